//! Error types for the REST client.

use reqwest::StatusCode;

use crate::auth::CredentialsError;

/// Errors returned by [`ApiClient`](crate::ApiClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credential discovery or parsing failed.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The HTTP client could not be initialised.
    #[error("failed to initialize HTTP client")]
    ClientInit(#[source] reqwest::Error),

    /// The configured API base URL is not a valid URL.
    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl {
        /// The rejected URL string.
        url: String,
        /// Why the URL failed to parse.
        reason: String,
    },

    /// The HTTP transport failed before a response was received.
    #[error("{method} {url} failed")]
    Transport {
        /// HTTP method of the failed request.
        method: &'static str,
        /// Full request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The remote returned a non-success HTTP status.
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        /// HTTP method of the request.
        method: &'static str,
        /// Full request URL.
        url: String,
        /// The status code returned.
        status: StatusCode,
    },

    /// A response body could not be deserialized.
    #[error("failed to decode response from {url}")]
    Decode {
        /// Full request URL.
        url: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// Computing the request signature failed.
    #[error("failed to compute request signature")]
    Signing(#[source] hmac::digest::InvalidLength),

    /// A paginated listing did not terminate within the page cap.
    #[error("pagination exceeded {max} pages for {path}")]
    TooManyPages {
        /// Request path of the runaway listing.
        path: String,
        /// The page cap that was hit.
        max: u32,
    },
}

impl ApiError {
    /// Whether retrying the failed operation could plausibly succeed.
    ///
    /// Transport failures and server-side statuses (5xx, 429) are transient;
    /// client-side statuses, credential and decode failures are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> ApiError {
        ApiError::Status {
            method: "GET",
            url: "https://api.example.com/appsec/v2/applications".to_string(),
            status,
        }
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(status_error(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(status_error(StatusCode::BAD_GATEWAY).is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!status_error(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!status_error(StatusCode::NOT_FOUND).is_transient());
        assert!(!status_error(StatusCode::BAD_REQUEST).is_transient());
    }

    #[test]
    fn page_cap_is_not_transient() {
        let err = ApiError::TooManyPages {
            path: "/appsec/v2/applications/abc/findings".to_string(),
            max: 1000,
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn status_error_message_names_the_request() {
        let err = status_error(StatusCode::FORBIDDEN);
        let message = err.to_string();
        assert!(message.contains("GET"));
        assert!(message.contains("403"));
    }
}
