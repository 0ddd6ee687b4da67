//! Signed HTTP client shared by the resource modules.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::USER_AGENT;
use crate::auth::Credentials;
use crate::error::ApiError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.veracode.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Hard cap on pages fetched from any one listing.
const MAX_PAGES: u32 = 1000;

/// HAL pagination block shared by the listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(default)]
    pub(crate) number: u32,
    #[serde(default)]
    pub(crate) total_pages: u32,
}

/// Signed HTTP client for the platform REST APIs.
///
/// Every request carries an HMAC `Authorization` header computed over the
/// exact path and query string sent on the wire. Cloning is cheap; the
/// underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
}

impl ApiClient {
    /// Creates a client against the default API host.
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Creates a client against `base_url`.
    ///
    /// A bare host name is accepted and defaults to `https`. Used for
    /// non-default regions and by tests.
    pub fn with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let with_scheme = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("https://{base_url}")
        };
        let base = Url::parse(&with_scheme).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: source.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::ClientInit)?;
        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    /// Discovers credentials from the environment and creates a client
    /// against the default API host.
    pub fn from_environment() -> Result<Self, ApiError> {
        Self::new(Credentials::discover()?)
    }

    /// The key id this client signs with.
    #[must_use]
    pub fn api_key_id(&self) -> &str {
        self.credentials.api_key_id()
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.request_url(path, query)?;
        let auth = self.authorization_for(&url, "GET")?;
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "GET",
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "GET",
                url: url.to_string(),
                status,
            });
        }
        response.json().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    pub(crate) async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.request_url(path, query)?;
        let auth = self.authorization_for(&url, "POST")?;
        debug!(url = %url, "POST");

        let response = self
            .http
            .post(url.clone())
            .header(AUTHORIZATION, auth)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "POST",
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "POST",
                url: url.to_string(),
                status,
            });
        }
        Ok(())
    }

    /// Fetches `path` repeatedly, bumping the `page` query parameter until
    /// the HAL page block reports the last page.
    pub(crate) async fn collect_pages<T, B, F>(
        &self,
        path: &str,
        query: &[(&str, String)],
        extract: F,
    ) -> Result<Vec<T>, ApiError>
    where
        B: DeserializeOwned,
        F: Fn(B) -> (Vec<T>, Option<PageInfo>),
    {
        let mut items = Vec::new();
        let mut page = 0u32;
        loop {
            let mut paged_query = query.to_vec();
            paged_query.push(("page", page.to_string()));
            let body: B = self.get_json(path, &paged_query).await?;

            let (batch, info) = extract(body);
            items.extend(batch);

            let Some(info) = info else { break };
            let next = info.number.saturating_add(1);
            if next >= info.total_pages {
                break;
            }
            if next >= MAX_PAGES {
                return Err(ApiError::TooManyPages {
                    path: path.to_string(),
                    max: MAX_PAGES,
                });
            }
            page = next;
        }
        Ok(items)
    }

    fn request_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.join(path).map_err(|source| ApiError::InvalidBaseUrl {
            url: format!("{}{path}", self.base),
            reason: source.to_string(),
        })?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn authorization_for(&self, url: &Url, method: &'static str) -> Result<String, ApiError> {
        let host = url.host_str().unwrap_or_default();
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        self.credentials
            .authorization_header(host, &path_and_query, method)
    }
}
