//! API credential discovery and request signing.
//!
//! Requests authenticate with the platform's HMAC scheme: a chain of
//! HMAC-SHA-256 operations keyed from the hex-decoded API secret over a
//! random nonce, a millisecond timestamp and the request identity, rendered
//! into an `Authorization` header.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::client::ApiClient;
use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the API key id.
pub const KEY_ID_VAR: &str = "VERACODE_API_KEY_ID";
/// Environment variable holding the API key secret.
pub const KEY_SECRET_VAR: &str = "VERACODE_API_KEY_SECRET";
/// Environment variable selecting the credentials file profile.
pub const PROFILE_VAR: &str = "VERACODE_API_PROFILE";

const AUTH_SCHEME: &str = "VERACODE-HMAC-SHA-256";
const REQUEST_VERSION: &[u8] = b"vcode_request_version_1";
const NONCE_LEN: usize = 16;
const KEY_ID_ENTRY: &str = "veracode_api_key_id";
const KEY_SECRET_ENTRY: &str = "veracode_api_key_secret";

/// Errors raised while discovering or parsing API credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// Neither environment variables nor a credentials file supplied a key pair.
    #[error(
        "no API credentials found; set {KEY_ID_VAR} and {KEY_SECRET_VAR} or create {}",
        .path.display()
    )]
    NotFound {
        /// The credentials file path that was searched.
        path: PathBuf,
    },

    /// The credentials file exists but could not be read.
    #[error("failed to read credentials file {}", .path.display())]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The selected profile is missing from the credentials file.
    #[error("profile [{profile}] has no API key pair in {}", .path.display())]
    ProfileNotFound {
        /// The profile that was requested.
        profile: String,
        /// The file that was searched.
        path: PathBuf,
    },

    /// The API key secret is not valid hex.
    #[error("API key secret is not valid hex")]
    InvalidSecret(#[source] hex::FromHexError),
}

/// An API key id/secret pair used to sign requests.
#[derive(Clone)]
pub struct Credentials {
    api_key_id: String,
    api_key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_id", &self.api_key_id)
            .field("api_key_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials from an explicit key pair.
    pub fn new(api_key_id: impl Into<String>, api_key_secret: impl Into<String>) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            api_key_secret: api_key_secret.into(),
        }
    }

    /// Discovers credentials from the environment, falling back to the
    /// `~/.veracode/credentials` profile file.
    ///
    /// The profile defaults to `default` and can be selected with the
    /// `VERACODE_API_PROFILE` environment variable.
    pub fn discover() -> Result<Self, CredentialsError> {
        if let (Ok(id), Ok(secret)) = (env::var(KEY_ID_VAR), env::var(KEY_SECRET_VAR)) {
            if !id.trim().is_empty() && !secret.trim().is_empty() {
                return Ok(Self::new(id.trim(), secret.trim()));
            }
        }

        let path = default_credentials_path();
        if !path.is_file() {
            return Err(CredentialsError::NotFound { path });
        }
        let profile = env::var(PROFILE_VAR).unwrap_or_else(|_| "default".to_string());
        Self::from_file(&path, &profile)
    }

    /// Reads a key pair from an INI-style credentials file.
    pub fn from_file(path: &Path, profile: &str) -> Result<Self, CredentialsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_profile(&contents, profile).ok_or_else(|| CredentialsError::ProfileNotFound {
            profile: profile.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// The API key id these credentials sign with.
    #[must_use]
    pub fn api_key_id(&self) -> &str {
        &self.api_key_id
    }

    /// Computes the `Authorization` header for one request.
    ///
    /// `path_and_query` must be exactly the path plus query string that goes
    /// on the wire; the server recomputes the signature from the received
    /// request line.
    pub(crate) fn authorization_header(
        &self,
        host: &str,
        path_and_query: &str,
        method: &str,
    ) -> Result<String, ApiError> {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let timestamp = Utc::now().timestamp_millis();
        self.signed_header(host, path_and_query, method, &nonce, timestamp)
    }

    fn signed_header(
        &self,
        host: &str,
        path_and_query: &str,
        method: &str,
        nonce: &[u8],
        timestamp: i64,
    ) -> Result<String, ApiError> {
        let secret =
            hex::decode(self.api_key_secret.trim()).map_err(CredentialsError::InvalidSecret)?;
        let data = format!(
            "id={}&host={}&url={}&method={}",
            self.api_key_id.to_lowercase(),
            host.to_lowercase(),
            path_and_query,
            method.to_uppercase()
        );

        let key_nonce = hmac_sha256(&secret, nonce)?;
        let key_date = hmac_sha256(&key_nonce, timestamp.to_string().as_bytes())?;
        let key_version = hmac_sha256(&key_date, REQUEST_VERSION)?;
        let signature = hmac_sha256(&key_version, data.as_bytes())?;

        Ok(format!(
            "{AUTH_SCHEME} id={},ts={timestamp},nonce={},sig={}",
            self.api_key_id,
            hex::encode(nonce),
            hex::encode(signature)
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(ApiError::Signing)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn default_credentials_path() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .unwrap_or_default();
    PathBuf::from(home).join(".veracode").join("credentials")
}

fn parse_profile(contents: &str, profile: &str) -> Option<Credentials> {
    let mut in_profile = false;
    let mut id = None;
    let mut secret = None;

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            in_profile = section.trim().eq_ignore_ascii_case(profile);
            continue;
        }
        if !in_profile {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                KEY_ID_ENTRY => id = Some(value.trim().to_string()),
                KEY_SECRET_ENTRY => secret = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    Some(Credentials::new(id?, secret?))
}

/// Credential metadata returned by the identity API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiCredentials {
    /// When the key pair expires, as an RFC 3339 timestamp with offset.
    #[serde(default)]
    pub expiration_ts: Option<String>,
}

impl ApiCredentials {
    /// Parses the expiration timestamp, if present and well-formed.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.expiration_ts.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
    }
}

impl ApiClient {
    /// Fetches metadata about the credentials this client signs with.
    pub async fn api_credentials(&self) -> Result<ApiCredentials, ApiError> {
        self.get_json("/api/authn/v2/api_credentials", &[]).await
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn parses_default_profile() {
        let contents = "\
[default]
veracode_api_key_id = abc123
veracode_api_key_secret = def456
";
        let creds = parse_profile(contents, "default").unwrap();
        assert_eq!(creds.api_key_id(), "abc123");
        assert_eq!(creds.api_key_secret, "def456");
    }

    #[test]
    fn parses_named_profile_among_several() {
        let contents = "\
# corp credentials
[default]
veracode_api_key_id = default-id
veracode_api_key_secret = default-secret

[staging]
veracode_api_key_id = staging-id
veracode_api_key_secret = staging-secret
";
        let creds = parse_profile(contents, "staging").unwrap();
        assert_eq!(creds.api_key_id(), "staging-id");
        assert_eq!(creds.api_key_secret, "staging-secret");
    }

    #[test]
    fn missing_profile_yields_none() {
        let contents = "[default]\nveracode_api_key_id = x\nveracode_api_key_secret = y\n";
        assert!(parse_profile(contents, "production").is_none());
    }

    #[test]
    fn profile_without_secret_yields_none() {
        let contents = "[default]\nveracode_api_key_id = x\n";
        assert!(parse_profile(contents, "default").is_none());
    }

    #[test]
    fn from_file_reads_key_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "[default]\nveracode_api_key_id = file-id\nveracode_api_key_secret = file-secret\n",
        )
        .unwrap();

        let creds = Credentials::from_file(&path, "default").unwrap();
        assert_eq!(creds.api_key_id(), "file-id");
    }

    #[test]
    fn from_file_reports_missing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(&path, "[other]\nveracode_api_key_id = x\n").unwrap();

        let err = Credentials::from_file(&path, "default").unwrap_err();
        assert!(matches!(err, CredentialsError::ProfileNotFound { .. }));
    }

    #[test]
    fn signed_header_is_deterministic_for_fixed_inputs() {
        let creds = Credentials::new("test-id", TEST_SECRET);
        let nonce = [7u8; NONCE_LEN];

        let first = creds
            .signed_header("api.example.com", "/appsec/v1/applications", "GET", &nonce, 1_700_000_000_000)
            .unwrap();
        let second = creds
            .signed_header("api.example.com", "/appsec/v1/applications", "GET", &nonce, 1_700_000_000_000)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn signed_header_has_expected_shape() {
        let creds = Credentials::new("Test-ID", TEST_SECRET);
        let nonce = [0u8; NONCE_LEN];
        let header = creds
            .signed_header("API.example.com", "/path?x=1", "get", &nonce, 42)
            .unwrap();

        assert!(header.starts_with("VERACODE-HMAC-SHA-256 "));
        assert!(header.contains("id=Test-ID,"));
        assert!(header.contains("ts=42,"));
        let sig = header.rsplit("sig=").next().unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_the_secret() {
        let nonce = [1u8; NONCE_LEN];
        let a = Credentials::new("id", TEST_SECRET)
            .signed_header("h", "/u", "GET", &nonce, 1)
            .unwrap();
        let b = Credentials::new("id", "ffffffffffffffffffffffffffffffff")
            .signed_header("h", "/u", "GET", &nonce, 1)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn non_hex_secret_is_rejected() {
        let creds = Credentials::new("id", "not hex at all");
        let err = creds
            .signed_header("h", "/u", "GET", &[0u8; NONCE_LEN], 1)
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Credentials(CredentialsError::InvalidSecret(_))
        ));
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let creds = Credentials::new("id", TEST_SECRET);
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(TEST_SECRET));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn expiry_parses_rfc3339_and_offset_formats() {
        let zulu = ApiCredentials {
            expiration_ts: Some("2026-09-01T10:20:30.000Z".to_string()),
        };
        assert!(zulu.expires_at().is_some());

        let offset = ApiCredentials {
            expiration_ts: Some("2026-09-01T10:20:30.000+0200".to_string()),
        };
        assert!(offset.expires_at().is_some());

        let garbage = ApiCredentials {
            expiration_ts: Some("next tuesday".to_string()),
        };
        assert!(garbage.expires_at().is_none());
    }
}
