//! Shared command startup: configuration, credentials and the runtime.

use std::path::Path;

use anyhow::Context as _;
use chrono::Utc;
use mitsync_api::{ApiClient, Credentials};
use mitsync_core::{CONFIG_FILENAME, Config};
use tracing::debug;

use crate::ui;

/// Remaining credential validity, in days, below which a warning is
/// printed at startup.
const EXPIRY_WARNING_DAYS: i64 = 7;

/// Configuration and signed API client shared by every command.
#[derive(Debug)]
pub struct Session {
    /// Effective configuration (file values over built-in defaults).
    pub config: Config,
    /// Signed client against the configured API host.
    pub client: ApiClient,
}

impl Session {
    /// Loads configuration and discovers credentials.
    ///
    /// `config_path` overrides the default `mitsync.toml` lookup in the
    /// working directory; a missing file yields defaults, a malformed
    /// one is fatal.
    pub fn open(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = Config::load(config_path.unwrap_or(Path::new(CONFIG_FILENAME)))?;
        let credentials = Credentials::discover()?;
        let client = match config.api_host.as_deref() {
            Some(host) => ApiClient::with_base_url(host, credentials)?,
            None => ApiClient::new(credentials)?,
        };

        Ok(Self { config, client })
    }
}

/// Builds the current-thread runtime commands drive their requests on.
pub fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")
}

/// Warns when the API credentials expire within the next week.
///
/// Expiry metadata is advisory; a failed check is logged and ignored.
pub async fn warn_expiring_credentials(client: &ApiClient) {
    match client.api_credentials().await {
        Ok(credentials) => {
            if let Some(expires_at) = credentials.expires_at() {
                let days_left = (expires_at.with_timezone(&Utc) - Utc::now()).num_days();
                if days_left < EXPIRY_WARNING_DAYS {
                    ui::print_warning(&format!("these API credentials expire {expires_at}"));
                }
            }
        }
        Err(error) => debug!(%error, "could not check credential expiry"),
    }
}
