//! Sandboxes resource: listing the named scan contexts of an application.

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, PageInfo};
use crate::error::ApiError;

const SANDBOXES_PAGE_SIZE: u32 = 100;

/// A named sandbox scan context within an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sandbox {
    /// Stable GUID identifying the sandbox.
    pub guid: String,
    /// Display name of the sandbox.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SandboxesPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<SandboxesEmbedded>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct SandboxesEmbedded {
    #[serde(default)]
    sandboxes: Vec<Sandbox>,
}

impl ApiClient {
    /// Lists the sandboxes of an application.
    pub async fn sandboxes(&self, app_guid: &str) -> Result<Vec<Sandbox>, ApiError> {
        let path = format!("/appsec/v1/applications/{app_guid}/sandboxes");
        let query = vec![("size", SANDBOXES_PAGE_SIZE.to_string())];
        self.collect_pages(&path, &query, |body: SandboxesPage| {
            (body.embedded.unwrap_or_default().sandboxes, body.page)
        })
        .await
    }
}
