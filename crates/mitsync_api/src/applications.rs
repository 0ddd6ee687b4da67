//! Applications resource: directory lookup by name, GUID or legacy id.

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, PageInfo};
use crate::error::ApiError;

const APPLICATIONS_PAGE_SIZE: u32 = 100;

/// An application profile directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Stable GUID identifying the application.
    pub guid: String,
    /// Legacy numeric application id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Profile block carrying the display name.
    pub profile: AppProfile,
}

/// Application profile details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppProfile {
    /// Display name of the application.
    pub name: String,
}

impl Application {
    /// Display name of the application.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

#[derive(Debug, Deserialize)]
struct ApplicationsPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<ApplicationsEmbedded>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ApplicationsEmbedded {
    #[serde(default)]
    applications: Vec<Application>,
}

impl ApiClient {
    /// Lists every application profile in the directory.
    pub async fn applications(&self) -> Result<Vec<Application>, ApiError> {
        let query = vec![("size", APPLICATIONS_PAGE_SIZE.to_string())];
        self.collect_pages("/appsec/v1/applications", &query, |body: ApplicationsPage| {
            (body.embedded.unwrap_or_default().applications, body.page)
        })
        .await
    }

    /// Searches the directory for applications whose name contains `name`.
    pub async fn applications_by_name(&self, name: &str) -> Result<Vec<Application>, ApiError> {
        let query = vec![
            ("name", name.to_string()),
            ("size", APPLICATIONS_PAGE_SIZE.to_string()),
        ];
        self.collect_pages("/appsec/v1/applications", &query, |body: ApplicationsPage| {
            (body.embedded.unwrap_or_default().applications, body.page)
        })
        .await
    }

    /// Fetches a single application by GUID.
    pub async fn application(&self, guid: &str) -> Result<Application, ApiError> {
        let path = format!("/appsec/v1/applications/{guid}");
        self.get_json(&path, &[]).await
    }

    /// Looks up an application by its legacy numeric id.
    pub async fn application_by_legacy_id(
        &self,
        legacy_id: u64,
    ) -> Result<Option<Application>, ApiError> {
        let query = vec![("legacy_id", legacy_id.to_string())];
        let mut matches = self
            .collect_pages("/appsec/v1/applications", &query, |body: ApplicationsPage| {
                (body.embedded.unwrap_or_default().applications, body.page)
            })
            .await?;
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::with_base_url(
            &server.uri(),
            Credentials::new("test-id", "0123456789abcdef0123456789abcdef"),
        )
        .unwrap()
    }

    fn app_json(guid: &str, name: &str) -> serde_json::Value {
        json!({ "guid": guid, "id": 12345, "profile": { "name": name } })
    }

    #[tokio::test]
    async fn name_search_passes_the_name_param() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .and(query_param("name", "My App"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {
                    "applications": [app_json("g-1", "My App"), app_json("g-2", "My App (old)")]
                },
                "page": { "number": 0, "total_pages": 1 }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let apps = client.applications_by_name("My App").await.unwrap();

        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].guid, "g-1");
        assert_eq!(apps[1].name(), "My App (old)");
    }

    #[tokio::test]
    async fn single_application_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications/g-77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(app_json("g-77", "Billing")))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let app = client.application("g-77").await.unwrap();
        assert_eq!(app.name(), "Billing");
        assert_eq!(app.id, Some(12345));
    }

    #[tokio::test]
    async fn legacy_id_lookup_returns_first_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .and(query_param("legacy_id", "9876"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": { "applications": [app_json("g-9", "Legacy")] },
                "page": { "number": 0, "total_pages": 1 }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let app = client.application_by_legacy_id(9876).await.unwrap();
        assert_eq!(app.unwrap().guid, "g-9");
    }

    #[tokio::test]
    async fn legacy_id_lookup_handles_no_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": { "applications": [] },
                "page": { "number": 0, "total_pages": 1 }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.application_by_legacy_id(1).await.unwrap().is_none());
    }
}
