//! Collaborator seam between the sync engine and the REST client.

use crate::applications::Application;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::findings::{AnnotationAction, Finding, ScanType};
use crate::sandboxes::Sandbox;

/// Remote operations the sync engine and CLI depend on.
///
/// Implemented by [`ApiClient`] for production use; engine tests substitute
/// in-memory doubles. Methods return `impl Future + Send` so generic callers
/// can await them from any runtime.
pub trait ScanRemote: Send + Sync {
    /// Lists every application profile in the directory.
    fn applications(&self) -> impl Future<Output = Result<Vec<Application>, ApiError>> + Send;

    /// Searches the directory for applications whose name contains `name`.
    fn applications_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<Application>, ApiError>> + Send;

    /// Fetches a single application by GUID.
    fn application(
        &self,
        guid: &str,
    ) -> impl Future<Output = Result<Application, ApiError>> + Send;

    /// Looks up an application by its legacy numeric id.
    fn application_by_legacy_id(
        &self,
        legacy_id: u64,
    ) -> impl Future<Output = Result<Option<Application>, ApiError>> + Send;

    /// Lists the sandboxes of an application.
    fn sandboxes(
        &self,
        app_guid: &str,
    ) -> impl Future<Output = Result<Vec<Sandbox>, ApiError>> + Send;

    /// Bulk-fetches findings for an application context, including
    /// annotation history.
    fn findings(
        &self,
        app_guid: &str,
        scan_type: ScanType,
        sandbox_guid: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Finding>, ApiError>> + Send;

    /// Applies one mitigation action to the listed findings.
    fn post_annotation(
        &self,
        app_guid: &str,
        issue_ids: &[u32],
        comment: &str,
        action: AnnotationAction,
        sandbox_guid: Option<&str>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl ScanRemote for ApiClient {
    async fn applications(&self) -> Result<Vec<Application>, ApiError> {
        ApiClient::applications(self).await
    }

    async fn applications_by_name(&self, name: &str) -> Result<Vec<Application>, ApiError> {
        ApiClient::applications_by_name(self, name).await
    }

    async fn application(&self, guid: &str) -> Result<Application, ApiError> {
        ApiClient::application(self, guid).await
    }

    async fn application_by_legacy_id(
        &self,
        legacy_id: u64,
    ) -> Result<Option<Application>, ApiError> {
        ApiClient::application_by_legacy_id(self, legacy_id).await
    }

    async fn sandboxes(&self, app_guid: &str) -> Result<Vec<Sandbox>, ApiError> {
        ApiClient::sandboxes(self, app_guid).await
    }

    async fn findings(
        &self,
        app_guid: &str,
        scan_type: ScanType,
        sandbox_guid: Option<&str>,
    ) -> Result<Vec<Finding>, ApiError> {
        ApiClient::findings(self, app_guid, scan_type, sandbox_guid).await
    }

    async fn post_annotation(
        &self,
        app_guid: &str,
        issue_ids: &[u32],
        comment: &str,
        action: AnnotationAction,
        sandbox_guid: Option<&str>,
    ) -> Result<(), ApiError> {
        ApiClient::post_annotation(self, app_guid, issue_ids, comment, action, sandbox_guid).await
    }
}
