//! Test utilities for `mitsync_core` (compiled only during testing).

use std::sync::Mutex;

use mitsync_api::{
    Annotation, AnnotationAction, ApiError, AppProfile, Application, Cwe, Finding, FindingDetails,
    FindingStatus, ResolutionStatus, Sandbox, ScanRemote, ScanType,
};
use reqwest::StatusCode;

pub(crate) fn static_finding(issue_id: u32, cwe: u32, file: &str, line: u32) -> Finding {
    Finding {
        issue_id,
        context_guid: None,
        violates_policy: true,
        finding_status: FindingStatus::default(),
        finding_details: FindingDetails {
            cwe: Some(Cwe { id: cwe, name: None }),
            file_path: Some(file.to_string()),
            file_line_number: Some(line),
            ..Default::default()
        },
        annotations: Vec::new(),
    }
}

pub(crate) fn approved(mut finding: Finding) -> Finding {
    finding.finding_status.resolution_status = ResolutionStatus::Approved;
    finding
}

pub(crate) fn annotated(mut finding: Finding, annotations: Vec<Annotation>) -> Finding {
    finding.annotations = annotations;
    finding
}

pub(crate) fn annotation(action: AnnotationAction, comment: &str) -> Annotation {
    Annotation {
        action,
        comment: comment.to_string(),
        created: None,
        user_name: Some("reviewer".to_string()),
    }
}

pub(crate) fn transient_error() -> ApiError {
    ApiError::Status {
        method: "GET",
        url: "https://api.example.com/mock".to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// One recorded call to [`MockRemote::post_annotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostedAnnotation {
    pub(crate) app_guid: String,
    pub(crate) issue_ids: Vec<u32>,
    pub(crate) comment: String,
    pub(crate) action: AnnotationAction,
    pub(crate) sandbox_guid: Option<String>,
}

/// In-memory [`ScanRemote`] double recording every call.
///
/// `fail_fetches` and `fail_posts` make the first N calls of the
/// corresponding kind fail with a transient error before succeeding.
#[derive(Debug, Default)]
pub(crate) struct MockRemote {
    findings: Mutex<Vec<Finding>>,
    fail_fetches: Mutex<u32>,
    fetch_calls: Mutex<u32>,
    fail_posts: Mutex<u32>,
    post_attempts: Mutex<u32>,
    posts: Mutex<Vec<PostedAnnotation>>,
}

impl MockRemote {
    pub(crate) fn with_findings(findings: Vec<Finding>) -> Self {
        Self {
            findings: Mutex::new(findings),
            ..Self::default()
        }
    }

    pub(crate) fn failing_fetches(self, failures: u32) -> Self {
        *self.fail_fetches.lock().unwrap() = failures;
        self
    }

    pub(crate) fn failing_posts(self, failures: u32) -> Self {
        *self.fail_posts.lock().unwrap() = failures;
        self
    }

    pub(crate) fn set_findings(&self, findings: Vec<Finding>) {
        *self.findings.lock().unwrap() = findings;
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
        *self.fetch_calls.lock().unwrap()
    }

    pub(crate) fn post_attempts(&self) -> u32 {
        *self.post_attempts.lock().unwrap()
    }

    pub(crate) fn posts(&self) -> Vec<PostedAnnotation> {
        self.posts.lock().unwrap().clone()
    }
}

impl ScanRemote for MockRemote {
    async fn applications(&self) -> Result<Vec<Application>, ApiError> {
        Ok(Vec::new())
    }

    async fn applications_by_name(&self, _name: &str) -> Result<Vec<Application>, ApiError> {
        Ok(Vec::new())
    }

    async fn application(&self, guid: &str) -> Result<Application, ApiError> {
        Ok(Application {
            guid: guid.to_string(),
            id: None,
            profile: AppProfile {
                name: format!("app {guid}"),
            },
        })
    }

    async fn application_by_legacy_id(
        &self,
        _legacy_id: u64,
    ) -> Result<Option<Application>, ApiError> {
        Ok(None)
    }

    async fn sandboxes(&self, _app_guid: &str) -> Result<Vec<Sandbox>, ApiError> {
        Ok(Vec::new())
    }

    async fn findings(
        &self,
        _app_guid: &str,
        _scan_type: ScanType,
        _sandbox_guid: Option<&str>,
    ) -> Result<Vec<Finding>, ApiError> {
        *self.fetch_calls.lock().unwrap() += 1;
        let mut failures = self.fail_fetches.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(transient_error());
        }
        Ok(self.findings.lock().unwrap().clone())
    }

    async fn post_annotation(
        &self,
        app_guid: &str,
        issue_ids: &[u32],
        comment: &str,
        action: AnnotationAction,
        sandbox_guid: Option<&str>,
    ) -> Result<(), ApiError> {
        *self.post_attempts.lock().unwrap() += 1;
        let mut failures = self.fail_posts.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(transient_error());
        }
        self.posts.lock().unwrap().push(PostedAnnotation {
            app_guid: app_guid.to_string(),
            issue_ids: issue_ids.to_vec(),
            comment: comment.to_string(),
            action,
            sandbox_guid: sandbox_guid.map(ToString::to_string),
        });
        Ok(())
    }
}
