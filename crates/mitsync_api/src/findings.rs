//! Findings resource: wire model, retrieval and annotation posting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, PageInfo};
use crate::error::ApiError;

/// Page size requested from the findings listing.
const FINDINGS_PAGE_SIZE: u32 = 500;

/// Scan category a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanType {
    /// Static analysis results.
    #[serde(rename = "STATIC")]
    Static,
    /// Dynamic analysis results.
    #[serde(rename = "DYNAMIC")]
    Dynamic,
}

impl ScanType {
    /// Wire value used in query parameters.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::Static => "STATIC",
            Self::Dynamic => "DYNAMIC",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Error returned when parsing a [`ScanType`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScanTypeError(String);

impl fmt::Display for ParseScanTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scan type '{}' (expected static or dynamic)", self.0)
    }
}

impl std::error::Error for ParseScanTypeError {}

impl FromStr for ScanType {
    type Err = ParseScanTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            _ => Err(ParseScanTypeError(s.to_string())),
        }
    }
}

/// Reviewer action kinds recorded in a finding's annotation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationAction {
    /// Free-text comment with no status change.
    #[serde(rename = "COMMENT")]
    Comment,
    /// Proposed mitigation: false positive.
    #[serde(rename = "FP")]
    FalsePositive,
    /// Proposed mitigation: addressed by application design.
    #[serde(rename = "APPDESIGN")]
    AppDesign,
    /// Proposed mitigation: addressed by OS environment.
    #[serde(rename = "OSENV")]
    OsEnv,
    /// Proposed mitigation: addressed by network environment.
    #[serde(rename = "NETENV")]
    NetEnv,
    /// Proposed mitigation: vulnerable code is in a library.
    #[serde(rename = "LIBRARY")]
    Library,
    /// Proposed mitigation: risk accepted.
    #[serde(rename = "ACCEPTRISK")]
    AcceptRisk,
    /// A proposed mitigation was approved by a reviewer.
    #[serde(rename = "APPROVED")]
    Approved,
    /// Direct acceptance of a proposed mitigation.
    #[serde(rename = "ACCEPTED")]
    Accepted,
    /// A proposed mitigation was rejected by a reviewer.
    #[serde(rename = "REJECTED")]
    Rejected,
    /// Scanner judgement: the finding conforms to its mitigation.
    #[serde(rename = "CONFORMS")]
    Conforms,
    /// Scanner judgement: the finding deviates from its mitigation.
    #[serde(rename = "DEVIATES")]
    Deviates,
    /// A custom cleanser function was proposed.
    #[serde(rename = "CUSTOMCLEANSERPROPOSED")]
    CustomCleanserProposed,
    /// A reviewer commented on a custom cleanser proposal.
    #[serde(rename = "CUSTOMCLEANSERUSERCOMMENT")]
    CustomCleanserUserComment,
    /// Any action kind this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl AnnotationAction {
    /// Wire value posted to the annotations endpoint.
    ///
    /// [`Unknown`](Self::Unknown) has no faithful wire value and is never
    /// posted; it renders as `UNKNOWN` for log output only.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Comment => "COMMENT",
            Self::FalsePositive => "FP",
            Self::AppDesign => "APPDESIGN",
            Self::OsEnv => "OSENV",
            Self::NetEnv => "NETENV",
            Self::Library => "LIBRARY",
            Self::AcceptRisk => "ACCEPTRISK",
            Self::Approved => "APPROVED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Conforms => "CONFORMS",
            Self::Deviates => "DEVIATES",
            Self::CustomCleanserProposed => "CUSTOMCLEANSERPROPOSED",
            Self::CustomCleanserUserComment => "CUSTOMCLEANSERUSERCOMMENT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AnnotationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Review state of a finding's proposed mitigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    /// A mitigation proposal has been approved.
    #[serde(rename = "APPROVED")]
    Approved,
    /// A mitigation has been proposed and awaits review.
    #[serde(rename = "PROPOSED")]
    Proposed,
    /// The most recent mitigation proposal was rejected.
    #[serde(rename = "REJECTED")]
    Rejected,
    /// No reviewed mitigation (the platform reports `NONE`).
    #[default]
    #[serde(other)]
    Unreviewed,
}

/// One entry in a finding's mitigation history.
///
/// The findings API returns annotations most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    /// Reviewer action kind.
    pub action: AnnotationAction,
    /// Free-text reviewer comment.
    #[serde(default)]
    pub comment: String,
    /// When the action was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Display name of the reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// CWE classification attached to a finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cwe {
    /// Numeric CWE identifier.
    pub id: u32,
    /// Short CWE name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Status block of a finding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingStatus {
    /// Review state of the finding's mitigation.
    #[serde(default)]
    pub resolution_status: ResolutionStatus,
    /// Resolution category, for example `POTENTIAL_FALSE_POSITIVE`.
    #[serde(default)]
    pub resolution: String,
    /// Whether the finding is `OPEN` or `CLOSED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// First date the finding was observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_found_date: Option<String>,
    /// Most recent date the finding was observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_date: Option<String>,
}

/// Scan-type-specific location and classification details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingDetails {
    /// CWE classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe: Option<Cwe>,
    /// Severity on the platform's 0-5 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,

    /// Source file path (static findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Source file name (static findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Line number within the source file (static findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_line_number: Option<u32>,
    /// Procedure (function) containing the flaw (static findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    /// Offset of the flaw relative to its procedure (static findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_location: Option<i32>,

    /// Request path (dynamic findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Full attacked URL (dynamic findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Vulnerable request parameter (dynamic findings); absent for some
    /// informational-leak findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerable_parameter: Option<String>,
}

/// A single reported vulnerability instance on a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Numeric identity of the finding within its application context.
    pub issue_id: u32,
    /// Sandbox context the finding belongs to, absent for policy findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_guid: Option<String>,
    /// Whether the finding currently violates policy.
    #[serde(default)]
    pub violates_policy: bool,
    /// Status block (resolution, open/closed, dates).
    #[serde(default)]
    pub finding_status: FindingStatus,
    /// Location and classification details.
    #[serde(default)]
    pub finding_details: FindingDetails,
    /// Mitigation history, most recent first.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Finding {
    /// Whether the finding already carries an approved mitigation.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.finding_status.resolution_status == ResolutionStatus::Approved
    }
}

#[derive(Debug, Deserialize)]
struct FindingsPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<FindingsEmbedded>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct FindingsEmbedded {
    #[serde(default)]
    findings: Vec<Finding>,
}

#[derive(Debug, Serialize)]
struct AnnotationRequest<'a> {
    issue_list: String,
    comment: &'a str,
    action: &'a str,
}

impl ApiClient {
    /// Fetches every finding for an application context, following pagination.
    ///
    /// Annotation history is included on each finding. `sandbox_guid` scopes
    /// the query to a sandbox; `None` queries the policy-level results.
    pub async fn findings(
        &self,
        app_guid: &str,
        scan_type: ScanType,
        sandbox_guid: Option<&str>,
    ) -> Result<Vec<Finding>, ApiError> {
        let path = format!("/appsec/v2/applications/{app_guid}/findings");
        let mut query = vec![
            ("scan_type", scan_type.as_query().to_string()),
            ("annot", "TRUE".to_string()),
            ("size", FINDINGS_PAGE_SIZE.to_string()),
        ];
        if let Some(sandbox) = sandbox_guid {
            query.push(("context", sandbox.to_string()));
        }
        self.collect_pages(&path, &query, |body: FindingsPage| {
            (body.embedded.unwrap_or_default().findings, body.page)
        })
        .await
    }

    /// Applies one mitigation action to the listed findings.
    ///
    /// `sandbox_guid` targets findings inside a sandbox; `None` targets the
    /// policy-level findings.
    pub async fn post_annotation(
        &self,
        app_guid: &str,
        issue_ids: &[u32],
        comment: &str,
        action: AnnotationAction,
        sandbox_guid: Option<&str>,
    ) -> Result<(), ApiError> {
        let path = format!("/appsec/v2/applications/{app_guid}/annotations");
        let mut query = Vec::new();
        if let Some(sandbox) = sandbox_guid {
            query.push(("sandbox_id", sandbox.to_string()));
        }
        let issue_list = issue_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let body = AnnotationRequest {
            issue_list,
            comment,
            action: action.as_wire(),
        };
        self.post_json(&path, &query, &body).await
    }
}
