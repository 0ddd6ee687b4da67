//! The per-finding sync loop.
//!
//! One sync pass copies approved mitigation history from a source scan
//! context onto the matching findings of a destination context. The
//! destination set is fetched fresh, each unapproved destination
//! finding is matched against the source pool, and the matched source's
//! annotation history is replayed onto it. Consumption is tracked per
//! destination finding so a destination never receives a second copy
//! pass within a run, even across repeated calls sharing one
//! [`ConsumedSet`].

use std::collections::HashSet;
use std::fmt;

use mitsync_api::{Finding, ScanRemote, ScanType};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::matching::{CandidatePool, MatchPolicy, match_finding};
use crate::replay::Replayer;
use crate::retry::{RetryPolicy, with_retry};

/// One application-or-sandbox scan context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    /// Application GUID.
    pub guid: String,
    /// Sandbox GUID, when the context is a sandbox.
    pub sandbox_guid: Option<String>,
    /// Display name used in progress output, when known.
    pub name: Option<String>,
}

impl AppContext {
    /// Policy-level context of an application.
    #[must_use]
    pub fn application(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            sandbox_guid: None,
            name: None,
        }
    }

    /// Sandbox context within an application.
    #[must_use]
    pub fn sandbox(guid: impl Into<String>, sandbox_guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            sandbox_guid: Some(sandbox_guid.into()),
            name: None,
        }
    }

    /// Attaches a display name for progress output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Human-readable description used in progress and log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or(&self.guid);
        match &self.sandbox_guid {
            Some(sandbox) => {
                format!("sandbox {sandbox} in application {name} (guid: {})", self.guid)
            }
            None => format!("application {name} (guid: {})", self.guid),
        }
    }
}

/// Destination issue ids already handled during this run.
///
/// Carrying one set across multiple sync calls keeps a destination
/// finding from receiving a second copy pass when the same destination
/// set is matched repeatedly.
#[derive(Debug, Clone, Default)]
pub struct ConsumedSet(HashSet<u32>);

impl ConsumedSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `issue_id` has already been handled.
    #[must_use]
    pub fn contains(&self, issue_id: u32) -> bool {
        self.0.contains(&issue_id)
    }

    /// Records `issue_id` as handled.
    ///
    /// Returns `false` if it was already recorded.
    pub fn insert(&mut self, issue_id: u32) -> bool {
        self.0.insert(issue_id)
    }

    /// Number of handled destination findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no destination findings have been handled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Behavior switches for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Log matches and intended posts without calling the remote.
    pub dry_run: bool,
    /// Do not replay approval actions, leaving copies as proposals.
    pub propose_only: bool,
    /// Accept close line numbers for static findings.
    pub allow_fuzzy: bool,
    /// Maximum line distance accepted by a fuzzy match.
    pub line_tolerance: u32,
    /// When set, only source findings with these issue ids are
    /// eligible to be copied from.
    pub issue_filter: Option<HashSet<u32>>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            propose_only: false,
            allow_fuzzy: false,
            line_tolerance: crate::matching::DEFAULT_LINE_TOLERANCE,
            issue_filter: None,
        }
    }
}

/// Drives the per-finding matching and replay loop.
pub struct Syncer<'a, R> {
    remote: &'a R,
    options: SyncOptions,
    retry: RetryPolicy,
}

impl<R> fmt::Debug for Syncer<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Syncer")
            .field("options", &self.options)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<'a, R: ScanRemote> Syncer<'a, R> {
    /// Creates a syncer with default options and retry policy.
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            options: SyncOptions::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the option set.
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the retry policy used for the destination fetch.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Copies approved mitigation history from `from_findings` onto the
    /// matching findings of the `to` context.
    ///
    /// Destination findings are processed in fetch order. A destination
    /// is skipped when it already carries an approved mitigation or was
    /// consumed earlier in the run; otherwise the first matching source
    /// candidate's history is replayed onto it and it is marked
    /// consumed. Returns the number of destination findings that
    /// received a copy pass.
    ///
    /// Only the destination fetch can fail here; per-annotation post
    /// failures are logged inside the replayer and do not abort the
    /// run.
    pub async fn sync_findings(
        &self,
        from_findings: &[Finding],
        from: &AppContext,
        to: &AppContext,
        scan_type: ScanType,
        consumed: &mut ConsumedSet,
    ) -> Result<u32, SyncError> {
        if from_findings.is_empty() {
            info!(from = %from.describe(), "source has no findings, nothing to copy");
            return Ok(0);
        }
        if let Some(filter) = &self.options.issue_filter {
            info!(ids = ?filter, "only copying source findings with the given issue ids");
        }
        if !self.has_eligible_source(from_findings) {
            info!(from = %from.describe(), "source has no approved findings, nothing to copy");
            return Ok(0);
        }

        info!(to = %to.describe(), %scan_type, "getting destination findings");
        let to_findings =
            fetch_findings_with_retry(self.remote, to, scan_type, &self.retry).await?;
        info!(count = to_findings.len(), to = %to.describe(), "found destination findings");
        if to_findings.is_empty() {
            return Ok(0);
        }

        let pool = CandidatePool::new(from_findings, scan_type);
        let policy = MatchPolicy {
            approved_only: true,
            allow_fuzzy: self.options.allow_fuzzy,
            line_tolerance: self.options.line_tolerance,
        };
        let replayer = Replayer::new(self.remote)
            .dry_run(self.options.dry_run)
            .propose_only(self.options.propose_only);

        let mut copied = 0u32;
        for destination in &to_findings {
            let issue_id = destination.issue_id;
            if destination.is_approved() || consumed.contains(issue_id) {
                debug!(issue_id, "destination already mitigated, skipping");
                continue;
            }

            let Some(candidate) = match_finding(destination, &pool, &policy) else {
                debug!(issue_id, "no approved source match");
                continue;
            };

            let history = &candidate.finding().annotations;
            info!(
                issue_id,
                source_id = candidate.key().issue_id,
                annotations = history.len(),
                "matched finding, applying history"
            );
            let outcome = replayer.replay(to, issue_id, history, &from.guid).await;
            debug!(
                issue_id,
                applied = outcome.applied,
                skipped = outcome.skipped,
                failed = outcome.failed,
                "replay finished"
            );

            consumed.insert(issue_id);
            copied += 1;
        }

        Ok(copied)
    }

    /// Whether any source finding is approved and passes the issue
    /// filter.
    fn has_eligible_source(&self, findings: &[Finding]) -> bool {
        findings.iter().any(|finding| {
            finding.is_approved()
                && self
                    .options
                    .issue_filter
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&finding.issue_id))
        })
    }
}

/// Bulk-fetches the findings of `context`, retrying transient failures
/// per `policy`.
///
/// Retry exhaustion (or a non-transient failure) is fatal for this
/// context and propagates as [`SyncError::FetchFindings`].
pub async fn fetch_findings_with_retry<R: ScanRemote>(
    remote: &R,
    context: &AppContext,
    scan_type: ScanType,
    policy: &RetryPolicy,
) -> Result<Vec<Finding>, SyncError> {
    with_retry(policy, || {
        remote.findings(&context.guid, scan_type, context.sandbox_guid.as_deref())
    })
    .await
    .map_err(|source| SyncError::FetchFindings {
        context: context.describe(),
        scan_type,
        source,
    })
}
