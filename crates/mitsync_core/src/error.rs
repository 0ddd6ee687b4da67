//! Error types for the sync engine.

use mitsync_api::{ApiError, ScanType};

/// Errors surfaced by the sync engine.
///
/// Only the bulk findings fetch can fail a unit of work. Individual
/// annotation posts are handled inside the replayer with skip-and-log
/// semantics and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The bulk findings fetch failed after exhausting its retry policy.
    #[error("failed to fetch {scan_type} findings for {context}: {source}")]
    FetchFindings {
        /// Description of the application or sandbox that was queried.
        context: String,
        /// Scan type of the failed query.
        scan_type: ScanType,
        /// The final fetch error.
        #[source]
        source: ApiError,
    },
}
