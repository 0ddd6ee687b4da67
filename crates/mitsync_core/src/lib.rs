//! Core mitigation sync engine for mitsync.
//!
//! This crate matches findings between two scan result sets and replays
//! approved mitigation history from one onto the other. It is written
//! against the [`ScanRemote`](mitsync_api::ScanRemote) seam, so it can
//! be driven by the real REST client or by in-memory doubles.
//!
//! # Main Types
//!
//! - [`Syncer`] - Drives the per-finding matching and replay loop
//! - [`CandidatePool`] - Normalized source findings a destination is matched against
//! - [`Replayer`] - Reapplies annotation history onto a matched finding
//! - [`Config`] - User configuration loaded from `mitsync.toml`
//!
//! # Error Handling
//!
//! This crate uses [`thiserror`] for structured, typed errors that library
//! consumers can match on:
//!
//! - [`SyncError`] - Bulk fetch failures that are fatal for one context
//! - [`ConfigError`] - Configuration loading/parsing failures
//!
//! The CLI crate (`mitsync_cli`) uses `anyhow` for error propagation.

/// User configuration loaded from `mitsync.toml`.
pub mod config;
/// Error types for the sync engine.
pub mod error;
/// Finding normalization and candidate matching.
pub mod matching;
/// Common re-exports for internal use.
pub mod prelude;
/// Annotation history replay with per-kind rules.
pub mod replay;
/// Bounded retry for bulk findings fetches.
pub mod retry;
/// The per-finding sync loop.
pub mod sync;
#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Config, ConfigError, RetryConfig};
pub use error::SyncError;
pub use matching::{
    Candidate, CandidatePool, DEFAULT_LINE_TOLERANCE, KeyLocation, MatchKey, MatchPolicy,
    WORK_DIR_MARKER, match_finding, normalize_file_path,
};
pub use replay::{COMMENT_MAX_CHARS, ReplayOutcome, ReplayRule, Replayer, prepare_comment, rule_for};
pub use retry::{Backoff, RetryPolicy, with_retry};
pub use sync::{AppContext, ConsumedSet, SyncOptions, Syncer, fetch_findings_with_retry};

/// Default filename for mitsync configuration.
pub const CONFIG_FILENAME: &str = "mitsync.toml";
