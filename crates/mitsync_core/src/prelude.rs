//! Convenience re-exports of the most commonly used types.

pub use crate::config::{Config, ConfigError};
pub use crate::error::SyncError;
pub use crate::matching::{
    CandidatePool, MatchKey, MatchPolicy, match_finding, normalize_file_path,
};
pub use crate::replay::{ReplayOutcome, ReplayRule, Replayer, prepare_comment, rule_for};
pub use crate::retry::{Backoff, RetryPolicy};
pub use crate::sync::{AppContext, ConsumedSet, SyncOptions, Syncer};
pub use mitsync_api::{
    Annotation, AnnotationAction, Finding, FindingDetails, ResolutionStatus, ScanRemote, ScanType,
};
