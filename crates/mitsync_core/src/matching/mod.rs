//! Finding normalization and candidate matching.
//!
//! Two scan result sets never share finding ids, so findings are paired
//! by a per-scan-type fingerprint instead: CWE plus file, procedure and
//! line for static findings, CWE plus request path and parameter for
//! dynamic ones. Line numbers may optionally match within a small
//! tolerance window to survive code drift between scans.

mod key;
mod matcher;

pub use key::{KeyLocation, MatchKey, WORK_DIR_MARKER, normalize_file_path};
pub use matcher::{
    Candidate, CandidatePool, DEFAULT_LINE_TOLERANCE, MatchPolicy, match_finding,
};
