use mitsync_api::{Finding, ScanType};

use super::key::{KeyLocation, MatchKey};

/// Default width of the fuzzy line window, in lines.
///
/// Static findings whose line numbers drift by no more than this many
/// lines between scans are still considered the same flaw when fuzzy
/// matching is enabled.
pub const DEFAULT_LINE_TOLERANCE: u32 = 5;

/// Policy knobs controlling candidate matching.
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// Only match source findings that carry an approved mitigation.
    ///
    /// Unapproved sources have no reviewed decision to propagate.
    pub approved_only: bool,
    /// Accept close-but-unequal line numbers for static findings.
    pub allow_fuzzy: bool,
    /// Maximum line distance accepted by a fuzzy match.
    pub line_tolerance: u32,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            approved_only: true,
            allow_fuzzy: false,
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

/// One source finding prepared for matching.
#[derive(Debug)]
pub struct Candidate<'a> {
    key: MatchKey,
    approved: bool,
    finding: &'a Finding,
}

impl<'a> Candidate<'a> {
    /// The normalized matching key.
    #[must_use]
    pub fn key(&self) -> &MatchKey {
        &self.key
    }

    /// Whether the source finding carries an approved mitigation.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approved
    }

    /// The raw finding this candidate was derived from.
    #[must_use]
    pub const fn finding(&self) -> &'a Finding {
        self.finding
    }
}

/// The normalized source findings a destination set is matched against.
///
/// Built once per sync pass; pool order is fetch order, which the
/// matcher's tie-break depends on.
#[derive(Debug)]
pub struct CandidatePool<'a> {
    candidates: Vec<Candidate<'a>>,
    scan_type: ScanType,
}

impl<'a> CandidatePool<'a> {
    /// Normalizes `findings` into a matching pool for `scan_type`.
    #[must_use]
    pub fn new(findings: &'a [Finding], scan_type: ScanType) -> Self {
        let candidates = findings
            .iter()
            .map(|finding| Candidate {
                key: MatchKey::normalize(finding, scan_type),
                approved: finding.is_approved(),
                finding,
            })
            .collect();

        Self {
            candidates,
            scan_type,
        }
    }

    /// Scan type the pool was normalized for.
    #[must_use]
    pub const fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    /// Number of candidates in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the pool contains no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates with an approved mitigation.
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.approved).count()
    }
}

/// How closely a source candidate agrees with a destination key.
enum Agreement {
    Exact,
    Fuzzy,
    Different,
}

/// Finds the single source candidate matching a destination finding.
///
/// Returns the first candidate in pool order whose key fields agree
/// exactly; when fuzzy matching is enabled and no exact candidate
/// exists, the first candidate within the line tolerance window is
/// returned instead. `None` means there is no history to copy, which
/// is a normal outcome rather than an error.
///
/// The result is deterministic: the same destination and pool always
/// yield the same candidate.
#[must_use]
pub fn match_finding<'p, 'a>(
    destination: &Finding,
    pool: &'p CandidatePool<'a>,
    policy: &MatchPolicy,
) -> Option<&'p Candidate<'a>> {
    let target = MatchKey::normalize(destination, pool.scan_type);
    let mut fuzzy_match = None;

    for candidate in &pool.candidates {
        if policy.approved_only && !candidate.approved {
            continue;
        }
        match agreement(&target, &candidate.key, policy) {
            Agreement::Exact => return Some(candidate),
            Agreement::Fuzzy => {
                if fuzzy_match.is_none() {
                    fuzzy_match = Some(candidate);
                }
            }
            Agreement::Different => {}
        }
    }

    fuzzy_match
}

fn agreement(destination: &MatchKey, source: &MatchKey, policy: &MatchPolicy) -> Agreement {
    if destination.cwe != source.cwe {
        return Agreement::Different;
    }

    match (&destination.location, &source.location) {
        (
            KeyLocation::Static {
                source_file: dest_file,
                procedure: dest_procedure,
                line: dest_line,
                ..
            },
            KeyLocation::Static {
                source_file: src_file,
                procedure: src_procedure,
                line: src_line,
                ..
            },
        ) => {
            if dest_file != src_file {
                return Agreement::Different;
            }
            // Procedure participates only when both scans report one.
            if let (Some(dest), Some(src)) = (dest_procedure, src_procedure) {
                if dest != src {
                    return Agreement::Different;
                }
            }
            line_agreement(*dest_line, *src_line, policy)
        }
        (
            KeyLocation::Dynamic {
                path: dest_path,
                vulnerable_parameter: dest_parameter,
            },
            KeyLocation::Dynamic {
                path: src_path,
                vulnerable_parameter: src_parameter,
            },
        ) => {
            if dest_path == src_path && dest_parameter == src_parameter {
                Agreement::Exact
            } else {
                Agreement::Different
            }
        }
        _ => Agreement::Different,
    }
}

fn line_agreement(destination: Option<u32>, source: Option<u32>, policy: &MatchPolicy) -> Agreement {
    match (destination, source) {
        (Some(dest), Some(src)) if dest == src => Agreement::Exact,
        (Some(dest), Some(src))
            if policy.allow_fuzzy && dest.abs_diff(src) <= policy.line_tolerance =>
        {
            Agreement::Fuzzy
        }
        (None, None) => Agreement::Exact,
        _ => Agreement::Different,
    }
}
