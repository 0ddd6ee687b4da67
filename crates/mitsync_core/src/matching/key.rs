use mitsync_api::{Finding, ScanType};

/// CI work-directory marker stripped from static file paths.
///
/// Build agents check sources out under a per-build directory whose name
/// is a random hash, so the same file is reported under a different
/// absolute prefix on every scan. Paths containing this marker are cut
/// down to the tail after the hash segment before comparison.
pub const WORK_DIR_MARKER: &str = "teamcity/buildagent/work/";

/// Length of the random directory segment that follows the marker.
const WORK_DIR_HASH_LEN: usize = 16;

/// Canonicalizes a source file path for matching.
///
/// Strips everything up to and including the CI work-directory marker
/// and its random hash segment, keeping only the repository-relative
/// tail. Paths without the marker pass through unchanged; an absent
/// path normalizes to an empty string.
#[must_use]
pub fn normalize_file_path(path: Option<&str>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    match path.find(WORK_DIR_MARKER) {
        Some(start) => {
            let tail = start + WORK_DIR_MARKER.len() + WORK_DIR_HASH_LEN + 1;
            path.get(tail..).unwrap_or_default().to_string()
        }
        None => path.to_string(),
    }
}

/// Compact projection of one finding used for equality and fuzzy
/// comparison.
///
/// Keys exist only transiently during matching; they are derived from a
/// [`Finding`] and never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    /// Identity of the finding the key was derived from.
    pub issue_id: u32,
    /// Numeric CWE id, `0` when the platform omitted the block.
    pub cwe: u32,
    /// Scan-type-specific location fields.
    pub location: KeyLocation,
}

/// Location fields that participate in key comparison, split by scan
/// type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLocation {
    /// Static-analysis flaw location.
    Static {
        /// Normalized source file path, empty when unreported.
        source_file: String,
        /// Procedure containing the flaw, compared only when both
        /// sides report one.
        procedure: Option<String>,
        /// Offset of the flaw relative to its procedure.
        relative_location: Option<i32>,
        /// Line number within the source file.
        line: Option<u32>,
    },
    /// Dynamic-analysis attack location.
    Dynamic {
        /// Request path of the attacked URL.
        path: String,
        /// Vulnerable request parameter, empty when the finding does
        /// not involve one.
        vulnerable_parameter: String,
    },
}

impl MatchKey {
    /// Projects a raw finding into its matching key for `scan_type`.
    ///
    /// Missing optional fields normalize to absent or empty values;
    /// this never fails.
    #[must_use]
    pub fn normalize(finding: &Finding, scan_type: ScanType) -> Self {
        let details = &finding.finding_details;
        let cwe = details.cwe.as_ref().map_or(0, |cwe| cwe.id);
        let location = match scan_type {
            ScanType::Static => KeyLocation::Static {
                source_file: normalize_file_path(details.file_path.as_deref()),
                procedure: details.procedure.clone(),
                relative_location: details.relative_location,
                line: details.file_line_number,
            },
            ScanType::Dynamic => KeyLocation::Dynamic {
                path: details.path.clone().unwrap_or_default(),
                vulnerable_parameter: details.vulnerable_parameter.clone().unwrap_or_default(),
            },
        };

        Self {
            issue_id: finding.issue_id,
            cwe,
            location,
        }
    }
}
