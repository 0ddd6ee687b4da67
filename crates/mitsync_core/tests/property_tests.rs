//! Property-based tests for `mitsync_core`.
//!
//! These tests verify invariants that should hold for all inputs,
//! catching edge cases that hand-written tests might miss.

use mitsync_api::{Cwe, FindingStatus};
use mitsync_core::prelude::*;
use mitsync_core::{COMMENT_MAX_CHARS, WORK_DIR_MARKER};
use proptest::prelude::*;

fn static_finding(issue_id: u32, cwe: u32, file: &str, line: u32, approved: bool) -> Finding {
    let mut status = FindingStatus::default();
    if approved {
        status.resolution_status = ResolutionStatus::Approved;
    }
    Finding {
        issue_id,
        context_guid: None,
        violates_policy: true,
        finding_status: status,
        finding_details: FindingDetails {
            cwe: Some(Cwe { id: cwe, name: None }),
            file_path: Some(file.to_string()),
            file_line_number: Some(line),
            ..Default::default()
        },
        annotations: Vec::new(),
    }
}

proptest! {
    /// Path normalization never panics and never grows the path.
    #[test]
    fn normalization_never_grows_the_path(path in ".*") {
        let normalized = normalize_file_path(Some(&path));
        prop_assert!(normalized.len() <= path.len());
    }

    /// Paths without the CI marker pass through unchanged.
    #[test]
    fn paths_without_marker_are_unchanged(path in "[a-zA-Z0-9_./-]{0,80}") {
        prop_assume!(!path.contains(WORK_DIR_MARKER));
        prop_assert_eq!(normalize_file_path(Some(&path)), path);
    }

    /// Marker paths always reduce to the tail after the hash segment.
    #[test]
    fn marker_paths_reduce_to_the_tail(
        prefix in "[a-zA-Z0-9_.-]{0,20}",
        hash in "[a-f0-9]{16}",
        tail in "[a-zA-Z0-9_./-]{0,40}",
    ) {
        let path = format!("{prefix}teamcity/buildagent/work/{hash}/{tail}");
        prop_assert_eq!(normalize_file_path(Some(&path)), tail);
    }

    /// Prepared comments never exceed the endpoint limit and always
    /// keep their provenance prefix.
    #[test]
    fn prepared_comments_respect_the_limit(
        guid in "[a-f0-9-]{1,36}",
        comment in ".{0,4000}",
    ) {
        let prepared = prepare_comment(&guid, &comment);
        let expected_prefix = format!("(COPIED FROM APP {guid}) ");
        prop_assert!(prepared.chars().count() <= COMMENT_MAX_CHARS);
        prop_assert!(prepared.starts_with(&expected_prefix));
    }

    /// The matcher is deterministic and only ever returns approved
    /// sources with the destination's CWE.
    #[test]
    fn matcher_is_deterministic_and_approved_only(
        pool_spec in prop::collection::vec(
            (
                1u32..100,
                prop::sample::select(vec![79u32, 89, 117]),
                prop::sample::select(vec!["a.java", "b.java"]),
                0u32..30,
                any::<bool>(),
            ),
            0..12,
        ),
        dest_cwe in prop::sample::select(vec![79u32, 89, 117]),
        dest_file in prop::sample::select(vec!["a.java", "b.java"]),
        dest_line in 0u32..30,
        allow_fuzzy in any::<bool>(),
    ) {
        let source: Vec<Finding> = pool_spec
            .iter()
            .map(|(id, cwe, file, line, approved)| {
                static_finding(*id, *cwe, file, *line, *approved)
            })
            .collect();
        let pool = CandidatePool::new(&source, ScanType::Static);
        let destination = static_finding(999, dest_cwe, dest_file, dest_line, false);
        let policy = MatchPolicy {
            approved_only: true,
            allow_fuzzy,
            line_tolerance: 5,
        };

        let first = match_finding(&destination, &pool, &policy).map(|c| c.key().issue_id);
        let second = match_finding(&destination, &pool, &policy).map(|c| c.key().issue_id);
        prop_assert_eq!(first, second);

        if let Some(candidate) = match_finding(&destination, &pool, &policy) {
            prop_assert!(candidate.is_approved());
            prop_assert_eq!(candidate.key().cwe, dest_cwe);
        }
    }

    /// Fuzzy matching accepts line drift exactly up to the tolerance.
    #[test]
    fn fuzzy_window_is_inclusive(
        base in 100u32..200,
        drift in 0u32..20,
        tolerance in 0u32..10,
    ) {
        let source = vec![static_finding(1, 79, "x.java", base, true)];
        let pool = CandidatePool::new(&source, ScanType::Static);
        let destination = static_finding(2, 79, "x.java", base + drift, false);
        let policy = MatchPolicy {
            approved_only: true,
            allow_fuzzy: true,
            line_tolerance: tolerance,
        };

        let matched = match_finding(&destination, &pool, &policy).is_some();
        prop_assert_eq!(matched, drift <= tolerance);
    }

    /// A consumed set reports exactly the distinct ids inserted into it.
    #[test]
    fn consumed_set_tracks_inserted_ids(ids in prop::collection::vec(0u32..1000, 0..50)) {
        let mut consumed = ConsumedSet::new();
        for id in &ids {
            consumed.insert(*id);
        }

        let distinct: std::collections::HashSet<u32> = ids.iter().copied().collect();
        prop_assert_eq!(consumed.len(), distinct.len());
        for id in distinct {
            prop_assert!(consumed.contains(id));
        }
    }
}
