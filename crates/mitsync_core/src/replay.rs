//! Annotation history replay.
//!
//! Once a destination finding has been matched to a source finding, the
//! source's mitigation history is reapplied to the destination through
//! the annotations endpoint, oldest action first, so the comment trail
//! reads in its original order. Not every action kind can be replayed;
//! the policy table in [`rule_for`] decides per kind.

use mitsync_api::{Annotation, AnnotationAction, ScanRemote};
use tracing::{debug, info, warn};

use crate::sync::AppContext;

/// Upper bound the annotations endpoint accepts for a comment, in
/// characters.
pub const COMMENT_MAX_CHARS: usize = 2048;

/// What the replayer does with one annotation action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayRule {
    /// Posted to the destination unchanged.
    Copy,
    /// Posted as `ACCEPTED`, unless the run is propose-only.
    CopyAsAccepted,
    /// Never copied: a scanner policy judgement, not a reviewer
    /// decision.
    SkipPolicyJudgement,
    /// Never copied: depends on custom cleanser metadata that is not
    /// available for replay.
    SkipCustomCleanser,
    /// Never copied: an unrecognized wire value has no faithful replay.
    SkipUnknown,
}

impl ReplayRule {
    /// Whether this rule results in a post to the destination.
    #[must_use]
    pub const fn is_copied(self) -> bool {
        matches!(self, Self::Copy | Self::CopyAsAccepted)
    }
}

/// The per-kind replay policy table.
#[must_use]
pub const fn rule_for(action: AnnotationAction) -> ReplayRule {
    match action {
        AnnotationAction::Comment
        | AnnotationAction::FalsePositive
        | AnnotationAction::AppDesign
        | AnnotationAction::OsEnv
        | AnnotationAction::NetEnv
        | AnnotationAction::Library
        | AnnotationAction::AcceptRisk
        | AnnotationAction::Accepted
        | AnnotationAction::Rejected => ReplayRule::Copy,
        AnnotationAction::Approved => ReplayRule::CopyAsAccepted,
        AnnotationAction::Conforms | AnnotationAction::Deviates => ReplayRule::SkipPolicyJudgement,
        AnnotationAction::CustomCleanserProposed | AnnotationAction::CustomCleanserUserComment => {
            ReplayRule::SkipCustomCleanser
        }
        AnnotationAction::Unknown => ReplayRule::SkipUnknown,
    }
}

/// Prefixes a copied comment with its source application and truncates
/// it to the endpoint's limit.
#[must_use]
pub fn prepare_comment(source_app_guid: &str, comment: &str) -> String {
    let full = format!("(COPIED FROM APP {source_app_guid}) {comment}");
    if full.chars().count() > COMMENT_MAX_CHARS {
        full.chars().take(COMMENT_MAX_CHARS).collect()
    } else {
        full
    }
}

/// Counts from replaying one finding's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Annotations posted, or that would post in a dry run.
    pub applied: u32,
    /// Annotations the policy table refused to copy.
    pub skipped: u32,
    /// Annotations whose post failed and was logged.
    pub failed: u32,
}

/// Replays annotation histories onto destination findings.
#[derive(Debug)]
pub struct Replayer<'a, R> {
    remote: &'a R,
    dry_run: bool,
    propose_only: bool,
}

impl<'a, R: ScanRemote> Replayer<'a, R> {
    /// Creates a replayer that posts through `remote`.
    pub const fn new(remote: &'a R) -> Self {
        Self {
            remote,
            dry_run: false,
            propose_only: false,
        }
    }

    /// Logs intended posts without calling the remote.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Leaves copied mitigations as proposals: approval actions are
    /// not replayed.
    #[must_use]
    pub const fn propose_only(mut self, propose_only: bool) -> Self {
        self.propose_only = propose_only;
        self
    }

    /// Replays `history` onto the destination finding, oldest action
    /// first.
    ///
    /// `history` is expected in the order the findings API returns it,
    /// most recent first. Each post is independent: a failed post is
    /// logged and replay continues with the next annotation.
    pub async fn replay(
        &self,
        to: &AppContext,
        issue_id: u32,
        history: &[Annotation],
        source_app_guid: &str,
    ) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();

        for annotation in history.iter().rev() {
            let action = annotation.action;
            let post_action = match rule_for(action) {
                ReplayRule::SkipPolicyJudgement => {
                    info!(issue_id, %action, "policy judgement is not copied, skipping");
                    outcome.skipped += 1;
                    continue;
                }
                ReplayRule::SkipCustomCleanser => {
                    info!(issue_id, %action, "custom cleanser action is not copied, skipping");
                    outcome.skipped += 1;
                    continue;
                }
                ReplayRule::SkipUnknown => {
                    warn!(issue_id, "unrecognized action kind, skipping");
                    outcome.skipped += 1;
                    continue;
                }
                ReplayRule::CopyAsAccepted if self.propose_only => {
                    info!(issue_id, %action, "approval withheld in propose-only run");
                    outcome.skipped += 1;
                    continue;
                }
                ReplayRule::CopyAsAccepted => AnnotationAction::Accepted,
                ReplayRule::Copy => action,
            };

            if self.dry_run {
                info!(
                    issue_id,
                    to = %to.describe(),
                    action = %post_action,
                    "dry run, would apply annotation"
                );
                outcome.applied += 1;
                continue;
            }

            let comment = prepare_comment(source_app_guid, &annotation.comment);
            match self
                .remote
                .post_annotation(
                    &to.guid,
                    &[issue_id],
                    &comment,
                    post_action,
                    to.sandbox_guid.as_deref(),
                )
                .await
            {
                Ok(()) => {
                    debug!(issue_id, action = %post_action, "annotation applied");
                    outcome.applied += 1;
                }
                Err(error) => {
                    warn!(
                        issue_id,
                        to = %to.describe(),
                        action = %post_action,
                        error = %error,
                        "failed to apply annotation, continuing"
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRemote, annotation};

    fn history() -> Vec<Annotation> {
        // As fetched: most recent first.
        vec![
            annotation(AnnotationAction::Approved, "fine"),
            annotation(AnnotationAction::Conforms, "scanner verdict"),
            annotation(AnnotationAction::Comment, "initial"),
        ]
    }

    #[tokio::test]
    async fn replay_posts_oldest_first_and_counts_each_rule() {
        let remote = MockRemote::default();
        let to = AppContext::application("to-guid");

        let outcome = Replayer::new(&remote)
            .replay(&to, 42, &history(), "from-guid")
            .await;

        assert_eq!(
            outcome,
            ReplayOutcome {
                applied: 2,
                skipped: 1,
                failed: 0,
            }
        );
        let posts = remote.posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].action, AnnotationAction::Comment);
        assert_eq!(posts[0].comment, "(COPIED FROM APP from-guid) initial");
        assert_eq!(posts[1].action, AnnotationAction::Accepted);
        assert_eq!(posts[1].comment, "(COPIED FROM APP from-guid) fine");
    }

    #[tokio::test]
    async fn failed_posts_are_counted_and_do_not_stop_replay() {
        let remote = MockRemote::default().failing_posts(1);
        let to = AppContext::application("to-guid");

        let outcome = Replayer::new(&remote)
            .replay(&to, 42, &history(), "from-guid")
            .await;

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.applied, 1);
        assert_eq!(remote.post_attempts(), 2);
    }

    #[tokio::test]
    async fn dry_run_counts_intended_posts_without_calling_remote() {
        let remote = MockRemote::default();
        let to = AppContext::application("to-guid");

        let outcome = Replayer::new(&remote)
            .dry_run(true)
            .replay(&to, 42, &history(), "from-guid")
            .await;

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(remote.post_attempts(), 0);
    }

    #[tokio::test]
    async fn propose_only_skips_the_approval_entry() {
        let remote = MockRemote::default();
        let to = AppContext::application("to-guid");

        let outcome = Replayer::new(&remote)
            .propose_only(true)
            .replay(&to, 42, &history(), "from-guid")
            .await;

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 2);
        let posts = remote.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].action, AnnotationAction::Comment);
    }

    #[test]
    fn approvals_translate_to_accepted() {
        assert_eq!(
            rule_for(AnnotationAction::Approved),
            ReplayRule::CopyAsAccepted
        );
    }

    #[test]
    fn policy_judgements_are_never_copied() {
        assert_eq!(
            rule_for(AnnotationAction::Conforms),
            ReplayRule::SkipPolicyJudgement
        );
        assert_eq!(
            rule_for(AnnotationAction::Deviates),
            ReplayRule::SkipPolicyJudgement
        );
        assert!(!rule_for(AnnotationAction::Conforms).is_copied());
    }

    #[test]
    fn custom_cleanser_actions_are_never_copied() {
        assert_eq!(
            rule_for(AnnotationAction::CustomCleanserProposed),
            ReplayRule::SkipCustomCleanser
        );
        assert_eq!(
            rule_for(AnnotationAction::CustomCleanserUserComment),
            ReplayRule::SkipCustomCleanser
        );
    }

    #[test]
    fn ordinary_actions_copy_unchanged() {
        for action in [
            AnnotationAction::Comment,
            AnnotationAction::FalsePositive,
            AnnotationAction::AppDesign,
            AnnotationAction::OsEnv,
            AnnotationAction::NetEnv,
            AnnotationAction::Library,
            AnnotationAction::AcceptRisk,
            AnnotationAction::Accepted,
            AnnotationAction::Rejected,
        ] {
            assert_eq!(rule_for(action), ReplayRule::Copy);
        }
    }

    #[test]
    fn unknown_actions_are_skipped() {
        assert_eq!(rule_for(AnnotationAction::Unknown), ReplayRule::SkipUnknown);
    }

    #[test]
    fn comment_gains_provenance_prefix() {
        let comment = prepare_comment("abcd-1234", "mitigated by design");
        assert_eq!(comment, "(COPIED FROM APP abcd-1234) mitigated by design");
    }

    #[test]
    fn long_comment_truncates_to_the_endpoint_limit() {
        let long = "x".repeat(3000);
        let comment = prepare_comment("abcd-1234", &long);
        assert_eq!(comment.chars().count(), COMMENT_MAX_CHARS);
        assert!(comment.starts_with("(COPIED FROM APP abcd-1234) "));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "\u{00e9}".repeat(3000);
        let comment = prepare_comment("a", &long);
        assert_eq!(comment.chars().count(), COMMENT_MAX_CHARS);
    }

    #[test]
    fn short_comment_is_not_padded_or_cut() {
        let comment = prepare_comment("a", "ok");
        assert_eq!(comment, "(COPIED FROM APP a) ok");
    }
}
