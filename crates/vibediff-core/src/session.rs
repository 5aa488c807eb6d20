//! Merge session state

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::align::{align, SideBySide};
use crate::change::Segment;
use crate::handoff::{Handoff, HandoffError};
use crate::hunk::{group, Hunk};
use crate::merge::{rebuild, rebuild_with, Choice, MergeError, Side};
use crate::partition::hunk_count;

/// Literal tokens that mark an unresolved conflict in merged text
pub const CONFLICT_MARKERS: [&str; 3] = ["<<<<<<<", "=======", ">>>>>>>"];

/// How a hunk decision interacts with earlier ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Every recorded selection is replayed on each decision
    #[default]
    Cumulative,
    /// Only the latest decision is applied; every other hunk reverts to right
    LatestOnly,
}

/// What a resolution action did, for the caller to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    HunkResolved { index: usize, choice: Choice },
    AcceptedAll(Side),
}

/// Working state of an interactive merge
#[derive(Debug, Clone)]
pub struct MergeSession {
    left_text: String,
    right_text: String,
    segments: Vec<Segment>,
    hunk_count: usize,
    mode: ResolutionMode,
    /// Current working text
    pub merged_text: String,
    /// Hunks explicitly resolved by the user; bookkeeping only
    pub accepted_hunks: BTreeSet<usize>,
    /// Recorded decision per hunk
    pub selections: BTreeMap<usize, Choice>,
}

impl MergeSession {
    pub fn new(
        left_text: impl Into<String>,
        right_text: impl Into<String>,
        segments: Vec<Segment>,
        mode: ResolutionMode,
    ) -> Self {
        let mut session = Self {
            left_text: left_text.into(),
            right_text: right_text.into(),
            hunk_count: hunk_count(&segments),
            segments,
            mode,
            merged_text: String::new(),
            accepted_hunks: BTreeSet::new(),
            selections: BTreeMap::new(),
        };
        session.merged_text = session.replay(&session.selections);
        session
    }

    /// Resume from a handoff payload, replaying its selections.
    ///
    /// A selection that does not name an existing hunk, or whose order is
    /// invalid, rejects the whole payload.
    pub fn from_handoff(handoff: Handoff, mode: ResolutionMode) -> Result<Self, HandoffError> {
        let mut session = Self::new(handoff.left, handoff.right, handoff.diff, mode);

        for (&index, choice) in &handoff.hunk_selections {
            if index >= session.hunk_count {
                return Err(HandoffError::InvalidSelection {
                    index,
                    reason: format!("only {} hunks", session.hunk_count),
                });
            }
            choice
                .validate()
                .map_err(|e| HandoffError::InvalidSelection {
                    index,
                    reason: e.to_string(),
                })?;
        }

        session.accepted_hunks = handoff.hunk_selections.keys().copied().collect();
        session.selections = handoff.hunk_selections;
        session.merged_text = session.replay(&session.selections);
        info!(
            hunks = session.hunk_count,
            restored = session.selections.len(),
            "merge session resumed"
        );
        Ok(session)
    }

    pub fn to_handoff(&self) -> Handoff {
        Handoff {
            left: self.left_text.clone(),
            right: self.right_text.clone(),
            diff: self.segments.clone(),
            hunk_selections: self.selections.clone(),
        }
    }

    pub fn left_text(&self) -> &str {
        &self.left_text
    }

    pub fn right_text(&self) -> &str {
        &self.right_text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn hunk_count(&self) -> usize {
        self.hunk_count
    }

    /// Number of hunks whose content is fixed by a recorded selection
    pub fn resolved_hunks(&self) -> usize {
        self.selections.len()
    }

    pub fn hunks(&self) -> Vec<Hunk> {
        group(&self.segments)
    }

    pub fn side_by_side(&self) -> SideBySide {
        align(&self.segments)
    }

    /// Whether the merged text still carries conflict markers
    pub fn has_conflicts(&self) -> bool {
        CONFLICT_MARKERS
            .iter()
            .any(|marker| self.merged_text.contains(marker))
    }

    /// Resolve one hunk and recompute the merged text
    pub fn accept(&mut self, index: usize, choice: Choice) -> Result<MergeOutcome, MergeError> {
        if index >= self.hunk_count {
            return Err(MergeError::HunkOutOfRange {
                index,
                count: self.hunk_count,
            });
        }
        choice.validate()?;

        // selections always reproduce merged_text when replayed on resume
        match self.mode {
            ResolutionMode::LatestOnly => {
                self.merged_text = rebuild(&self.segments, index, &choice);
                self.selections = BTreeMap::from([(index, choice.clone())]);
            }
            ResolutionMode::Cumulative => {
                self.selections.insert(index, choice.clone());
                self.merged_text = self.replay(&self.selections);
            }
        }
        self.accepted_hunks.insert(index);

        debug!(hunk = index, %choice, mode = ?self.mode, "hunk resolved");
        Ok(MergeOutcome::HunkResolved { index, choice })
    }

    pub fn accept_left(&mut self, index: usize) -> Result<MergeOutcome, MergeError> {
        self.accept(index, Choice::Left)
    }

    pub fn accept_right(&mut self, index: usize) -> Result<MergeOutcome, MergeError> {
        self.accept(index, Choice::Right)
    }

    pub fn accept_both(
        &mut self,
        index: usize,
        order: impl Into<Vec<Side>>,
    ) -> Result<MergeOutcome, MergeError> {
        self.accept(index, Choice::Both {
            order: order.into(),
        })
    }

    /// Replace the merged text with one whole side, ignoring hunks.
    ///
    /// Every hunk's selection is set to `side` so a resumed session rebuilds
    /// the same text; accepted hunks are left untouched.
    pub fn accept_all(&mut self, side: Side) -> MergeOutcome {
        self.merged_text = match side {
            Side::Left => self.left_text.clone(),
            Side::Right => self.right_text.clone(),
        };
        self.selections = (0..self.hunk_count)
            .map(|index| (index, Choice::from(side)))
            .collect();

        debug!(%side, "accepted whole side");
        MergeOutcome::AcceptedAll(side)
    }

    /// Replace the merged text with a manual edit
    pub fn edit(&mut self, text: impl Into<String>) {
        self.merged_text = text.into();
    }

    /// Rebuild the merged text from `selections`.
    ///
    /// An empty change sequence means one side was empty and nothing was
    /// compared, so the right-hand text is taken as is.
    fn replay(&self, selections: &BTreeMap<usize, Choice>) -> String {
        if self.segments.is_empty() {
            return self.right_text.clone();
        }
        rebuild_with(&self.segments, selections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;

    const LEFT: &str = "keep\nold1\nmid\nold2\nend\n";
    const RIGHT: &str = "keep\nnew1\nmid\nnew2\nend\n";

    fn session(mode: ResolutionMode) -> MergeSession {
        let result = DiffEngine::new().diff_strings(LEFT, RIGHT);
        MergeSession::new(LEFT, RIGHT, result.segments, mode)
    }

    #[test]
    fn test_starts_with_right_content() {
        let s = session(ResolutionMode::Cumulative);
        assert_eq!(s.merged_text, RIGHT);
        assert_eq!(s.hunk_count(), 2);
        assert!(s.accepted_hunks.is_empty());
        assert!(!s.has_conflicts());
    }

    #[test]
    fn test_cumulative_keeps_earlier_choices() {
        let mut s = session(ResolutionMode::Cumulative);
        s.accept_left(0).unwrap();
        s.accept_left(1).unwrap();

        assert_eq!(s.merged_text, LEFT);
        assert_eq!(s.accepted_hunks, BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_latest_only_reverts_other_hunks() {
        let mut s = session(ResolutionMode::LatestOnly);
        s.accept_left(0).unwrap();
        s.accept_left(1).unwrap();

        assert_eq!(s.merged_text, "keep\nnew1\nmid\nold2\nend\n");
        assert_eq!(s.accepted_hunks, BTreeSet::from([0, 1]));
        assert_eq!(s.selections, BTreeMap::from([(1, Choice::Left)]));
    }

    #[test]
    fn test_latest_only_resume_keeps_merged_text() {
        let mut s = session(ResolutionMode::LatestOnly);
        s.accept_left(0).unwrap();
        s.accept_left(1).unwrap();

        for mode in [ResolutionMode::Cumulative, ResolutionMode::LatestOnly] {
            let resumed = MergeSession::from_handoff(s.to_handoff(), mode).unwrap();
            assert_eq!(resumed.merged_text, s.merged_text);
            assert_eq!(resumed.resolved_hunks(), 1);
        }
    }

    #[test]
    fn test_empty_side_keeps_right_text() {
        let result = DiffEngine::new().diff_strings("", "abc\n");
        let s = MergeSession::new("", "abc\n", result.segments, ResolutionMode::Cumulative);
        assert_eq!(s.hunk_count(), 0);
        assert_eq!(s.merged_text, "abc\n");

        let resumed =
            MergeSession::from_handoff(s.to_handoff(), ResolutionMode::Cumulative).unwrap();
        assert_eq!(resumed.merged_text, "abc\n");

        let result = DiffEngine::new().diff_strings("abc\n", "");
        let mut s = MergeSession::new("abc\n", "", result.segments, ResolutionMode::Cumulative);
        assert_eq!(s.merged_text, "");
        s.accept_all(Side::Left);
        assert_eq!(s.merged_text, "abc\n");
    }

    #[test]
    fn test_accept_both_reports_outcome() {
        let mut s = session(ResolutionMode::Cumulative);
        let outcome = s.accept_both(1, [Side::Right, Side::Left]).unwrap();

        assert_eq!(s.merged_text, "keep\nnew1\nmid\nnew2\nold2\nend\n");
        assert!(matches!(outcome, MergeOutcome::HunkResolved { index: 1, .. }));
    }

    #[test]
    fn test_rejects_bad_requests() {
        let mut s = session(ResolutionMode::Cumulative);
        assert_eq!(
            s.accept_left(5),
            Err(MergeError::HunkOutOfRange { index: 5, count: 2 })
        );
        assert!(s.accept_both(0, [Side::Left, Side::Left]).is_err());
        assert!(s.accepted_hunks.is_empty());
        assert_eq!(s.merged_text, RIGHT);
    }

    #[test]
    fn test_accept_all_uses_whole_text() {
        let mut s = session(ResolutionMode::Cumulative);
        s.accept_left(1).unwrap();

        assert_eq!(s.accept_all(Side::Left), MergeOutcome::AcceptedAll(Side::Left));
        assert_eq!(s.merged_text, LEFT);
        assert_eq!(s.accepted_hunks, BTreeSet::from([1]));

        s.accept_all(Side::Right);
        assert_eq!(s.merged_text, RIGHT);
    }

    #[test]
    fn test_accept_all_resolves_every_hunk() {
        let mut s = session(ResolutionMode::Cumulative);
        assert_eq!(s.resolved_hunks(), 0);
        s.accept_all(Side::Left);
        assert_eq!(s.resolved_hunks(), s.hunk_count());

        let resumed =
            MergeSession::from_handoff(s.to_handoff(), ResolutionMode::Cumulative).unwrap();
        assert_eq!(resumed.resolved_hunks(), s.resolved_hunks());
        assert_eq!(resumed.merged_text, LEFT);
    }

    #[test]
    fn test_conflict_markers() {
        let mut s = session(ResolutionMode::Cumulative);
        for marker in CONFLICT_MARKERS {
            s.edit(format!("before\n{marker}\nafter\n"));
            assert!(s.has_conflicts());
        }
        s.edit("clean\n");
        assert!(!s.has_conflicts());
    }

    #[test]
    fn test_handoff_resume() {
        let mut s = session(ResolutionMode::Cumulative);
        s.accept_left(0).unwrap();
        s.accept_both(1, [Side::Left, Side::Right]).unwrap();

        let resumed =
            MergeSession::from_handoff(s.to_handoff(), ResolutionMode::Cumulative).unwrap();
        assert_eq!(resumed.merged_text, s.merged_text);
        assert_eq!(resumed.selections, s.selections);
        assert_eq!(resumed.accepted_hunks, s.accepted_hunks);
    }

    #[test]
    fn test_handoff_with_unknown_hunk_is_rejected() {
        let mut handoff = session(ResolutionMode::Cumulative).to_handoff();
        handoff.hunk_selections.insert(9, Choice::Left);

        let err = MergeSession::from_handoff(handoff, ResolutionMode::Cumulative).unwrap_err();
        assert!(matches!(err, HandoffError::InvalidSelection { index: 9, .. }));
    }
}
