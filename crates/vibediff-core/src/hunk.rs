//! Hunk grouping

use serde::{Deserialize, Serialize};

use crate::change::{split_lines, ChangeKind, Segment};
use crate::partition::{partition, Token};

/// A maximal run of contiguous removed/added segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Sequential index, starting at 0
    pub index: usize,
    /// Segments of the run, in order (never equal segments)
    pub segments: Vec<Segment>,
    /// Lines taken from the removed segments
    pub left_lines: Vec<String>,
    /// Lines taken from the added segments
    pub right_lines: Vec<String>,
}

impl Hunk {
    fn from_run(index: usize, segments: &[Segment]) -> Self {
        Self {
            index,
            segments: segments.to_vec(),
            left_lines: lines_of(segments, ChangeKind::Removed),
            right_lines: lines_of(segments, ChangeKind::Added),
        }
    }

    /// Full removed text of the hunk, as it appears in the left input
    pub fn removed_text(&self) -> String {
        text_of(&self.segments, ChangeKind::Removed)
    }

    /// Full added text of the hunk, as it appears in the right input
    pub fn added_text(&self) -> String {
        text_of(&self.segments, ChangeKind::Added)
    }

    /// A hunk with both removed and added content
    pub fn is_replace(&self) -> bool {
        !self.left_lines.is_empty() && !self.right_lines.is_empty()
    }
}

/// Group a change sequence into indexed hunks
pub fn group(segments: &[Segment]) -> Vec<Hunk> {
    partition(segments)
        .into_iter()
        .filter_map(|token| match token {
            Token::Hunk { index, segments } => Some(Hunk::from_run(index, segments)),
            Token::Equal(_) => None,
        })
        .collect()
}

pub(crate) fn text_of(segments: &[Segment], kind: ChangeKind) -> String {
    segments
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| s.text.as_str())
        .collect()
}

fn lines_of(segments: &[Segment], kind: ChangeKind) -> Vec<String> {
    segments
        .iter()
        .filter(|s| s.kind == kind)
        .flat_map(|s| split_lines(&s.text))
        .map(str::to_string)
        .collect()
}
