//! Side-by-side alignment of a change sequence

use serde::{Deserialize, Serialize};

use crate::change::{ChangeKind, Segment};
use crate::partition::{partition, Token};

/// One rendered line on one side of the side-by-side view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRow {
    /// 1-based line number on this side, 0 for a placeholder
    pub line_number: usize,
    pub content: String,
    pub kind: ChangeKind,
    pub hunk_index: Option<usize>,
    /// First line of a removed/added segment
    pub is_first_in_hunk: bool,
}

impl AlignedRow {
    fn line(line_number: usize, content: &str, kind: ChangeKind) -> Self {
        Self {
            line_number,
            content: content.to_string(),
            kind,
            hunk_index: None,
            is_first_in_hunk: false,
        }
    }

    /// An empty row that only keeps both columns the same height
    pub fn placeholder() -> Self {
        Self::line(0, "", ChangeKind::Equal)
    }

    pub fn is_placeholder(&self) -> bool {
        self.line_number == 0
    }
}

/// Two row-aligned columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideBySide {
    pub left: Vec<AlignedRow>,
    pub right: Vec<AlignedRow>,
}

impl SideBySide {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Iterate rows pairwise
    pub fn rows(&self) -> impl Iterator<Item = (&AlignedRow, &AlignedRow)> {
        self.left.iter().zip(self.right.iter())
    }

    fn push_pair(&mut self, left: AlignedRow, right: AlignedRow) {
        self.left.push(left);
        self.right.push(right);
    }
}

/// Expand a change sequence into two parallel, line-numbered columns.
///
/// Every row pushed to one column is matched by a row on the other, either a
/// real line or a placeholder, so both columns always have the same length.
pub fn align(segments: &[Segment]) -> SideBySide {
    let mut view = SideBySide::default();
    let mut left_num = 1;
    let mut right_num = 1;

    for token in partition(segments) {
        match token {
            Token::Equal(segment) => {
                for line in segment.lines() {
                    view.push_pair(
                        AlignedRow::line(left_num, line, ChangeKind::Equal),
                        AlignedRow::line(right_num, line, ChangeKind::Equal),
                    );
                    left_num += 1;
                    right_num += 1;
                }
            }
            Token::Hunk { index, segments } => {
                for segment in segments {
                    for (line_idx, line) in segment.lines().into_iter().enumerate() {
                        let mut row = AlignedRow::line(0, line, segment.kind);
                        row.hunk_index = Some(index);
                        row.is_first_in_hunk = line_idx == 0;

                        if segment.kind == ChangeKind::Removed {
                            row.line_number = left_num;
                            left_num += 1;
                            view.push_pair(row, AlignedRow::placeholder());
                        } else {
                            row.line_number = right_num;
                            right_num += 1;
                            view.push_pair(AlignedRow::placeholder(), row);
                        }
                    }
                }
            }
        }
    }

    view
}
