//! Merge reconstruction from per-hunk choices

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::change::{ChangeKind, Segment};
use crate::hunk::text_of;
use crate::partition::{partition, Token};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("hunk {index} out of range ({count} hunks)")]
    HunkOutOfRange { index: usize, count: usize },
    #[error("invalid order for 'both': {0}")]
    InvalidOrder(String),
}

/// One side of the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The original text
    Left,
    /// The modified text
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// How a single hunk is resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "lowercase")]
pub enum Choice {
    Left,
    #[default]
    Right,
    /// Keep both sides, concatenated in `order`
    Both { order: Vec<Side> },
}

impl Choice {
    pub fn both(order: impl Into<Vec<Side>>) -> Result<Self, MergeError> {
        let choice = Self::Both {
            order: order.into(),
        };
        choice.validate()?;
        Ok(choice)
    }

    /// Each side may appear at most once, and `both` needs at least one side.
    pub fn validate(&self) -> Result<(), MergeError> {
        if let Self::Both { order } = self {
            if order.is_empty() {
                return Err(MergeError::InvalidOrder("order is empty".into()));
            }
            let mut seen = Vec::with_capacity(2);
            for side in order {
                if seen.contains(side) {
                    return Err(MergeError::InvalidOrder(format!(
                        "'{side}' appears more than once"
                    )));
                }
                seen.push(*side);
            }
        }
        Ok(())
    }
}

impl From<Side> for Choice {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Self::Left,
            Side::Right => Self::Right,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Both { order } => {
                let order: Vec<String> = order.iter().map(Side::to_string).collect();
                write!(f, "both ({})", order.join(" then "))
            }
        }
    }
}

/// Rebuild the merged text with `choice` applied to hunk `target`.
///
/// Every other hunk falls back to its right-hand content. The result only
/// depends on the arguments, so repeated calls give identical output.
pub fn rebuild(segments: &[Segment], target: usize, choice: &Choice) -> String {
    replay(segments, |index| {
        if index == target {
            choice
        } else {
            &DEFAULT_CHOICE
        }
    })
}

/// Rebuild the merged text with a choice per hunk; hunks missing from
/// `selections` take their right-hand content.
pub fn rebuild_with(segments: &[Segment], selections: &BTreeMap<usize, Choice>) -> String {
    replay(segments, |index| {
        selections.get(&index).unwrap_or(&DEFAULT_CHOICE)
    })
}

static DEFAULT_CHOICE: Choice = Choice::Right;

fn replay<'c>(segments: &[Segment], choice_for: impl Fn(usize) -> &'c Choice) -> String {
    let mut merged = String::new();

    for token in partition(segments) {
        match token {
            Token::Equal(segment) => merged.push_str(&segment.text),
            Token::Hunk { index, segments } => match choice_for(index) {
                Choice::Left => merged.push_str(&text_of(segments, ChangeKind::Removed)),
                Choice::Right => merged.push_str(&text_of(segments, ChangeKind::Added)),
                Choice::Both { order } => {
                    for side in order {
                        let kind = match side {
                            Side::Left => ChangeKind::Removed,
                            Side::Right => ChangeKind::Added,
                        };
                        merged.push_str(&text_of(segments, kind));
                    }
                }
            },
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<Segment> {
        vec![
            Segment::equal("a\n"),
            Segment::removed("b\n"),
            Segment::added("x\n"),
            Segment::equal("c"),
        ]
    }

    fn two_hunks() -> Vec<Segment> {
        vec![
            Segment::equal("keep\n"),
            Segment::removed("old1\n"),
            Segment::added("new1\n"),
            Segment::equal("mid\n"),
            Segment::removed("old2\n"),
            Segment::added("new2\n"),
        ]
    }

    #[test]
    fn test_rebuild_right_and_left() {
        let segments = abc();
        assert_eq!(rebuild(&segments, 0, &Choice::Right), "a\nx\nc");
        assert_eq!(rebuild(&segments, 0, &Choice::Left), "a\nb\nc");
    }

    #[test]
    fn test_rebuild_both_in_order() {
        let segments = abc();
        let left_first = Choice::both([Side::Left, Side::Right]).unwrap();
        let right_first = Choice::both([Side::Right, Side::Left]).unwrap();

        assert_eq!(rebuild(&segments, 0, &left_first), "a\nb\nx\nc");
        assert_eq!(rebuild(&segments, 0, &right_first), "a\nx\nb\nc");
    }

    #[test]
    fn test_both_with_one_side() {
        let only_left = Choice::both([Side::Left]).unwrap();
        assert_eq!(rebuild(&abc(), 0, &only_left), "a\nb\nc");
    }

    #[test]
    fn test_other_hunks_default_to_right() {
        let segments = two_hunks();
        assert_eq!(
            rebuild(&segments, 1, &Choice::Left),
            "keep\nnew1\nmid\nold2\n"
        );
        assert_eq!(
            rebuild(&segments, 0, &Choice::Left),
            "keep\nold1\nmid\nnew2\n"
        );
    }

    #[test]
    fn test_unknown_target_yields_all_right() {
        let segments = two_hunks();
        assert_eq!(
            rebuild(&segments, 7, &Choice::Left),
            "keep\nnew1\nmid\nnew2\n"
        );
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let segments = two_hunks();
        let choice = Choice::both([Side::Right, Side::Left]).unwrap();
        let first = rebuild(&segments, 1, &choice);
        for _ in 0..3 {
            assert_eq!(rebuild(&segments, 1, &choice), first);
        }
        assert_eq!(segments, two_hunks());
    }

    #[test]
    fn test_rebuild_with_accumulates() {
        let segments = two_hunks();
        let mut selections = BTreeMap::new();
        selections.insert(0, Choice::Left);
        selections.insert(1, Choice::both([Side::Left, Side::Right]).unwrap());

        assert_eq!(
            rebuild_with(&segments, &selections),
            "keep\nold1\nmid\nold2\nnew2\n"
        );
        assert_eq!(
            rebuild_with(&segments, &BTreeMap::new()),
            "keep\nnew1\nmid\nnew2\n"
        );
    }

    #[test]
    fn test_rebuild_matches_single_selection() {
        let segments = two_hunks();
        let selections = BTreeMap::from([(1, Choice::Left)]);
        assert_eq!(
            rebuild_with(&segments, &selections),
            rebuild(&segments, 1, &Choice::Left)
        );
    }

    #[test]
    fn test_pure_insert_and_delete_hunks() {
        let segments = vec![
            Segment::equal("a\n"),
            Segment::added("inserted\n"),
            Segment::equal("b\n"),
            Segment::removed("deleted\n"),
        ];
        let all_left = BTreeMap::from([(0, Choice::Left), (1, Choice::Left)]);

        assert_eq!(rebuild_with(&segments, &all_left), "a\nb\ndeleted\n");
        assert_eq!(rebuild_with(&segments, &BTreeMap::new()), "a\ninserted\nb\n");
    }

    #[test]
    fn test_choice_validation() {
        assert!(Choice::both([Side::Left, Side::Left]).is_err());
        assert!(Choice::both(Vec::new()).is_err());
        assert!(Choice::both([Side::Left, Side::Right, Side::Left]).is_err());
        assert!(Choice::Left.validate().is_ok());
    }

    #[test]
    fn test_choice_serde_shape() {
        let choice = Choice::both([Side::Right, Side::Left]).unwrap();
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, r#"{"choice":"both","order":["right","left"]}"#);
        assert_eq!(
            serde_json::to_string(&Choice::Left).unwrap(),
            r#"{"choice":"left"}"#
        );
    }
}
