//! Run detection over a change sequence.
//!
//! Every consumer that needs hunk numbering (grouping, alignment, merge
//! reconstruction) goes through [`partition`], so they can never disagree on
//! which segments form hunk `n`.

use crate::change::Segment;

/// A piece of a partitioned change sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A single unchanged segment
    Equal(&'a Segment),
    /// A maximal run of contiguous removed/added segments
    Hunk {
        index: usize,
        segments: &'a [Segment],
    },
}

impl<'a> Token<'a> {
    pub fn hunk_index(&self) -> Option<usize> {
        match self {
            Token::Equal(_) => None,
            Token::Hunk { index, .. } => Some(*index),
        }
    }
}

/// Partition a change sequence into equal spans and indexed hunks.
///
/// A hunk opens at the first non-equal segment after an equal one (or at the
/// start), and closes at the next equal segment or at the end of input. Hunks
/// are numbered from 0 in order of appearance.
pub fn partition(segments: &[Segment]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut next_index = 0;

    for (pos, segment) in segments.iter().enumerate() {
        if segment.is_change() {
            if run_start.is_none() {
                run_start = Some(pos);
            }
            continue;
        }

        if let Some(start) = run_start.take() {
            tokens.push(Token::Hunk {
                index: next_index,
                segments: &segments[start..pos],
            });
            next_index += 1;
        }
        tokens.push(Token::Equal(segment));
    }

    // A diff that ends mid-change still owns its last hunk
    if let Some(start) = run_start {
        tokens.push(Token::Hunk {
            index: next_index,
            segments: &segments[start..],
        });
    }

    tokens
}

/// Number of hunks in a change sequence
pub fn hunk_count(segments: &[Segment]) -> usize {
    partition(segments)
        .iter()
        .filter(|t| matches!(t, Token::Hunk { .. }))
        .count()
}
