//! Change representation for diff operations

use serde::{Deserialize, Serialize};

/// The kind of change a segment represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Content is unchanged (context)
    Equal,
    /// Content exists only in the left (original) text
    Removed,
    /// Content exists only in the right (modified) text
    Added,
}

/// One contiguous span of text produced by the line diff.
///
/// `text` may hold several lines joined by `\n`. The change sequence that
/// owns these segments is never mutated once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub kind: ChangeKind,
}

impl Segment {
    pub fn new(kind: ChangeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(ChangeKind::Equal, text)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(ChangeKind::Removed, text)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(ChangeKind::Added, text)
    }

    /// Check if this is an actual change (not just context)
    pub fn is_change(&self) -> bool {
        self.kind != ChangeKind::Equal
    }

    /// Physical lines of this segment
    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.text)
    }
}

/// Split text into lines.
///
/// The empty element left behind by a final line break is not a line and is
/// dropped; empty lines in the middle of the text are kept.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}
