//! Diff computation engine

use crate::align::{align, SideBySide};
use crate::change::{ChangeKind, Segment};
use crate::hunk::{group, Hunk};
use similar::{ChangeTag, TextDiff};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
}

/// Result of a diff operation
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// The change sequence, in order
    pub segments: Vec<Segment>,
    /// Number of added lines
    pub insertions: usize,
    /// Number of removed lines
    pub deletions: usize,
}

impl DiffResult {
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let count = |kind: ChangeKind| -> usize {
            segments
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| s.lines().len())
                .sum()
        };
        let insertions = count(ChangeKind::Added);
        let deletions = count(ChangeKind::Removed);
        Self {
            segments,
            insertions,
            deletions,
        }
    }

    /// Whether the two inputs differ at all
    pub fn has_diff(&self) -> bool {
        self.segments.iter().any(Segment::is_change)
    }

    pub fn hunks(&self) -> Vec<Hunk> {
        group(&self.segments)
    }

    pub fn side_by_side(&self) -> SideBySide {
        align(&self.segments)
    }
}

/// A diff for a pair of files
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub old_content: String,
    pub new_content: String,
    pub result: DiffResult,
}

/// The main diff engine
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    /// Upper bound on time spent in the diff algorithm
    timeout: Option<Duration>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Compute a line diff between two strings.
    ///
    /// Consecutive lines with the same tag are joined into one segment. When
    /// either side is empty there is nothing to compare and the result is
    /// empty.
    pub fn diff_strings(&self, old: &str, new: &str) -> DiffResult {
        if old.is_empty() || new.is_empty() {
            debug!("empty input, skipping diff");
            return DiffResult::default();
        }

        let mut config = TextDiff::configure();
        if let Some(timeout) = self.timeout {
            config.timeout(timeout);
        }
        let text_diff = config.diff_lines(old, new);

        let mut segments: Vec<Segment> = Vec::new();
        for change in text_diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => ChangeKind::Equal,
                ChangeTag::Delete => ChangeKind::Removed,
                ChangeTag::Insert => ChangeKind::Added,
            };
            match segments.last_mut() {
                Some(last) if last.kind == kind => last.text.push_str(change.value()),
                _ => segments.push(Segment::new(kind, change.value())),
            }
        }

        let result = DiffResult::from_segments(segments);
        debug!(
            segments = result.segments.len(),
            insertions = result.insertions,
            deletions = result.deletions,
            "diff computed"
        );
        result
    }

    /// Compute diff between two files
    pub fn diff_files(&self, old_path: &Path, new_path: &Path) -> Result<FileDiff, DiffError> {
        let old_content = std::fs::read_to_string(old_path)?;
        let new_content = std::fs::read_to_string(new_path)?;

        let result = self.diff_strings(&old_content, &new_content);

        Ok(FileDiff {
            old_path: old_path.to_string_lossy().to_string(),
            new_path: new_path.to_string_lossy().to_string(),
            old_content,
            new_content,
            result,
        })
    }
}
