//! Persistence for named diffs.
//!
//! All saved diffs live in one JSON array on disk. Every mutation reads the
//! current list, rebuilds it in memory and only then replaces the file, via a
//! temporary file in the same directory, so a failed write never leaves a
//! partial store behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::change::Segment;
use crate::handoff::Handoff;
use crate::merge::Choice;
use crate::session::MergeSession;

/// Characters of merged text shown in a listing preview
pub const PREVIEW_CHARS: usize = 80;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store data could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("saved diff not found: {0}")]
    NotFound(String),
    #[error("saved diff name must not be empty")]
    EmptyName,
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A named, persisted diff together with its merge progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDiff {
    /// Unique key
    pub name: String,
    /// Milliseconds since the Unix epoch of the last save
    pub timestamp: i64,
    pub left_text: String,
    pub right_text: String,
    pub merged_text: String,
    pub diff_result: Vec<Segment>,
    #[serde(default)]
    pub hunk_selections: BTreeMap<usize, Choice>,
}

impl SavedDiff {
    /// Snapshot a session under `name`, stamped with the current time.
    ///
    /// `DiffStore::save` restamps it so saves stay strictly ordered.
    pub fn from_session(name: impl Into<String>, session: &MergeSession) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now().timestamp_millis(),
            left_text: session.left_text().to_string(),
            right_text: session.right_text().to_string(),
            merged_text: session.merged_text.clone(),
            diff_result: session.segments().to_vec(),
            hunk_selections: session.selections.clone(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn to_handoff(&self) -> Handoff {
        Handoff {
            left: self.left_text.clone(),
            right: self.right_text.clone(),
            diff: self.diff_result.clone(),
            hunk_selections: self.hunk_selections.clone(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.merged_text.to_lowercase().contains(query)
    }
}

/// JSON file backed store of saved diffs, keyed by name
#[derive(Debug, Clone)]
pub struct DiffStore {
    path: PathBuf,
}

impl DiffStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved diffs, newest first. A missing store file is an empty store.
    pub fn list(&self) -> Result<Vec<SavedDiff>, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut diffs: Vec<SavedDiff> = serde_json::from_str(&data)?;
        diffs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(count = diffs.len(), path = %self.path.display(), "loaded saved diffs");
        Ok(diffs)
    }

    pub fn get(&self, name: &str) -> Result<SavedDiff, StoreError> {
        self.list()?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Case-insensitive match on name or merged text; an empty query lists all
    pub fn search(&self, query: &str) -> Result<Vec<SavedDiff>, StoreError> {
        let diffs = self.list()?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(diffs);
        }
        Ok(diffs.into_iter().filter(|d| d.matches(&query)).collect())
    }

    /// Insert or replace the diff with the same name and make it the most
    /// recent entry.
    pub fn save(&self, mut diff: SavedDiff) -> Result<SavedDiff, StoreError> {
        if diff.name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let mut diffs = self.list()?;
        let before = diffs.len();
        diffs.retain(|d| d.name != diff.name);
        let replaced = diffs.len() != before;

        let newest = diffs.first().map_or(i64::MIN, |d| d.timestamp);
        diff.timestamp = Utc::now().timestamp_millis().max(newest.saturating_add(1));
        diffs.insert(0, diff.clone());

        self.write_all(&diffs)?;
        info!(diff = %diff.name, replaced, "saved diff");
        Ok(diff)
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut diffs = self.list()?;
        let before = diffs.len();
        diffs.retain(|d| d.name != name);
        if diffs.len() == before {
            return Err(StoreError::NotFound(name.to_string()));
        }

        self.write_all(&diffs)?;
        info!(diff = name, "deleted diff");
        Ok(())
    }

    /// Write the merged text of `diff` into `dir`, returning the file path
    pub fn export(&self, diff: &SavedDiff, dir: &Path) -> Result<PathBuf, StoreError> {
        let path = dir.join(export_file_name(&diff.name, Utc::now().timestamp_millis()));
        fs::write(&path, diff.merged_text.as_bytes()).map_err(|e| StoreError::io(&path, e))?;
        info!(diff = %diff.name, path = %path.display(), "exported diff");
        Ok(path)
    }

    fn write_all(&self, diffs: &[SavedDiff]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let json = serde_json::to_vec_pretty(diffs)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.flush())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to replace store file");
            StoreError::io(&self.path, e.error)
        })?;
        Ok(())
    }
}

/// File name for an exported diff: every character of `name` that is not an
/// ASCII letter or digit becomes `_`, followed by the timestamp.
pub fn export_file_name(name: &str, timestamp_ms: i64) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}-{timestamp_ms}.txt")
}

/// Short single-string preview of a text for listings
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
