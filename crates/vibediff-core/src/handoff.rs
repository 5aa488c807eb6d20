//! Payload used to resume a merge in another session

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::change::Segment;
use crate::merge::Choice;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("handoff payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("handoff payload is missing '{0}'")]
    MissingField(&'static str),
    #[error("handoff selection for hunk {index} is invalid: {reason}")]
    InvalidSelection { index: usize, reason: String },
}

/// Everything needed to pick up an in-progress merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handoff {
    pub left: String,
    pub right: String,
    pub diff: Vec<Segment>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hunk_selections: BTreeMap<usize, Choice>,
}

/// Wire shape with every field optional, so absence can be reported by name
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHandoff {
    left: Option<String>,
    right: Option<String>,
    diff: Option<Vec<Segment>>,
    #[serde(default)]
    hunk_selections: Option<BTreeMap<usize, Choice>>,
}

impl Handoff {
    /// Parse a payload. Anything incomplete is rejected as a whole.
    pub fn from_json(json: &str) -> Result<Self, HandoffError> {
        let raw: RawHandoff = serde_json::from_str(json)?;

        let left = raw
            .left
            .filter(|s| !s.is_empty())
            .ok_or(HandoffError::MissingField("left"))?;
        let right = raw
            .right
            .filter(|s| !s.is_empty())
            .ok_or(HandoffError::MissingField("right"))?;
        let diff = raw.diff.ok_or(HandoffError::MissingField("diff"))?;

        Ok(Self {
            left,
            right,
            diff,
            hunk_selections: raw.hunk_selections.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String, HandoffError> {
        Ok(serde_json::to_string(self)?)
    }
}
