//! User-facing notices for merge and store actions.
//!
//! Notices go to stderr so stdout can carry merged text.

use crossterm::style::{Color, Stylize};
use vibediff_core::{MergeOutcome, SavedDiff, Side};

#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    color: bool,
}

impl Notifier {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn success(&self, msg: &str) {
        eprintln!("{} {msg}", self.mark("✓", Color::Green));
    }

    pub fn info(&self, msg: &str) {
        eprintln!("{} {msg}", self.mark("•", Color::Blue));
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{} {msg}", self.mark("⚠", Color::Yellow));
    }

    pub fn outcome(&self, outcome: &MergeOutcome) {
        self.info(&describe(outcome));
    }

    pub fn saved(&self, diff: &SavedDiff) {
        self.success(&format!("saved \"{}\"", diff.name));
    }

    fn mark(&self, symbol: &str, color: Color) -> String {
        if self.color {
            symbol.with(color).to_string()
        } else {
            symbol.to_string()
        }
    }
}

pub fn describe(outcome: &MergeOutcome) -> String {
    match outcome {
        MergeOutcome::HunkResolved { index, choice } => {
            format!("hunk {index}: accepted {choice}")
        }
        MergeOutcome::AcceptedAll(Side::Left) => {
            "accepted all original: using the entire left version".to_string()
        }
        MergeOutcome::AcceptedAll(Side::Right) => {
            "accepted all modified: using the entire right version".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibediff_core::Choice;

    #[test]
    fn test_describe_outcomes() {
        let resolved = MergeOutcome::HunkResolved {
            index: 2,
            choice: Choice::Both {
                order: vec![Side::Right, Side::Left],
            },
        };
        assert_eq!(describe(&resolved), "hunk 2: accepted both (right then left)");
        assert!(describe(&MergeOutcome::AcceptedAll(Side::Left)).contains("left version"));
    }
}
