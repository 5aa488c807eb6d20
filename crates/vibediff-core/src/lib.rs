//! Vibediff Core - hunk-level merging on top of a line diff
//!
//! This library turns a line diff into indexed hunks, a row-aligned
//! side-by-side view, and merged text built from per-hunk choices.

pub mod align;
pub mod change;
pub mod diff;
pub mod handoff;
pub mod hunk;
pub mod merge;
pub mod partition;
pub mod session;
pub mod store;

pub use align::{align, AlignedRow, SideBySide};
pub use change::{split_lines, ChangeKind, Segment};
pub use diff::{DiffEngine, DiffError, DiffResult, FileDiff};
pub use handoff::{Handoff, HandoffError};
pub use hunk::{group, Hunk};
pub use merge::{rebuild, rebuild_with, Choice, MergeError, Side};
pub use partition::{partition, Token};
pub use session::{MergeOutcome, MergeSession, ResolutionMode, CONFLICT_MARKERS};
pub use store::{export_file_name, preview, DiffStore, SavedDiff, StoreError};
