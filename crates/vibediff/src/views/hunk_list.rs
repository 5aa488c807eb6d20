//! Hunk list view

use super::{expand_tabs, ViewOptions};
use crossterm::style::Color;
use std::collections::BTreeMap;
use vibediff_core::{Choice, Hunk};

/// Render each hunk with its removed and added lines, noting any recorded
/// selection
pub fn render_hunk_list(
    hunks: &[Hunk],
    selections: &BTreeMap<usize, Choice>,
    opts: &ViewOptions,
) -> Vec<String> {
    let mut lines = Vec::new();

    for hunk in hunks {
        let mut title = format!(
            "hunk {} (-{} +{})",
            hunk.index,
            hunk.left_lines.len(),
            hunk.right_lines.len()
        );
        if let Some(choice) = selections.get(&hunk.index) {
            title.push_str(&format!(" [{choice}]"));
        }
        lines.push(opts.paint(title, Color::Cyan));

        for line in &hunk.left_lines {
            let text = format!("- {}", expand_tabs(line, opts.tab_width));
            lines.push(opts.paint(text, Color::Red));
        }
        for line in &hunk.right_lines {
            let text = format!("+ {}", expand_tabs(line, opts.tab_width));
            lines.push(opts.paint(text, Color::Green));
        }
    }

    lines
}
