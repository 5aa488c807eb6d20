//! Side-by-side view - original on the left, modified on the right

use super::{expand_tabs, fit, ViewOptions};
use crossterm::style::Color;
use vibediff_core::{AlignedRow, ChangeKind, SideBySide};

/// Width of the line number gutter ("1234 ")
const NUMBER_WIDTH: usize = 5;
/// Width of the change marker ("- ")
const MARKER_WIDTH: usize = 2;
const SEPARATOR: &str = " │ ";
const SEPARATOR_WIDTH: usize = 3;

/// Render both columns as terminal lines, with a header before every hunk
pub fn render_side_by_side(view: &SideBySide, opts: &ViewOptions) -> Vec<String> {
    let column_width = opts.width.saturating_sub(SEPARATOR_WIDTH) / 2;
    let gutter = (if opts.line_numbers { NUMBER_WIDTH } else { 0 }) + MARKER_WIDTH;
    let content_width = column_width.saturating_sub(gutter);

    let mut lines = Vec::with_capacity(view.len());
    let mut current_hunk = None;

    for (left, right) in view.rows() {
        let hunk = left.hunk_index.or(right.hunk_index);
        if let Some(index) = hunk.filter(|_| hunk != current_hunk) {
            let title = format!("── hunk {index} ");
            let rule = "─".repeat(opts.width.saturating_sub(title.chars().count()));
            lines.push(opts.dim(format!("{title}{rule}")));
        }
        current_hunk = hunk;

        let left = render_cell(left, opts, content_width);
        let right = render_cell(right, opts, content_width);
        lines.push(format!("{left}{}{right}", opts.dim(SEPARATOR.to_string())));
    }

    lines
}

fn render_cell(row: &AlignedRow, opts: &ViewOptions, content_width: usize) -> String {
    let mut cell = String::new();

    if opts.line_numbers {
        let number = if row.is_placeholder() {
            " ".repeat(NUMBER_WIDTH)
        } else {
            format!("{:>4} ", row.line_number)
        };
        cell.push_str(&opts.dim(number));
    }

    if row.is_placeholder() {
        cell.push_str(&" ".repeat(MARKER_WIDTH + content_width));
        return cell;
    }

    let (marker, color) = match row.kind {
        ChangeKind::Equal => (' ', None),
        ChangeKind::Removed => ('-', Some(Color::Red)),
        ChangeKind::Added => ('+', Some(Color::Green)),
    };
    let text = format!(
        "{marker} {}",
        fit(&expand_tabs(&row.content, opts.tab_width), content_width)
    );
    match color {
        Some(color) => cell.push_str(&opts.paint(text, color)),
        None => cell.push_str(&text),
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibediff_core::DiffEngine;

    fn plain(width: usize) -> ViewOptions {
        ViewOptions {
            width,
            line_numbers: true,
            tab_width: 4,
            color: false,
        }
    }

    #[test]
    fn test_renders_rows_and_hunk_headers() {
        let result = DiffEngine::new().diff_strings("a\nb\nc\n", "a\nx\nc\n");
        let lines = render_side_by_side(&result.side_by_side(), &plain(43));

        // a, header, b/placeholder, placeholder/x, c
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("── hunk 0 "));
        assert!(lines[2].starts_with("   2 - b"));
        assert!(lines[3].contains("│    2 + x"));
        assert!(lines[4].starts_with("   3   c"));
    }

    #[test]
    fn test_lines_have_fixed_width() {
        let result = DiffEngine::new().diff_strings("one\ntwo\n", "one\nthree\nfour\n");
        let opts = plain(60);
        for line in render_side_by_side(&result.side_by_side(), &opts) {
            if !line.starts_with("──") {
                assert_eq!(line.chars().count(), 59);
            }
        }
    }

    #[test]
    fn test_without_line_numbers() {
        let result = DiffEngine::new().diff_strings("a\n", "b\n");
        let mut opts = plain(23);
        opts.line_numbers = false;

        let lines = render_side_by_side(&result.side_by_side(), &opts);
        assert!(lines[1].starts_with("- a"));
    }
}
