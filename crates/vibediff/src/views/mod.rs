//! View rendering modules

mod hunk_list;
mod side_by_side;

pub use hunk_list::render_hunk_list;
pub use side_by_side::render_side_by_side;

use crossterm::style::{Color, Stylize};
use unicode_width::UnicodeWidthChar;

/// Rendering options shared by all views
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub width: usize,
    pub line_numbers: bool,
    pub tab_width: usize,
    pub color: bool,
}

impl ViewOptions {
    pub fn paint(&self, text: String, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text
        }
    }

    pub fn dim(&self, text: String) -> String {
        if self.color {
            text.dim().to_string()
        } else {
            text
        }
    }
}

/// Replace tabs with spaces up to the next tab stop
pub(crate) fn expand_tabs(text: &str, tab_width: usize) -> String {
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(text.len());
    let mut col = 0;
    for ch in text.chars() {
        if ch == '\t' {
            let spaces = tab_width - (col % tab_width);
            out.extend(std::iter::repeat(' ').take(spaces));
            col += spaces;
        } else {
            out.push(ch);
            col += ch.width().unwrap_or(0);
        }
    }
    out
}

/// Truncate or pad `text` to exactly `width` display columns
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}
