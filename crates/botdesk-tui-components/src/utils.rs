//! Text utilities for TUI rendering.

use unicode_width::UnicodeWidthChar;

/// Wrap text to fit within a given width, handling unicode safely.
///
/// Returns a vector of lines, each fitting within the specified width.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }

    let mut lines = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_width = 0;

        for ch in line.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);

            if current_width + ch_width > width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
                current_width = 0;
            }

            current_line.push(ch);
            current_width += ch_width;
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Wrap text at word boundaries with an indent prefix on every line.
///
/// Widths are measured in terminal columns, so wide characters (CJK, emoji)
/// take two.
pub fn wrap_text_indented(text: &str, width: usize, indent: &str) -> Vec<String> {
    let indent_width: usize = indent
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(1))
        .sum();
    let effective_width = width.saturating_sub(indent_width);

    if effective_width == 0 {
        return vec![format!("{}{}", indent, text)];
    }

    let mut lines = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            lines.push(indent.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0;

        for word in line.split(' ') {
            let word_width: usize = word
                .chars()
                .map(|c| UnicodeWidthChar::width(c).unwrap_or(1))
                .sum();
            let sep = usize::from(!current.is_empty());

            if current_width + sep + word_width <= effective_width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_width += sep + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(format!("{}{}", indent, current));
                current.clear();
                current_width = 0;
            }

            // A word longer than the line is split by columns.
            if word_width > effective_width {
                let mut pieces = wrap_text(word, effective_width);
                let last = pieces.pop().unwrap_or_default();
                for piece in pieces {
                    lines.push(format!("{}{}", indent, piece));
                }
                current_width = last
                    .chars()
                    .map(|c| UnicodeWidthChar::width(c).unwrap_or(1))
                    .sum();
                current = last;
            } else {
                current.push_str(word);
                current_width = word_width;
            }
        }

        lines.push(format!("{}{}", indent, current));
    }

    if lines.is_empty() {
        lines.push(indent.to_string());
    }

    lines
}

/// Truncate a string to fit within a given width, adding ellipsis if needed.
pub fn truncate(text: &str, max_width: usize) -> String {
    if max_width < 3 {
        return text.chars().take(max_width).collect();
    }

    let total: usize = text
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(1))
        .sum();
    if total <= max_width {
        return text.to_string();
    }

    let mut width = 0;
    let mut result = String::new();

    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result.push_str("...");
    result
}
