use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a table column may grow before values are cut.
pub(crate) const MAX_COLUMN_WIDTH: usize = 32;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cell text on one line: tabs and line breaks become spaces.
pub(crate) fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

/// Cut `s` to at most `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    // Too narrow for the marker: keep what fits
    let (budget, marker) = if width < 3 { (width, "") } else { (width - 2, "..") };

    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str(marker);
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let cut = truncate_display(s, width);
    let w = display_width(&cut);
    format!("{}{}", cut, " ".repeat(width.saturating_sub(w)))
}

/// Column widths for a table: the widest of header and values, capped.
pub(crate) fn column_widths(
    headers: &[String],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (w, value) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(display_width(value));
        }
    }
    widths.into_iter().map(|w| w.clamp(1, MAX_COLUMN_WIDTH)).collect()
}
