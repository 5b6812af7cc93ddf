//! Row merge: per-file batches in, one provenance-tagged dataset out.
//!
//! Merge and exclusion are separate steps. Rows from the reference source are
//! still scanned by correlation (they are the email -> phone lookup sheet) and
//! dropped right after, so they never reach the header set or the view.

use crate::row::{Row, SOURCE_COLUMN};
use crate::sanitize::sanitize_row;

/// Sources whose title contains this marker (case-insensitive) are reference
/// data, not contacts.
pub const EXCLUDED_SOURCE_MARKER: &str = "email whatsapp brevo";

/// One file's worth of rows.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// File name without its extension
    pub title: String,
    pub rows: Vec<Row>,
}

impl SourceBatch {
    pub fn new(title: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// Concatenate batches in file order then row order, stamping provenance and
/// sanitizing the phone columns of every row.
pub fn merge_batches(batches: Vec<SourceBatch>) -> Vec<Row> {
    let total: usize = batches.iter().map(|b| b.rows.len()).sum();
    let mut merged = Vec::with_capacity(total);

    for batch in batches {
        log::debug!("merging {} rows from '{}'", batch.rows.len(), batch.title);
        for mut row in batch.rows {
            row.set(SOURCE_COLUMN, batch.title.as_str());
            sanitize_row(&mut row);
            merged.push(row);
        }
    }

    merged
}

/// True when the row came from the reference source.
pub fn is_reference_row(row: &Row) -> bool {
    row.source()
        .map(|s| s.to_lowercase().contains(EXCLUDED_SOURCE_MARKER))
        .unwrap_or(false)
}

/// Drop reference rows, keeping the order of the rest. Returns how many were dropped.
pub fn exclude_reference_rows(rows: &mut Vec<Row>) -> usize {
    let before = rows.len();
    rows.retain(|row| !is_reference_row(row));
    before - rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    #[test]
    fn merge_keeps_file_then_row_order() {
        let merged = merge_batches(vec![
            SourceBatch::new("a", vec![row(&[("n", "1")]), row(&[("n", "2")])]),
            SourceBatch::new("b", vec![row(&[("n", "3")])]),
        ]);
        let ns: Vec<_> = merged.iter().map(|r| r.get("n").as_text().into_owned()).collect();
        assert_eq!(ns, vec!["1", "2", "3"]);
        assert_eq!(merged[0].source(), Some("a"));
        assert_eq!(merged[2].source(), Some("b"));
    }

    #[test]
    fn merge_stamps_over_file_source_column() {
        let merged = merge_batches(vec![SourceBatch::new(
            "ventas",
            vec![row(&[("Source", "from file")])],
        )]);
        assert_eq!(merged[0].source(), Some("ventas"));
    }

    #[test]
    fn merge_sanitizes_phone() {
        let merged = merge_batches(vec![SourceBatch::new(
            "x",
            vec![row(&[("Whatsapp", "+593 999")])],
        )]);
        assert_eq!(merged[0].get("Whatsapp"), &CellValue::text("593999"));
    }

    #[test]
    fn exclusion_is_case_insensitive_substring() {
        let mut rows = merge_batches(vec![
            SourceBatch::new("Clientes", vec![row(&[("n", "1")])]),
            SourceBatch::new("2025 EMAIL WhatsApp Brevo export", vec![row(&[("n", "2")])]),
            SourceBatch::new("Otros", vec![row(&[("n", "3")])]),
        ]);
        assert_eq!(exclude_reference_rows(&mut rows), 1);
        let sources: Vec<_> = rows.iter().filter_map(|r| r.source()).collect();
        assert_eq!(sources, vec!["Clientes", "Otros"]);
    }
}
