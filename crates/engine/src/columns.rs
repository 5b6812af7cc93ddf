//! Header set derivation and the column placement rules.

use indexmap::IndexSet;

use crate::row::{is_whatsapp_column, Row, SOURCE_COLUMN};

/// Column whose filter defaults to [`PENDING_DEFAULT_FILTER`] after a load.
pub const PENDING_COLUMN: &str = "Pendientes_";
pub const PENDING_DEFAULT_FILTER: &str = "processing";

/// Column the view is sorted by (ascending) after a load.
pub const REACTIVATION_COLUMN: &str = "Reactivation";

const COMMENTS_MARKER: &str = "comentarios";
const REST_MARKER: &str = "rest.";

/// Union of all row keys in first-seen order, `Source` first, then the
/// whatsapp column placed by [`reorder_headers`].
pub fn derive_headers(rows: &[Row]) -> Vec<String> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for row in rows {
        seen.extend(row.columns());
    }

    let mut headers: Vec<String> = Vec::with_capacity(seen.len());
    if seen.contains(SOURCE_COLUMN) {
        headers.push(SOURCE_COLUMN.to_string());
    }
    headers.extend(
        seen.into_iter()
            .filter(|h| *h != SOURCE_COLUMN)
            .map(str::to_string),
    );

    reorder_headers(headers)
}

/// Move the whatsapp column next to the comments column (after it), else in
/// front of the `Rest.` column, else to the end.
pub fn reorder_headers(mut headers: Vec<String>) -> Vec<String> {
    let Some(from) = headers.iter().position(|h| is_whatsapp_column(h)) else {
        return headers;
    };
    let whatsapp = headers.remove(from);

    let contains = |h: &String, marker: &str| h.to_lowercase().contains(marker);

    if let Some(i) = headers.iter().position(|h| contains(h, COMMENTS_MARKER)) {
        headers.insert(i + 1, whatsapp);
    } else if let Some(i) = headers.iter().position(|h| contains(h, REST_MARKER)) {
        headers.insert(i, whatsapp);
    } else {
        headers.push(whatsapp);
    }
    headers
}

/// Index of the first header whose trimmed, lower-cased name starts with `prefix`.
pub fn position_by_prefix(headers: &[String], prefix: &str) -> Option<usize> {
    let prefix = prefix.trim().to_lowercase();
    headers
        .iter()
        .position(|h| h.trim().to_lowercase().starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn whatsapp_goes_after_comentarios() {
        assert_eq!(
            reorder_headers(h(&["Source", "Comentarios", "Rest.", "Other", "Whatsapp"])),
            h(&["Source", "Comentarios", "Whatsapp", "Rest.", "Other"])
        );
        assert_eq!(
            reorder_headers(h(&["Comentarios", "Rest.", "Other", "Whatsapp"])),
            h(&["Comentarios", "Whatsapp", "Rest.", "Other"])
        );
    }

    #[test]
    fn whatsapp_goes_before_rest_without_comentarios() {
        assert_eq!(
            reorder_headers(h(&["Rest.", "Other", "Whatsapp"])),
            h(&["Whatsapp", "Rest.", "Other"])
        );
    }

    #[test]
    fn whatsapp_appended_without_markers() {
        assert_eq!(reorder_headers(h(&["EMAIL", "Whatsapp"])), h(&["EMAIL", "Whatsapp"]));
        assert_eq!(reorder_headers(h(&["Whatsapp", "EMAIL"])), h(&["EMAIL", "Whatsapp"]));
    }

    #[test]
    fn markers_match_case_insensitive_substrings() {
        assert_eq!(
            reorder_headers(h(&["Mis COMENTARIOS_", "x", "WHATSAPP"])),
            h(&["Mis COMENTARIOS_", "WHATSAPP", "x"])
        );
    }

    #[test]
    fn no_whatsapp_leaves_order_alone() {
        let headers = h(&["b", "Comentarios", "a"]);
        assert_eq!(reorder_headers(headers.clone()), headers);
    }

    #[test]
    fn derive_unions_and_forces_source_first() {
        let rows: Vec<Row> = vec![
            [("Email", "a"), ("Source", "f1")].into_iter().collect(),
            [("Rest.", "1"), ("Whatsapp", "2"), ("Source", "f2")].into_iter().collect(),
        ];
        assert_eq!(derive_headers(&rows), h(&["Source", "Email", "Whatsapp", "Rest."]));
    }

    #[test]
    fn derive_empty() {
        assert!(derive_headers(&[]).is_empty());
    }

    #[test]
    fn prefix_lookup() {
        let headers = h(&["Source", " Universidad ", "Whatsapp"]);
        assert_eq!(position_by_prefix(&headers, "univers"), Some(1));
        assert_eq!(position_by_prefix(&headers, "SOURCE"), Some(0));
        assert_eq!(position_by_prefix(&headers, "fecha"), None);
    }
}
