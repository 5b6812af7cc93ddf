//! Field-level cleanup rules.

use crate::row::{is_whatsapp_column, Row};
use crate::value::CellValue;

/// Strip `+` and every whitespace character from a phone number.
/// Other punctuation (dashes, parentheses) passes through unchanged.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c != '+' && !c.is_whitespace() && c != '\u{feff}')
        .collect()
}

/// Apply [`sanitize_phone`] to every whatsapp-named field of a row.
/// The cleaned value is always text, even if the source cell was numeric.
pub fn sanitize_row(row: &mut Row) {
    for (column, value) in row.values_mut() {
        if is_whatsapp_column(column) {
            let cleaned = sanitize_phone(&value.as_text());
            *value = CellValue::Text(cleaned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_plus_and_spaces() {
        assert_eq!(sanitize_phone("+593 999"), "593999");
        assert_eq!(sanitize_phone("099 123 456"), "099123456");
        assert_eq!(sanitize_phone("\t+1\u{a0}555\n"), "1555");
    }

    #[test]
    fn keeps_other_punctuation() {
        assert_eq!(sanitize_phone("+1 (555) 123"), "1(555)123");
        assert_eq!(sanitize_phone("555-123"), "555-123");
    }

    #[test]
    fn row_sanitizes_every_whatsapp_spelling() {
        let mut row: Row = [("Name", "Charlie"), ("WHATSAPP", "+1 (555) 123")]
            .into_iter()
            .collect();
        row.set("whatsapp", 593999.0);
        sanitize_row(&mut row);
        assert_eq!(row.get("WHATSAPP"), &CellValue::text("1(555)123"));
        assert_eq!(row.get("whatsapp"), &CellValue::text("593999"));
        assert_eq!(row.get("Name"), &CellValue::text("Charlie"));
    }

    #[test]
    fn absent_phone_becomes_empty_text() {
        let mut row = Row::new();
        row.set("Whatsapp", CellValue::Absent);
        sanitize_row(&mut row);
        assert_eq!(row.get("Whatsapp"), &CellValue::text(""));
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(raw in "\\PC*") {
            let once = sanitize_phone(&raw);
            prop_assert_eq!(sanitize_phone(&once), once.clone());
            prop_assert!(!once.contains('+'));
            prop_assert!(!once.chars().any(char::is_whitespace));
        }
    }
}
