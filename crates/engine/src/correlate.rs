//! Email -> phone correlation.
//!
//! Three steps, strictly in order:
//! 1. scan the merged rows (last row wins per email)
//! 2. fold in the external contact records (external wins over local)
//! 3. back-fill rows that have an email but no phone
//!
//! The map is assembled by [`CorrelationMapBuilder`] and frozen by `build()`.
//! Back-fill only accepts a [`CorrelationMap`], so it can never see a map that
//! is still being written.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::ProviderError;
use crate::provider::ContactRecord;
use crate::row::Row;
use crate::sanitize::sanitize_phone;

/// Lower-case and trim, the join key for emails.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// =============================================================================
// Map
// =============================================================================

/// Frozen email -> phone lookup for one load.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMap {
    phones: FxHashMap<String, String>,
}

impl CorrelationMap {
    pub fn get(&self, email: &str) -> Option<&str> {
        self.phones.get(&normalize_email(email)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.phones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty()
    }
}

/// Mutable phase of the map. Consumed by `build()`.
#[derive(Debug, Default)]
pub struct CorrelationMapBuilder {
    phones: FxHashMap<String, String>,
    local_entries: usize,
    external_applied: usize,
}

impl CorrelationMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step 1: every row exposing both a non-empty email and phone contributes.
    pub fn scan_rows(&mut self, rows: &[Row]) -> &mut Self {
        for row in rows {
            let schema = row.schema();
            let email = schema.email(row);
            let phone = schema.whatsapp(row);
            if email.is_blank() || phone.is_blank() {
                continue;
            }
            let key = normalize_email(&email.as_text());
            let phone = phone.as_text().trim().to_string();
            self.phones.insert(key, phone);
        }
        self.local_entries = self.phones.len();
        log::debug!("correlation: {} emails from local rows", self.local_entries);
        self
    }

    /// Step 2: external records overwrite local ones. Records with a blank
    /// email, or a phone that is blank once sanitized, are ignored.
    pub fn merge_external(&mut self, records: &[ContactRecord]) -> &mut Self {
        for record in records {
            let email = normalize_email(&record.email);
            let phone = sanitize_phone(&record.whatsapp);
            if email.is_empty() || phone.is_empty() {
                continue;
            }
            self.phones.insert(email, phone);
            self.external_applied += 1;
        }
        log::debug!(
            "correlation: {} external records applied, {} emails total",
            self.external_applied,
            self.phones.len()
        );
        self
    }

    pub fn local_entries(&self) -> usize {
        self.local_entries
    }

    pub fn external_applied(&self) -> usize {
        self.external_applied
    }

    pub fn build(self) -> CorrelationMap {
        CorrelationMap { phones: self.phones }
    }
}

// =============================================================================
// Back-fill
// =============================================================================

/// Step 3: give every phone-less row with a known email its mapped phone.
/// Rows that already carry a phone are left alone. Returns the number of rows written.
pub fn backfill(rows: &mut [Row], map: &CorrelationMap) -> usize {
    if map.is_empty() {
        return 0;
    }

    let mut filled = 0;
    for row in rows.iter_mut() {
        let schema = row.schema();
        if !schema.whatsapp(row).is_blank() {
            continue;
        }
        let email = schema.email(row);
        if email.is_blank() {
            continue;
        }
        if let Some(phone) = map.get(&email.as_text()) {
            let phone = phone.to_string();
            row.set(schema.whatsapp_target(), phone);
            filled += 1;
        }
    }
    filled
}

// =============================================================================
// Report
// =============================================================================

/// What correlation did during one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub local_entries: usize,
    pub external_applied: usize,
    pub map_size: usize,
    pub backfilled: usize,
    /// Set when the external provider failed; correlation still ran on local rows
    pub provider_error: Option<String>,
}

/// Run all three steps. `external` is the provider outcome, already awaited.
pub fn correlate(
    rows: &mut [Row],
    external: Result<Vec<ContactRecord>, ProviderError>,
) -> (CorrelationMap, CorrelationReport) {
    let mut builder = CorrelationMapBuilder::new();
    builder.scan_rows(rows);

    let mut report = CorrelationReport::default();
    match external {
        Ok(records) => {
            builder.merge_external(&records);
        }
        Err(e) => {
            log::warn!("contact provider failed, using local matches only: {}", e);
            report.provider_error = Some(e.to_string());
        }
    }

    report.local_entries = builder.local_entries();
    report.external_applied = builder.external_applied();

    let map = builder.build();
    report.map_size = map.len();
    report.backfilled = backfill(rows, &map);

    (map, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn record(email: &str, whatsapp: &str) -> ContactRecord {
        ContactRecord::new(email, whatsapp)
    }

    #[test]
    fn local_scan_last_write_wins() {
        let rows = vec![
            row(&[("Email", "a@x.com"), ("Whatsapp", "111")]),
            row(&[("email", " A@X.com "), ("WHATSAPP", " 222 ")]),
        ];
        let map = CorrelationMapBuilder::new().scan_rows(&rows).phones.clone();
        assert_eq!(map.get("a@x.com").map(String::as_str), Some("222"));
    }

    #[test]
    fn scan_skips_rows_missing_either_side() {
        let rows = vec![
            row(&[("Email", "a@x.com"), ("Whatsapp", "")]),
            row(&[("Email", ""), ("Whatsapp", "999")]),
            row(&[("Email", "b@x.com")]),
        ];
        let mut builder = CorrelationMapBuilder::new();
        builder.scan_rows(&rows);
        assert_eq!(builder.local_entries(), 0);
    }

    #[test]
    fn external_overrides_local() {
        let mut rows = vec![
            row(&[("Email", "a@x.com"), ("Whatsapp", "111")]),
            row(&[("Email", "A@x.com")]),
        ];
        let (_, report) = correlate(&mut rows, Ok(vec![record("a@x.com", "+593 999")]));
        assert_eq!(rows[1].get("Whatsapp"), &CellValue::text("593999"));
        assert_eq!(report.backfilled, 1);
        assert_eq!(report.external_applied, 1);
    }

    #[test]
    fn external_blank_phone_is_ignored() {
        let mut builder = CorrelationMapBuilder::new();
        builder.merge_external(&[record("a@x.com", " + "), record("", "123")]);
        assert_eq!(builder.external_applied(), 0);
        assert!(builder.build().is_empty());
    }

    #[test]
    fn backfill_never_overwrites_existing_phone() {
        let mut rows = vec![row(&[("Email", "a@x.com"), ("Whatsapp", "555")])];
        let (_, report) = correlate(&mut rows, Ok(vec![record("a@x.com", "999")]));
        assert_eq!(rows[0].get("Whatsapp"), &CellValue::text("555"));
        assert_eq!(report.backfilled, 0);
    }

    #[test]
    fn backfill_creates_canonical_column_or_reuses_existing() {
        let mut rows = vec![
            row(&[("E-mail", "a@x.com")]),
            row(&[("EMAIL", "a@x.com"), ("WHATSAPP", "  ")]),
        ];
        correlate(&mut rows, Ok(vec![record("a@x.com", "123")]));
        assert_eq!(rows[0].get("Whatsapp"), &CellValue::text("123"));
        assert_eq!(rows[1].get("WHATSAPP"), &CellValue::text("123"));
        assert!(!rows[1].contains("Whatsapp"));
    }

    #[test]
    fn provider_failure_falls_back_to_local() {
        let mut rows = vec![
            row(&[("Email", "a@x.com"), ("Whatsapp", "111")]),
            row(&[("Email", "a@x.com")]),
        ];
        let (_, report) = correlate(&mut rows, Err(ProviderError::new("offline")));
        assert_eq!(rows[1].get("Whatsapp"), &CellValue::text("111"));
        assert_eq!(report.provider_error.as_deref(), Some("offline"));
        assert_eq!(report.map_size, 1);
    }
}
