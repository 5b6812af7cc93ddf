//! Filter and sort: rows in, an ordered view of data row indices out.
//!
//! The view layer follows the usual split between view space (what the user
//! sees after filter and sort) and data space (the merged rows, untouched).
//! [`query`] never reorders or copies rows; it returns a [`RowView`] that maps
//! view index -> data index.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::collate::natural_cmp;
use crate::row::Row;
use crate::value::CellValue;

/// Column with the colour-bucket filter.
pub const REST_COLUMN: &str = "Rest.";

/// Columns (lower-cased) sorted by date rather than by text.
pub const DATE_COLUMNS: [&str; 6] = [
    "reactivation",
    "start",
    "end",
    "fecha_compra_",
    "fecha_actual",
    "fecha_hora_actual",
];

pub fn is_date_column(column: &str) -> bool {
    let lower = column.to_lowercase();
    DATE_COLUMNS.contains(&lower.as_str())
}

// =============================================================================
// RowView
// =============================================================================

/// Filtered, ordered view over the dataset: view row -> data row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowView {
    row_order: Vec<usize>,
}

impl RowView {
    /// Every row, in data order.
    pub fn identity(row_count: usize) -> Self {
        Self {
            row_order: (0..row_count).collect(),
        }
    }

    /// Number of rows that passed the filters
    pub fn len(&self) -> usize {
        self.row_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_order.is_empty()
    }

    pub fn view_to_data(&self, view_row: usize) -> Option<usize> {
        self.row_order.get(view_row).copied()
    }

    pub fn row_order(&self) -> &[usize] {
        &self.row_order
    }

    /// Resolve the view against the rows it was built from.
    pub fn rows<'a>(&'a self, rows: &'a [Row]) -> impl Iterator<Item = &'a Row> + 'a {
        self.row_order.iter().filter_map(move |&i| rows.get(i))
    }
}

// =============================================================================
// Sort spec
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Orient an ascending comparison.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    pub fn is_active(&self) -> bool {
        self.column.is_some()
    }
}

// =============================================================================
// Filters
// =============================================================================

/// One filter string per header. An empty string disables that column's filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFilters {
    filters: IndexMap<String, String>,
}

impl ColumnFilters {
    pub fn for_headers(headers: &[String]) -> Self {
        Self {
            filters: headers.iter().map(|h| (h.clone(), String::new())).collect(),
        }
    }

    pub fn get(&self, column: &str) -> &str {
        self.filters.get(column).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(column.into(), value.into());
    }

    /// Blank every slot, keeping one per header.
    pub fn clear(&mut self) {
        for value in self.filters.values_mut() {
            value.clear();
        }
    }

    /// Non-empty filters only
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_active(&self) -> bool {
        self.active().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Colour buckets for the `Rest.` column (days remaining).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestBucket {
    /// below 1
    Rojo,
    /// 1 to 30 inclusive
    Amarillo,
    /// above 30
    Verde,
}

impl RestBucket {
    pub fn parse(filter: &str) -> Option<Self> {
        match filter.trim().to_lowercase().as_str() {
            "rojo" => Some(RestBucket::Rojo),
            "amarillo" => Some(RestBucket::Amarillo),
            "verde" => Some(RestBucket::Verde),
            _ => None,
        }
    }

    pub fn contains(self, n: f64) -> bool {
        match self {
            RestBucket::Rojo => n < 1.0,
            RestBucket::Amarillo => (1.0..=30.0).contains(&n),
            RestBucket::Verde => n > 30.0,
        }
    }

    pub fn for_value(n: f64) -> Option<Self> {
        [RestBucket::Rojo, RestBucket::Amarillo, RestBucket::Verde]
            .into_iter()
            .find(|b| b.contains(n))
    }
}

fn contains_ci(cell: &CellValue, needle_lower: &str) -> bool {
    cell.as_text().to_lowercase().contains(needle_lower)
}

/// Column filters (AND), then the global filter (any header contains it).
pub fn row_matches(row: &Row, headers: &[String], filters: &ColumnFilters, global: &str) -> bool {
    for (column, filter) in filters.active() {
        let cell = row.get(column);

        if column == REST_COLUMN {
            if let (Some(n), Some(bucket)) = (cell.leading_number(), RestBucket::parse(filter)) {
                if !bucket.contains(n) {
                    return false;
                }
                continue;
            }
        }

        if !contains_ci(cell, &filter.to_lowercase()) {
            return false;
        }
    }

    if !global.is_empty() {
        let needle = global.to_lowercase();
        if !headers.iter().any(|h| contains_ci(row.get(h), &needle)) {
            return false;
        }
    }

    true
}

// =============================================================================
// Dates
// =============================================================================

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FALLBACK_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const FALLBACK_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Timestamp (UTC millis) of a date cell. `D-MMM-YYYY` with an English month
/// abbreviation first (day overflow rolls into the next month), then a
/// handful of common ISO and US layouts. `None` means unparsable.
pub fn parse_custom_date(raw: &str) -> Option<i64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)-([A-Za-z]+)-(\d{4})$").expect("date pattern is valid")
    });

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let Some(caps) = pattern.captures(raw) else {
        return parse_fallback_date(raw);
    };

    let day: u64 = caps[1].parse().ok()?;
    let month = MONTHS.iter().position(|m| *m == &caps[2])? as u32 + 1;
    let year: i32 = caps[3].parse().ok()?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let date = if day == 0 {
        first.checked_sub_days(Days::new(1))?
    } else {
        first.checked_add_days(Days::new(day - 1))?
    };
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn parse_fallback_date(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

// =============================================================================
// Comparators
// =============================================================================

/// Direction-aware comparison of two cells from a non-date column.
/// Absent sorts last in both directions.
///
/// Two fully numeric values compare as numbers and two texts compare
/// naturally. A number against a text always ranks the number first:
/// letting that pair fall through to `natural_cmp` would allow cycles
/// (`1.10 < 1.5 < 1.7x < 1.10`), and `sort_by` needs a total order.
pub fn compare_values(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (a.is_absent(), b.is_absent()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => natural_cmp(&a.as_text(), &b.as_text()),
            };
            direction.apply(ord)
        }
    }
}

/// Direction-aware comparison of two date keys. Unparsable (`None`) is the
/// smallest value, so it leads ascending runs and trails descending ones.
pub fn compare_dates(a: Option<i64>, b: Option<i64>, direction: SortDirection) -> Ordering {
    direction.apply(a.cmp(&b))
}

/// Full row comparator for a sort spec. No column means everything is equal.
pub fn compare_rows(a: &Row, b: &Row, sort: &SortSpec) -> Ordering {
    let Some(column) = sort.column.as_deref() else {
        return Ordering::Equal;
    };
    if is_date_column(column) {
        let key = |r: &Row| parse_custom_date(&r.get(column).as_text());
        compare_dates(key(a), key(b), sort.direction)
    } else {
        compare_values(a.get(column), b.get(column), sort.direction)
    }
}

// =============================================================================
// Query
// =============================================================================

/// Filter, then (stable) sort. Data order breaks ties.
pub fn query(
    rows: &[Row],
    headers: &[String],
    filters: &ColumnFilters,
    global: &str,
    sort: &SortSpec,
) -> RowView {
    let mut row_order: Vec<usize> = (0..rows.len())
        .filter(|&i| row_matches(&rows[i], headers, filters, global))
        .collect();

    if let Some(column) = sort.column.as_deref() {
        if is_date_column(column) {
            // Parse each date once rather than per comparison
            let mut keyed: Vec<(Option<i64>, usize)> = row_order
                .iter()
                .map(|&i| (parse_custom_date(&rows[i].get(column).as_text()), i))
                .collect();
            keyed.sort_by(|a, b| compare_dates(a.0, b.0, sort.direction));
            row_order = keyed.into_iter().map(|(_, i)| i).collect();
        } else {
            row_order.sort_by(|&a, &b| {
                compare_values(rows[a].get(column), rows[b].get(column), sort.direction)
            });
        }
    }

    RowView { row_order }
}
