//! Spreadsheet date serials.
//!
//! Exports store dates as day counts in the 1900 date system. Numbers in a
//! window that covers roughly 1954-2064 are taken to be dates and rendered
//! as `D-MMM-YYYY`, the form the engine's date sort understands.

use chrono::{Datelike, Duration, NaiveDate};
use unigrid_engine::CellValue;

/// Exclusive bounds of the serial window treated as dates.
pub const SERIAL_DATE_MIN: f64 = 20000.0;
pub const SERIAL_DATE_MAX: f64 = 60000.0;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn looks_like_serial_date(n: f64) -> bool {
    n > SERIAL_DATE_MIN && n < SERIAL_DATE_MAX
}

/// `45694.0` -> `"6-Feb-2025"`. The time of day is dropped, rounding to the
/// nearest second first so 23:59:59.9 lands on the next day.
pub fn serial_to_date_string(serial: f64) -> Option<String> {
    // 2958465 is 31-Dec-9999, the last date a spreadsheet can hold
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    // Day 0 is 1899-12-30 once the phantom 1900-02-29 is accounted for
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let seconds = (serial * 86_400.0).round() as i64;
    let date = epoch.checked_add_signed(Duration::seconds(seconds.div_euclid(86_400) * 86_400))?;
    let month = MONTHS[date.month0() as usize];
    Some(format!("{}-{}-{}", date.day(), month, date.year()))
}

/// Numeric cell value as it enters the dataset: a date string when it looks
/// like a serial, the number otherwise.
pub fn decode_number(n: f64) -> CellValue {
    if looks_like_serial_date(n) {
        if let Some(s) = serial_to_date_string(n) {
            return CellValue::Text(s);
        }
    }
    CellValue::Number(n)
}
