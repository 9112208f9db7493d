use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Cell;

/// Lower bound (exclusive) of the day-count window read as a spreadsheet date serial (1970-01-01).
pub const SERIAL_MIN: f64 = 25569.0;
/// Upper bound (exclusive) of the serial window (2064-04-09).
pub const SERIAL_MAX: f64 = 60000.0;
/// Lower bound (exclusive) of the narrower window used only when formatting axis labels.
pub const LABEL_SERIAL_MIN: f64 = 40000.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

static DAY_FIRST_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}(?:$|[\sT])").unwrap());
static ISO_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

/// Spreadsheet serial date handling. Day zero is 1899-12-30.
pub struct ExcelSerialDateConverter;

impl ExcelSerialDateConverter {
    pub fn is_serial(value: f64) -> bool {
        value > SERIAL_MIN && value < SERIAL_MAX
    }

    pub fn is_label_serial(value: f64) -> bool {
        value > LABEL_SERIAL_MIN && value < SERIAL_MAX
    }

    pub fn to_date(value: f64) -> Option<NaiveDateTime> {
        if !value.is_finite() {
            return None;
        }
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let offset = Duration::try_milliseconds((value * MILLIS_PER_DAY).round() as i64)?;
        epoch.checked_add_signed(offset)
    }
}

/// `DD/MM/YYYY`-like (also `-` or `.` separated) or `YYYY-MM-DD`-prefixed text.
pub fn is_date_string(s: &str) -> bool {
    let s = s.trim();
    DAY_FIRST_DATE.is_match(s) || ISO_DATE_PREFIX.is_match(s)
}

/// Native dates, serial numbers and date-shaped text all count as date-like.
pub fn is_date_like(cell: &Cell) -> bool {
    match cell {
        Cell::Date(_) => true,
        Cell::Number(n) => ExcelSerialDateConverter::is_serial(*n),
        Cell::Text(s) => is_date_string(s),
        Cell::Null => false,
    }
}
