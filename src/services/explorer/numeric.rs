use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::dates::ExcelSerialDateConverter;
use crate::models::Cell;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());
static PLAIN_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static PLAIN_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").unwrap());
static BR_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(?:\.\d{3})*(?:,\d+)?$").unwrap());
static US_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(?:,\d{3})*(?:\.\d+)?$").unwrap());
static DECORATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s%()]|R\$|US\$|\$|€|£").unwrap());

/// Reasons a cell does not yield a number. The lenient parser maps all of them to `0`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericParseError {
    #[error("value is null")]
    Null,
    #[error("date values are not numeric")]
    Date,
    #[error("{0} falls in the spreadsheet date serial window")]
    ExcelSerial(f64),
    #[error("value is not finite")]
    NonFinite,
    #[error("no digits left in {0:?}")]
    Empty(String),
    #[error("cannot read a number from {0:?}")]
    Invalid(String),
}

/// Reads numbers written with either BR (`1.234,56`) or US (`1,234.56`) separators.
pub struct NumericParser;

impl NumericParser {
    /// Lenient parse: anything unreadable becomes `0`.
    pub fn parse(cell: &Cell) -> f64 {
        Self::parse_strict(cell).unwrap_or(0.0)
    }

    pub fn parse_strict(cell: &Cell) -> Result<f64, NumericParseError> {
        match cell {
            Cell::Null => Err(NumericParseError::Null),
            Cell::Date(_) => Err(NumericParseError::Date),
            Cell::Number(n) if !n.is_finite() => Err(NumericParseError::NonFinite),
            Cell::Number(n) if ExcelSerialDateConverter::is_serial(*n) => {
                Err(NumericParseError::ExcelSerial(*n))
            }
            Cell::Number(n) => Ok(*n),
            Cell::Text(s) => Self::parse_text(s),
        }
    }

    pub fn parse_text(raw: &str) -> Result<f64, NumericParseError> {
        let trimmed = raw.trim();
        let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => (true, inner),
            None => (false, trimmed),
        };

        let stripped: String = body
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
            .collect();
        if matches!(stripped.as_str(), "" | "-" | "." | ",") {
            return Err(NumericParseError::Empty(raw.to_string()));
        }

        let normalized = normalize_separators(&stripped);
        let value = leading_float(&normalized)
            .ok_or_else(|| NumericParseError::Invalid(raw.to_string()))?;
        if !value.is_finite() {
            return Err(NumericParseError::NonFinite);
        }

        Ok(if negative { -value.abs() } else { value })
    }

    /// Shape check used by column classification. Looser than `parse_strict`
    /// on decorations, stricter on stray letters.
    pub fn is_numeric_like(cell: &Cell) -> bool {
        match cell {
            Cell::Number(n) => n.is_finite() && !ExcelSerialDateConverter::is_serial(*n),
            Cell::Text(s) => is_numeric_text(s),
            Cell::Date(_) | Cell::Null => false,
        }
    }
}

/// The separator occurring last is the decimal one when both are present; a lone
/// separator is decimal only when it splits the string in two with 1-2 trailing digits.
fn normalize_separators(s: &str) -> String {
    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) => decimal_or_grouping(s, ','),
        (Some(_), None) => decimal_or_grouping(s, '.'),
        (None, None) => s.to_string(),
    }
}

fn decimal_or_grouping(s: &str, separator: char) -> String {
    let parts: Vec<&str> = s.split(separator).collect();
    match parts.as_slice() {
        [whole, fraction]
            if (1..=2).contains(&fraction.len())
                && fraction.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}.{}", whole, fraction)
        }
        _ => s.replace(separator, ""),
    }
}

/// Longest numeric prefix, so `"2024-01-01"` reads as `2024`.
fn leading_float(s: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn is_numeric_text(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    if PLAIN_INTEGER.is_match(s)
        || PLAIN_DECIMAL.is_match(s)
        || BR_NUMBER.is_match(s)
        || US_NUMBER.is_match(s)
    {
        return true;
    }

    let bare = DECORATIONS.replace_all(s, "");
    let br = bare.replace('.', "").replace(',', ".");
    let us = bare.replace(',', "");
    is_finite_number(&br) || is_finite_number(&us)
}

fn is_finite_number(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().map_or(false, f64::is_finite)
}
