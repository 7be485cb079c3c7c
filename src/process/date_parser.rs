use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::raw_table::RawSheet;
use crate::error::{BulletinError, Result};

/// Lenient on purpose: `39/19/2029` matches and is rejected afterwards.
static HEADER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-3][0-9]/[0-1][0-9]/20[1-2][0-9]").expect("valid date regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// A reference date supplied by the caller instead of read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplicitDate {
    Date(NaiveDate),
    Text(String),
}

impl From<NaiveDate> for ExplicitDate {
    fn from(d: NaiveDate) -> Self {
        ExplicitDate::Date(d)
    }
}

impl From<&str> for ExplicitDate {
    fn from(s: &str) -> Self {
        ExplicitDate::Text(s.to_string())
    }
}

impl From<String> for ExplicitDate {
    fn from(s: String) -> Self {
        ExplicitDate::Text(s)
    }
}

/// Parse a caller-supplied date string.
pub fn parse_explicit(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(BulletinError::InvalidDateFormat(s.to_string()))
}

/// First real calendar date in a free-text header such as
/// `"Atualizado em 11/08/2020"`.
pub fn parse_header(text: &str) -> Result<NaiveDate> {
    let mut matched = false;
    for m in HEADER_DATE.find_iter(text) {
        matched = true;
        if let Ok(d) = NaiveDate::parse_from_str(m.as_str(), "%d/%m/%Y") {
            return Ok(d);
        }
    }
    if matched {
        Err(BulletinError::InvalidDateFormat(text.to_string()))
    } else {
        Err(BulletinError::DateNotFound(text.to_string()))
    }
}

/// Bulletin reference date: the explicit one when given, otherwise the date
/// statement in the first mapped column of `date_row`.
pub fn resolve(sheet: &RawSheet, date_row: u32, explicit: Option<&ExplicitDate>) -> Result<NaiveDate> {
    match explicit {
        Some(ExplicitDate::Date(d)) => Ok(*d),
        Some(ExplicitDate::Text(s)) => parse_explicit(s),
        None => {
            let header = sheet
                .cell(date_row, 0)
                .and_then(|c| c.as_text())
                .unwrap_or_default();
            let date = parse_header(&header)?;
            debug!(%date, header = %header, "bulletin date read from header");
            Ok(date)
        }
    }
}
