//! Calendar date handling.
//!
//! ISO `YYYY-MM-DD` is the canonical session date. Compact `YYYYMMDD` input is
//! accepted on entry and normalized; any other shape is a validation error.
//! Weekday indices follow the catalog convention: 0 = Sunday .. 6 = Saturday.

use chrono::{Datelike, NaiveDate};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::errors::CoreError;

const ISO_FORMAT: &str = "%Y-%m-%d";
const COMPACT_FORMAT: &str = "%Y%m%d";

/// Parse a session date from either `YYYY-MM-DD` or `YYYYMMDD`.
///
/// # Errors
///
/// Returns `CoreError::Validation` for any other shape or an impossible date.
pub fn parse_session_date(input: &str) -> Result<NaiveDate, CoreError> {
    let s = input.trim();
    let bytes = s.as_bytes();

    let format = match bytes.len() {
        10 if bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit()) =>
        {
            ISO_FORMAT
        }
        8 if bytes.iter().all(u8::is_ascii_digit) => COMPACT_FORMAT,
        _ => {
            return Err(CoreError::validation(format!(
                "date '{input}' must be YYYY-MM-DD or YYYYMMDD"
            )));
        }
    };

    NaiveDate::parse_from_str(s, format)
        .map_err(|e| CoreError::validation(format!("date '{input}' is not a calendar date: {e}")))
}

/// Canonical `YYYY-MM-DD` rendering.
#[must_use]
pub fn format_session_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Weekday index of `date`, 0 = Sunday .. 6 = Saturday.
#[must_use]
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Lowercase, trim, and strip diacritics so `"Miércoles"` matches `"miercoles"`,
/// whether the accent is precomposed or a combining mark.
#[must_use]
pub fn fold_day_name(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Map a day name (Spanish or English, any case or accents) or a numeric
/// index to a weekday index. Returns `None` when nothing matches.
#[must_use]
pub fn day_name_to_index(name: &str) -> Option<u32> {
    let folded = fold_day_name(name);
    let index = match folded.as_str() {
        "domingo" | "sunday" => 0,
        "lunes" | "monday" => 1,
        "martes" | "tuesday" => 2,
        "miercoles" | "wednesday" => 3,
        "jueves" | "thursday" => 4,
        "viernes" | "friday" => 5,
        "sabado" | "saturday" => 6,
        other => return other.parse::<u32>().ok().filter(|n| *n <= 6),
    };
    Some(index)
}
