//! Input validation utilities.
//!
//! Form input arrives as loose strings: birthdays as three selector values, dates as ISO
//! text, names with stray whitespace. The helpers here turn them into checked values or a
//! [`ValidationError`] for the form to display.

use crate::constants::MONTH_NAMES;
use crate::error::ValidationError;
use chrono::NaiveDate;
use imus_types::NonEmptyText;

/// Converts a month name to its zero-padded number (`"march"` → `"03"`).
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn month_number(name: &str) -> Result<String, ValidationError> {
    let wanted = name.trim();
    MONTH_NAMES
        .iter()
        .position(|month| month.eq_ignore_ascii_case(wanted))
        .map(|index| format!("{:02}", index + 1))
        .ok_or_else(|| ValidationError::UnknownMonth(wanted.to_owned()))
}

/// Assembles an ISO `YYYY-MM-DD` birthday from the day, month-name and year selectors.
///
/// # Errors
///
/// - [`ValidationError::MissingDateComponent`] if any component is blank
/// - [`ValidationError::UnknownMonth`] if the month is not one of the twelve English names
/// - [`ValidationError::InvalidDay`] / [`ValidationError::InvalidYear`] for non-numeric parts
/// - [`ValidationError::NonexistentDate`] for dates such as 31 February
pub fn assemble_birthday(day: &str, month: &str, year: &str) -> Result<String, ValidationError> {
    let (day, month, year) = (day.trim(), month.trim(), year.trim());

    if day.is_empty() {
        return Err(ValidationError::MissingDateComponent("day"));
    }
    if month.is_empty() {
        return Err(ValidationError::MissingDateComponent("month"));
    }
    if year.is_empty() {
        return Err(ValidationError::MissingDateComponent("year"));
    }

    let month = month_number(month)?;
    let day_num: u32 = day
        .parse()
        .map_err(|_| ValidationError::InvalidDay(day.to_owned()))?;
    if year.len() != 4 {
        return Err(ValidationError::InvalidYear(year.to_owned()));
    }
    let year_num: i32 = year
        .parse()
        .map_err(|_| ValidationError::InvalidYear(year.to_owned()))?;

    let iso = format!("{year_num:04}-{month}-{day_num:02}");
    // month_number only yields 01..=12
    let month_num: u32 = month.parse().unwrap_or_default();
    NaiveDate::from_ymd_opt(year_num, month_num, day_num)
        .ok_or(ValidationError::NonexistentDate(iso.clone()))?;

    Ok(iso)
}

/// Parses a strict ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidIsoDate(value.to_owned()))
}

/// Requires a non-blank form field, naming it in the error.
pub fn required(field: &'static str, value: &str) -> Result<NonEmptyText, ValidationError> {
    NonEmptyText::new(value).map_err(|_| ValidationError::MissingField(field))
}
