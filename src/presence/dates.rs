//! Date handling for the webhook source.
//!
//! The source sends dates and times as separate fields in day/month/year
//! order (`15/03/2024` + `09:00:00`). Timestamps that arrive whole (such as
//! `requestedAt`) may be ISO 8601, with or without an offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Day/month/year, as the source writes it.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Time of day, as the source writes it.
pub const TIME_FORMAT: &str = "%H:%M:%S";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Strip whitespace and treat the source's empty markers as absent.
pub fn present(raw: Option<&str>) -> Option<&str> {
    let value = raw?.trim();
    if value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("undefined")
    {
        None
    } else {
        Some(value)
    }
}

/// Parse a calendar date. Impossible dates (31/02) yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT))
        .ok()
}

/// Parse a time of day; seconds are optional.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Parse a whole timestamp into wall-clock time at `offset`.
///
/// Offset-qualified inputs are converted; naive inputs are taken as already
/// local. A bare date means midnight.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset).naive_local());
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    parse_date(raw).map(|d| d.and_time(NaiveTime::MIN))
}

/// Combine a date field and an optional time field.
///
/// Absent or unparseable time means midnight. A date field that carries a
/// whole timestamp is accepted as-is and the time field is ignored.
pub fn combine(
    date: Option<&str>,
    time: Option<&str>,
    offset: FixedOffset,
) -> Option<NaiveDateTime> {
    let date_raw = present(date)?;
    match parse_date(date_raw) {
        Some(day) => {
            let time = present(time).and_then(parse_time).unwrap_or(NaiveTime::MIN);
            Some(day.and_time(time))
        }
        None => parse_timestamp(date_raw, offset),
    }
}

/// `DD/MM/YYYY`
pub fn format_date(dt: &NaiveDateTime) -> String {
    dt.format(DATE_FORMAT).to_string()
}

/// `HH:MM:SS`
pub fn format_time(dt: &NaiveDateTime) -> String {
    dt.format(TIME_FORMAT).to_string()
}

/// `DD/MM/YYYY HH:MM:SS`
pub fn format_local(dt: &NaiveDateTime) -> String {
    format!("{} {}", format_date(dt), format_time(dt))
}

/// `DD/MM HH:MM`, for tight table cells.
pub fn format_short(dt: &NaiveDateTime) -> String {
    dt.format("%d/%m %H:%M").to_string()
}
