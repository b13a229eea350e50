//! Field parsing for incident files.
//!
//! Dates, times of day, and coordinates arrive as loosely formatted text.
//! Every parser here returns `None` rather than failing so that one bad
//! field only affects the record it belongs to.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use crime_graph_geography::validate_lat_lon;

/// Date-time layouts seen in the `DATE OCC` column.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Date-only layouts seen in the `DATE OCC` column.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Parses the calendar date of an occurrence. Any time-of-day component is
/// discarded (the source fills it with midnight).
#[must_use]
pub fn parse_occurrence_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        })
}

/// Parses a 24-hour `HHMM` time of day (`"930"` is 09:30).
#[must_use]
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let value: u32 = s.trim().parse().ok()?;
    NaiveTime::from_hms_opt(value / 100, value % 100, 0)
}

/// Parses a single coordinate component.
///
/// Placeholders (`missing`, `N/A`, empty) yield `None`. A value with more
/// than one `.` keeps the first one and joins the remaining digits, so
/// `"34.05.12"` reads as `34.0512`.
#[must_use]
pub fn parse_coordinate(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("missing") || s.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let repaired = match s.split_once('.') {
        Some((whole, fraction)) if fraction.contains('.') => {
            format!("{whole}.{}", fraction.replace('.', ""))
        }
        _ => s.to_string(),
    };

    repaired.parse::<f64>().ok()
}

/// Parses and validates a latitude/longitude pair. Returns `None` if either
/// is missing, unparseable, out of range, or zero.
#[must_use]
pub fn parse_lat_lon(lat: Option<&str>, lon: Option<&str>) -> Option<(f64, f64)> {
    let latitude = parse_coordinate(lat?)?;
    let longitude = parse_coordinate(lon?)?;
    validate_lat_lon(latitude, longitude)
}
