#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record, shift, and categorical attribute types.
//!
//! Every analysis in the crime-graph system consumes [`IncidentRecord`]s.
//! Categorical values that are missing in the source data are normalized to
//! the [`UNKNOWN`] sentinel, which never counts as a match when two records
//! are compared.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Sentinel for a categorical value that was missing in the source data.
pub const UNKNOWN: &str = "UNKNOWN";

/// Raw values that source files use to mean "no value".
const MISSING_MARKERS: &[&str] = &["", "missing", "n/a", "nan", "null", "unknown"];

/// Normalizes a raw categorical value, mapping empty and placeholder values
/// to [`UNKNOWN`] and trimming whitespace from everything else.
#[must_use]
pub fn normalize_category(raw: Option<&str>) -> String {
    let Some(value) = raw.map(str::trim) else {
        return UNKNOWN.to_string();
    };

    if MISSING_MARKERS
        .iter()
        .any(|marker| value.eq_ignore_ascii_case(marker))
    {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// Returns `true` if the value carries information (is not [`UNKNOWN`]).
#[must_use]
pub fn is_known(value: &str) -> bool {
    value != UNKNOWN
}

/// Returns `true` if both values are equal and known.
///
/// Two unknown values never match.
#[must_use]
pub fn known_match(a: &str, b: &str) -> bool {
    a == b && is_known(a)
}

/// One of the three fixed segments of a day.
///
/// Variants are declared in chronological order, so the derived [`Ord`]
/// matches the order in which shifts occur.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
)]
pub enum Shift {
    /// 06:00 to 11:59
    Morning,
    /// 12:00 to 17:59
    Afternoon,
    /// 18:00 to 05:59
    Night,
}

impl Shift {
    /// Returns all shifts in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Morning, Self::Afternoon, Self::Night]
    }

    /// The shift that starts the day.
    #[must_use]
    pub const fn first() -> Self {
        Self::Morning
    }

    /// The shift that ends the day.
    #[must_use]
    pub const fn last() -> Self {
        Self::Night
    }

    /// Returns the shift immediately following this one within the same day.
    ///
    /// Night has no successor: the day does not wrap around.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Morning => Some(Self::Afternoon),
            Self::Afternoon => Some(Self::Night),
            Self::Night => None,
        }
    }

    /// Returns `true` if `other` immediately follows this shift.
    #[must_use]
    pub fn precedes(self, other: Self) -> bool {
        self.next() == Some(other)
    }

    /// Returns each adjacent `(earlier, later)` pair of shifts in the day.
    #[must_use]
    pub fn adjacent_pairs() -> Vec<(Self, Self)> {
        Self::all()
            .iter()
            .filter_map(|&shift| shift.next().map(|next| (shift, next)))
            .collect()
    }

    /// Classifies a 24-hour `HHMM` time-of-day value.
    ///
    /// Values that cannot be parsed as an integer fall back to
    /// [`Shift::Night`] rather than failing the record.
    #[must_use]
    pub fn from_time_of_day(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map_or(Self::Night, Self::from_hhmm)
    }

    /// Classifies a numeric `HHMM` value (e.g. `930` for 09:30).
    #[must_use]
    pub const fn from_hhmm(hhmm: i64) -> Self {
        if 600 <= hhmm && hhmm < 1200 {
            Self::Morning
        } else if 1200 <= hhmm && hhmm < 1800 {
            Self::Afternoon
        } else {
            Self::Night
        }
    }
}

/// Secondary categorical attributes that contribute to record similarity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryAttribute {
    /// Weapon used, if any.
    Weapon,
    /// Type of premise where the incident occurred.
    Premise,
    /// Victim sex code.
    VictimSex,
    /// Victim descent code.
    VictimDescent,
}

impl SecondaryAttribute {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Weapon,
            Self::Premise,
            Self::VictimSex,
            Self::VictimDescent,
        ]
    }

    /// Human-readable label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weapon => "Weapon",
            Self::Premise => "Premise",
            Self::VictimSex => "Victim sex",
            Self::VictimDescent => "Victim descent",
        }
    }
}

/// A cleaned crime incident.
///
/// Produced by ingestion after coordinate validation and missing-value
/// normalization. Coordinates are optional: records without them still take
/// part in the similarity and chain analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Unique incident identifier from the source (e.g. `DR_NO`).
    pub id: String,
    /// Crime-type label (e.g. `"VEHICLE - STOLEN"`).
    pub crime_type: String,
    /// Reporting district identifier.
    pub district: String,
    /// Patrol area name (e.g. `"Central"`).
    pub area: String,
    /// When the incident occurred.
    pub occurred_at: NaiveDateTime,
    /// Day segment derived from the time of occurrence.
    pub shift: Shift,
    /// Latitude (WGS84), `None` if missing or invalid.
    pub latitude: Option<f64>,
    /// Longitude (WGS84), `None` if missing or invalid.
    pub longitude: Option<f64>,
    /// Secondary categorical attributes. Absent keys read as [`UNKNOWN`].
    #[serde(default)]
    pub attributes: BTreeMap<SecondaryAttribute, String>,
}

impl IncidentRecord {
    /// Returns the value of a secondary attribute, or [`UNKNOWN`] if absent.
    #[must_use]
    pub fn attribute(&self, attribute: SecondaryAttribute) -> &str {
        self.attributes
            .get(&attribute)
            .map_or(UNKNOWN, String::as_str)
    }

    /// Returns `(latitude, longitude)` if both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Calendar date of occurrence.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_missing_markers() {
        assert_eq!(normalize_category(None), UNKNOWN);
        assert_eq!(normalize_category(Some("  ")), UNKNOWN);
        assert_eq!(normalize_category(Some("missing")), UNKNOWN);
        assert_eq!(normalize_category(Some("N/A")), UNKNOWN);
        assert_eq!(normalize_category(Some(" STREET ")), "STREET");
    }

    #[test]
    fn unknown_values_never_match() {
        assert!(!known_match(UNKNOWN, UNKNOWN));
        assert!(known_match("M", "M"));
        assert!(!known_match("M", "F"));
    }

    #[test]
    fn classifies_shift_boundaries() {
        assert_eq!(Shift::from_time_of_day("0600"), Shift::Morning);
        assert_eq!(Shift::from_time_of_day("1159"), Shift::Morning);
        assert_eq!(Shift::from_time_of_day("1200"), Shift::Afternoon);
        assert_eq!(Shift::from_time_of_day("1759"), Shift::Afternoon);
        assert_eq!(Shift::from_time_of_day("1800"), Shift::Night);
        assert_eq!(Shift::from_time_of_day("559"), Shift::Night);
        assert_eq!(Shift::from_time_of_day("1"), Shift::Night);
    }

    #[test]
    fn malformed_time_defaults_to_night() {
        assert_eq!(Shift::from_time_of_day("noon"), Shift::Night);
        assert_eq!(Shift::from_time_of_day(""), Shift::Night);
    }

    #[test]
    fn shifts_chain_within_a_single_day() {
        assert!(Shift::Morning.precedes(Shift::Afternoon));
        assert!(Shift::Afternoon.precedes(Shift::Night));
        assert!(!Shift::Night.precedes(Shift::Morning));
        assert!(!Shift::Morning.precedes(Shift::Night));
        assert!(!Shift::Morning.precedes(Shift::Morning));
        assert_eq!(
            Shift::adjacent_pairs(),
            vec![
                (Shift::Morning, Shift::Afternoon),
                (Shift::Afternoon, Shift::Night)
            ]
        );
    }

    #[test]
    fn shift_displays_its_variant_name() {
        assert_eq!(Shift::Morning.to_string(), "Morning");
        assert_eq!(format!("{}|{}", "0101", Shift::Night), "0101|Night");
    }

    #[test]
    fn missing_attribute_reads_as_unknown() {
        let record = IncidentRecord {
            id: "1".to_string(),
            crime_type: "ROBBERY".to_string(),
            district: "0101".to_string(),
            area: "Central".to_string(),
            occurred_at: NaiveDate::from_ymd_opt(2022, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            shift: Shift::Morning,
            latitude: Some(34.05),
            longitude: None,
            attributes: BTreeMap::new(),
        };
        assert_eq!(record.attribute(SecondaryAttribute::Weapon), UNKNOWN);
        assert!(record.coordinates().is_none());
    }
}
