//! Record builders shared by the unit tests of this crate.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use crime_graph_incident_models::{IncidentRecord, SecondaryAttribute, Shift, UNKNOWN};

/// Builds a record with every secondary attribute unknown and no
/// coordinates. `at` is `"YYYY-MM-DD HH:MM"`.
pub fn incident(id: &str, crime_type: &str, district: &str, at: &str) -> IncidentRecord {
    let occurred_at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap();
    let hhmm = occurred_at.format("%H%M").to_string();
    IncidentRecord {
        id: id.to_string(),
        crime_type: crime_type.to_string(),
        district: district.to_string(),
        area: UNKNOWN.to_string(),
        occurred_at,
        shift: Shift::from_time_of_day(&hhmm),
        latitude: None,
        longitude: None,
        attributes: BTreeMap::new(),
    }
}

/// Same as [`incident`] with every secondary attribute set to a known value.
pub fn described_incident(id: &str, crime_type: &str, area: &str) -> IncidentRecord {
    let mut record = incident(id, crime_type, "0101", "2022-01-01 08:00");
    record.area = area.to_string();
    record.attributes = BTreeMap::from([
        (SecondaryAttribute::Weapon, "STRONG-ARM".to_string()),
        (SecondaryAttribute::Premise, "STREET".to_string()),
        (SecondaryAttribute::VictimSex, "F".to_string()),
        (SecondaryAttribute::VictimDescent, "H".to_string()),
    ]);
    record
}

/// Gives `record` its own coordinates.
pub fn located(mut record: IncidentRecord, lat: f64, lon: f64) -> IncidentRecord {
    record.latitude = Some(lat);
    record.longitude = Some(lon);
    record
}
