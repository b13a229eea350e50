//! Record selection by area, year, and period.

use std::collections::BTreeMap;

use chrono::Datelike as _;
use crime_graph_analysis_models::PeriodDefinition;
use crime_graph_incident_models::{IncidentRecord, is_known};

/// Keeps records whose area name matches `area`, ignoring case.
#[must_use]
pub fn filter_area(records: &[IncidentRecord], area: &str) -> Vec<IncidentRecord> {
    let area = area.trim();
    records
        .iter()
        .filter(|r| r.area.eq_ignore_ascii_case(area))
        .cloned()
        .collect()
}

/// Keeps records that occurred in `year`.
#[must_use]
pub fn filter_year(records: &[IncidentRecord], year: i32) -> Vec<IncidentRecord> {
    records
        .iter()
        .filter(|r| r.occurred_at.year() == year)
        .cloned()
        .collect()
}

/// Keeps records whose year falls inside `period`.
#[must_use]
pub fn filter_period(records: &[IncidentRecord], period: &PeriodDefinition) -> Vec<IncidentRecord> {
    records
        .iter()
        .filter(|r| period.contains(r.occurred_at.year()))
        .cloned()
        .collect()
}

/// The `n` known areas with the most records, most frequent first. Ties
/// are ordered by name.
#[must_use]
pub fn top_areas(records: &[IncidentRecord], n: usize) -> Vec<String> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| is_known(&r.area)) {
        *counts.entry(record.area.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(area, _)| area.to_string())
        .collect()
}

/// Keeps records in any of `areas`, ignoring case.
#[must_use]
pub fn filter_areas(records: &[IncidentRecord], areas: &[String]) -> Vec<IncidentRecord> {
    records
        .iter()
        .filter(|r| areas.iter().any(|a| r.area.eq_ignore_ascii_case(a.trim())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use crime_graph_incident_models::{Shift, UNKNOWN};

    use super::*;

    fn record(id: &str, area: &str, year: i32) -> IncidentRecord {
        IncidentRecord {
            id: id.to_string(),
            crime_type: "ROBBERY".to_string(),
            district: "0101".to_string(),
            area: area.to_string(),
            occurred_at: NaiveDate::from_ymd_opt(year, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            shift: Shift::Morning,
            latitude: None,
            longitude: None,
            attributes: BTreeMap::new(),
        }
    }

    fn ids(records: &[IncidentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<IncidentRecord> {
        vec![
            record("1", "Central", 2020),
            record("2", "77th Street", 2021),
            record("3", "77th Street", 2023),
            record("4", "Pacific", 2024),
            record("5", UNKNOWN, 2022),
            record("6", UNKNOWN, 2022),
            record("7", UNKNOWN, 2022),
        ]
    }

    #[test]
    fn area_filter_ignores_case() {
        assert_eq!(ids(&filter_area(&sample(), "central")), vec!["1"]);
        assert_eq!(ids(&filter_area(&sample(), " 77TH STREET ")), vec!["2", "3"]);
        assert!(filter_area(&sample(), "Harbor").is_empty());
    }

    #[test]
    fn year_and_period_filters() {
        assert_eq!(ids(&filter_year(&sample(), 2022)), vec!["5", "6", "7"]);

        let recent = PeriodDefinition {
            name: "2023-2024".to_string(),
            from_year: 2023,
            to_year: 2024,
        };
        assert_eq!(ids(&filter_period(&sample(), &recent)), vec!["3", "4"]);
    }

    #[test]
    fn top_areas_skip_unknown_and_break_ties_by_name() {
        assert_eq!(top_areas(&sample(), 2), vec!["77th Street", "Central"]);
        assert_eq!(top_areas(&sample(), 10).len(), 3);
        assert!(top_areas(&[], 5).is_empty());
    }

    #[test]
    fn area_set_filter() {
        let areas = vec!["pacific".to_string(), "Central".to_string()];
        assert_eq!(ids(&filter_areas(&sample(), &areas)), vec!["1", "4"]);
    }
}
