#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate validation, great-circle distance, and district centroids.
//!
//! Reporting districts are aggregated to the mean position of their
//! incidents. Spatially-dependent analyses compare districts through those
//! centroids using the haversine distance in kilometres.

use std::collections::BTreeMap;

use crime_graph_incident_models::{IncidentRecord, is_known};
use geo::{Distance, Haversine, Point};

/// Validates a coordinate pair. Returns `None` if either component is out of
/// range, not finite, or exactly zero (the source placeholder for "no
/// location").
#[must_use]
pub fn validate_lat_lon(lat: f64, lon: f64) -> Option<(f64, f64)> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    if lat == 0.0 || lon == 0.0 {
        return None;
    }
    Some((lat, lon))
}

/// Great-circle distance between two `(lat, lon)` positions in kilometres.
#[must_use]
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let origin = Point::new(a.1, a.0);
    let destination = Point::new(b.1, b.0);
    Haversine.distance(origin, destination) / 1000.0
}

/// Mean `(lat, lon)` of every known reporting district that has at least
/// one incident with coordinates.
///
/// Districts whose incidents all lack coordinates are absent, as is the
/// unknown district, so any spatial comparison involving them fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictCentroids {
    centroids: BTreeMap<String, (f64, f64)>,
}

impl DistrictCentroids {
    /// Aggregates incident coordinates per district.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[IncidentRecord]) -> Self {
        let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
        let mut skipped = 0_usize;

        for record in records {
            if !is_known(&record.district) {
                skipped += 1;
                continue;
            }
            let Some((lat, lon)) = record.coordinates() else {
                skipped += 1;
                continue;
            };
            let entry = sums.entry(record.district.as_str()).or_insert((0.0, 0.0, 0));
            entry.0 += lat;
            entry.1 += lon;
            entry.2 += 1;
        }

        if skipped > 0 {
            log::debug!(
                "{skipped} records without coordinates or district excluded from district centroids"
            );
        }

        let centroids = sums
            .into_iter()
            .map(|(district, (lat, lon, count))| {
                let n = count as f64;
                (district.to_string(), (lat / n, lon / n))
            })
            .collect();

        Self { centroids }
    }

    /// Returns the centroid of a district, if known.
    #[must_use]
    pub fn get(&self, district: &str) -> Option<(f64, f64)> {
        self.centroids.get(district).copied()
    }

    /// Distance between two district centroids in kilometres, or `None` if
    /// either district has no known centroid.
    #[must_use]
    pub fn distance_km(&self, a: &str, b: &str) -> Option<f64> {
        Some(haversine_km(self.get(a)?, self.get(b)?))
    }

    /// Returns `true` if both districts have centroids no further apart
    /// than `threshold_km`.
    #[must_use]
    pub fn within(&self, a: &str, b: &str, threshold_km: f64) -> bool {
        self.distance_km(a, b)
            .is_some_and(|distance| distance <= threshold_km)
    }

    /// Iterates districts and their centroids, ordered by district id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.centroids
            .iter()
            .map(|(district, &position)| (district.as_str(), position))
    }

    /// Number of districts with a known centroid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    /// Returns `true` if no district has a known centroid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

impl FromIterator<(String, (f64, f64))> for DistrictCentroids {
    fn from_iter<T: IntoIterator<Item = (String, (f64, f64))>>(iter: T) -> Self {
        Self {
            centroids: iter.into_iter().collect(),
        }
    }
}
