//! Spatial shift-transition graph.
//!
//! Nodes are `(district, shift)` pairs for every district with a known
//! centroid. For each calendar day and each pair of adjacent shifts, every
//! incident in the earlier shift is matched against every incident in the
//! later shift; if their districts' centroids are within the proximity
//! threshold the edge `district_a|early -> district_b|late` gains the chain
//! weight of `type_a -> type_b`, or 1 when the chain graph has no such edge.
//!
//! Night never links to the next day's Morning: each day is searched on its
//! own.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crime_graph_geography::DistrictCentroids;
use crime_graph_incident_models::{IncidentRecord, Shift};
use serde::Serialize;

use crate::AnalysisError;
use crate::chain::ChainGraph;
use crate::graph::{Directed, NodeIndex, WeightedGraph};

/// Horizontal layout distance between consecutive districts.
pub const LAYOUT_DISTRICT_SPACING: f64 = 1.5;

/// Weight added for a proximate transition with no chain history.
pub const FLOOR_WEIGHT: u64 = 1;

/// Node data of the shift graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftNode {
    /// Reporting district id.
    pub district: String,
    /// Day segment.
    pub shift: Shift,
    /// Layout position `(x, y)` for renderers. Not used by any analysis.
    pub position: (f64, f64),
}

/// Directed graph of `(district, shift)` transitions keyed by
/// `"{district}|{shift}"`.
pub type ShiftGraph = WeightedGraph<ShiftNode, Directed>;

/// Composite node key for a district and shift.
#[must_use]
pub fn shift_node_key(district: &str, shift: Shift) -> String {
    format!("{district}|{shift}")
}

/// Vertical layout offset that stacks shifts in rows.
const fn layout_offset(shift: Shift) -> f64 {
    match shift {
        Shift::Morning => 30.0,
        Shift::Afternoon => 15.0,
        Shift::Night => 0.0,
    }
}

/// Builds the shift graph.
///
/// # Errors
///
/// Returns [`AnalysisError::Graph`] if an edge insertion is rejected.
#[allow(clippy::cast_precision_loss)]
pub fn build_shift_graph(
    records: &[IncidentRecord],
    centroids: &DistrictCentroids,
    chain: &ChainGraph,
    proximity_km: f64,
) -> Result<ShiftGraph, AnalysisError> {
    let mut graph = ShiftGraph::new();
    let mut node_of: BTreeMap<(&str, Shift), NodeIndex> = BTreeMap::new();

    for (i, (district, (lat, lon))) in centroids.iter().enumerate() {
        for &shift in Shift::all() {
            let position = (
                LAYOUT_DISTRICT_SPACING.mul_add(i as f64, lon),
                lat + layout_offset(shift),
            );
            let idx = graph.add_node(shift_node_key(district, shift), ShiftNode {
                district: district.to_string(),
                shift,
                position,
            });
            node_of.insert((district, shift), idx);
        }
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<&IncidentRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date()).or_default().push(record);
    }

    let mut within_cache: BTreeMap<(&str, &str), bool> = BTreeMap::new();
    let mut skipped = 0_u64;

    for day in by_date.values() {
        for (early_shift, late_shift) in Shift::adjacent_pairs() {
            let early = day.iter().filter(|r| r.shift == early_shift);

            for first in early {
                let Some(&from) = node_of.get(&(first.district.as_str(), early_shift)) else {
                    skipped += 1;
                    continue;
                };

                for second in day.iter().filter(|r| r.shift == late_shift) {
                    let Some(&to) = node_of.get(&(second.district.as_str(), late_shift)) else {
                        continue;
                    };

                    let near = *within_cache
                        .entry((first.district.as_str(), second.district.as_str()))
                        .or_insert_with(|| {
                            centroids.within(&first.district, &second.district, proximity_km)
                        });
                    if !near {
                        continue;
                    }

                    let weight = chain
                        .edge_weight_by_key(&first.crime_type, &second.crime_type)
                        .map_or(FLOOR_WEIGHT, std::num::NonZeroU64::get);
                    graph.accumulate_edge(from, to, weight)?;
                }
            }
        }
    }

    if skipped > 0 {
        log::debug!("{skipped} incidents in districts without coordinates skipped");
    }
    log::info!(
        "Built shift graph with {} nodes and {} edges over {} days",
        graph.node_count(),
        graph.edge_count(),
        by_date.len()
    );

    Ok(graph)
}
