//! Temporal crime-chain graph.
//!
//! Nodes are the most frequent crime types. Within each reporting district,
//! incidents are ordered by time and every later incident that follows an
//! earlier one within the window adds 1 to the edge `earlier type -> later
//! type`. Self-transitions count.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use crime_graph_incident_models::{IncidentRecord, is_known};
use serde::Serialize;

use crate::AnalysisError;
use crate::graph::{Directed, NodeIndex, WeightedGraph};

/// Node data of the chain graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrimeTypeNode {
    /// Number of input records of this crime type.
    pub frequency: u64,
}

/// Directed graph of crime-type transitions keyed by crime-type label.
pub type ChainGraph = WeightedGraph<CrimeTypeNode, Directed>;

/// The `k` most frequent known crime types with their counts.
///
/// Ordered by count descending, then label ascending.
#[must_use]
pub fn top_crime_types(records: &[IncidentRecord], k: usize) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| is_known(&r.crime_type)) {
        *counts.entry(record.crime_type.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(k)
        .map(|(label, count)| (label.to_string(), count))
        .collect()
}

/// Builds the chain graph from `records`.
///
/// Only the `top_k` most frequent crime types take part; every one of them
/// becomes a node even if it never transitions. Records with an unknown
/// district are ignored. For each district the records are sorted by time
/// and each ordered pair `(i, j)` with `0 < t_j - t_i <= window` increments
/// `type_i -> type_j`.
///
/// # Errors
///
/// Returns [`AnalysisError::Graph`] if an edge insertion is rejected.
pub fn build_chain_graph(
    records: &[IncidentRecord],
    top_k: usize,
    window: TimeDelta,
) -> Result<ChainGraph, AnalysisError> {
    let mut graph = ChainGraph::new();

    let top = top_crime_types(records, top_k);
    let mut type_nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();
    for (label, frequency) in &top {
        let idx = graph.add_node(label.clone(), CrimeTypeNode {
            frequency: *frequency,
        });
        type_nodes.insert(label.as_str(), idx);
    }

    let mut by_district: BTreeMap<&str, Vec<(&IncidentRecord, NodeIndex)>> = BTreeMap::new();
    for record in records {
        if !is_known(&record.district) {
            continue;
        }
        if let Some(&idx) = type_nodes.get(record.crime_type.as_str()) {
            by_district
                .entry(record.district.as_str())
                .or_default()
                .push((record, idx));
        }
    }

    for events in by_district.values_mut() {
        events.sort_by_key(|(record, _)| record.occurred_at);

        for (i, &(earlier, from)) in events.iter().enumerate() {
            for &(later, to) in &events[i + 1..] {
                let gap = later.occurred_at - earlier.occurred_at;
                // Sorted by time: every later event is even further away.
                if gap > window {
                    break;
                }
                if gap > TimeDelta::zero() {
                    graph.accumulate_edge(from, to, 1)?;
                }
            }
        }
    }

    log::info!(
        "Built chain graph with {} crime types, {} transitions across {} districts",
        graph.node_count(),
        graph.edge_count(),
        by_district.len()
    );

    Ok(graph)
}
