//! Reporting on partitions produced by external community detection.
//!
//! Community detection itself runs outside this crate; it receives the
//! similarity graph (edge weights under
//! [`crime_graph_analysis_models::WEIGHT_KEY`]) and hands back a
//! [`Partition`]. This module scores that partition and describes what each
//! community has in common.

use std::collections::{BTreeMap, BTreeSet};

use crime_graph_analysis_models::{
    AttributeBreakdown, CommunityProfile, GraphSummary, Partition, ValueShare,
};
use crime_graph_incident_models::{IncidentRecord, SecondaryAttribute, is_known};

use crate::AnalysisError;
use crate::graph::{EdgeType, WeightedGraph};
use crate::similarity::SimilarityGraph;

/// Number of values listed per attribute in a community profile.
const TOP_VALUES: usize = 3;

fn community_of<N, K: EdgeType>(
    partition: &Partition,
    graph: &WeightedGraph<N, K>,
    key: &str,
) -> Result<u32, AnalysisError> {
    partition
        .get(key)
        .copied()
        .ok_or_else(|| AnalysisError::Partition {
            message: format!(
                "node {key} of a {}-node graph has no community",
                graph.node_count()
            ),
        })
}

/// Weighted Newman modularity of `partition` over an undirected graph.
///
/// `Q = sum_c [ L_c / m - (d_c / 2m)^2 ]` where `m` is the total edge
/// weight, `L_c` the weight inside community `c` and `d_c` the summed
/// weighted degree of its members.
///
/// # Errors
///
/// Returns [`AnalysisError::Partition`] if a node has no community or the
/// graph has no edges (modularity is undefined).
#[allow(clippy::cast_precision_loss)]
pub fn modularity<N, K: EdgeType>(
    partition: &Partition,
    graph: &WeightedGraph<N, K>,
) -> Result<f64, AnalysisError> {
    let total = graph.total_weight() as f64;
    if total == 0.0 {
        return Err(AnalysisError::Partition {
            message: "modularity is undefined for a graph without edges".to_string(),
        });
    }

    let mut internal: BTreeMap<u32, f64> = BTreeMap::new();
    let mut degree: BTreeMap<u32, f64> = BTreeMap::new();

    for (idx, key, _) in graph.nodes() {
        let community = community_of(partition, graph, key)?;
        *degree.entry(community).or_default() += graph.weighted_degree(idx) as f64;
    }

    for (from, to, weight) in graph.edges() {
        let a = community_of(partition, graph, graph.key(from))?;
        let b = community_of(partition, graph, graph.key(to))?;
        if a == b {
            *internal.entry(a).or_default() += weight.get() as f64;
        }
    }

    Ok(degree
        .iter()
        .map(|(community, &d)| {
            let inside = internal.get(community).copied().unwrap_or(0.0);
            (d / (2.0 * total)).mul_add(-(d / (2.0 * total)), inside / total)
        })
        .sum())
}

fn breakdown<'a>(
    label: &str,
    members: &[&'a IncidentRecord],
    value: impl Fn(&'a IncidentRecord) -> &'a str,
) -> AttributeBreakdown {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &member in members {
        let v = value(member);
        if is_known(v) {
            *counts.entry(v).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    #[allow(clippy::cast_precision_loss)]
    let top_values = ranked
        .into_iter()
        .take(TOP_VALUES)
        .map(|(v, count)| ValueShare {
            value: v.to_string(),
            count,
            share: count as f64 / members.len() as f64,
        })
        .collect();

    AttributeBreakdown {
        label: label.to_string(),
        top_values,
    }
}

/// Describes each community: its size and the most common known values of
/// every incident attribute. Communities are ordered by id.
///
/// # Errors
///
/// Returns [`AnalysisError::Partition`] if a graph node has no community.
pub fn profile_communities(
    partition: &Partition,
    graph: &SimilarityGraph,
) -> Result<Vec<CommunityProfile>, AnalysisError> {
    let mut members: BTreeMap<u32, Vec<&IncidentRecord>> = BTreeMap::new();
    for (_, key, record) in graph.nodes() {
        let community = community_of(partition, graph, key)?;
        members.entry(community).or_default().push(record);
    }

    let profiles = members
        .into_iter()
        .map(|(community, records)| {
            let mut attributes = vec![
                breakdown("Crime type", &records, |r| r.crime_type.as_str()),
                breakdown("Area", &records, |r| r.area.as_str()),
            ];
            for &attribute in SecondaryAttribute::all() {
                attributes.push(breakdown(attribute.label(), &records, move |r| {
                    r.attribute(attribute)
                }));
            }
            CommunityProfile {
                community,
                size: records.len(),
                attributes,
            }
        })
        .collect();

    Ok(profiles)
}

/// Node, edge, and density statistics of a graph plus the modularity of an
/// optional partition.
///
/// # Errors
///
/// Returns [`AnalysisError::Partition`] if the partition does not cover the
/// graph. A partition of an edgeless graph yields no modularity rather than
/// an error.
pub fn summarize<N, K: EdgeType>(
    name: &str,
    graph: &WeightedGraph<N, K>,
    partition: Option<&Partition>,
) -> Result<GraphSummary, AnalysisError> {
    let modularity = match partition {
        Some(partition) if graph.edge_count() > 0 => Some(modularity(partition, graph)?),
        _ => None,
    };

    Ok(GraphSummary {
        name: name.to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        density: graph.density(),
        modularity,
    })
}

/// Number of distinct communities in a partition.
#[must_use]
pub fn community_count(partition: &Partition) -> usize {
    partition.values().collect::<BTreeSet<_>>().len()
}
