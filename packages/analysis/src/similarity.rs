//! Incident similarity graph.
//!
//! Every unordered pair of incidents is scored by how many known attributes
//! they share; pairs scoring at least the threshold are joined by an
//! undirected edge weighted by the score. The pairwise pass is quadratic, so
//! callers sample large inputs down first with [`sample_records`].

use std::sync::Arc;

use crime_graph_incident_models::{IncidentRecord, SecondaryAttribute, known_match};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use crate::AnalysisError;
use crate::graph::{NodeIndex, Undirected, WeightedGraph};
use crate::progress::ProgressCallback;

/// Undirected graph of incidents keyed by incident id.
pub type SimilarityGraph = WeightedGraph<IncidentRecord, Undirected>;

/// Score for matching crime types.
pub const CRIME_TYPE_SCORE: u64 = 3;

/// Score for matching areas.
pub const AREA_SCORE: u64 = 2;

/// Score for each matching secondary attribute.
pub const ATTRIBUTE_SCORE: u64 = 1;

/// Highest score any pair can reach.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_SCORE: u64 =
    CRIME_TYPE_SCORE + AREA_SCORE + ATTRIBUTE_SCORE * SecondaryAttribute::all().len() as u64;

/// Similarity score of two incidents. Unknown values never score.
#[must_use]
pub fn similarity_score(a: &IncidentRecord, b: &IncidentRecord) -> u64 {
    let mut score = 0;

    if known_match(&a.crime_type, &b.crime_type) {
        score += CRIME_TYPE_SCORE;
    }
    if known_match(&a.area, &b.area) {
        score += AREA_SCORE;
    }
    for &attribute in SecondaryAttribute::all() {
        if known_match(a.attribute(attribute), b.attribute(attribute)) {
            score += ATTRIBUTE_SCORE;
        }
    }

    score
}

/// Deterministically samples at most `size` records using `seed`.
///
/// The chosen records keep their relative input order. Inputs no larger than
/// `size` are returned whole.
#[must_use]
pub fn sample_records(records: &[IncidentRecord], size: usize, seed: u64) -> Vec<IncidentRecord> {
    if records.len() <= size {
        return records.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut chosen = rand::seq::index::sample(&mut rng, records.len(), size).into_vec();
    chosen.sort_unstable();

    chosen.into_iter().map(|i| records[i].clone()).collect()
}

/// Builds the similarity graph over `records`.
///
/// Each record becomes a node keyed by its id (later records repeating an
/// id are skipped). Each unordered pair is scored exactly once and an edge
/// is created iff the score is at least `threshold`.
///
/// # Errors
///
/// Returns [`AnalysisError::Graph`] if an edge insertion is rejected, which
/// only happens for a zero `threshold` combined with a zero score.
pub fn build_similarity_graph(
    records: &[IncidentRecord],
    threshold: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<SimilarityGraph, AnalysisError> {
    let mut graph = SimilarityGraph::new();
    let mut nodes: Vec<NodeIndex> = Vec::with_capacity(records.len());

    for record in records {
        if graph.contains_node(&record.id) {
            log::warn!("Duplicate incident id {} skipped", record.id);
            continue;
        }
        nodes.push(graph.add_node(record.id.clone(), record.clone()));
    }

    let n = nodes.len() as u64;
    progress.set_total(n * n.saturating_sub(1) / 2);
    progress.set_message(format!("Scoring {n} incidents"));

    for (i, &a) in nodes.iter().enumerate() {
        for &b in &nodes[i + 1..] {
            let score = similarity_score(graph.node(a), graph.node(b));
            if score >= threshold {
                graph.accumulate_edge(a, b, score)?;
            }
        }
        progress.inc((nodes.len() - i - 1) as u64);
    }

    progress.finish(format!(
        "Similarity graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    ));
    log::info!(
        "Built similarity graph with {} nodes and {} edges (threshold {threshold})",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use crime_graph_incident_models::UNKNOWN;

    use super::*;
    use crate::progress::null_progress;
    use crate::testing::{described_incident, incident};

    #[test]
    fn records_differing_only_in_id_score_maximum() {
        let a = described_incident("1", "ROBBERY", "Central");
        let b = described_incident("2", "ROBBERY", "Central");
        // Crime type 3, area 2, and one for each of four attributes.
        assert_eq!(similarity_score(&a, &b), 9);
        assert_eq!(MAX_SCORE, 9);

        let graph = build_similarity_graph(&[a, b], 3, &null_progress()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight_by_key("1", "2").unwrap().get(), 9);
    }

    #[test]
    fn same_type_and_area_with_unknown_rest_scores_five() {
        let mut a = incident("1", "BURGLARY", "0101", "2022-01-01 08:00");
        let mut b = incident("2", "BURGLARY", "0909", "2022-06-01 20:00");
        a.area = "Pacific".to_string();
        b.area = "Pacific".to_string();

        let graph = build_similarity_graph(&[a, b], 3, &null_progress()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight_by_key("1", "2").unwrap().get(), 5);
    }

    #[test]
    fn unknown_values_contribute_nothing() {
        let mut a = described_incident("1", UNKNOWN, UNKNOWN);
        let mut b = described_incident("2", UNKNOWN, UNKNOWN);
        a.attributes.clear();
        b.attributes.clear();
        assert_eq!(similarity_score(&a, &b), 0);
    }

    #[test]
    fn pairs_below_threshold_get_no_edge() {
        // Area (2) only.
        let a = described_incident("1", "ROBBERY", "Central");
        let mut b = described_incident("2", "BURGLARY", "Central");
        b.attributes.clear();
        assert_eq!(similarity_score(&a, &b), 2);

        // Secondary attributes only (4) still qualify.
        let c = described_incident("3", "VANDALISM", "Pacific");

        let graph = build_similarity_graph(&[a, b, c], 3, &null_progress()).unwrap();
        assert!(graph.edge_weight_by_key("1", "2").is_none());
        assert_eq!(graph.edge_weight_by_key("1", "3").unwrap().get(), 4);
        assert!(graph.edge_weight_by_key("2", "3").is_none());
        for (_, _, weight) in graph.edges() {
            assert!(weight.get() >= 3);
        }
    }

    #[test]
    fn nodes_carry_full_records_and_no_self_loops() {
        let records = vec![
            described_incident("1", "ROBBERY", "Central"),
            described_incident("2", "ROBBERY", "Central"),
            described_incident("3", "ROBBERY", "Central"),
        ];
        let graph = build_similarity_graph(&records, 3, &null_progress()).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        for (idx, key, record) in graph.nodes() {
            assert_eq!(key, record.id);
            assert!(graph.edge_weight(idx, idx).is_none());
        }
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let records = vec![
            described_incident("1", "ROBBERY", "Central"),
            described_incident("1", "ROBBERY", "Central"),
        ];
        let graph = build_similarity_graph(&records, 3, &null_progress()).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn sampling_is_deterministic_and_order_preserving() {
        let records: Vec<_> = (0..50)
            .map(|i| described_incident(&i.to_string(), "ROBBERY", "Central"))
            .collect();

        let first = sample_records(&records, 10, 42);
        let second = sample_records(&records, 10, 42);
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);

        let positions: Vec<usize> = first
            .iter()
            .map(|r| r.id.parse::<usize>().unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sampling_small_input_returns_everything() {
        let records = vec![described_incident("1", "ROBBERY", "Central")];
        assert_eq!(sample_records(&records, 1000, 7), records);
    }
}
