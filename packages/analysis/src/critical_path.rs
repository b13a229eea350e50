//! Critical path search over the shift graph.
//!
//! Traversing an edge of weight `w` costs `1 / w`, so heavily travelled
//! transitions are cheap. [`shortest_paths`] is a single-source search that
//! settles one node per step: the unsettled node with the lowest finite cost,
//! ties going to the node inserted into the graph first. The search stops
//! once no unsettled node is reachable.
//!
//! [`find_critical_path`] runs that search from every first-shift node and
//! keeps the cheapest last-shift destination across all runs.

use crime_graph_analysis_models::CriticalPath;
use crime_graph_incident_models::Shift;

use crate::graph::{EdgeType, NodeIndex, WeightedGraph};
use crate::shift_graph::ShiftGraph;

/// Search state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unvisited,
    Frontier,
    Settled,
}

/// Back-references from each node to the node it was reached from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredecessorMap {
    predecessors: Vec<Option<NodeIndex>>,
}

impl PredecessorMap {
    /// Creates a map with no predecessors for `node_count` nodes.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            predecessors: vec![None; node_count],
        }
    }

    /// Records `predecessor` as the node `node` was reached from.
    ///
    /// # Panics
    ///
    /// Panics if `node` is outside the map.
    pub fn set(&mut self, node: NodeIndex, predecessor: NodeIndex) {
        self.predecessors[node.index()] = Some(predecessor);
    }

    /// The node `node` was reached from, if any.
    #[must_use]
    pub fn get(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.predecessors.get(node.index()).copied().flatten()
    }

    /// Number of nodes covered by the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    /// Returns `true` if the map covers no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }
}

/// Result of one single-source search.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: NodeIndex,
    costs: Vec<f64>,
    predecessors: PredecessorMap,
}

impl ShortestPaths {
    /// Cost of the cheapest path to `node`, `f64::INFINITY` if unreachable.
    #[must_use]
    pub fn cost(&self, node: NodeIndex) -> f64 {
        self.costs.get(node.index()).copied().unwrap_or(f64::INFINITY)
    }

    /// Predecessors recorded by the search.
    #[must_use]
    pub const fn predecessors(&self) -> &PredecessorMap {
        &self.predecessors
    }

    /// Node sequence from the source to `destination`, empty if unreachable.
    #[must_use]
    pub fn path_to(&self, destination: NodeIndex) -> Vec<NodeIndex> {
        reconstruct_path(&self.predecessors, self.source, destination)
    }
}

/// Runs the inverse-weight single-source search from `source`.
///
/// # Panics
///
/// Panics if `source` does not belong to `graph`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn shortest_paths<N, K: EdgeType>(
    graph: &WeightedGraph<N, K>,
    source: NodeIndex,
) -> ShortestPaths {
    let n = graph.node_count();
    let mut costs = vec![f64::INFINITY; n];
    let mut states = vec![NodeState::Unvisited; n];
    let mut predecessors = PredecessorMap::new(n);

    costs[source.index()] = 0.0;
    states[source.index()] = NodeState::Frontier;

    loop {
        // Linear scan in insertion order; strict `<` keeps the first of
        // equally cheap nodes.
        let mut current: Option<NodeIndex> = None;
        for idx in graph.node_indices() {
            if states[idx.index()] == NodeState::Settled || costs[idx.index()].is_infinite() {
                continue;
            }
            if current.is_none_or(|best| costs[idx.index()] < costs[best.index()]) {
                current = Some(idx);
            }
        }

        let Some(current) = current else {
            break;
        };
        states[current.index()] = NodeState::Settled;

        for (neighbor, weight) in graph.neighbors(current) {
            if states[neighbor.index()] == NodeState::Settled {
                continue;
            }
            let candidate = costs[current.index()] + 1.0 / weight.get() as f64;
            if candidate < costs[neighbor.index()] {
                costs[neighbor.index()] = candidate;
                states[neighbor.index()] = NodeState::Frontier;
                predecessors.set(neighbor, current);
            }
        }
    }

    ShortestPaths {
        source,
        costs,
        predecessors,
    }
}

/// Walks predecessors back from `destination` to `origin`.
///
/// Returns the forward node sequence, or an empty sequence if the walk hits
/// a node without a predecessor before reaching `origin`. A destination equal
/// to the origin yields a single-node path.
#[must_use]
pub fn reconstruct_path(
    predecessors: &PredecessorMap,
    origin: NodeIndex,
    destination: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = vec![destination];
    let mut current = destination;

    while current != origin {
        // A well-formed map cannot be longer than the node count.
        if path.len() > predecessors.len() {
            return Vec::new();
        }
        let Some(previous) = predecessors.get(current) else {
            return Vec::new();
        };
        path.push(previous);
        current = previous;
    }

    path.reverse();
    path
}

/// Finds the lowest-cost path from any first-shift node to any last-shift
/// node of the shift graph.
///
/// Sources and destinations are visited in node insertion order and only a
/// strictly cheaper destination replaces the current best, so the earliest
/// inserted pair wins ties. Returns [`CriticalPath::none`] when the graph has
/// no first-shift or no last-shift nodes, or when no destination is
/// reachable.
#[must_use]
pub fn find_critical_path(graph: &ShiftGraph) -> CriticalPath {
    let nodes_in = |shift: Shift| -> Vec<NodeIndex> {
        graph
            .nodes()
            .filter(|(_, _, node)| node.shift == shift)
            .map(|(idx, _, _)| idx)
            .collect()
    };

    let sources = nodes_in(Shift::first());
    let destinations = nodes_in(Shift::last());

    if sources.is_empty() || destinations.is_empty() {
        log::info!(
            "No critical path: {} {} nodes, {} {} nodes",
            sources.len(),
            Shift::first(),
            destinations.len(),
            Shift::last()
        );
        return CriticalPath::none();
    }

    let mut best = CriticalPath::none();

    for &source in &sources {
        let search = shortest_paths(graph, source);
        for &destination in &destinations {
            let cost = search.cost(destination);
            if cost < best.cost {
                let path = search.path_to(destination);
                if path.is_empty() {
                    continue;
                }
                best = CriticalPath {
                    nodes: path.iter().map(|&idx| graph.key(idx).to_string()).collect(),
                    cost,
                };
            }
        }
    }

    if best.is_empty() {
        log::info!("No critical path: no {} node is reachable", Shift::last());
    } else {
        log::debug!("Critical path {:?} with cost {}", best.nodes, best.cost);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Directed;
    use crate::shift_graph::{ShiftNode, shift_node_key};

    fn add(graph: &mut ShiftGraph, district: &str, shift: Shift) -> NodeIndex {
        graph.add_node(shift_node_key(district, shift), ShiftNode {
            district: district.to_string(),
            shift,
            position: (0.0, 0.0),
        })
    }

    #[test]
    fn inverse_weight_path_cost() {
        let mut graph = ShiftGraph::new();
        let m1 = add(&mut graph, "M1", Shift::Morning);
        let a1 = add(&mut graph, "A1", Shift::Afternoon);
        let n1 = add(&mut graph, "N1", Shift::Night);
        graph.accumulate_edge(m1, a1, 2).unwrap();
        graph.accumulate_edge(a1, n1, 4).unwrap();

        let path = find_critical_path(&graph);
        assert_eq!(path.nodes, vec!["M1|Morning", "A1|Afternoon", "N1|Night"]);
        assert!((path.cost - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn prefers_heavier_transitions() {
        let mut graph = ShiftGraph::new();
        let m = add(&mut graph, "M", Shift::Morning);
        let light = add(&mut graph, "L", Shift::Afternoon);
        let heavy = add(&mut graph, "H", Shift::Afternoon);
        let n = add(&mut graph, "N", Shift::Night);
        graph.accumulate_edge(m, light, 1).unwrap();
        graph.accumulate_edge(light, n, 1).unwrap();
        graph.accumulate_edge(m, heavy, 5).unwrap();
        graph.accumulate_edge(heavy, n, 5).unwrap();

        let path = find_critical_path(&graph);
        assert_eq!(path.nodes, vec!["M|Morning", "H|Afternoon", "N|Night"]);
        assert!((path.cost - 0.4).abs() < 1e-12);

        // Any hand-computed path is at least as expensive.
        assert!(path.cost <= 1.0 / 1.0 + 1.0 / 1.0);
    }

    #[test]
    fn best_is_taken_across_all_sources() {
        let mut graph = ShiftGraph::new();
        let m1 = add(&mut graph, "M1", Shift::Morning);
        let m2 = add(&mut graph, "M2", Shift::Morning);
        let a = add(&mut graph, "A", Shift::Afternoon);
        let n = add(&mut graph, "N", Shift::Night);
        graph.accumulate_edge(m1, a, 1).unwrap();
        graph.accumulate_edge(m2, a, 10).unwrap();
        graph.accumulate_edge(a, n, 10).unwrap();

        let path = find_critical_path(&graph);
        assert_eq!(path.nodes, vec!["M2|Morning", "A|Afternoon", "N|Night"]);
        assert!((path.cost - 0.2).abs() < 1e-12);
    }

    #[test]
    fn equal_costs_keep_first_inserted_pair() {
        let mut graph = ShiftGraph::new();
        let m1 = add(&mut graph, "M1", Shift::Morning);
        let m2 = add(&mut graph, "M2", Shift::Morning);
        let a1 = add(&mut graph, "A1", Shift::Afternoon);
        let a2 = add(&mut graph, "A2", Shift::Afternoon);
        let n1 = add(&mut graph, "N1", Shift::Night);
        let n2 = add(&mut graph, "N2", Shift::Night);
        graph.accumulate_edge(m2, a2, 2).unwrap();
        graph.accumulate_edge(a2, n2, 2).unwrap();
        graph.accumulate_edge(m1, a1, 2).unwrap();
        graph.accumulate_edge(a1, n1, 2).unwrap();

        let path = find_critical_path(&graph);
        assert_eq!(path.nodes, vec!["M1|Morning", "A1|Afternoon", "N1|Night"]);
    }

    #[test]
    fn equal_cost_routes_resolve_by_settle_order() {
        // Two routes of cost 1.0 to N; A1 settles before A2, so it becomes
        // the predecessor and A2's equal candidate does not replace it.
        let mut graph = ShiftGraph::new();
        let m = add(&mut graph, "M", Shift::Morning);
        let a1 = add(&mut graph, "A1", Shift::Afternoon);
        let a2 = add(&mut graph, "A2", Shift::Afternoon);
        let n = add(&mut graph, "N", Shift::Night);
        graph.accumulate_edge(m, a2, 2).unwrap();
        graph.accumulate_edge(m, a1, 2).unwrap();
        graph.accumulate_edge(a1, n, 2).unwrap();
        graph.accumulate_edge(a2, n, 2).unwrap();

        let search = shortest_paths(&graph, m);
        assert_eq!(search.predecessors().get(n), Some(a1));
        assert_eq!(search.path_to(n), vec![m, a1, n]);
    }

    #[test]
    fn disconnected_graph_reports_no_path() {
        let mut graph = ShiftGraph::new();
        let m = add(&mut graph, "M", Shift::Morning);
        let a = add(&mut graph, "A", Shift::Afternoon);
        add(&mut graph, "N", Shift::Night);
        graph.accumulate_edge(m, a, 3).unwrap();

        let path = find_critical_path(&graph);
        assert!(path.is_empty());
        assert!(path.cost.is_infinite());
    }

    #[test]
    fn missing_first_or_last_shift_reports_no_path() {
        let mut graph = ShiftGraph::new();
        let a = add(&mut graph, "A", Shift::Afternoon);
        let n = add(&mut graph, "N", Shift::Night);
        graph.accumulate_edge(a, n, 3).unwrap();
        assert_eq!(find_critical_path(&graph), CriticalPath::none());

        assert_eq!(find_critical_path(&ShiftGraph::new()), CriticalPath::none());
    }

    #[test]
    fn search_costs_are_sums_of_inverse_weights() {
        let mut graph: WeightedGraph<(), Directed> = WeightedGraph::new();
        let a = graph.add_node("a", ());
        let b = graph.add_node("b", ());
        let c = graph.add_node("c", ());
        let d = graph.add_node("d", ());
        graph.accumulate_edge(a, b, 4).unwrap();
        graph.accumulate_edge(b, c, 8).unwrap();
        graph.accumulate_edge(a, c, 2).unwrap();

        let search = shortest_paths(&graph, a);
        assert!(search.cost(a).abs() < f64::EPSILON);
        assert!((search.cost(b) - 0.25).abs() < f64::EPSILON);
        assert!((search.cost(c) - 0.375).abs() < f64::EPSILON);
        assert!(search.cost(d).is_infinite());
        assert_eq!(search.path_to(c), vec![a, b, c]);
        assert!(search.path_to(d).is_empty());
    }

    #[test]
    fn reconstruct_single_node_when_origin_is_destination() {
        let predecessors = PredecessorMap::new(3);
        let origin = NodeIndex::new(1);
        assert_eq!(reconstruct_path(&predecessors, origin, origin), vec![origin]);
    }

    #[test]
    fn reconstruct_disconnected_destination_is_empty() {
        let mut predecessors = PredecessorMap::new(4);
        let [a, b, c, d] = [0, 1, 2, 3].map(NodeIndex::new);
        predecessors.set(b, a);
        predecessors.set(d, c);

        assert_eq!(reconstruct_path(&predecessors, a, b), vec![a, b]);
        assert!(reconstruct_path(&predecessors, a, d).is_empty());
        assert!(reconstruct_path(&predecessors, a, c).is_empty());
    }

    #[test]
    fn reconstruct_stops_on_cyclic_map() {
        let mut predecessors = PredecessorMap::new(3);
        let [a, b, c] = [0, 1, 2].map(NodeIndex::new);
        predecessors.set(b, c);
        predecessors.set(c, b);
        assert!(reconstruct_path(&predecessors, a, b).is_empty());
    }
}
