//! String-keyed `petgraph` graph with accumulating edge weights.
//!
//! Every builder in this crate produces a [`WeightedGraph`]: a
//! [`petgraph::Graph`] whose nodes carry a unique string key next to their
//! data. Node indices follow insertion order, which is the stable ordering
//! used for deterministic tie-breaking. Edge weights are [`EdgeWeight`]s
//! (`NonZeroU64`) and the only way to change one is
//! [`WeightedGraph::accumulate_edge`], which adds to the existing value and
//! rejects a zero amount, so a zero or shrinking weight cannot be stored.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use crime_graph_analysis_models::{NodeLinkEdge, NodeLinkGraph, NodeLinkNode};
use petgraph::Graph;
use petgraph::graph::NodeIndices;
use petgraph::visit::EdgeRef as _;

pub use petgraph::graph::NodeIndex;
pub use petgraph::{Directed, EdgeType, Undirected};

use crate::GraphError;

/// Accumulated weight of an edge. Always at least 1.
pub type EdgeWeight = NonZeroU64;

#[derive(Debug, Clone)]
struct KeyedNode<N> {
    key: String,
    data: N,
}

/// A graph over string-keyed nodes carrying data of type `N`.
///
/// `K` is [`Directed`] or [`Undirected`]; undirected graphs reject
/// self-loops.
#[derive(Debug, Clone)]
pub struct WeightedGraph<N, K: EdgeType> {
    inner: Graph<KeyedNode<N>, EdgeWeight, K>,
    index: BTreeMap<String, NodeIndex>,
}

impl<N, K: EdgeType> Default for WeightedGraph<N, K> {
    fn default() -> Self {
        Self {
            inner: Graph::default(),
            index: BTreeMap::new(),
        }
    }
}

impl<N, K: EdgeType> WeightedGraph<N, K> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this graph's edges are directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        K::is_directed()
    }

    /// Adds a node, returning its index.
    ///
    /// If a node with the same key already exists its index is returned and
    /// the existing data is kept.
    pub fn add_node(&mut self, key: impl Into<String>, data: N) -> NodeIndex {
        let key = key.into();
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }

        let idx = self.inner.add_node(KeyedNode {
            key: key.clone(),
            data,
        });
        self.index.insert(key, idx);
        idx
    }

    /// Looks up a node by key.
    #[must_use]
    pub fn node_index(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Returns `true` if a node with this key exists.
    #[must_use]
    pub fn contains_node(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Key of a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn key(&self, idx: NodeIndex) -> &str {
        &self.inner[idx].key
    }

    /// Data of a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &N {
        &self.inner[idx].data
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges. An undirected edge counts once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Node indices in insertion order.
    pub fn node_indices(&self) -> NodeIndices {
        self.inner.node_indices()
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &str, &N)> {
        self.inner
            .node_indices()
            .map(|idx| (idx, self.inner[idx].key.as_str(), &self.inner[idx].data))
    }

    /// Adds `amount` to the weight of the edge `from -> to`, creating the
    /// edge if it does not exist. Returns the new weight.
    ///
    /// # Errors
    ///
    /// * [`GraphError::ZeroWeight`] if `amount` is zero.
    /// * [`GraphError::SelfLoop`] for `from == to` in an undirected graph.
    /// * [`GraphError::UnknownNode`] if either index is not in this graph.
    pub fn accumulate_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        amount: u64,
    ) -> Result<EdgeWeight, GraphError> {
        self.check_index(from)?;
        self.check_index(to)?;

        let Some(amount) = NonZeroU64::new(amount) else {
            return Err(GraphError::ZeroWeight {
                from: self.key(from).to_string(),
                to: self.key(to).to_string(),
            });
        };

        if !K::is_directed() && from == to {
            return Err(GraphError::SelfLoop {
                node: self.key(from).to_string(),
            });
        }

        if let Some(edge) = self.inner.find_edge(from, to) {
            let weight = &mut self.inner[edge];
            *weight = weight.saturating_add(amount.get());
            Ok(*weight)
        } else {
            self.inner.add_edge(from, to, amount);
            Ok(amount)
        }
    }

    fn check_index(&self, idx: NodeIndex) -> Result<(), GraphError> {
        if self.inner.node_weight(idx).is_some() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode {
                key: format!("#{}", idx.index()),
            })
        }
    }

    /// Weight of the edge `from -> to`, if present.
    #[must_use]
    pub fn edge_weight(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeWeight> {
        if self.inner.node_weight(from).is_none() || self.inner.node_weight(to).is_none() {
            return None;
        }
        self.inner
            .find_edge(from, to)
            .map(|edge| self.inner[edge])
    }

    /// Weight of the edge between two nodes looked up by key.
    #[must_use]
    pub fn edge_weight_by_key(&self, from: &str, to: &str) -> Option<EdgeWeight> {
        self.edge_weight(self.node_index(from)?, self.node_index(to)?)
    }

    /// Outgoing neighbors of a node with edge weights. For undirected
    /// graphs this is every incident edge.
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeWeight)> {
        self.inner.edges(idx).map(move |edge| {
            let other = if edge.source() == idx {
                edge.target()
            } else {
                edge.source()
            };
            (other, *edge.weight())
        })
    }

    /// Iterates every edge once as `(from, to, weight)` in the order edges
    /// were created. Undirected edges are reported with `from <= to`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, EdgeWeight)> {
        self.inner.edge_references().map(|edge| {
            let (from, to) = (edge.source(), edge.target());
            if !K::is_directed() && to < from {
                (to, from, *edge.weight())
            } else {
                (from, to, *edge.weight())
            }
        })
    }

    /// Sum of all edge weights, each edge counted once.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.inner.edge_weights().map(|w| w.get()).sum()
    }

    /// Weighted degree of a node: the sum of its incident edge weights.
    #[must_use]
    pub fn weighted_degree(&self, idx: NodeIndex) -> u64 {
        self.neighbors(idx).map(|(_, w)| w.get()).sum()
    }

    /// Edge density: `m / (n (n - 1))` when directed, twice that when
    /// undirected. Graphs with fewer than two nodes have density `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        let possible = (n * (n - 1)) as f64;
        let m = self.edge_count() as f64;
        if K::is_directed() {
            m / possible
        } else {
            2.0 * m / possible
        }
    }

    /// Node-link view of the graph for external renderers.
    #[must_use]
    pub fn to_node_link(&self) -> NodeLinkGraph<&N> {
        NodeLinkGraph {
            directed: self.is_directed(),
            nodes: self
                .nodes()
                .map(|(_, key, data)| NodeLinkNode {
                    id: key.to_string(),
                    data,
                })
                .collect(),
            edges: self
                .edges()
                .map(|(from, to, weight)| NodeLinkEdge {
                    source: self.key(from).to_string(),
                    target: self.key(to).to_string(),
                    weight: weight.get(),
                })
                .collect(),
        }
    }
}
