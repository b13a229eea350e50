#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Graph construction and path search over crime incidents.
//!
//! * [`similarity`] connects incidents that share enough attributes.
//! * [`chain`] counts crime-type transitions within a time window per
//!   reporting district.
//! * [`shift_graph`] links `(district, shift)` nodes across adjacent shifts of
//!   a day, weighted by proximity and chain history.
//! * [`critical_path`] finds the cheapest first-shift to last-shift route
//!   through the shift graph.
//! * [`community`] reports on partitions produced by an external
//!   community-detection tool.
//!
//! All graphs are [`graph::WeightedGraph`]s built once from a frozen slice of
//! records and read-only afterwards.

pub mod chain;
pub mod community;
pub mod critical_path;
pub mod graph;
pub mod progress;
pub mod shift_graph;
pub mod similarity;

use thiserror::Error;

/// Errors raised while mutating a [`graph::WeightedGraph`].
///
/// Builders only ever add positive amounts, so any of these during a build
/// indicates a defect rather than bad input.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge weight increment of zero was requested.
    #[error("Zero weight for edge {from} -> {to}")]
    ZeroWeight {
        /// Source node key.
        from: String,
        /// Target node key.
        to: String,
    },

    /// A self-loop was requested in an undirected graph.
    #[error("Self-loop on node {node} in undirected graph")]
    SelfLoop {
        /// Node key.
        node: String,
    },

    /// A node index or key does not belong to the graph.
    #[error("Unknown node {key}")]
    UnknownNode {
        /// Node key, or `#index` for a foreign index.
        key: String,
    },
}

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Graph construction failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A supplied partition does not fit the graph.
    #[error("Partition error: {message}")]
    Partition {
        /// Description of what went wrong.
        message: String,
    },
}

#[cfg(test)]
mod testing;
