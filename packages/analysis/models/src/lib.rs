#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis configuration and graph result types.
//!
//! [`AnalysisConfig`] is loaded from TOML and carries every tunable of the
//! graph builders. The remaining types are the serializable outputs handed
//! to the visualization and community-detection collaborators.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Default configuration, embedded at compile time.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Edge attribute the community-detection tool reads the weight from.
///
/// [`NodeLinkEdge::weight`] is serialized under this name; the two must stay
/// in step.
pub const WEIGHT_KEY: &str = "weight";

/// Mapping from node id to community id, as produced by an external
/// community-detection tool.
pub type Partition = BTreeMap<String, u32>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML or has mistyped fields.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// A named, inclusive range of years analyzed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDefinition {
    /// Label used in logs and output file names (e.g. `"2020-2022"`).
    pub name: String,
    /// First year of the period.
    pub from_year: i32,
    /// Last year of the period (inclusive).
    pub to_year: i32,
}

impl PeriodDefinition {
    /// Returns `true` if `year` falls inside this period.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        self.from_year <= year && year <= self.to_year
    }
}

/// Tunables for every graph builder and the pipelines around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Patrol area for the transition analysis.
    pub area: Option<String>,
    /// Year for the transition analysis.
    pub year: Option<i32>,
    /// Maximum gap between two incidents counted as a chain transition.
    pub chain_window_hours: i64,
    /// Minimum similarity score for an edge.
    pub similarity_threshold: u64,
    /// Maximum centroid distance (km) for a shift transition.
    pub proximity_km: f64,
    /// Number of most frequent crime types kept for chain building.
    pub top_crime_types: usize,
    /// Records sampled per period for the similarity graph.
    pub sample_size: usize,
    /// Seed for every stochastic step.
    pub seed: u64,
    /// Number of busiest areas kept for the similarity analysis.
    pub top_areas: usize,
    /// Explicit list of areas for the similarity analysis. Overrides
    /// `top_areas` when non-empty.
    pub similarity_areas: Vec<String>,
    /// Periods analyzed independently by the similarity pipeline.
    pub periods: Vec<PeriodDefinition>,
    /// Field delimiter of the incident file.
    pub delimiter: char,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            area: None,
            year: None,
            chain_window_hours: 24,
            similarity_threshold: 3,
            proximity_km: 50.0,
            top_crime_types: 10,
            sample_size: 1000,
            seed: 42,
            top_areas: 5,
            similarity_areas: Vec::new(),
            periods: vec![
                PeriodDefinition {
                    name: "2020-2022".to_string(),
                    from_year: 2020,
                    to_year: 2022,
                },
                PeriodDefinition {
                    name: "2023-2024".to_string(),
                    from_year: 2023,
                    to_year: 2024,
                },
            ],
            delimiter: ';',
        }
    }
}

impl AnalysisConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is malformed, or
    /// contains out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks that every tunable is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if self.chain_window_hours <= 0 {
            return invalid(format!(
                "chain_window_hours must be positive, got {}",
                self.chain_window_hours
            ));
        }
        if self.similarity_threshold == 0 {
            return invalid("similarity_threshold must be at least 1".to_string());
        }
        if !(self.proximity_km.is_finite() && self.proximity_km > 0.0) {
            return invalid(format!(
                "proximity_km must be a positive number, got {}",
                self.proximity_km
            ));
        }
        if self.top_crime_types == 0 {
            return invalid("top_crime_types must be at least 1".to_string());
        }
        if let Some(period) = self.periods.iter().find(|p| p.from_year > p.to_year) {
            return invalid(format!(
                "period '{}' starts after it ends ({} > {})",
                period.name, period.from_year, period.to_year
            ));
        }
        Ok(())
    }

    /// The chain window as a duration.
    #[must_use]
    pub fn chain_window(&self) -> TimeDelta {
        TimeDelta::try_hours(self.chain_window_hours).unwrap_or(TimeDelta::MAX)
    }
}

/// Lowest-cost sequence of shift-graph nodes from a first-shift node to a
/// last-shift node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    /// Node keys in travel order. Empty when no path exists.
    pub nodes: Vec<String>,
    /// Sum of inverse edge weights along the path, `f64::INFINITY` when no
    /// path exists.
    pub cost: f64,
}

impl CriticalPath {
    /// The "no path" result.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            nodes: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    /// Returns `true` if no path was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consecutive `(from, to)` node pairs along the path, for highlighting.
    pub fn hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

/// Size and shape statistics for one analyzed graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    /// Label of the analyzed period or graph.
    pub name: String,
    /// Node count.
    pub nodes: usize,
    /// Edge count.
    pub edges: usize,
    /// Edge density, `0.0` for graphs with fewer than two nodes.
    pub density: f64,
    /// Modularity of the detected partition, if one was supplied.
    pub modularity: Option<f64>,
}

/// How often one attribute value occurs inside a community.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueShare {
    /// Attribute value.
    pub value: String,
    /// Number of community members with this value.
    pub count: usize,
    /// `count` divided by the community size.
    pub share: f64,
}

/// Most frequent known values of one attribute inside a community.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeBreakdown {
    /// Attribute label (e.g. `"Crime type"`).
    pub label: String,
    /// Up to three values, most frequent first. Empty when every member's
    /// value is unknown.
    pub top_values: Vec<ValueShare>,
}

/// Characterization of one detected community.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityProfile {
    /// Community id from the partition.
    pub community: u32,
    /// Number of incidents in the community.
    pub size: usize,
    /// Per-attribute breakdown.
    pub attributes: Vec<AttributeBreakdown>,
}

/// A node in a node-link graph export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLinkNode<N> {
    /// Node key.
    pub id: String,
    /// Node attributes, flattened next to the id.
    #[serde(flatten)]
    pub data: N,
}

/// An edge in a node-link graph export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLinkEdge {
    /// Key of the source node.
    pub source: String,
    /// Key of the target node.
    pub target: String,
    /// Accumulated edge weight, exported under [`WEIGHT_KEY`].
    pub weight: u64,
}

/// Node-link representation of a built graph for external renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLinkGraph<N> {
    /// Whether edges are directed.
    pub directed: bool,
    /// Nodes in insertion order.
    pub nodes: Vec<NodeLinkNode<N>>,
    /// Edges in the order they were created.
    pub edges: Vec<NodeLinkEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_config_matches_default() {
        let config = AnalysisConfig::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config = AnalysisConfig::from_toml_str("area = \"Pacific\"\nyear = 2021\n").unwrap();
        assert_eq!(config.area.as_deref(), Some("Pacific"));
        assert_eq!(config.year, Some(2021));
        assert_eq!(config.chain_window_hours, 24);
        assert_eq!(config.similarity_threshold, 3);
        assert_eq!(config.top_crime_types, 10);
        assert_eq!(config.chain_window(), TimeDelta::hours(24));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("chain_window_hours = 0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("proximity_km = -1.0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str(
                "[[periods]]\nname = \"bad\"\nfrom_year = 2024\nto_year = 2020\n"
            ),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_mistyped_values() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("top_crime_types = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let period = PeriodDefinition {
            name: "2020-2022".to_string(),
            from_year: 2020,
            to_year: 2022,
        };
        assert!(period.contains(2020));
        assert!(period.contains(2022));
        assert!(!period.contains(2023));
    }

    #[test]
    fn empty_critical_path_has_infinite_cost() {
        let path = CriticalPath::none();
        assert!(path.is_empty());
        assert!(path.cost.is_infinite());
        assert_eq!(path.hops().count(), 0);
    }

    #[test]
    fn hops_pair_consecutive_nodes() {
        let path = CriticalPath {
            nodes: vec!["a|Morning".to_string(), "b|Afternoon".to_string(), "a|Night".to_string()],
            cost: 1.5,
        };
        assert_eq!(path.hops().collect::<Vec<_>>(), vec![
            ("a|Morning", "b|Afternoon"),
            ("b|Afternoon", "a|Night"),
        ]);
    }

    #[test]
    fn edge_weight_is_exported_under_weight_key() {
        let edge = NodeLinkEdge {
            source: "a".to_string(),
            target: "b".to_string(),
            weight: 4,
        };
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value[WEIGHT_KEY], 4);
        assert_eq!(value.as_object().unwrap().len(), 3);
    }
}
