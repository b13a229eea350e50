//! Crime-chain, shift-transition, and critical path analysis of one area
//! and year.

use std::path::Path;

use crime_graph_analysis::chain::build_chain_graph;
use crime_graph_analysis::critical_path::find_critical_path;
use crime_graph_analysis::shift_graph::build_shift_graph;
use crime_graph_analysis_models::{AnalysisConfig, CriticalPath};
use crime_graph_geography::DistrictCentroids;
use crime_graph_ingest::filter::{filter_area, filter_year};
use crime_graph_ingest::load_incidents;

use crate::CliError;
use crate::export::{slug, write_json};

/// Runs the transition analysis for the configured area and year and
/// returns the critical path.
///
/// # Errors
///
/// Returns [`CliError::Missing`] if no area or year is configured, or
/// another [`CliError`] if loading, building, or writing fails.
pub fn run(
    config: &AnalysisConfig,
    input: &Path,
    output_dir: &Path,
) -> Result<CriticalPath, CliError> {
    let Some(area) = config.area.as_deref() else {
        return Err(CliError::Missing {
            message: "area (use --area or set `area` in the config)".to_string(),
        });
    };
    let Some(year) = config.year else {
        return Err(CliError::Missing {
            message: "year (use --year or set `year` in the config)".to_string(),
        });
    };

    let records = load_incidents(input, config.delimiter)?;
    let records = filter_year(&filter_area(&records, area), year);
    log::info!("{} incidents in {area} during {year}", records.len());
    if records.is_empty() {
        log::warn!("No incidents match {area} in {year}; graphs will be empty");
    }

    let chain = build_chain_graph(&records, config.top_crime_types, config.chain_window())?;
    let centroids = DistrictCentroids::from_records(&records);
    log::info!("{} districts with known centroids", centroids.len());
    let shifts = build_shift_graph(&records, &centroids, &chain, config.proximity_km)?;
    let path = find_critical_path(&shifts);

    let suffix = format!("{}_{year}", slug(area));
    write_json(output_dir, &format!("chain_{suffix}"), &chain.to_node_link())?;
    write_json(output_dir, &format!("shifts_{suffix}"), &shifts.to_node_link())?;
    write_json(output_dir, &format!("critical_path_{suffix}"), &path)?;

    if path.is_empty() {
        log::info!("Critical path: none");
    } else {
        log::info!(
            "Critical path: [{}] (cost: {:.2})",
            path.nodes.join(", "),
            path.cost
        );
        for (from, to) in path.hops() {
            let weight = shifts.edge_weight_by_key(from, to).map_or(0, |w| w.get());
            log::debug!("  {from} -> {to} (weight {weight})");
        }
    }

    Ok(path)
}
