//! Per-period similarity graphs of the busiest areas.

use std::path::Path;
use std::sync::Arc;

use crime_graph_analysis::community::{community_count, profile_communities, summarize};
use crime_graph_analysis::progress::ProgressCallback;
use crime_graph_analysis::similarity::{build_similarity_graph, sample_records};
use crime_graph_analysis_models::{AnalysisConfig, GraphSummary, PeriodDefinition};
use crime_graph_cli_utils::{IndicatifProgress, MultiProgress};
use crime_graph_incident_models::IncidentRecord;
use crime_graph_ingest::filter::{filter_areas, filter_period, top_areas};
use crime_graph_ingest::load_incidents;

use crate::CliError;
use crate::export::{load_partition, partition_path, slug, write_json};

/// Loads `input`, restricts it to the configured or busiest areas, and
/// analyses every configured period on its own. A failing period is logged
/// and skipped.
///
/// # Errors
///
/// Returns [`CliError`] if the input cannot be loaded.
pub fn run(
    config: &AnalysisConfig,
    input: &Path,
    output_dir: &Path,
    partition_dir: &Path,
    multi: &MultiProgress,
) -> Result<(), CliError> {
    let records = load_incidents(input, config.delimiter)?;

    let areas = if config.similarity_areas.is_empty() {
        top_areas(&records, config.top_areas)
    } else {
        config.similarity_areas.clone()
    };
    log::info!("Areas: {}", areas.join(", "));
    let records = filter_areas(&records, &areas);

    let steps = IndicatifProgress::steps_bar(multi, "Periods", config.periods.len() as u64);
    let mut summaries = Vec::with_capacity(config.periods.len());

    for period in &config.periods {
        steps.set_message(format!("Period {}", period.name));
        match run_period(config, period, &records, output_dir, partition_dir, multi) {
            Ok(summary) => summaries.push(summary),
            Err(e) => log::error!("Period {} failed: {e}", period.name),
        }
        steps.inc(1);
    }
    steps.finish(format!("{} of {} periods analysed", summaries.len(), config.periods.len()));

    print_comparison(&summaries);
    write_json(output_dir, "similarity_summary", &summaries)?;

    Ok(())
}

fn run_period(
    config: &AnalysisConfig,
    period: &PeriodDefinition,
    records: &[IncidentRecord],
    output_dir: &Path,
    partition_dir: &Path,
    multi: &MultiProgress,
) -> Result<GraphSummary, CliError> {
    let in_period = filter_period(records, period);
    let sample = sample_records(&in_period, config.sample_size, config.seed);
    log::info!(
        "Period {}: {} incidents, {} sampled",
        period.name,
        in_period.len(),
        sample.len()
    );

    let progress: Arc<dyn ProgressCallback> =
        IndicatifProgress::pairs_bar(multi, &format!("Similarity {}", period.name));
    let graph = build_similarity_graph(&sample, config.similarity_threshold, &progress)?;

    let name = slug(&period.name);
    let path = write_json(output_dir, &format!("similarity_{name}"), &graph.to_node_link())?;
    log::info!("Similarity graph for {} written to {}", period.name, path.display());

    let partition = load_partition(&partition_path(partition_dir, &period.name))?;
    if let Some(partition) = &partition {
        let profiles = profile_communities(partition, &graph)?;
        log::info!(
            "Period {}: {} communities",
            period.name,
            community_count(partition)
        );
        for profile in &profiles {
            let described: Vec<String> = profile
                .attributes
                .iter()
                .filter_map(|a| {
                    a.top_values
                        .first()
                        .map(|v| format!("{}: {} ({:.0}%)", a.label, v.value, v.share * 100.0))
                })
                .collect();
            log::info!(
                "  Community {} ({} incidents): {}",
                profile.community,
                profile.size,
                described.join(", ")
            );
        }
        write_json(output_dir, &format!("communities_{name}"), &profiles)?;
    } else {
        log::info!(
            "No partition for period {} in {}; skipping community report",
            period.name,
            partition_dir.display()
        );
    }

    Ok(summarize(&period.name, &graph, partition.as_ref())?)
}

fn print_comparison(summaries: &[GraphSummary]) {
    println!();
    println!(
        "{:<14} {:>8} {:>10} {:>10} {:>12}",
        "PERIOD", "NODES", "EDGES", "DENSITY", "MODULARITY"
    );
    println!("{}", "-".repeat(58));
    for summary in summaries {
        let modularity = summary
            .modularity
            .map_or_else(|| "-".to_string(), |q| format!("{q:.4}"));
        println!(
            "{:<14} {:>8} {:>10} {:>10.4} {:>12}",
            summary.name, summary.nodes, summary.edges, summary.density, modularity
        );
    }
}
