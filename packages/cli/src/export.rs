//! JSON files exchanged with the visualization and community-detection
//! tools.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use crime_graph_analysis_models::Partition;
use serde::Serialize;

use crate::CliError;

/// File-name friendly form of a label: lowercase with runs of
/// non-alphanumerics collapsed to `_`.
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Writes `value` as pretty JSON to `<dir>/<name>.json`.
///
/// # Errors
///
/// Returns [`CliError`] if the file cannot be created or encoding fails.
pub fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
) -> Result<PathBuf, CliError> {
    let path = dir.join(format!("{name}.json"));
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

/// Path of the community partition for a period.
pub fn partition_path(dir: &Path, period: &str) -> PathBuf {
    dir.join(format!("partition_{period}.json"))
}

/// Reads a partition (`{"node id": community, ...}`) if the file exists.
///
/// # Errors
///
/// Returns [`CliError`] if the file exists but cannot be read or parsed.
pub fn load_partition(path: &Path) -> Result<Option<Partition>, CliError> {
    if !path.is_file() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}
