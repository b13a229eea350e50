#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident file loading.
//!
//! Reads delimited incident exports into [`IncidentRecord`]s. Rows whose
//! occurrence date or identifier cannot be read are dropped and counted;
//! every other defect (bad coordinates, blank categories, malformed times)
//! degrades the affected field instead of the whole row.

pub mod filter;
pub mod parsing;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveTime;
use crime_graph_incident_models::{
    IncidentRecord, SecondaryAttribute, Shift, UNKNOWN, normalize_category,
};
use serde::Deserialize;

use crate::parsing::{parse_lat_lon, parse_occurrence_date, parse_time_of_day};

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "DR_NO",
    "DATE OCC",
    "TIME OCC",
    "AREA NAME",
    "Rpt Dist No",
    "Crm Cd Desc",
];

/// Errors that can occur while loading incidents.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },
}

/// One row as it appears in the export. Every field is optional so that a
/// short row still deserializes.
#[derive(Debug, Deserialize)]
struct RawIncident {
    #[serde(rename = "DR_NO", default)]
    id: Option<String>,
    #[serde(rename = "DATE OCC", default)]
    date_occ: Option<String>,
    #[serde(rename = "TIME OCC", default)]
    time_occ: Option<String>,
    #[serde(rename = "AREA NAME", default)]
    area_name: Option<String>,
    #[serde(rename = "Rpt Dist No", default)]
    district: Option<String>,
    #[serde(rename = "Crm Cd Desc", default)]
    crime_type: Option<String>,
    #[serde(rename = "Weapon Desc", default)]
    weapon: Option<String>,
    #[serde(rename = "Premis Desc", default)]
    premise: Option<String>,
    #[serde(rename = "Vict Sex", default)]
    victim_sex: Option<String>,
    #[serde(rename = "Vict Descent", default)]
    victim_descent: Option<String>,
    #[serde(rename = "LAT", default)]
    latitude: Option<String>,
    #[serde(rename = "LON", default)]
    longitude: Option<String>,
}

/// Counts of what happened to each data row during a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data rows read (excluding the header).
    pub rows: u64,
    /// Rows turned into records.
    pub loaded: u64,
    /// Rows the CSV reader could not deserialize.
    pub malformed: u64,
    /// Rows without an identifier.
    pub missing_id: u64,
    /// Rows whose occurrence date could not be parsed.
    pub invalid_date: u64,
    /// Loaded records whose coordinates were missing or invalid.
    pub without_coordinates: u64,
}

impl LoadSummary {
    /// Total rows dropped for any reason.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.malformed + self.missing_id + self.invalid_date
    }
}

/// Decodes file content, falling back to Latin-1 when it is not UTF-8.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Input is not UTF-8 ({e}), decoding as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

fn to_record(raw: RawIncident, summary: &mut LoadSummary) -> Option<IncidentRecord> {
    let id = raw.id.as_deref().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        summary.missing_id += 1;
        return None;
    }

    let Some(date) = raw.date_occ.as_deref().and_then(parse_occurrence_date) else {
        summary.invalid_date += 1;
        log::trace!("Dropping incident {id}: unreadable date {:?}", raw.date_occ);
        return None;
    };

    let time_occ = raw.time_occ.as_deref().unwrap_or_default();
    let time = parse_time_of_day(time_occ).unwrap_or(NaiveTime::MIN);
    let shift = Shift::from_time_of_day(time_occ);

    let coordinates = parse_lat_lon(raw.latitude.as_deref(), raw.longitude.as_deref());
    if coordinates.is_none() {
        summary.without_coordinates += 1;
    }

    let attributes: BTreeMap<SecondaryAttribute, String> = [
        (SecondaryAttribute::Weapon, raw.weapon),
        (SecondaryAttribute::Premise, raw.premise),
        (SecondaryAttribute::VictimSex, raw.victim_sex),
        (SecondaryAttribute::VictimDescent, raw.victim_descent),
    ]
    .into_iter()
    .map(|(attribute, value)| (attribute, normalize_category(value.as_deref())))
    .filter(|(_, value)| value != UNKNOWN)
    .collect();

    Some(IncidentRecord {
        id: id.to_string(),
        crime_type: normalize_category(raw.crime_type.as_deref()),
        district: normalize_category(raw.district.as_deref()),
        area: normalize_category(raw.area_name.as_deref()),
        occurred_at: date.and_time(time),
        shift,
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lon)| lon),
        attributes,
    })
}

/// Reads incidents from delimited text.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`] if a required column is absent,
/// or [`IngestError::Io`]/[`IngestError::Csv`] if the input cannot be read.
pub fn read_incidents<R: Read>(
    mut reader: R,
    delimiter: u8,
) -> Result<(Vec<IncidentRecord>, LoadSummary), IngestError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = decode(bytes);

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == *column))
    {
        return Err(IngestError::MissingColumn {
            column: (*column).to_string(),
        });
    }
    csv_reader.set_headers(csv::StringRecord::from(headers));

    let mut summary = LoadSummary::default();
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<RawIncident>() {
        summary.rows += 1;
        match row {
            Ok(raw) => {
                if let Some(record) = to_record(raw, &mut summary) {
                    records.push(record);
                }
            }
            Err(e) => {
                summary.malformed += 1;
                log::debug!("Skipping malformed row {}: {e}", summary.rows);
            }
        }
    }
    summary.loaded = records.len() as u64;

    Ok((records, summary))
}

/// Loads incidents from a file, logging a summary of dropped rows.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or read.
pub fn load_incidents(
    path: &Path,
    delimiter: char,
) -> Result<Vec<IncidentRecord>, IngestError> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("delimiter {delimiter:?} is not a single byte"),
        ))
    })?;

    log::info!("Loading incidents from {}", path.display());
    let file = std::fs::File::open(path)?;
    let (records, summary) = read_incidents(std::io::BufReader::new(file), delimiter)?;

    if summary.dropped() > 0 {
        log::warn!(
            "Dropped {} of {} rows ({} malformed, {} without id, {} with invalid dates)",
            summary.dropped(),
            summary.rows,
            summary.malformed,
            summary.missing_id,
            summary.invalid_date
        );
    }
    log::info!(
        "Loaded {} incidents ({} without coordinates)",
        summary.loaded,
        summary.without_coordinates
    );

    Ok(records)
}
