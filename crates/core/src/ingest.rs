//! Ingestion of eBird tab-separated observation extracts.
//!
//! Columns are resolved by header name. Rows missing a required field
//! (common name, state, latitude, longitude) are dropped silently,
//! best-effort visualization semantics. Rows that are present but
//! unparseable (bad coordinates, bad dates) are governed by [`RowPolicy`].

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Observation, ObservationCount};
use crate::region;

/// Expected format of the `OBSERVATION DATE` column.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What to do with a row that is present but unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowPolicy {
    /// Drop the offending row and keep going.
    #[default]
    Skip,
    /// Fail the whole load on the first offending row.
    Abort,
}

/// Load parameters. Also the cache-key material for
/// [`crate::dataset::DatasetCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LoadOptions {
    /// Upper bound on raw data rows read: a prefix of the file, applied
    /// before any filtering. `None` reads everything.
    pub limit: Option<usize>,
    pub policy: RowPolicy,
}

#[derive(Debug, Error)]
pub enum LoadError {
    /// The observation file does not exist. Fatal, no retry.
    #[error("observation file not found: {path}")]
    FileNotFound { path: String },

    /// A required column is absent from the header row.
    #[error("required column missing from header: {0}")]
    MissingColumn(&'static str),

    /// A row could not be decoded, or held unparseable coordinates.
    /// Surfaced only under [`RowPolicy::Abort`].
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// The `OBSERVATION DATE` value was missing or not `YYYY-MM-DD`.
    /// Surfaced only under [`RowPolicy::Abort`].
    #[error("unparseable observation date at line {line}: {value:?}")]
    UnparseableDate { line: usize, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Header positions of the columns we consume. Only the required set must
/// be present; every other column may be missing from the file entirely.
struct Columns {
    common_name: usize,
    scientific_name: Option<usize>,
    taxonomic_order: Option<usize>,
    observation_count: Option<usize>,
    breeding_category: Option<usize>,
    state: usize,
    locality: Option<usize>,
    latitude: usize,
    longitude: usize,
    date: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require =
            |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));
        Ok(Columns {
            common_name: require("COMMON NAME")?,
            scientific_name: find("SCIENTIFIC NAME"),
            taxonomic_order: find("TAXONOMIC ORDER"),
            observation_count: find("OBSERVATION COUNT"),
            breeding_category: find("BREEDING CATEGORY"),
            state: require("STATE")?,
            locality: find("LOCALITY"),
            latitude: require("LATITUDE")?,
            longitude: require("LONGITUDE")?,
            date: find("OBSERVATION DATE"),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

fn optional_field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Load and normalize the observation log at `path` into an ordered
/// sequence of retained records.
pub fn load_observations(
    path: &Path,
    options: &LoadOptions,
) -> Result<Vec<Observation>, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => LoadError::Io(e),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns = match reader.headers() {
        Ok(headers) => Columns::resolve(headers)?,
        Err(e) => {
            return Err(LoadError::MalformedRow {
                line: 1,
                reason: e.to_string(),
            })
        }
    };

    let mut observations = Vec::new();
    let mut rows_read = 0usize;
    let mut dropped_missing = 0usize;
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        if options.limit.is_some_and(|cap| idx >= cap) {
            break;
        }
        rows_read += 1;
        // 1-based line number, counting the header line.
        let line = idx + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => match options.policy {
                RowPolicy::Abort => {
                    return Err(LoadError::MalformedRow {
                        line,
                        reason: e.to_string(),
                    })
                }
                RowPolicy::Skip => {
                    skipped += 1;
                    tracing::debug!(line, error = %e, "skipping undecodable row");
                    continue;
                }
            },
        };

        let raw_date = optional_field(&record, columns.date);
        let date = match NaiveDate::parse_from_str(raw_date, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => match options.policy {
                RowPolicy::Abort => {
                    return Err(LoadError::UnparseableDate {
                        line,
                        value: raw_date.to_string(),
                    })
                }
                RowPolicy::Skip => {
                    skipped += 1;
                    tracing::debug!(line, value = raw_date, "skipping row with bad date");
                    continue;
                }
            },
        };

        let common_name = field(&record, columns.common_name);
        let raw_region = field(&record, columns.state);
        let raw_latitude = field(&record, columns.latitude);
        let raw_longitude = field(&record, columns.longitude);
        if common_name.is_empty()
            || raw_region.is_empty()
            || raw_latitude.is_empty()
            || raw_longitude.is_empty()
        {
            dropped_missing += 1;
            tracing::debug!(line, "dropping row with missing required fields");
            continue;
        }

        let coordinates = raw_latitude
            .parse::<f64>()
            .and_then(|lat| raw_longitude.parse::<f64>().map(|lon| (lat, lon)));
        let (latitude, longitude) = match coordinates {
            Ok(pair) => pair,
            Err(_) => match options.policy {
                RowPolicy::Abort => {
                    return Err(LoadError::MalformedRow {
                        line,
                        reason: format!(
                            "invalid coordinates {:?}, {:?}",
                            raw_latitude, raw_longitude
                        ),
                    })
                }
                RowPolicy::Skip => {
                    skipped += 1;
                    tracing::debug!(line, "skipping row with bad coordinates");
                    continue;
                }
            },
        };
        // f64 parsing accepts "NaN" and "inf" text; such values are missing
        // coordinates, not malformed rows.
        if !latitude.is_finite() || !longitude.is_finite() {
            dropped_missing += 1;
            tracing::debug!(line, "dropping row with non-finite coordinates");
            continue;
        }

        let Some(region) = region::normalize(raw_region) else {
            dropped_missing += 1;
            tracing::debug!(line, raw = raw_region, "dropping row with blank region");
            continue;
        };

        observations.push(Observation {
            common_name: common_name.to_string(),
            scientific_name: optional_field(&record, columns.scientific_name).to_string(),
            taxonomic_order: optional_field(&record, columns.taxonomic_order).to_string(),
            count: ObservationCount::parse(optional_field(
                &record,
                columns.observation_count,
            )),
            breeding_category: optional_field(&record, columns.breeding_category)
                .to_string(),
            region,
            locality: optional_field(&record, columns.locality).to_string(),
            latitude,
            longitude,
            date,
        });
    }

    tracing::info!(
        path = %path.display(),
        rows_read,
        kept = observations.len(),
        dropped_missing,
        skipped,
        "loaded observation log"
    );

    Ok(observations)
}
