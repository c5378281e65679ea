//! Aggregation queries over a loaded observation sequence.
//!
//! Every function here is pure: no I/O, no shared state, deterministic
//! output for a given input. Empty inputs yield empty outputs, never errors.

use std::collections::BTreeMap;

use crate::models::{DateCount, Marker, Observation, RegionCount};

/// Select the observations of one species by exact, case-sensitive common
/// name. `None` returns the full sequence in order.
pub fn filter_by_species<'a>(
    observations: &'a [Observation],
    species: Option<&str>,
) -> Vec<&'a Observation> {
    match species {
        Some(name) => observations
            .iter()
            .filter(|o| o.common_name == name)
            .collect(),
        None => observations.iter().collect(),
    }
}

/// Sorted, deduplicated species common names across the whole sequence.
pub fn distinct_species(observations: &[Observation]) -> Vec<String> {
    let mut names: Vec<String> = observations
        .iter()
        .map(|o| o.common_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Observation counts partitioned by normalized region, region-sorted.
pub fn counts_by_region(
    observations: &[Observation],
    species: Option<&str>,
) -> Vec<RegionCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for observation in filter_by_species(observations, species) {
        *counts.entry(observation.region.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
        .collect()
}

/// Observation counts per calendar day, date-sorted.
pub fn counts_by_date(
    observations: &[Observation],
    species: Option<&str>,
) -> Vec<DateCount> {
    let mut counts: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for observation in filter_by_species(observations, species) {
        *counts.entry(observation.date).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

/// Sorted, deduplicated locality names. Blank localities are skipped.
pub fn distinct_localities(
    observations: &[Observation],
    species: Option<&str>,
) -> Vec<String> {
    let mut localities: Vec<String> = filter_by_species(observations, species)
        .into_iter()
        .filter(|o| !o.locality.is_empty())
        .map(|o| o.locality.clone())
        .collect();
    localities.sort();
    localities.dedup();
    localities
}

/// Map markers for the (optionally filtered) observations. Handles are
/// dense `0..n` over the filtered sequence.
pub fn marker_payload(observations: &[Observation], species: Option<&str>) -> Vec<Marker> {
    filter_by_species(observations, species)
        .into_iter()
        .enumerate()
        .map(|(idx, observation)| Marker {
            handle: idx as u32,
            latitude: observation.latitude,
            longitude: observation.longitude,
            common_name: observation.common_name.clone(),
            date: observation.date,
            locality: observation.locality.clone(),
            region: observation.region.clone(),
        })
        .collect()
}
