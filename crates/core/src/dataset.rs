//! A loaded observation log with its species index, plus a bounded cache
//! of loads keyed by source path and load options.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::index::SpeciesIndex;
use crate::ingest::{self, LoadError, LoadOptions};
use crate::models::{DateCount, Marker, Observation, RegionCount, SpeciesProfile};
use crate::query;

/// Entries retained by [`DatasetCache::new`].
pub const DATASET_CACHE_SIZE: usize = 32;

/// Headline numbers for a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetStats {
    pub observations: u64,
    pub species: u64,
    pub regions: u64,
}

/// The retained observations of one load, indexed by species.
///
/// Immutable once constructed. Share across threads as `Arc<Dataset>`.
#[derive(Debug, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
    species: SpeciesIndex,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        let species = SpeciesIndex::build(&observations);
        Dataset {
            observations,
            species,
        }
    }

    /// Load the observation log at `path` and index it.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, LoadError> {
        Ok(Self::new(ingest::load_observations(path, options)?))
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Sorted, deduplicated species common names.
    pub fn species_names(&self) -> &[String] {
        self.species.names()
    }

    /// Observations of one species via the index, or all of them for `None`.
    /// Identical to [`query::filter_by_species`] over the same sequence.
    pub fn observations_for(&self, species: Option<&str>) -> Vec<&Observation> {
        match species {
            Some(name) => self
                .species
                .positions(name)
                .iter()
                .map(|&pos| &self.observations[pos as usize])
                .collect(),
            None => self.observations.iter().collect(),
        }
    }

    pub fn counts_by_region(&self, species: Option<&str>) -> Vec<RegionCount> {
        query::counts_by_region(&self.observations, species)
    }

    pub fn counts_by_date(&self, species: Option<&str>) -> Vec<DateCount> {
        query::counts_by_date(&self.observations, species)
    }

    pub fn localities(&self, species: Option<&str>) -> Vec<String> {
        query::distinct_localities(&self.observations, species)
    }

    pub fn markers(&self, species: Option<&str>) -> Vec<Marker> {
        query::marker_payload(&self.observations, species)
    }

    /// Detail card for one species: the first retained record's fields plus
    /// the species' total retained-record count. `None` for an unknown name.
    pub fn profile(&self, species: &str) -> Option<SpeciesProfile> {
        let positions = self.species.positions(species);
        let first = &self.observations[*positions.first()? as usize];
        Some(SpeciesProfile {
            common_name: first.common_name.clone(),
            scientific_name: first.scientific_name.clone(),
            taxonomic_order: first.taxonomic_order.clone(),
            count: first.count,
            breeding_category: first.breeding_category.clone(),
            region: first.region.clone(),
            locality: first.locality.clone(),
            total_observations: positions.len() as u64,
        })
    }

    pub fn stats(&self) -> DatasetStats {
        let regions: BTreeSet<&str> = self
            .observations
            .iter()
            .map(|o| o.region.as_str())
            .collect();
        DatasetStats {
            observations: self.observations.len() as u64,
            species: self.species.len() as u64,
            regions: regions.len() as u64,
        }
    }
}

/// Bounded memoization of [`Dataset::load`] calls.
///
/// Keyed by `(path, LoadOptions)` so loads with different truncation or row
/// policy never alias. The lock is held across a miss so each entry is
/// computed once.
pub struct DatasetCache {
    entries: Mutex<LruCache<(PathBuf, LoadOptions), Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::with_capacity(DATASET_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        DatasetCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached dataset for `(path, options)`, loading it on a miss.
    pub fn get_or_load(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Arc<Dataset>, LoadError> {
        let key = (path.to_path_buf(), options.clone());
        let mut entries = self.entries.lock().unwrap();
        if let Some(dataset) = entries.get(&key) {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(Dataset::load(path, options)?);
        entries.put(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
