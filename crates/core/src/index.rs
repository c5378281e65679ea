//! Species lookup structures built once per loaded dataset.

use std::collections::HashMap;

use crate::models::Observation;

/// Maps species common names to the positions of their observations.
///
/// Positions index into the observation sequence the index was built from,
/// in original load order. Positions are `u32`, so sequences are bounded at
/// `u32::MAX` rows; loads past that are not supported.
#[derive(Debug, Default, Clone)]
pub struct SpeciesIndex {
    names: Vec<String>,
    by_name: HashMap<String, Vec<u32>>,
}

impl SpeciesIndex {
    /// Build the index over an observation sequence.
    pub fn build(observations: &[Observation]) -> Self {
        let mut by_name: HashMap<String, Vec<u32>> = HashMap::new();
        for (idx, observation) in observations.iter().enumerate() {
            by_name
                .entry(observation.common_name.clone())
                .or_default()
                .push(idx as u32);
        }
        let mut names: Vec<String> = by_name.keys().cloned().collect();
        names.sort();
        SpeciesIndex { names, by_name }
    }

    /// Sorted, deduplicated species common names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Observation positions for `species`, in load order. Empty for a name
    /// that never occurs.
    pub fn positions(&self, species: &str) -> &[u32] {
        self.by_name.get(species).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationCount;
    use chrono::NaiveDate;

    fn observation(common_name: &str) -> Observation {
        Observation {
            common_name: common_name.to_string(),
            scientific_name: String::new(),
            taxonomic_order: String::new(),
            count: ObservationCount::PresenceOnly,
            breeding_category: String::new(),
            region: "Stockholm".to_string(),
            locality: "Ekhagen".to_string(),
            latitude: 59.33,
            longitude: 18.06,
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_build_empty() {
        let index = SpeciesIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.names().is_empty());
        assert!(index.positions("Common Blackbird").is_empty());
    }

    #[test]
    fn test_names_sorted_and_deduplicated() {
        let observations = vec![
            observation("European Robin"),
            observation("Common Blackbird"),
            observation("European Robin"),
            observation("Eurasian Magpie"),
        ];
        let index = SpeciesIndex::build(&observations);
        assert_eq!(
            index.names(),
            &[
                "Common Blackbird".to_string(),
                "Eurasian Magpie".to_string(),
                "European Robin".to_string(),
            ]
        );
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_positions_preserve_load_order() {
        let observations = vec![
            observation("European Robin"),
            observation("Common Blackbird"),
            observation("European Robin"),
            observation("European Robin"),
        ];
        let index = SpeciesIndex::build(&observations);
        assert_eq!(index.positions("European Robin"), &[0, 2, 3]);
        assert_eq!(index.positions("Common Blackbird"), &[1]);
    }

    #[test]
    fn test_unknown_species_is_empty_without_error() {
        let observations = vec![observation("Common Blackbird")];
        let index = SpeciesIndex::build(&observations);
        assert!(index.positions("White-tailed Eagle").is_empty());
    }
}
