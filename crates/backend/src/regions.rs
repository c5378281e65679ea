use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// The slice of the region reference GeoJSON we care about: one `name`
/// property per feature. Geometry is passed through to clients untouched.
#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Deserialize, Default)]
struct FeatureProperties {
    name: Option<String>,
}

/// Region names from the reference polygons, used to sanity-check the
/// normalized region keys a dataset produced.
#[derive(Debug)]
pub struct RegionReference {
    names: HashSet<String>,
}

impl RegionReference {
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let collection: FeatureCollection = serde_json::from_str(&data)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        let names: HashSet<String> = collection
            .features
            .into_iter()
            .filter_map(|f| f.properties.name)
            .collect();

        tracing::info!(regions = names.len(), "Loaded region reference");

        Ok(RegionReference { names })
    }

    pub fn contains(&self, region: &str) -> bool {
        self.names.contains(region)
    }

    /// Region keys among `regions` with no matching reference polygon;
    /// these render as blank areas on a choropleth.
    pub fn unmatched<'a>(&self, regions: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut missing: Vec<&str> = regions
            .into_iter()
            .filter(|r| !self.contains(r))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}
