use std::sync::Arc;

use async_graphql::{Context, Object, SimpleObject};
use birdmap_core::dataset::{Dataset, DatasetStats};
use birdmap_core::models::{DateCount, Marker, Observation, RegionCount, SpeciesProfile};
use chrono::NaiveDate;

// GraphQL output types. Dates travel as "YYYY-MM-DD" strings; observation
// counts as their raw column form ("X" for presence-only records).

#[derive(SimpleObject)]
pub struct GqlObservation {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomic_order: String,
    pub count: String,
    pub breeding_category: String,
    pub region: String,
    pub locality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
}

impl From<&Observation> for GqlObservation {
    fn from(o: &Observation) -> Self {
        GqlObservation {
            common_name: o.common_name.clone(),
            scientific_name: o.scientific_name.clone(),
            taxonomic_order: o.taxonomic_order.clone(),
            count: o.count.to_string(),
            breeding_category: o.breeding_category.clone(),
            region: o.region.clone(),
            locality: o.locality.clone(),
            latitude: o.latitude,
            longitude: o.longitude,
            date: o.date.to_string(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlRegionCount {
    pub region: String,
    pub count: u64,
}

impl From<&RegionCount> for GqlRegionCount {
    fn from(c: &RegionCount) -> Self {
        GqlRegionCount {
            region: c.region.clone(),
            count: c.count,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlDateCount {
    pub date: String,
    pub count: u64,
}

impl From<&DateCount> for GqlDateCount {
    fn from(c: &DateCount) -> Self {
        GqlDateCount {
            date: c.date.to_string(),
            count: c.count,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlMarker {
    pub handle: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub common_name: String,
    pub date: String,
    pub locality: String,
    pub region: String,
}

impl From<&Marker> for GqlMarker {
    fn from(m: &Marker) -> Self {
        GqlMarker {
            handle: m.handle,
            latitude: m.latitude,
            longitude: m.longitude,
            common_name: m.common_name.clone(),
            date: m.date.to_string(),
            locality: m.locality.clone(),
            region: m.region.clone(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlSpeciesProfile {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomic_order: String,
    pub count: String,
    pub breeding_category: String,
    pub region: String,
    pub locality: String,
    pub total_observations: u64,
}

impl From<SpeciesProfile> for GqlSpeciesProfile {
    fn from(p: SpeciesProfile) -> Self {
        GqlSpeciesProfile {
            common_name: p.common_name,
            scientific_name: p.scientific_name,
            taxonomic_order: p.taxonomic_order,
            count: p.count.to_string(),
            breeding_category: p.breeding_category,
            region: p.region,
            locality: p.locality,
            total_observations: p.total_observations,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlDatasetStats {
    pub observations: u64,
    pub species: u64,
    pub regions: u64,
}

impl From<DatasetStats> for GqlDatasetStats {
    fn from(s: DatasetStats) -> Self {
        GqlDatasetStats {
            observations: s.observations,
            species: s.species,
            regions: s.regions,
        }
    }
}

fn parse_date_arg(value: &str) -> async_graphql::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| async_graphql::Error::new(format!("Invalid date: {}", value)))
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Sorted, deduplicated species common names.
    async fn species(&self, ctx: &Context<'_>) -> Vec<String> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset.species_names().to_vec()
    }

    /// Observations, optionally narrowed to one species and an inclusive
    /// date range. Unknown species yields an empty list.
    async fn observations(
        &self,
        ctx: &Context<'_>,
        species: Option<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> async_graphql::Result<Vec<GqlObservation>> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        let from = from.as_deref().map(parse_date_arg).transpose()?;
        let to = to.as_deref().map(parse_date_arg).transpose()?;

        let mut selected = dataset.observations_for(species.as_deref());
        if let Some(from) = from {
            selected.retain(|o| o.date >= from);
        }
        if let Some(to) = to {
            selected.retain(|o| o.date <= to);
        }

        Ok(selected.into_iter().map(GqlObservation::from).collect())
    }

    async fn region_counts(
        &self,
        ctx: &Context<'_>,
        species: Option<String>,
    ) -> Vec<GqlRegionCount> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset
            .counts_by_region(species.as_deref())
            .iter()
            .map(GqlRegionCount::from)
            .collect()
    }

    /// Observation counts per calendar day, optionally narrowed to one
    /// species and an inclusive date range.
    async fn daily_counts(
        &self,
        ctx: &Context<'_>,
        species: Option<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> async_graphql::Result<Vec<GqlDateCount>> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        let from = from.as_deref().map(parse_date_arg).transpose()?;
        let to = to.as_deref().map(parse_date_arg).transpose()?;

        let mut counts = dataset.counts_by_date(species.as_deref());
        if let Some(from) = from {
            counts.retain(|c| c.date >= from);
        }
        if let Some(to) = to {
            counts.retain(|c| c.date <= to);
        }

        Ok(counts.iter().map(GqlDateCount::from).collect())
    }

    async fn markers(&self, ctx: &Context<'_>, species: Option<String>) -> Vec<GqlMarker> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset
            .markers(species.as_deref())
            .iter()
            .map(GqlMarker::from)
            .collect()
    }

    async fn localities(&self, ctx: &Context<'_>, species: Option<String>) -> Vec<String> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset.localities(species.as_deref())
    }

    /// Detail card for one species, or null for a name with no records.
    async fn species_profile(
        &self,
        ctx: &Context<'_>,
        species: String,
    ) -> Option<GqlSpeciesProfile> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset.profile(&species).map(GqlSpeciesProfile::from)
    }

    async fn stats(&self, ctx: &Context<'_>) -> GqlDatasetStats {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset.stats().into()
    }
}

pub type Schema =
    async_graphql::Schema<QueryRoot, async_graphql::EmptyMutation, async_graphql::EmptySubscription>;

pub fn build_schema(dataset: Arc<Dataset>) -> Schema {
    async_graphql::Schema::build(
        QueryRoot,
        async_graphql::EmptyMutation,
        async_graphql::EmptySubscription,
    )
    .data(dataset)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use birdmap_core::models::ObservationCount;
    use serde_json::json;

    fn observation(
        common_name: &str,
        region: &str,
        day: u32,
        count: ObservationCount,
    ) -> Observation {
        Observation {
            common_name: common_name.to_string(),
            scientific_name: format!("{common_name} (sci)"),
            taxonomic_order: "27365".to_string(),
            count,
            breeding_category: "C2".to_string(),
            region: region.to_string(),
            locality: format!("{region} harbour"),
            latitude: 59.33,
            longitude: 18.06,
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
        }
    }

    fn test_schema() -> Schema {
        build_schema(Arc::new(Dataset::new(vec![
            observation("European Robin", "Stockholm", 1, ObservationCount::Known(2)),
            observation("Common Blackbird", "Uppsala", 1, ObservationCount::PresenceOnly),
            observation("European Robin", "Stockholm", 2, ObservationCount::Known(1)),
            observation("European Robin", "Dalarna", 3, ObservationCount::Known(4)),
        ])))
    }

    #[tokio::test]
    async fn test_species_lists_sorted_names() {
        let resp = test_schema().execute("{ species }").await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "species": ["Common Blackbird", "European Robin"] })
        );
    }

    #[tokio::test]
    async fn test_region_counts_with_species_filter() {
        let resp = test_schema()
            .execute(r#"{ regionCounts(species: "European Robin") { region count } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "regionCounts": [
                { "region": "Dalarna", "count": 1 },
                { "region": "Stockholm", "count": 2 },
            ] })
        );
    }

    #[tokio::test]
    async fn test_region_counts_without_filter_cover_all_rows() {
        let resp = test_schema()
            .execute("{ regionCounts { region count } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "regionCounts": [
                { "region": "Dalarna", "count": 1 },
                { "region": "Stockholm", "count": 2 },
                { "region": "Uppsala", "count": 1 },
            ] })
        );
    }

    #[tokio::test]
    async fn test_observations_carry_string_dates_and_counts() {
        let resp = test_schema()
            .execute(r#"{ observations(species: "Common Blackbird") { commonName count date region } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "observations": [{
                "commonName": "Common Blackbird",
                "count": "X",
                "date": "2024-09-01",
                "region": "Uppsala",
            }] })
        );
    }

    #[tokio::test]
    async fn test_observations_date_range_is_inclusive() {
        let resp = test_schema()
            .execute(
                r#"{ observations(species: "European Robin", from: "2024-09-02", to: "2024-09-03") { date } }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "observations": [
                { "date": "2024-09-02" },
                { "date": "2024-09-03" },
            ] })
        );
    }

    #[tokio::test]
    async fn test_observations_invalid_date_is_an_error() {
        let resp = test_schema()
            .execute(r#"{ observations(from: "02/09/2024") { date } }"#)
            .await;
        assert_eq!(resp.errors.len(), 1);
        assert!(resp.errors[0].message.contains("Invalid date"));
    }

    #[tokio::test]
    async fn test_daily_counts_narrowed_by_range() {
        let resp = test_schema()
            .execute(r#"{ dailyCounts(to: "2024-09-01") { date count } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "dailyCounts": [ { "date": "2024-09-01", "count": 2 } ] })
        );
    }

    #[tokio::test]
    async fn test_markers_have_dense_handles() {
        let resp = test_schema()
            .execute(r#"{ markers(species: "European Robin") { handle region } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "markers": [
                { "handle": 0, "region": "Stockholm" },
                { "handle": 1, "region": "Stockholm" },
                { "handle": 2, "region": "Dalarna" },
            ] })
        );
    }

    #[tokio::test]
    async fn test_localities_sorted_and_deduplicated() {
        let resp = test_schema().execute("{ localities }").await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "localities": [
                "Dalarna harbour",
                "Stockholm harbour",
                "Uppsala harbour",
            ] })
        );
    }

    #[tokio::test]
    async fn test_species_profile_uses_first_record() {
        let resp = test_schema()
            .execute(
                r#"{ speciesProfile(species: "European Robin") {
                    scientificName region totalObservations count
                } }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "speciesProfile": {
                "scientificName": "European Robin (sci)",
                "region": "Stockholm",
                "totalObservations": 3,
                "count": "2",
            } })
        );
    }

    #[tokio::test]
    async fn test_species_profile_null_for_unknown_name() {
        let resp = test_schema()
            .execute(r#"{ speciesProfile(species: "White-tailed Eagle") { commonName } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "speciesProfile": null })
        );
    }

    #[tokio::test]
    async fn test_unknown_species_yields_empty_lists() {
        let resp = test_schema()
            .execute(
                r#"{ observations(species: "White-tailed Eagle") { date }
                     regionCounts(species: "White-tailed Eagle") { region } }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "observations": [], "regionCounts": [] })
        );
    }

    #[tokio::test]
    async fn test_stats_summarizes_dataset() {
        let resp = test_schema()
            .execute("{ stats { observations species regions } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data.into_json().unwrap(),
            json!({ "stats": { "observations": 4, "species": 2, "regions": 3 } })
        );
    }
}
