use chrono::NaiveDate;

/// The `OBSERVATION COUNT` column: a bird count, or the eBird convention
/// `"X"` meaning "present, count unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationCount {
    Known(u32),
    PresenceOnly,
}

impl ObservationCount {
    /// Parse the raw column value. Anything that is neither `"X"` nor a
    /// non-negative integer degrades to [`ObservationCount::PresenceOnly`];
    /// the column is not part of the required field set.
    pub fn parse(raw: &str) -> Self {
        if raw == "X" {
            return ObservationCount::PresenceOnly;
        }
        raw.parse::<u32>()
            .map(ObservationCount::Known)
            .unwrap_or(ObservationCount::PresenceOnly)
    }
}

impl std::fmt::Display for ObservationCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationCount::Known(n) => write!(f, "{}", n),
            ObservationCount::PresenceOnly => write!(f, "X"),
        }
    }
}

/// One retained bird-sighting record.
///
/// `region` always holds the normalized form (see [`crate::region`]); the
/// raw `STATE` text is discarded at ingestion. A retained record is
/// guaranteed to have a non-empty common name and region and parsed
/// coordinates and date.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomic_order: String,
    pub count: ObservationCount,
    pub breeding_category: String,
    pub region: String,
    pub locality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
}

/// Observation count for one normalized region under some species filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCount {
    pub region: String,
    pub count: u64,
}

/// Observation count for one calendar day under some species filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Per-record map payload: coordinates plus the popup fields, paired by a
/// dense integer handle instead of a synthesized string identifier. Handles
/// enumerate the filtered records and share the `u32` sequence bound of
/// [`crate::index::SpeciesIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub handle: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub common_name: String,
    pub date: NaiveDate,
    pub locality: String,
    pub region: String,
}

/// Detail card for one species: the first retained record's fields plus the
/// species' total retained-record count.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesProfile {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomic_order: String,
    pub count: ObservationCount,
    pub breeding_category: String,
    pub region: String,
    pub locality: String,
    pub total_observations: u64,
}
