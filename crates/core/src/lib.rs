//! Data pipeline for the Birds of Sweden observation explorer.
//!
//! Turns raw eBird-style tab-separated extracts into typed, region-normalized
//! observation records and answers the aggregation queries behind the map
//! views: species lists, per-region and per-day counts, and per-record
//! marker payloads. Rendering, image lookup, and all other UI concerns live
//! with external consumers of this crate.

pub mod dataset;
pub mod index;
pub mod ingest;
pub mod models;
pub mod query;
pub mod region;
