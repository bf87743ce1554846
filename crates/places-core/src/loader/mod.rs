// crates/places-core/src/loader/mod.rs

//! # Data Loader
//!
//! Handles the physical layer (fetching, decompression) and delegates to the
//! CSV parsers. Sources only move bytes; everything after the fetch is shared
//! so a gzipped file behaves exactly like a plain one.

use crate::error::Result;
use crate::model::CountryMap;
use crate::traits::{DataSource, Resource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

mod common_io;
mod dir;
#[cfg(feature = "http")]
mod http;
mod rows;

pub use common_io::{decode_payload, is_gzip};
pub use dir::DirSource;
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use rows::{parse_countries, parse_places, ParsedPlaces};

/// Published dataset location.
pub const DEFAULT_DATA_URL: &str = "https://cdn.jsdelivr.net/npm/re.places.js@0.1.2/db";

/// Where the dataset files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceConfig {
    /// Base URL holding `places.txt`, `places-{iso2}.txt` and `countries.txt`.
    Url(String),
    /// Local directory with the same files, plain or `.gz`.
    Dir(PathBuf),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Url(DEFAULT_DATA_URL.to_owned())
    }
}

impl SourceConfig {
    pub fn into_source(self) -> Result<Arc<dyn DataSource>> {
        match self {
            SourceConfig::Dir(root) => Ok(Arc::new(DirSource::new(root))),
            #[cfg(feature = "http")]
            SourceConfig::Url(url) => Ok(Arc::new(HttpSource::new(url))),
            #[cfg(not(feature = "http"))]
            SourceConfig::Url(url) => Err(crate::error::PlacesError::invalid_param(
                "source",
                format!("{url} needs the `http` feature"),
            )),
        }
    }
}

/// Fetches and parses the country map.
pub async fn load_countries(source: &dyn DataSource) -> Result<CountryMap> {
    let bytes = source.fetch(&Resource::Countries).await?;
    let countries = parse_countries(&decode_payload(bytes)?)?;
    log::info!("loaded {} countries from {}", countries.len(), source.describe());
    Ok(countries)
}

/// Fetches and parses one places file.
///
/// Dropped rows are reported once per file.
pub async fn load_places<F>(
    source: &dyn DataSource,
    resource: &Resource,
    countries: &CountryMap,
    next_id: F,
) -> Result<ParsedPlaces>
where
    F: FnMut() -> String,
{
    let bytes = source.fetch(resource).await?;
    let parsed = parse_places(&decode_payload(bytes)?, countries, next_id)?;
    if parsed.dropped > 0 {
        log::warn!("{resource}: dropped {} malformed rows", parsed.dropped);
    }
    log::info!("{resource}: {} places", parsed.records.len());
    Ok(parsed)
}
