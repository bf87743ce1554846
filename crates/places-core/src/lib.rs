// crates/places-core/src/lib.rs

//! # places-core
//!
//! Geo-aware, typo-tolerant place search for city autocomplete.
//!
//! ```no_run
//! use places_core::{DirSource, FixedLocator, PlaceSearch, QueryParams};
//!
//! # async fn run() -> places_core::Result<()> {
//! let engine = PlaceSearch::new(DirSource::new("./db"), FixedLocator::unknown());
//! if let Some(response) = engine.search(QueryParams::new("lond").countries(["gb"]), false).await? {
//!     for hit in &response.hits {
//!         println!("{} ({}) {:.3}", hit.city, hit.country, hit.score);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod boost;
pub mod cache;
pub mod common;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod index;
pub mod loader; // Fetch, gunzip, CSV
pub mod locate;
pub mod model;
pub mod params;
pub mod response;
pub mod text;
pub mod traits;

// Re-exports
pub use crate::common::IndexStats;
pub use crate::engine::PlaceSearch;
pub use crate::error::{PlacesError, Result};
pub use crate::geometry::{distance_between, haversine_distance, BoundingBox, LatLng, PolygonRing};
pub use crate::highlight::{HighlightField, HighlightResult, MatchLevel};
pub use crate::loader::{DirSource, SourceConfig, DEFAULT_DATA_URL};
#[cfg(feature = "http")]
pub use crate::loader::HttpSource;
#[cfg(feature = "http")]
pub use crate::locate::TraceLocator;
pub use crate::locate::FixedLocator;
pub use crate::model::{CountryMap, PlaceRecord};
pub use crate::params::{EngineConfig, QueryParams};
pub use crate::response::{Hit, ResponseEnvelope};
pub use crate::text::{fold_key, normalize};
pub use crate::traits::{DataSource, Locator, Resource};
