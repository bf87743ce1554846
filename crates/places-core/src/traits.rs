// crates/places-core/src/traits.rs

//! Seams between the engine and the outside world.
//!
//! The engine never talks to the network or the filesystem directly: it asks
//! a [`DataSource`] for dataset files and a [`Locator`] for the caller's
//! country. Both are object-safe so an engine can be built from boxed
//! implementations chosen at runtime.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// One of the dataset files an engine may need.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Whole-world places (`places.txt`).
    Places,
    /// Places of a single country (`places-{iso2}.txt`), lowercase ISO2.
    CountryPlaces(String),
    /// ISO2 → display name (`countries.txt`).
    Countries,
}

impl Resource {
    /// File name of the resource relative to the dataset root.
    pub fn file_name(&self) -> String {
        match self {
            Resource::Places => "places.txt".to_owned(),
            Resource::CountryPlaces(iso2) => format!("places-{iso2}.txt"),
            Resource::Countries => "countries.txt".to_owned(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Where dataset files come from.
///
/// Implementations return the raw payload; gzip detection and CSV parsing
/// happen in the loader, so a source only moves bytes.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches the raw bytes of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`](crate::PlacesError) when the resource cannot
    /// be retrieved.
    async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// Best-effort IP → country resolution.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Lowercase or uppercase ISO2 of the caller, `None` when unknown.
    ///
    /// # Errors
    ///
    /// Errors are swallowed by the engine; they only reach the log.
    async fn locate(&self) -> Result<Option<String>>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for std::sync::Arc<T> {
    async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>> {
        (**self).fetch(resource).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_map_to_dataset_files() {
        assert_eq!(Resource::Places.file_name(), "places.txt");
        assert_eq!(Resource::CountryPlaces("fr".into()).file_name(), "places-fr.txt");
        assert_eq!(Resource::Countries.to_string(), "countries.txt");
    }
}
