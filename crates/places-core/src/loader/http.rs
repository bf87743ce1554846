// crates/places-core/src/loader/http.rs
use crate::error::{PlacesError, Result};
use crate::traits::{DataSource, Resource};
use async_trait::async_trait;
use reqwest::StatusCode;

use super::DEFAULT_DATA_URL;

/// Fetches dataset files over HTTP(S) from a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuses an existing client (timeouts, proxies, connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    pub fn url_for(&self, resource: &Resource) -> String {
        format!("{}/{}", self.base_url, resource.file_name())
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_URL)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>> {
        let url = self.url_for(resource);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlacesError::NotFound(url));
        }
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_file_name() {
        let source = HttpSource::new("https://example.com/db/");
        assert_eq!(
            source.url_for(&Resource::CountryPlaces("nz".into())),
            "https://example.com/db/places-nz.txt"
        );
        assert_eq!(HttpSource::default().url_for(&Resource::Places), format!("{DEFAULT_DATA_URL}/places.txt"));
    }
}
