// crates/places-core/src/locate.rs

//! IP-based country detection.
//!
//! Used only to boost results from the caller's country. Any failure means
//! "no boost"; nothing here ever fails a search.

use crate::error::Result;
use crate::traits::Locator;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Cloudflare's plain-text trace endpoint; its `loc=` line is the ISO2.
pub const TRACE_URL: &str = "https://1.1.1.1/cdn-cgi/trace";

/// Extracts the lowercase country code from a trace body.
///
/// `XX` (Cloudflare's "unknown") and blank values yield `None`.
pub fn parse_trace(body: &str) -> Option<String> {
    body.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "loc")
        .map(|(_, value)| value.trim().to_lowercase())
        .filter(|code| code.len() == 2 && code != "xx")
}

/// Looks the caller up through the trace endpoint.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct TraceLocator {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http")]
impl TraceLocator {
    pub fn new() -> Self {
        Self::with_url(TRACE_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for TraceLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Locator for TraceLocator {
    async fn locate(&self) -> Result<Option<String>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_trace(&body))
    }
}

/// Always answers the same; for offline use and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator(pub Option<String>);

impl FixedLocator {
    pub fn country(iso2: &str) -> Self {
        Self(Some(iso2.to_lowercase()))
    }

    pub fn unknown() -> Self {
        Self(None)
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Runs a [`Locator`] at most once per engine and remembers the answer,
/// failures included.
pub struct GeoLocator {
    locator: Arc<dyn Locator>,
    resolved: OnceCell<Option<String>>,
}

impl GeoLocator {
    pub fn new(locator: Arc<dyn Locator>) -> Self {
        Self {
            locator,
            resolved: OnceCell::new(),
        }
    }

    /// Lowercase ISO2 of the caller, if it could be determined.
    ///
    /// Concurrent first calls share one lookup.
    pub async fn country(&self) -> Option<&str> {
        self.resolved
            .get_or_init(|| async {
                match self.locator.locate().await {
                    Ok(Some(code)) => {
                        log::debug!("caller located in {code}");
                        Some(code.to_lowercase())
                    }
                    Ok(None) => {
                        log::debug!("caller location unknown");
                        None
                    }
                    Err(err) => {
                        log::debug!("IP lookup failed, no country boost: {err}");
                        None
                    }
                }
            })
            .await
            .as_deref()
    }
}
