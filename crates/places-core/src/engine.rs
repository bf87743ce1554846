// crates/places-core/src/engine.rs

//! # Query Coordinator
//!
//! [`PlaceSearch`] is the public entry point. One search runs through:
//!
//! 1. merge the caller's parameters with the engine defaults
//! 2. make sure the needed part of the dataset is indexed (may fetch)
//! 3. wait a short debounce so the next keystroke can supersede this one
//! 4. drop out if a newer request arrived meanwhile
//! 5. resolve the IP country if the boost needs it, then search, rank,
//!    truncate and highlight
//!
//! "Latest request wins": every non-empty search takes a sequence number and
//! publishes it as the latest. A request that finds a newer number after its
//! debounce never touches the index. A request already past that check is
//! not interrupted.

use crate::boost::{wants_ip_country, SearchPlan};
use crate::cache::DatasetCache;
use crate::common::IndexStats;
use crate::error::Result;
use crate::highlight::highlight;
use crate::locate::GeoLocator;
use crate::params::{Defaults, EngineConfig, QueryParams};
use crate::response::{Hit, ResponseEnvelope};
use crate::traits::{DataSource, Locator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::time::Instant;

/// Geo-aware, typo-tolerant place search over a lazily loaded dataset.
///
/// Each engine owns its cache, index and locator; independent engines can
/// live side by side in one process.
pub struct PlaceSearch {
    cache: DatasetCache,
    locator: GeoLocator,
    defaults: RwLock<Defaults>,
    next_seq: AtomicU64,
    latest: AtomicU64,
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

impl PlaceSearch {
    pub fn new<S, L>(source: S, locator: L) -> Self
    where
        S: DataSource + 'static,
        L: Locator + 'static,
    {
        Self::from_parts(Arc::new(source), Arc::new(locator))
    }

    pub fn from_parts(source: Arc<dyn DataSource>, locator: Arc<dyn Locator>) -> Self {
        Self {
            cache: DatasetCache::new(source),
            locator: GeoLocator::new(locator),
            defaults: RwLock::new(Defaults::default()),
            next_seq: AtomicU64::new(0),
            latest: AtomicU64::new(0),
        }
    }

    /// Engine reading the published dataset over HTTP and locating the
    /// caller through the Cloudflare trace.
    #[cfg(feature = "http")]
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self::new(
            crate::loader::HttpSource::new(base_url),
            crate::locate::TraceLocator::new(),
        )
    }

    /// Merges `config` into the defaults applied to every search.
    ///
    /// With `preload` set, the dataset those defaults call for is fetched and
    /// indexed before this returns. Spawn the call to preload in the
    /// background.
    ///
    /// # Errors
    ///
    /// Only a failed preload.
    pub async fn init(&self, config: EngineConfig) -> Result<()> {
        let countries = {
            let mut defaults = self.defaults.write().unwrap_or_else(PoisonError::into_inner);
            defaults.merge(&config);
            defaults.countries.clone()
        };

        if config.preload {
            let params = QueryParams {
                countries,
                ..QueryParams::default()
            };
            let outcome = self.cache.ensure(params.country_filter().as_deref()).await?;
            log::info!("preload finished (fetched: {})", outcome.fetched);
        }
        Ok(())
    }

    pub fn defaults(&self) -> Defaults {
        self.defaults.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Runs one search.
    ///
    /// Returns `Ok(None)` when a newer search superseded this one, unless
    /// `allow_empty_response` asks for an empty envelope instead. An empty
    /// query answers immediately with no hits and fetches nothing.
    ///
    /// # Errors
    ///
    /// Dataset fetch or parse failures. IP lookup failures only disable the
    /// IP boost.
    pub async fn search(
        &self,
        params: impl Into<QueryParams>,
        allow_empty_response: bool,
    ) -> Result<Option<ResponseEnvelope>> {
        let mut started = Instant::now();
        let defaults = self.defaults();
        let params = params.into().with_defaults(&defaults);

        if params.query.trim().is_empty() {
            return Ok(Some(ResponseEnvelope::empty(&params, 0.0, elapsed_ms(started))));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.fetch_max(seq, Ordering::SeqCst);

        let outcome = self.cache.ensure(params.country_filter().as_deref()).await?;
        let fetch_time_ms = if outcome.fetched {
            let ms = elapsed_ms(started);
            started = Instant::now();
            ms
        } else {
            0.0
        };

        tokio::time::sleep(defaults.debounce).await;

        if self.latest.load(Ordering::SeqCst) != seq {
            log::debug!("search #{seq} ({:?}) superseded", params.query);
            return Ok(allow_empty_response
                .then(|| ResponseEnvelope::empty(&params, fetch_time_ms, elapsed_ms(started))));
        }

        let ip_country = if wants_ip_country(&params) {
            self.locator.country().await.map(str::to_owned)
        } else {
            None
        };

        let plan = SearchPlan::from_params(&params, ip_country.as_deref());
        let index = self.cache.index();
        let mut results = index.search(&params.query, |hit| plan.apply(hit));
        results.truncate(params.effective_hits_per_page());

        let hits: Vec<Hit> = results
            .into_iter()
            .map(|result| {
                let highlighted = highlight(&params.query, &result.record, &result.matches);
                Hit::new(result, highlighted)
            })
            .collect();

        log::debug!("search #{seq} ({:?}): {} hits", params.query, hits.len());
        Ok(Some(ResponseEnvelope::new(
            &params,
            ip_country.as_deref(),
            fetch_time_ms,
            elapsed_ms(started),
            hits,
        )))
    }

    pub fn stats(&self) -> IndexStats {
        self.cache.stats()
    }
}
