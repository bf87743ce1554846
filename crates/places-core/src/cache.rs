// crates/places-core/src/cache.rs

//! # Dataset Cache
//!
//! Loads the dataset lazily and keeps it for the lifetime of the engine.
//!
//! - Country-scoped requests fetch only the missing `places-{iso2}.txt`
//!   shards; unscoped requests fetch `places.txt` once.
//! - The country map is fetched once and shared by every shard.
//! - Fetches in flight are shared futures: overlapping callers await the
//!   same download instead of starting another one.
//! - A full load replaces whatever shards were indexed before it, in one
//!   swap. Searches hold an `Arc` of the index they started with and never
//!   see a half-built one.

use crate::common::IndexStats;
use crate::error::{PlacesError, Result};
use crate::index::TextIndex;
use crate::loader;
use crate::model::{CountryMap, PlaceRecord};
use crate::traits::{DataSource, Resource};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

type SharedLoad<T> = Shared<BoxFuture<'static, std::result::Result<T, Arc<PlacesError>>>>;

/// What [`DatasetCache::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsureOutcome {
    /// `true` when the call waited on a fetch that had not finished yet.
    pub fetched: bool,
}

#[derive(Default)]
struct Loads {
    countries: Option<SharedLoad<Arc<CountryMap>>>,
    full: Option<SharedLoad<()>>,
    shards: HashMap<String, SharedLoad<()>>,
}

struct Snapshot {
    index: Arc<TextIndex>,
    shards: BTreeSet<String>,
    full: bool,
    generation: u64,
}

struct Inner {
    source: Arc<dyn DataSource>,
    loads: Mutex<Loads>,
    snapshot: RwLock<Snapshot>,
}

/// Shard-aware dataset cache owned by one engine.
#[derive(Clone)]
pub struct DatasetCache {
    inner: Arc<Inner>,
}

enum Pending {
    Full(SharedLoad<()>),
    Shard(String, SharedLoad<()>),
}

impl DatasetCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                loads: Mutex::new(Loads::default()),
                snapshot: RwLock::new(Snapshot {
                    index: Arc::new(TextIndex::new()),
                    shards: BTreeSet::new(),
                    full: false,
                    generation: 0,
                }),
            }),
        }
    }

    /// Makes sure the records needed for `countries` are indexed.
    ///
    /// `None` (or an empty list) means the whole world. Once the full
    /// dataset is loaded or loading, every call just waits for it.
    ///
    /// # Errors
    ///
    /// Fetch and parse failures of any load this call waited on. Failed loads
    /// are forgotten, so a later call fetches again.
    pub async fn ensure(&self, countries: Option<&[String]>) -> Result<EnsureOutcome> {
        let pending = self.plan(countries);
        let fetched = pending.iter().any(|p| p.load().peek().is_none());
        if !fetched {
            log::debug!("dataset cache hit for {countries:?}");
        }

        let results = future::join_all(pending.iter().map(|p| p.load().clone())).await;

        let mut first_error = None;
        for (pending, result) in pending.iter().zip(results) {
            if let Err(err) = result {
                self.forget(pending);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(PlacesError::Shared(err)),
            None => Ok(EnsureOutcome { fetched }),
        }
    }

    /// The index searches should run against right now.
    pub fn index(&self) -> Arc<TextIndex> {
        Arc::clone(&self.inner.read().index)
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.inner.read();
        IndexStats {
            records: snapshot.index.len(),
            terms: snapshot.index.term_count(),
            shards: snapshot.shards.iter().cloned().collect(),
            full: snapshot.full,
            generation: snapshot.generation,
        }
    }

    /// Registers whatever loads `countries` still needs, and returns every
    /// load the caller has to wait for.
    fn plan(&self, countries: Option<&[String]>) -> Vec<Pending> {
        let mut loads = self.inner.loads.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(full) = &loads.full {
            return vec![Pending::Full(full.clone())];
        }

        match countries.filter(|c| !c.is_empty()) {
            Some(codes) => {
                let mut pending = Vec::with_capacity(codes.len());
                for code in codes {
                    let code = code.trim().to_lowercase();
                    if pending.iter().any(|p| matches!(p, Pending::Shard(c, _) if *c == code)) {
                        continue;
                    }
                    let load = loads
                        .shards
                        .entry(code.clone())
                        .or_insert_with(|| self.inner.load_shard(code.clone()))
                        .clone();
                    pending.push(Pending::Shard(code, load));
                }
                pending
            }
            None => {
                let load = self.inner.load_full();
                loads.full = Some(load.clone());
                vec![Pending::Full(load)]
            }
        }
    }

    fn forget(&self, pending: &Pending) {
        let mut loads = self.inner.loads.lock().unwrap_or_else(PoisonError::into_inner);
        match pending {
            Pending::Full(load) => {
                if loads.full.as_ref().is_some_and(|l| l.ptr_eq(load)) {
                    loads.full = None;
                }
            }
            Pending::Shard(code, load) => {
                if loads.shards.get(code).is_some_and(|l| l.ptr_eq(load)) {
                    loads.shards.remove(code);
                }
            }
        }
    }
}

impl Pending {
    fn load(&self) -> &SharedLoad<()> {
        match self {
            Pending::Full(load) | Pending::Shard(_, load) => load,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Inner {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared load of the country map, restarted if the last attempt failed.
    async fn countries(self: Arc<Self>) -> Result<Arc<CountryMap>> {
        let load = {
            let mut loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
            loads
                .countries
                .get_or_insert_with(|| {
                    let inner = Arc::clone(&self);
                    async move {
                        loader::load_countries(inner.source.as_ref())
                            .await
                            .map(Arc::new)
                            .map_err(Arc::new)
                    }
                    .boxed()
                    .shared()
                })
                .clone()
        };

        match load.clone().await {
            Ok(countries) => Ok(countries),
            Err(err) => {
                let mut loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
                if loads.countries.as_ref().is_some_and(|l| l.ptr_eq(&load)) {
                    loads.countries = None;
                }
                Err(PlacesError::Shared(err))
            }
        }
    }

    fn load_shard(self: &Arc<Self>, code: String) -> SharedLoad<()> {
        let inner = Arc::clone(self);
        async move {
            let countries = Arc::clone(&inner).countries().await?;
            let resource = Resource::CountryPlaces(code.clone());
            let parsed = loader::load_places(inner.source.as_ref(), &resource, &countries, new_id).await?;
            inner.index_shard(&code, parsed.records);
            Ok::<(), PlacesError>(())
        }
        .map(|r| r.map_err(Arc::new))
        .boxed()
        .shared()
    }

    fn load_full(self: &Arc<Self>) -> SharedLoad<()> {
        let inner = Arc::clone(self);
        async move {
            let countries = Arc::clone(&inner).countries().await?;
            let parsed = loader::load_places(inner.source.as_ref(), &Resource::Places, &countries, new_id).await?;
            inner.index_full(parsed.records);
            Ok::<(), PlacesError>(())
        }
        .map(|r| r.map_err(Arc::new))
        .boxed()
        .shared()
    }

    fn index_shard(&self, code: &str, records: Vec<Arc<PlaceRecord>>) {
        let mut snapshot = self.write();
        if snapshot.full {
            log::debug!("shard {code} arrived after the full dataset; skipped");
            return;
        }
        Arc::make_mut(&mut snapshot.index).index(records);
        snapshot.shards.insert(code.to_owned());
        snapshot.generation += 1;
    }

    fn index_full(&self, records: Vec<Arc<PlaceRecord>>) {
        let mut index = TextIndex::new();
        index.index(records);

        let mut snapshot = self.write();
        if !snapshot.shards.is_empty() {
            log::info!(
                "full dataset supersedes {} shard(s): {:?}",
                snapshot.shards.len(),
                snapshot.shards
            );
        }
        snapshot.index = Arc::new(index);
        snapshot.shards.clear();
        snapshot.full = true;
        snapshot.generation += 1;
        log::info!("indexed {} places (generation {})", snapshot.index.len(), snapshot.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const COUNTRIES: &str = "iso2,country\nfr,France\ngb,United Kingdom\n";
    const FR: &str = "iso2,city,admin,lng,lat\nfr,Paris,Île-de-France,2.35,48.85\nfr,Lyon,Auvergne,4.83,45.76\n";
    const GB: &str = "iso2,city,admin,lng,lat\ngb,London,England,-0.12,51.5\n";

    #[derive(Default)]
    struct Memory {
        calls: AtomicUsize,
        fail_places: AtomicBool,
        shard_delay: Duration,
    }

    #[async_trait]
    impl DataSource for Memory {
        async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if matches!(resource, Resource::CountryPlaces(_)) && !self.shard_delay.is_zero() {
                tokio::time::sleep(self.shard_delay).await;
            }
            let text = match resource {
                Resource::Countries => COUNTRIES.to_owned(),
                Resource::CountryPlaces(c) if c == "fr" => FR.to_owned(),
                Resource::CountryPlaces(c) if c == "gb" => GB.to_owned(),
                Resource::Places if !self.fail_places.load(Ordering::SeqCst) => {
                    format!("{FR}{}", GB.lines().skip(1).collect::<Vec<_>>().join("\n"))
                }
                other => return Err(PlacesError::NotFound(other.to_string())),
            };
            Ok(text.into_bytes())
        }

        fn describe(&self) -> String {
            "memory".into()
        }
    }

    fn codes(c: &[&str]) -> Vec<String> {
        c.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn shards_are_fetched_once() {
        let source = Arc::new(Memory::default());
        let cache = DatasetCache::new(source.clone());

        let first = cache.ensure(Some(&codes(&["FR"]))).await.unwrap();
        assert!(first.fetched);
        let again = cache.ensure(Some(&codes(&["fr"]))).await.unwrap();
        assert!(!again.fetched);

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().shards, vec!["fr"]);
        assert_eq!(cache.index().len(), 2);
    }

    #[tokio::test]
    async fn full_load_replaces_shards_without_duplicates() {
        let source = Arc::new(Memory::default());
        let cache = DatasetCache::new(source.clone());

        cache.ensure(Some(&codes(&["fr", "gb"]))).await.unwrap();
        assert_eq!(cache.index().len(), 3);

        cache.ensure(None).await.unwrap();
        let stats = cache.stats();
        assert!(stats.full);
        assert!(stats.shards.is_empty());
        assert_eq!(stats.records, 3);

        // Scoped calls now ride on the full load.
        let calls = source.calls.load(Ordering::SeqCst);
        let outcome = cache.ensure(Some(&codes(&["de"]))).await.unwrap();
        assert!(!outcome.fetched);
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn shard_landing_after_full_load_is_skipped() {
        let source = Arc::new(Memory {
            shard_delay: Duration::from_millis(200),
            ..Memory::default()
        });
        let cache = DatasetCache::new(source.clone());
        let gb = codes(&["gb"]);

        let (shard, full) = tokio::join!(cache.ensure(Some(&gb)), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            cache.ensure(None).await
        });
        shard.unwrap();
        full.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.records, 3);
        assert!(stats.full);
        assert!(stats.shards.is_empty());
        assert_eq!(stats.generation, 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let source = Arc::new(Memory::default());
        let cache = DatasetCache::new(source.clone());
        let fr = codes(&["fr"]);

        let (a, b) = tokio::join!(cache.ensure(Some(&fr)), cache.ensure(Some(&fr)));
        a.unwrap();
        b.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.index().len(), 2);
    }

    #[tokio::test]
    async fn failed_load_is_retried_by_a_later_call() {
        let source = Arc::new(Memory::default());
        source.fail_places.store(true, Ordering::SeqCst);
        let cache = DatasetCache::new(source.clone());

        let err = cache.ensure(None).await.unwrap_err();
        assert!(matches!(err, PlacesError::Shared(_)));
        assert!(cache.index().is_empty());

        source.fail_places.store(false, Ordering::SeqCst);
        cache.ensure(None).await.unwrap();
        assert_eq!(cache.index().len(), 3);
    }

    #[tokio::test]
    async fn unknown_shard_fails_but_others_load() {
        let cache = DatasetCache::new(Arc::new(Memory::default()));
        assert!(cache.ensure(Some(&codes(&["fr", "zz"]))).await.is_err());
        assert_eq!(cache.stats().shards, vec!["fr"]);
    }

    #[test]
    fn stats_start_empty() {
        let cache = DatasetCache::new(Arc::new(Memory::default()));
        let stats = cache.stats();
        assert_eq!(stats.records, 0);
        assert_eq!(stats.generation, 0);
        assert!(!stats.full);
    }
}
