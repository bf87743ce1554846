// crates/places-core/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use places_core::{DataSource, Locator, PlacesError, Resource, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const COUNTRIES: &str = "\
iso2,country
au,Australia
fr,France
gb,United Kingdom
";

const HEADER: &str = "iso2,city,admin,lng,lat";

pub const AU_ROWS: &[&str] = &[
    "au,Darwin,Northern Territory,130.84,-12.46",
    "au,Sydney,New South Wales,151.21,-33.87",
];

pub const FR_ROWS: &[&str] = &[
    "fr,Lyon,Auvergne-Rhône-Alpes,4.83,45.76",
    "fr,Marseille,\"Provence-Alpes-Côte d'Azur\",5.37,43.30",
    "fr,Orléans,Centre-Val de Loire,1.90,47.90",
    "fr,Paris,Île-de-France,2.35,48.86",
];

pub const GB_ROWS: &[&str] = &[
    "gb,London,England,-0.13,51.51",
    "gb,Londonderry,Northern Ireland,-7.31,55.00",
];

pub fn total_places() -> usize {
    AU_ROWS.len() + FR_ROWS.len() + GB_ROWS.len()
}

fn csv(rows: &[&[&str]]) -> String {
    let mut out = String::from(HEADER);
    for row in rows.iter().flat_map(|r| r.iter()) {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

/// In-memory dataset that counts fetches per file and can be slowed down.
pub struct MemorySource {
    files: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl MemorySource {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(Resource::Countries.file_name(), COUNTRIES.to_owned());
        files.insert(Resource::Places.file_name(), csv(&[AU_ROWS, FR_ROWS, GB_ROWS]));
        files.insert(Resource::CountryPlaces("au".into()).file_name(), csv(&[AU_ROWS]));
        files.insert(Resource::CountryPlaces("fr".into()).file_name(), csv(&[FR_ROWS]));
        files.insert(Resource::CountryPlaces("gb".into()).file_name(), csv(&[GB_ROWS]));
        Self {
            files,
            calls: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without(mut self, resource: Resource) -> Self {
        self.files.remove(&resource.file_name());
        self
    }

    pub fn calls(&self, resource: &Resource) -> usize {
        self.calls.lock().unwrap().get(&resource.file_name()).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap().entry(resource.file_name()).or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.files
            .get(&resource.file_name())
            .map(|text| text.clone().into_bytes())
            .ok_or_else(|| PlacesError::NotFound(resource.to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}

/// Fixed answer that counts how often it was asked.
pub struct CountingLocator {
    answer: Option<String>,
    pub calls: AtomicUsize,
}

impl CountingLocator {
    pub fn new(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_owned),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Locator for CountingLocator {
    async fn locate(&self) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
