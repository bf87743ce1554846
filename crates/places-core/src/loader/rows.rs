// crates/places-core/src/loader/rows.rs
use crate::error::{PlacesError, Result};
use crate::model::{CountryMap, PlaceRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::sync::Arc;

/// Records parsed from one places file.
#[derive(Debug, Default)]
pub struct ParsedPlaces {
    pub records: Vec<Arc<PlaceRecord>>,
    /// Rows dropped for a wrong column count or unusable coordinates.
    pub dropped: usize,
}

/// Column positions resolved from a header row.
struct Columns {
    count: usize,
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        Self {
            count: header.len(),
            index: header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_lowercase(), i))
                .collect(),
        }
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PlacesError::InvalidData(format!("missing `{name}` column")))
    }
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Parses an `iso2,country` file.
pub fn parse_countries(text: &str) -> Result<CountryMap> {
    let mut rdr = reader(text);
    let columns = Columns::from_header(rdr.headers()?);
    let iso2 = columns.require("iso2")?;
    let country = columns.require("country")?;

    let mut map = CountryMap::new();
    for row in rdr.records() {
        let row = row?;
        if row.len() != columns.count {
            continue;
        }
        if let (Some(code), Some(name)) = (row.get(iso2), row.get(country)) {
            if !code.is_empty() {
                map.insert(code, name);
            }
        }
    }
    Ok(map)
}

/// Parses an `iso2,city,admin,lng,lat` file into records.
///
/// `next_id` is called once per accepted row. Malformed rows are skipped
/// and counted, never fatal; a missing header column is.
pub fn parse_places<F>(text: &str, countries: &CountryMap, mut next_id: F) -> Result<ParsedPlaces>
where
    F: FnMut() -> String,
{
    let mut rdr = reader(text);
    let columns = Columns::from_header(rdr.headers()?);
    let iso2 = columns.require("iso2")?;
    let city = columns.require("city")?;
    let admin = columns.require("admin")?;
    let lng_col = columns.require("lng")?;
    let lat_col = columns.require("lat")?;
    let id = columns.index.get("id").copied();

    let mut parsed = ParsedPlaces::default();
    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                parsed.dropped += 1;
                continue;
            }
        };
        if row.len() != columns.count {
            parsed.dropped += 1;
            continue;
        }

        let (Some(lat), Some(lng)) = (coordinate(&row, lat_col, 90.0), coordinate(&row, lng_col, 180.0)) else {
            parsed.dropped += 1;
            continue;
        };

        let record_id = id
            .and_then(|i| row.get(i))
            .filter(|v| !v.is_empty())
            .map_or_else(&mut next_id, str::to_owned);

        parsed.records.push(Arc::new(PlaceRecord::new(
            record_id,
            row.get(iso2).unwrap_or_default(),
            row.get(city).unwrap_or_default(),
            row.get(admin).unwrap_or_default(),
            lat,
            lng,
            countries,
        )));
    }
    Ok(parsed)
}

fn coordinate(row: &StringRecord, index: usize, limit: f64) -> Option<f64> {
    row.get(index)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}
