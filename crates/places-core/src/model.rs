// crates/places-core/src/model.rs
use crate::geometry::LatLng;
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single place as loaded from the dataset.
///
/// Immutable once built. The `*_norm` fields are diacritic-folded copies
/// used only for indexing and are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: String,
    pub city: String,
    #[serde(skip)]
    pub city_norm: String,
    /// Region / state. Empty when it would just repeat the city.
    pub admin: String,
    #[serde(skip)]
    pub admin_norm: String,
    /// Lowercase ISO2.
    pub country_code: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
}

impl PlaceRecord {
    /// Builds a record, resolving the country display name via `countries`.
    ///
    /// Unknown codes fall back to the uppercase ISO2 so the country field is
    /// never blank.
    pub fn new(
        id: String,
        iso2: &str,
        city: &str,
        admin: &str,
        lat: f64,
        lng: f64,
        countries: &CountryMap,
    ) -> Self {
        let country_code = iso2.trim().to_lowercase();
        let admin = if admin == city { "" } else { admin };
        let country = countries
            .name(&country_code)
            .map(str::to_owned)
            .unwrap_or_else(|| country_code.to_uppercase());

        Self {
            id,
            city: city.to_owned(),
            city_norm: normalize(city),
            admin: admin.to_owned(),
            admin_norm: normalize(admin),
            country_code,
            country,
            lat,
            lng,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Raw text of an indexed field.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::CityNorm => &self.city_norm,
            Field::City => &self.city,
            Field::AdminNorm => &self.admin_norm,
            Field::Country => &self.country,
        }
    }
}

/// The indexed fields of a [`PlaceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CityNorm,
    City,
    AdminNorm,
    Country,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::CityNorm, Field::City, Field::AdminNorm, Field::Country];

    /// Relative weight of a match in this field.
    pub fn boost(self) -> f64 {
        match self {
            Field::CityNorm | Field::City => 1.0,
            Field::AdminNorm | Field::Country => 0.1,
        }
    }

    /// The display field this index field highlights.
    pub fn display(self) -> DisplayField {
        match self {
            Field::CityNorm | Field::City => DisplayField::City,
            Field::AdminNorm => DisplayField::Admin,
            Field::Country => DisplayField::Country,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// A user-visible field that can carry highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    City,
    Admin,
    Country,
}

/// ISO2 → country display name. Loaded once and shared by every shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryMap {
    names: HashMap<String, String>,
}

impl CountryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iso2: &str, name: impl Into<String>) {
        self.names.insert(iso2.trim().to_lowercase(), name.into());
    }

    /// Case-insensitive lookup by ISO2.
    pub fn name(&self, iso2: &str) -> Option<&str> {
        self.names.get(&iso2.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for CountryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = CountryMap::new();
        for (k, v) in iter {
            map.insert(k.as_ref(), v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_resolves_country_and_folds_names() {
        let countries: CountryMap = [("FR", "France")].into_iter().collect();
        let r = PlaceRecord::new(
            "1".into(),
            "FR",
            "Orléans",
            "Centre-Val de Loire",
            47.9,
            1.9,
            &countries,
        );
        assert_eq!(r.country_code, "fr");
        assert_eq!(r.country, "France");
        assert_eq!(r.city_norm, "Orleans");
        assert_eq!(r.field(Field::AdminNorm), "Centre-Val de Loire");
    }

    #[test]
    fn admin_matching_city_is_blank() {
        let r = PlaceRecord::new("1".into(), "sg", "Singapore", "Singapore", 1.3, 103.8, &CountryMap::new());
        assert_eq!(r.admin, "");
        assert_eq!(r.country, "SG");
    }

    #[test]
    fn serialized_record_hides_index_fields() {
        let r = PlaceRecord::new("x".into(), "de", "Köln", "", 50.9, 6.9, &CountryMap::new());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("cityNorm").is_none());
        assert_eq!(json["countryCode"], "de");
    }
}
