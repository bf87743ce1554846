// crates/places-core/src/params.rs
use crate::geometry::{BoundingBox, LatLng, PolygonRing};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Radius used by `aroundLatLng` when none is given (cities, not addresses).
pub const DEFAULT_AROUND_RADIUS_M: f64 = 500_000.0;
pub const DEFAULT_HITS_PER_PAGE: usize = 5;
pub const MAX_HITS_PER_PAGE: usize = 20;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Caller-supplied search options.
///
/// Field names follow the wire names (`aroundLatLng`, `hitsPerPage`, ...)
/// so a JSON body can be deserialized directly. Geometry accepts either the
/// comma-separated string form or numeric arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub query: String,
    /// Exclusive ISO2 filter.
    pub countries: Option<Vec<String>>,
    pub around_lat_lng: Option<LatLng>,
    /// Meters; only meaningful together with `around_lat_lng`.
    pub around_radius: Option<f64>,
    /// Takes priority over `inside_polygon` when both are set.
    pub inside_bounding_box: Option<BoundingBox>,
    pub inside_polygon: Option<PolygonRing>,
    #[serde(rename = "aroundLatLngViaIP")]
    pub around_lat_lng_via_ip: Option<bool>,
    pub hits_per_page: Option<i64>,
}

impl QueryParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn around(mut self, point: LatLng) -> Self {
        self.around_lat_lng = Some(point);
        self
    }

    pub fn radius(mut self, meters: f64) -> Self {
        self.around_radius = Some(meters);
        self
    }

    pub fn inside_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.inside_bounding_box = Some(bbox);
        self
    }

    pub fn inside_polygon(mut self, polygon: PolygonRing) -> Self {
        self.inside_polygon = Some(polygon);
        self
    }

    pub fn via_ip(mut self, enabled: bool) -> Self {
        self.around_lat_lng_via_ip = Some(enabled);
        self
    }

    pub fn hits_per_page(mut self, n: i64) -> Self {
        self.hits_per_page = Some(n);
        self
    }

    /// Fills unset options from the engine defaults.
    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        if self.countries.is_none() {
            self.countries = defaults.countries.clone();
        }
        if self.around_lat_lng_via_ip.is_none() {
            self.around_lat_lng_via_ip = Some(defaults.around_lat_lng_via_ip);
        }
        self
    }

    /// Lowercased country filter, `None` when absent or empty.
    pub fn country_filter(&self) -> Option<Vec<String>> {
        self.countries
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(|c| c.iter().map(|code| code.trim().to_lowercase()).collect())
    }

    /// Radius in meters, falling back to [`DEFAULT_AROUND_RADIUS_M`].
    pub fn effective_radius(&self) -> f64 {
        match self.around_radius {
            Some(r) if r > 0.0 => r,
            _ => DEFAULT_AROUND_RADIUS_M,
        }
    }

    pub fn via_ip_enabled(&self) -> bool {
        self.around_lat_lng_via_ip.unwrap_or(true)
    }

    pub fn effective_hits_per_page(&self) -> usize {
        clamp_hits_per_page(self.hits_per_page)
    }
}

impl From<&str> for QueryParams {
    fn from(query: &str) -> Self {
        QueryParams::new(query)
    }
}

impl From<String> for QueryParams {
    fn from(query: String) -> Self {
        QueryParams::new(query)
    }
}

/// Absent or zero → 5, otherwise clamped to `1..=20`.
pub fn clamp_hits_per_page(requested: Option<i64>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_HITS_PER_PAGE,
        Some(n) => n.clamp(1, MAX_HITS_PER_PAGE as i64) as usize,
    }
}

/// Engine-wide settings passed to `PlaceSearch::init`.
///
/// Every field is optional; only the ones present override the current
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    #[serde(rename = "aroundLatLngViaIP")]
    pub around_lat_lng_via_ip: Option<bool>,
    pub countries: Option<Vec<String>>,
    /// Fetch the dataset right away instead of on first search.
    pub preload: bool,
    pub debounce_ms: Option<u64>,
}

/// Engine defaults merged into every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub around_lat_lng_via_ip: bool,
    pub countries: Option<Vec<String>>,
    pub debounce: Duration,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            around_lat_lng_via_ip: true,
            countries: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl Defaults {
    pub fn merge(&mut self, config: &EngineConfig) {
        if let Some(via_ip) = config.around_lat_lng_via_ip {
            self.around_lat_lng_via_ip = via_ip;
        }
        if let Some(countries) = &config.countries {
            self.countries = Some(countries.clone());
        }
        if let Some(ms) = config.debounce_ms {
            self.debounce = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_per_page_is_clamped() {
        assert_eq!(clamp_hits_per_page(None), 5);
        assert_eq!(clamp_hits_per_page(Some(0)), 5);
        assert_eq!(clamp_hits_per_page(Some(-4)), 1);
        assert_eq!(clamp_hits_per_page(Some(7)), 7);
        assert_eq!(clamp_hits_per_page(Some(500)), 20);
        for n in -50..50 {
            let v = clamp_hits_per_page(Some(n));
            assert!((1..=20).contains(&v));
        }
    }

    #[test]
    fn deserializes_wire_names_and_string_geometry() {
        let params: QueryParams = serde_json::from_str(
            r#"{
                "query": "lond",
                "countries": ["GB"],
                "aroundLatLng": "51.5,-0.12",
                "aroundRadius": 1000,
                "insideBoundingBox": "60,2,49,-8",
                "aroundLatLngViaIP": false,
                "hitsPerPage": 3
            }"#,
        )
        .unwrap();
        assert_eq!(params.query, "lond");
        assert_eq!(params.country_filter(), Some(vec!["gb".to_string()]));
        assert_eq!(params.around_lat_lng, Some(LatLng::new(51.5, -0.12)));
        assert_eq!(params.effective_radius(), 1000.0);
        assert!(params.inside_bounding_box.is_some());
        assert!(!params.via_ip_enabled());
        assert_eq!(params.effective_hits_per_page(), 3);
    }

    #[test]
    fn malformed_geometry_is_a_usage_error() {
        let err = serde_json::from_str::<QueryParams>(r#"{"insidePolygon": "1,2,3"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn defaults_fill_only_unset_options() {
        let mut defaults = Defaults::default();
        defaults.merge(&EngineConfig {
            around_lat_lng_via_ip: Some(false),
            countries: Some(vec!["fr".into()]),
            ..EngineConfig::default()
        });

        let merged = QueryParams::new("paris").with_defaults(&defaults);
        assert_eq!(merged.countries, Some(vec!["fr".to_string()]));
        assert_eq!(merged.around_lat_lng_via_ip, Some(false));

        let explicit = QueryParams::new("paris")
            .countries(["de"])
            .via_ip(true)
            .with_defaults(&defaults);
        assert_eq!(explicit.countries, Some(vec!["de".to_string()]));
        assert!(explicit.via_ip_enabled());
        assert_eq!(defaults.debounce, DEFAULT_DEBOUNCE);
    }

    #[test]
    fn radius_falls_back_to_default() {
        assert_eq!(QueryParams::new("x").effective_radius(), DEFAULT_AROUND_RADIUS_M);
        assert_eq!(QueryParams::new("x").radius(0.0).effective_radius(), DEFAULT_AROUND_RADIUS_M);
    }
}
