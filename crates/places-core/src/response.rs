// crates/places-core/src/response.rs

//! # Response Envelope
//!
//! The serialized shape of a search answer, plus the canonical echo of the
//! parameters that were actually applied (`params` as a query string,
//! `paramsData` as structured data).

use crate::boost::{Boost, IpCountry};
use crate::geometry::{BoundingBox, LatLng, PolygonRing};
use crate::highlight::HighlightResult;
use crate::index::SearchResult;
use crate::params::QueryParams;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::fmt::Write as _;

/// One ranked place as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub id: String,
    pub city: String,
    pub admin: String,
    pub country: String,
    pub country_code: String,
    pub lat: f64,
    pub lng: f64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<Boost>,
    #[serde(rename = "_highlightResult")]
    pub highlight_result: HighlightResult,
}

impl Hit {
    pub fn new(result: SearchResult, highlight_result: HighlightResult) -> Self {
        let record = &result.record;
        Self {
            id: record.id.clone(),
            city: record.city.clone(),
            admin: record.admin.clone(),
            country: record.country.clone(),
            country_code: record.country_code.clone(),
            lat: record.lat,
            lng: record.lng,
            score: result.score,
            boost: result.boost,
            highlight_result,
        }
    }
}

/// `aroundLatLngViaIP` echo: the flag, or the country it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViaIp {
    Enabled(bool),
    Resolved(IpCountry),
}

/// Structured echo of the filters and boosts a search applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(rename = "aroundLatLngViaIP")]
    pub around_lat_lng_via_ip: ViaIp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub around_lat_lng: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub around_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inside_bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inside_polygon: Option<PolygonRing>,
}

impl ParamsData {
    /// `ip_country` is the country the IP boost actually used, if any.
    pub fn from_params(params: &QueryParams, ip_country: Option<&str>) -> Self {
        let around_lat_lng_via_ip = match ip_country {
            Some(iso2) => ViaIp::Resolved(IpCountry { iso2: iso2.to_owned() }),
            None => ViaIp::Enabled(params.via_ip_enabled()),
        };
        // Bounding box wins; the polygon is only echoed when it was applied.
        let inside_polygon = match params.inside_bounding_box {
            Some(_) => None,
            None => params.inside_polygon.clone(),
        };

        Self {
            countries: params.country_filter(),
            around_lat_lng_via_ip,
            around_lat_lng: params.around_lat_lng,
            around_radius: params.around_lat_lng.map(|_| params.effective_radius()),
            inside_bounding_box: params.inside_bounding_box.clone(),
            inside_polygon,
        }
    }

    /// `key=value` pairs for the query-string echo, in canonical order.
    ///
    /// `aroundLatLngViaIP` only appears when it was turned off.
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(countries) = &self.countries {
            let json = serde_json::to_string(countries).unwrap_or_default();
            pairs.push(("countries", json));
        }
        if self.around_lat_lng_via_ip == ViaIp::Enabled(false) {
            pairs.push(("aroundLatLngViaIP", "false".to_owned()));
        }
        if let Some(point) = self.around_lat_lng {
            pairs.push(("aroundLatLng", join_numbers(&[point.lat, point.lng])));
        }
        if let Some(radius) = self.around_radius {
            pairs.push(("aroundRadius", radius.to_string()));
        }
        if let Some(bbox) = &self.inside_bounding_box {
            pairs.push(("insideBoundingBox", join_numbers(&bbox.corners())));
        }
        if let Some(polygon) = &self.inside_polygon {
            pairs.push(("insidePolygon", join_numbers(polygon.coords())));
        }
        pairs
    }
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `hitsPerPage=…&language=en&query=…` followed by the applied filters.
pub fn params_string(hits_per_page: usize, query: &str, data: &ParamsData) -> String {
    let mut out = format!(
        "hitsPerPage={hits_per_page}&language=en&query={}",
        encode_uri_component(query)
    );
    for (key, value) in data.pairs() {
        let _ = write!(out, "&{key}={}", encode_uri_component(&value));
    }
    out
}

/// `encodeURIComponent`'s unreserved set: alphanumerics and `-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// A complete search answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub query: String,
    /// Time spent waiting for the dataset; 0 when it was already cached.
    #[serde(rename = "fetchTimeMS")]
    pub fetch_time_ms: f64,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: f64,
    pub params: String,
    pub params_data: ParamsData,
    pub nb_hits: usize,
    pub hits: Vec<Hit>,
}

impl ResponseEnvelope {
    pub fn new(
        params: &QueryParams,
        ip_country: Option<&str>,
        fetch_time_ms: f64,
        processing_time_ms: f64,
        hits: Vec<Hit>,
    ) -> Self {
        let params_data = ParamsData::from_params(params, ip_country);
        Self {
            query: params.query.clone(),
            fetch_time_ms,
            processing_time_ms,
            params: params_string(params.effective_hits_per_page(), &params.query, &params_data),
            params_data,
            nb_hits: hits.len(),
            hits,
        }
    }

    /// A well-formed answer with no hits.
    pub fn empty(params: &QueryParams, fetch_time_ms: f64, processing_time_ms: f64) -> Self {
        Self::new(params, None, fetch_time_ms, processing_time_ms, Vec::new())
    }
}
