// crates/places-core/src/boost.rs

//! # Score Boosting
//!
//! Filters and boosts applied to each candidate while the index ranks it.
//! Exclusive rules drop candidates; inclusive rules only rescale scores and
//! record why in a [`Boost`].
//!
//! At most one boost rule is active per query: proximity when a point is
//! given, otherwise the IP-country boost. Boosts are always computed from
//! the pre-boost score, so evaluating the same result twice gives the same
//! outcome.

use crate::geometry::{distance_between, BoundingBox, LatLng, PolygonRing};
use crate::index::SearchResult;
use crate::params::QueryParams;
use serde::Serialize;

/// Multiplier floor for results inside `aroundRadius`; closeness adds up to 1.
pub const PROXIMITY_BASE: f64 = 4.0;
pub const IP_COUNTRY_MULTIPLIER: f64 = 3.0;

/// Why a result's score was changed, and from what.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boost {
    #[serde(rename = "scoreFrom")]
    pub score_from: f64,
    #[serde(flatten)]
    pub signal: BoostSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoostSignal {
    Proximity {
        #[serde(rename = "aroundLatLng")]
        around_lat_lng: bool,
        #[serde(rename = "distanceFromLatLng")]
        distance_from_lat_lng: f64,
    },
    IpCountry {
        #[serde(rename = "aroundLatLngViaIP")]
        around_lat_lng_via_ip: IpCountry,
    },
}

/// The country resolved from the caller's network location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpCountry {
    pub iso2: String,
}

/// One filter or boost.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Exclusive: keep only these lowercase ISO2 codes.
    Countries(Vec<String>),
    /// Inclusive: scale by `4 + (1 - d / radius)` within `radius` meters.
    Proximity { center: LatLng, radius: f64 },
    /// Inclusive: scale by 3 when the country matches.
    IpCountry(IpCountry),
    /// Exclusive.
    BoundingBox(BoundingBox),
    /// Exclusive.
    Polygon(PolygonRing),
}

impl Rule {
    /// Returns `false` when the result must be dropped.
    pub fn apply(&self, hit: &mut SearchResult) -> bool {
        match self {
            Rule::Countries(codes) => codes.iter().any(|c| *c == hit.record.country_code),
            Rule::Proximity { center, radius } => {
                let distance = distance_between(*center, hit.record.position());
                let boosted = distance <= *radius;
                boost_score(hit, boosted, PROXIMITY_BASE + (1.0 - distance / radius), || {
                    BoostSignal::Proximity {
                        around_lat_lng: true,
                        distance_from_lat_lng: distance,
                    }
                });
                true
            }
            Rule::IpCountry(country) => {
                let boosted = hit.record.country_code == country.iso2;
                boost_score(hit, boosted, IP_COUNTRY_MULTIPLIER, || BoostSignal::IpCountry {
                    around_lat_lng_via_ip: country.clone(),
                });
                true
            }
            Rule::BoundingBox(bbox) => bbox.contains(hit.record.position()),
            Rule::Polygon(polygon) => polygon.contains(hit.record.position()),
        }
    }
}

/// Rescales `hit` from its pre-boost score, or restores that score and
/// clears the provenance when the boost no longer applies.
fn boost_score<F>(hit: &mut SearchResult, boosted: bool, multiplier: f64, signal: F)
where
    F: FnOnce() -> BoostSignal,
{
    let base = hit.boost.take().map_or(hit.score, |b| b.score_from);
    hit.score = base;
    if boosted {
        hit.boost = Some(Boost {
            score_from: base,
            signal: signal(),
        });
        hit.score = base * multiplier;
    }
}

/// The rules of one query, evaluated in order.
#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    rules: Vec<Rule>,
}

impl SearchPlan {
    /// Builds the plan for `params`.
    ///
    /// `ip_country` is only consulted when [`wants_ip_country`] holds.
    pub fn from_params(params: &QueryParams, ip_country: Option<&str>) -> Self {
        let mut rules = Vec::new();

        if let Some(codes) = params.country_filter() {
            rules.push(Rule::Countries(codes));
        }

        if let Some(center) = params.around_lat_lng {
            rules.push(Rule::Proximity {
                center,
                radius: params.effective_radius(),
            });
        } else if wants_ip_country(params) {
            if let Some(iso2) = ip_country {
                rules.push(Rule::IpCountry(IpCountry {
                    iso2: iso2.to_lowercase(),
                }));
            }
        }

        if let Some(bbox) = &params.inside_bounding_box {
            rules.push(Rule::BoundingBox(bbox.clone()));
        } else if let Some(polygon) = &params.inside_polygon {
            rules.push(Rule::Polygon(polygon.clone()));
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs every rule; `false` as soon as one excludes the result.
    pub fn apply(&self, hit: &mut SearchResult) -> bool {
        self.rules.iter().all(|rule| rule.apply(hit))
    }
}

/// IP boosting only runs when nothing else narrows or anchors the search.
pub fn wants_ip_country(params: &QueryParams) -> bool {
    params.via_ip_enabled() && params.country_filter().is_none() && params.around_lat_lng.is_none()
}
