//! Basic usage example for places-rs
//!
//! This example demonstrates how to:
//! - Point the engine at the published dataset
//! - Run a typo-tolerant search
//! - Restrict to countries and boost around a point
//! - Read the highlight markup of a hit

use places_core::{EngineConfig, LatLng, PlaceSearch, QueryParams, DEFAULT_DATA_URL};

#[tokio::main]
async fn main() -> places_core::Result<()> {
    println!("=== places-rs Basic Usage Example ===\n");

    let engine = PlaceSearch::remote(DEFAULT_DATA_URL);
    engine
        .init(EngineConfig {
            around_lat_lng_via_ip: Some(false),
            debounce_ms: Some(0),
            ..EngineConfig::default()
        })
        .await?;

    // Example 1: Misspelled query against one country
    println!("--- Example 1: 'marseile' in France ---");
    let params = QueryParams::new("marseile").countries(["fr"]);
    if let Some(response) = engine.search(params, false).await? {
        println!(
            "{} hits (fetch {:.0} ms, processing {:.1} ms)",
            response.nb_hits, response.fetch_time_ms, response.processing_time_ms
        );
        for hit in &response.hits {
            println!("  {} ({}) score {:.3}", hit.city, hit.admin, hit.score);
        }
    }
    println!();

    // Example 2: Proximity boost
    println!("--- Example 2: 'lond' around Birmingham ---");
    let params = QueryParams::new("lond")
        .countries(["gb"])
        .around(LatLng::new(52.48, -1.89))
        .radius(200_000.0);
    if let Some(response) = engine.search(params, false).await? {
        for hit in &response.hits {
            let boosted = if hit.boost.is_some() { "boosted" } else { "" };
            println!("  {:<24} {:.3} {}", hit.city, hit.score, boosted);
        }
    }
    println!();

    // Example 3: Highlighting
    println!("--- Example 3: highlight for 'northern terr' ---");
    let params = QueryParams::new("northern terr").countries(["au"]).hits_per_page(3);
    if let Some(response) = engine.search(params, false).await? {
        for hit in &response.hits {
            let admin = hit
                .highlight_result
                .admin
                .first()
                .map(|field| field.value.as_str())
                .unwrap_or("");
            println!("  {}: {}", hit.city, admin);
        }
    }

    let stats = engine.stats();
    println!("\nIndexed {} places from shards {:?}", stats.records, stats.shards);
    Ok(())
}
