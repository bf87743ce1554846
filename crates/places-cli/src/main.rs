//! places-cli — Command-line interface for places-core
//!
//! Runs searches against the place dataset from your terminal, preloads
//! it, prints index statistics, and measures distances.
//!
//! Usage examples
//! --------------
//!
//! - Autocomplete-style search (whole world, IP-boosted)
//!   $ places search lond
//!
//! - Restrict to countries, or boost around a point
//!   $ places search --countries FR,BE brux
//!   $ places search --around 51.5,-0.12 --radius 200000 lond
//!
//! - Filter to a bounding box and print the raw envelope
//!   $ places search --bbox 51.1,9.6,41.3,-5.2 --json saint
//!
//! - Inspect what a load indexes
//!   $ places --data-dir ./db stats --countries fr
//!
//! Data source
//! -----------
//!
//! By default the published dataset is fetched over HTTPS. Use
//! `--data-dir <dir>` for local files (plain or `.gz`) or `--data-url <url>`
//! for another mirror. `--config <file.toml>` sets engine defaults, and
//! `RUST_LOG=debug` shows cache and supersession decisions.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use places_core::{
    haversine_distance, BoundingBox, DataSource, EngineConfig, FixedLocator, LatLng, Locator,
    PlaceSearch,
    PolygonRing, QueryParams, ResponseEnvelope, SourceConfig,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = CliArgs::parse();

    match args.timeout_ms.map(Duration::from_millis) {
        Some(limit) => tokio::time::timeout(limit, run(args))
            .await
            .with_context(|| format!("gave up after {} ms", limit.as_millis()))?,
        None => run(args).await,
    }
}

async fn run(args: CliArgs) -> Result<()> {
    if let Commands::Distance { from, to } = &args.command {
        let from: LatLng = from.parse().context("invalid `from` point")?;
        let to: LatLng = to.parse().context("invalid `to` point")?;
        let meters = haversine_distance(from, to);
        println!("{:.0} m ({:.1} km)", meters, meters / 1000.0);
        return Ok(());
    }

    let engine = build_engine(&args).await?;

    match args.command {
        Commands::Search {
            query,
            countries,
            around,
            radius,
            bbox,
            polygon,
            hits,
            json,
        } => {
            let mut params = QueryParams::new(query);
            if let Some(codes) = countries {
                params = params.countries(split_codes(&codes));
            }
            if let Some(point) = around {
                params = params.around(point.parse().context("invalid --around")?);
            }
            if let Some(r) = radius {
                params = params.radius(r);
            }
            if let Some(b) = bbox {
                params = params.inside_bounding_box(b.parse::<BoundingBox>().context("invalid --bbox")?);
            }
            if let Some(p) = polygon {
                params = params.inside_polygon(p.parse::<PolygonRing>().context("invalid --polygon")?);
            }
            if let Some(n) = hits {
                params = params.hits_per_page(n);
            }

            match engine.search(params, false).await? {
                Some(response) if json => println!("{}", serde_json::to_string_pretty(&response)?),
                Some(response) => print_hits(&response),
                None => eprintln!("search was superseded"),
            }
        }

        Commands::Preload { countries } => {
            let started = Instant::now();
            preload(&engine, countries.as_deref()).await?;
            let stats = engine.stats();
            println!(
                "Loaded {} places in {:.1?} ({})",
                stats.records,
                started.elapsed(),
                if stats.full { "full dataset".to_owned() } else { stats.shards.join(",") }
            );
        }

        Commands::Stats { countries } => {
            preload(&engine, countries.as_deref()).await?;
            let stats = engine.stats();
            println!("Index statistics:");
            println!("  Places: {}", stats.records);
            println!("  Terms: {}", stats.terms);
            println!("  Full dataset: {}", stats.full);
            println!("  Shards: {}", stats.shards.join(", "));
            println!("  Generation: {}", stats.generation);
        }

        Commands::Distance { .. } => {}
    }

    Ok(())
}

async fn build_engine(args: &CliArgs) -> Result<PlaceSearch> {
    let source = match (&args.data_dir, &args.data_url) {
        (Some(dir), _) => SourceConfig::Dir(dir.clone()),
        (None, Some(url)) => SourceConfig::Url(url.clone()),
        (None, None) => SourceConfig::default(),
    }
    .into_source()?;

    let locator: Arc<dyn Locator> = if args.no_ip {
        Arc::new(FixedLocator::unknown())
    } else {
        default_locator()
    };

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<EngineConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if args.no_ip {
        config.around_lat_lng_via_ip = Some(false);
    }

    log::debug!("dataset: {}", source.describe());
    let engine = PlaceSearch::from_parts(source, locator);
    engine.init(config).await?;
    Ok(engine)
}

#[cfg(feature = "http")]
fn default_locator() -> Arc<dyn Locator> {
    Arc::new(places_core::TraceLocator::new())
}

#[cfg(not(feature = "http"))]
fn default_locator() -> Arc<dyn Locator> {
    Arc::new(FixedLocator::unknown())
}

async fn preload(engine: &PlaceSearch, countries: Option<&str>) -> Result<()> {
    let config = EngineConfig {
        countries: countries.map(split_codes),
        preload: true,
        ..EngineConfig::default()
    };
    engine.init(config).await.context("loading dataset")?;
    Ok(())
}

fn split_codes(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_lowercase())
        .filter(|x| !x.is_empty())
        .collect()
}

fn print_hits(response: &ResponseEnvelope) {
    if response.hits.is_empty() {
        println!("No places found matching: {}", response.query);
        return;
    }
    println!(
        "{} hits in {:.1} ms (fetch {:.1} ms)",
        response.nb_hits, response.processing_time_ms, response.fetch_time_ms
    );
    for hit in &response.hits {
        let region = if hit.admin.is_empty() {
            hit.country.clone()
        } else {
            format!("{}, {}", hit.admin, hit.country)
        };
        let boosted = if hit.boost.is_some() { " *" } else { "" };
        println!(
            "{:>9.3}{boosted}  {} — {} ({:.4}, {:.4})",
            hit.score, hit.city, region, hit.lat, hit.lng
        );
    }
}
