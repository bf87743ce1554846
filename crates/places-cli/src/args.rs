use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for places-cli
#[derive(Debug, Parser)]
#[command(
    name = "places",
    version,
    about = "CLI for searching and inspecting a places-core dataset"
)]
pub struct CliArgs {
    /// Base URL of the dataset (places.txt, places-{iso2}.txt, countries.txt)
    #[arg(long = "data-url", global = true, conflicts_with = "data_dir")]
    pub data_url: Option<String>,

    /// Local directory holding the dataset files instead of a URL
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML file with engine defaults (aroundLatLngViaIP, countries, debounceMs)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Never look up the caller's country by IP
    #[arg(long = "no-ip", global = true)]
    pub no_ip: bool,

    /// Give up on a command after this many milliseconds
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search places and print the hits
    Search {
        /// Query text (may be partial or misspelled)
        query: String,

        /// Comma-separated ISO2 codes to restrict to (e.g. FR,BE)
        #[arg(short = 'f', long = "countries")]
        countries: Option<String>,

        /// Boost results around a point, "lat,lng"
        #[arg(long = "around")]
        around: Option<String>,

        /// Boost radius in meters (default 500000)
        #[arg(long = "radius")]
        radius: Option<f64>,

        /// Keep only results inside "lat1,lng1,lat2,lng2"
        #[arg(long = "bbox")]
        bbox: Option<String>,

        /// Keep only results inside a flat "lat,lng,lat,lng,..." polygon
        #[arg(long = "polygon")]
        polygon: Option<String>,

        /// Number of hits (1-20, default 5)
        #[arg(short = 'n', long = "hits")]
        hits: Option<i64>,

        /// Print the full response envelope as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Fetch and index the dataset, then report what was loaded
    Preload {
        /// Comma-separated ISO2 codes; the whole world when omitted
        #[arg(short = 'f', long = "countries")]
        countries: Option<String>,
    },

    /// Load the dataset and print index statistics
    Stats {
        /// Comma-separated ISO2 codes; the whole world when omitted
        #[arg(short = 'f', long = "countries")]
        countries: Option<String>,
    },

    /// Great-circle distance in meters between two "lat,lng" points
    Distance { from: String, to: String },
}
