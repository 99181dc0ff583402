use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Route elevation profiles from SRTM tiles
#[derive(Parser)]
#[command(name = "elevroute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads tiles.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Directory containing .hgt / .hgt.zip files
    #[arg(short, long, env = "ELEVROUTE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Maximum tiles in cache
    #[arg(
        short,
        long,
        env = "ELEVROUTE_CACHE_SIZE",
        default_value = "100",
        global = true
    )]
    pub cache_size: u64,

    /// Clamp negative samples to sea level instead of gap-filling them
    #[arg(long, global = true)]
    pub keep_negative: bool,

    /// Elevation (m) below which both gap neighbors count as water
    #[arg(long, default_value = "5.0", global = true)]
    pub sea_level_threshold: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a gap-filled elevation profile for a route file
    Profile {
        /// Input file (.csv, .json route body, or .geojson)
        input: PathBuf,

        /// Output file (derived from the input name if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Display information about an SRTM tile
    Info {
        /// Path to a tile file, or tile name (e.g., N35E138)
        #[arg(required_unless_present_all = ["lat", "lon"])]
        tile: Option<String>,

        /// Specify tile by latitude instead of name
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Specify tile by longitude instead of name
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List available SRTM tiles
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "elevroute=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::profile::run(&cli.service, input, output, &lat_col, &lon_col),
        Commands::Query { lat, lon, json } => commands::query::run(&cli.service, lat, lon, json),
        Commands::Info { tile, lat, lon } => commands::info::run(&cli.service, tile, lat, lon),
        Commands::List => commands::list::run(&cli.service),
    }
}
