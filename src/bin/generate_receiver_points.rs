use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use p1812_coverage::gis::points_feature_collection;
use p1812_coverage::logging::init_logging;
use p1812_coverage::propagation::{generate_phyllotaxis, points_to_csv};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "generate-receiver-points")]
#[command(version, about = "Generate uniformly distributed receiver points using a phyllotaxis pattern", long_about = None)]
struct Cli {
    /// Starting latitude in degrees
    #[arg(allow_negative_numbers = true)]
    lat: f64,

    /// Starting longitude in degrees
    #[arg(allow_negative_numbers = true)]
    lon: f64,

    /// Number of points to generate
    num_points: usize,

    /// Radius of the point set in metres
    #[arg(long, default_value = "1000.0")]
    scale: f64,

    /// Output a GeoJSON point collection instead of lat,lon lines
    #[arg(long)]
    geojson: bool,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(0);

    let points = generate_phyllotaxis(cli.lat, cli.lon, cli.num_points, cli.scale);

    let rendered = if cli.geojson {
        points_feature_collection(&points).to_json_string().context("Failed to serialize GeoJSON")?
    } else {
        points_to_csv(&points)
    };

    match cli.output {
        Some(path) => {
            fs::write(&path, &rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            let kind = if cli.geojson { "GeoJSON" } else { "CSV" };
            info!("{} saved to {}", kind, path.display());
        }
        None if cli.geojson => println!("{}", rendered),
        None => print!("{}", rendered),
    }
    Ok(())
}
