use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use p1812_coverage::config::ConfigStore;
use p1812_coverage::gis::FeatureCollection;
use p1812_coverage::logging::init_logging;
use p1812_coverage::propagation::{BatchOptions, BatchOrchestrator, BatchReport, CommandLossModel, JsonProfileLoader, LossModel};
use p1812_coverage::validation::{validate_link_lines, validate_receiver_points};
use std::fs;
use std::path::{Path, PathBuf};

/// Executable looked up on PATH when `--loss-command` is not given.
const DEFAULT_LOSS_COMMAND: &str = "p1812-bt-loss";

#[derive(Parser)]
#[command(name = "propagation-calculator")]
#[command(version, about = "Run ITU-R P.1812 propagation analysis on terrain profiles", long_about = None)]
struct Cli {
    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory containing profile JSON files
    #[arg(long)]
    profiles_dir: Option<PathBuf>,

    /// Directory for GeoJSON output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Pipeline configuration file (.json, .yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// External loss model executable (name on PATH or explicit path)
    #[arg(long, default_value = DEFAULT_LOSS_COMMAND)]
    loss_command: String,

    /// Extra argument passed to the loss model executable (repeatable)
    #[arg(long = "loss-arg")]
    loss_args: Vec<String>,

    /// Run data-quality checks on the written collections
    #[arg(long)]
    check: bool,
}

fn load_config(path: Option<&Path>) -> Result<ConfigStore> {
    let store = match path {
        Some(path) => ConfigStore::load(path).with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ConfigStore::from_defaults(),
    };
    store.log_summary();
    Ok(store)
}

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let data = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

fn check_outputs(report: &BatchReport) -> Result<()> {
    let points = read_collection(&report.points_path)?;
    match validate_receiver_points(&points) {
        Ok(stats) => info!(
            "Receivers: {} points, distance {:.2}-{:.2} km, Lb {:.1}-{:.1} dB",
            stats.total_points, stats.distance_range.0, stats.distance_range.1, stats.lb_range.0, stats.lb_range.1
        ),
        Err(e) => warn!("Points check failed: {}", e),
    }

    let lines = read_collection(&report.lines_path)?;
    match validate_link_lines(&lines) {
        Ok(count) => info!("Links: {} lines", count),
        Err(e) => warn!("Lines check failed: {}", e),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let model = CommandLossModel::locate(&cli.loss_command).map(|m| m.with_args(cli.loss_args.clone()));
    let orchestrator = BatchOrchestrator::new(model.as_ref().map(|m| m as &dyn LossModel), &config);
    let options = BatchOptions {
        profiles_dir: cli.profiles_dir,
        output_dir: cli.output_dir,
    };

    let report = orchestrator
        .run(&JsonProfileLoader, &options)
        .with_context(|| format!("Propagation run failed (loss command: {})", cli.loss_command))?;
    if cli.check {
        check_outputs(&report)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting propagation calculator");
    run(cli)?;
    info!("Propagation calculations complete");
    Ok(())
}
