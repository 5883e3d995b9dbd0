//! Logging setup and timing helpers shared by the binaries.

use env_logger::Builder;
use log::LevelFilter;
use std::time::{Duration, Instant};

/// Initialise `env_logger`.
///
/// Other crates log at Info; this crate's filter is raised by `verbosity`
/// (0 = Info, 1 = Debug, 2+ = Trace). `RUST_LOG` still overrides both.
pub fn init_logging(verbosity: u8) {
    let crate_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("p1812_coverage"), crate_level)
        .filter(Some("propagation_calculator"), crate_level)
        .filter(Some("generate_receiver_points"), crate_level)
        .parse_default_env()
        .init();
}

/// Wall-clock timer for observability only.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Human readable duration: seconds below a minute, then minutes, then hours.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}
