//! Batch orchestration: profiles in, three GeoJSON artifacts out.
//!
//! One run:
//! 1. resolves the input/output directories,
//! 2. loads the ordered profiles,
//! 3. derives each profile's parameter set, checks it against the configured
//!    transmitter and P.1812 settings, and calls the loss model,
//! 4. emits the transmitter once (from the first profile),
//! 5. emits a receiver and a link per profile and collects the coverage ring,
//! 6. closes the coverage polygon,
//! 7. names the outputs after the maximum path distance and a timestamp,
//! 8. writes points, lines and polygon collections.
//!
//! Profiles are processed strictly in load order. Receiver numbering, link
//! numbering and the coverage ring vertex order all follow that order, so
//! reordering the input changes the polygon.

use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::loss_model::{LossModel, LossModelError};
use super::parameters::{LossParameterSet, LossResult, Profile};
use super::profile_loader::{ProfileError, ProfileLoader};
use crate::config::{ConfigError, ConfigStore, Polarization};
use crate::gis::{FeatureCollection, Position, coverage_polygon, link_feature, receiver_feature, transmitter_feature};
use crate::logging::{Stopwatch, format_duration};

pub const DEFAULT_PROFILES_DIR: &str = "data/input/profiles";
pub const DEFAULT_OUTPUT_DIR: &str = "data/output/geojson";
pub const OUTPUT_EXTENSION: &str = "geojson";

/// Error type for batch run failures.
#[derive(Debug)]
pub enum BatchError {
    /// The loss computation collaborator is unavailable. Fatal, never retried.
    Environment(String),
    Config(ConfigError),
    /// A profile was prepared with settings other than the configured ones.
    ConfigMismatch { index: usize, parameter: &'static str, profile: f64, configured: f64 },
    Profile(ProfileError),
    LossModel { index: usize, source: LossModelError },
    Io { path: PathBuf, message: String },
    Serialize(String),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::Environment(msg) => write!(f, "Environment error: {}", msg),
            BatchError::Config(e) => write!(f, "{}", e),
            BatchError::ConfigMismatch {
                index,
                parameter,
                profile,
                configured,
            } => write!(f, "Profile {}: {} is {} but the configuration says {}", index + 1, parameter, profile, configured),
            BatchError::Profile(e) => write!(f, "{}", e),
            BatchError::LossModel { index, source } => write!(f, "Profile {}: {}", index + 1, source),
            BatchError::Io { path, message } => write!(f, "Failed to write {}: {}", path.display(), message),
            BatchError::Serialize(msg) => write!(f, "Failed to serialize GeoJSON: {}", msg),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Config(e) => Some(e),
            BatchError::Profile(e) => Some(e),
            BatchError::LossModel { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for BatchError {
    fn from(e: ConfigError) -> Self {
        BatchError::Config(e)
    }
}

impl From<ProfileError> for BatchError {
    fn from(e: ProfileError) -> Self {
        BatchError::Profile(e)
    }
}

/// Input/output locations; `None` falls back to the default directories.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub profiles_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl BatchOptions {
    pub fn profiles_dir(&self) -> PathBuf {
        self.profiles_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILES_DIR))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

/// Per-profile outcome, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    /// Zero-based processing index.
    pub index: usize,
    pub tx_id: String,
    pub result: LossResult,
    pub distance_km: f64,
    pub elapsed: Duration,
}

/// Everything a run produces before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub points: FeatureCollection,
    pub lines: FeatureCollection,
    pub polygon: FeatureCollection,
    pub max_distance_km: f64,
    pub records: Vec<LinkRecord>,
}

/// File names of the three artifacts of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub points: String,
    pub lines: String,
    pub polygon: String,
}

impl OutputNames {
    pub fn new(max_distance_km: f64, timestamp: &str) -> Self {
        let tag = distance_tag(max_distance_km);
        let name = |kind: &str| format!("{}_{}_{}.{}", kind, tag, timestamp, OUTPUT_EXTENSION);
        Self {
            points: name("points"),
            lines: name("lines"),
            polygon: name("polygon"),
        }
    }
}

/// Distance tag: one decimal place, `.` replaced by `p`, suffixed `km` (5.0 → `5p0km`).
pub fn distance_tag(max_distance_km: f64) -> String {
    format!("{:.1}km", max_distance_km).replace('.', "p")
}

/// Run timestamp as `YYYYMMDD_HHMMSS`.
pub fn run_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Paths written by a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub points_path: PathBuf,
    pub lines_path: PathBuf,
    pub polygon_path: PathBuf,
    pub profile_count: usize,
    pub max_distance_km: f64,
}

/// Configured values every profile of a run must have been prepared with.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub tx_id: String,
    pub frequency_ghz: f64,
    pub time_percentage: f64,
    pub polarization: Polarization,
    pub tx_antenna_height_m: f64,
    pub rx_antenna_height_m: f64,
}

const SETTING_TOLERANCE: f64 = 1e-9;

impl RunSettings {
    pub fn from_config(config: &ConfigStore) -> Result<Self, ConfigError> {
        let transmitter = config.transmitter()?;
        let p1812 = config.p1812()?;
        Ok(Self {
            tx_id: transmitter.tx_id,
            frequency_ghz: p1812.frequency_ghz,
            time_percentage: p1812.time_percentage,
            polarization: p1812.polarization,
            tx_antenna_height_m: transmitter.antenna_height_tx,
            rx_antenna_height_m: transmitter.antenna_height_rx,
        })
    }

    /// Fail on the first setting of profile `index` that disagrees with the configuration.
    pub fn check(&self, index: usize, parameters: &LossParameterSet) -> Result<(), BatchError> {
        let pairs = [
            ("frequency_ghz", parameters.frequency_ghz, self.frequency_ghz),
            ("time_percentage", parameters.time_percentage, self.time_percentage),
            ("polarization", f64::from(parameters.polarization.code()), f64::from(self.polarization.code())),
            ("antenna_height_tx", parameters.tx_antenna_height_m, self.tx_antenna_height_m),
            ("antenna_height_rx", parameters.rx_antenna_height_m, self.rx_antenna_height_m),
        ];
        match pairs.into_iter().find(|(_, profile, configured)| (profile - configured).abs() > SETTING_TOLERANCE) {
            Some((parameter, profile, configured)) => Err(BatchError::ConfigMismatch {
                index,
                parameter,
                profile,
                configured,
            }),
            None => Ok(()),
        }
    }
}

/// Drives one end-to-end run with an injected loss model and configuration.
pub struct BatchOrchestrator<'a> {
    model: Option<&'a dyn LossModel>,
    config: &'a ConfigStore,
}

impl<'a> BatchOrchestrator<'a> {
    /// `model` is `None` when the loss computation could not be provided;
    /// every run then fails with `BatchError::Environment`.
    pub fn new(model: Option<&'a dyn LossModel>, config: &'a ConfigStore) -> Self {
        Self { model, config }
    }

    fn require_model(&self) -> Result<&'a dyn LossModel, BatchError> {
        self.model.ok_or_else(|| {
            BatchError::Environment("loss computation model not available; install or configure the P.1812 loss command".to_string())
        })
    }

    /// Compute losses and build the three collections (steps 3 to 7, no I/O).
    pub fn assemble(&self, profiles: &[Profile]) -> Result<BatchOutput, BatchError> {
        let model = self.require_model()?;
        let settings = RunSettings::from_config(self.config)?;

        let mut points = Vec::with_capacity(profiles.len() + 1);
        let mut lines = Vec::with_capacity(profiles.len());
        let mut ring: Vec<Position> = Vec::with_capacity(profiles.len() + 1);
        let mut records = Vec::with_capacity(profiles.len());

        for (index, profile) in profiles.iter().enumerate() {
            let (parameters, tx_id) = profile.to_loss_parameters().map_err(|defect| ProfileError::Malformed {
                index,
                message: defect.to_string(),
            })?;
            settings.check(index, &parameters)?;
            let tx_id = if tx_id.is_empty() { settings.tx_id.clone() } else { tx_id };

            let stopwatch = Stopwatch::start();
            let result = model
                .compute_loss(&parameters)
                .map_err(|source| BatchError::LossModel { index, source })?;
            let elapsed = stopwatch.elapsed();

            info!(
                "Profile {}: Lb={:.2} dB, Ep={:.2} dBμV/m ({:.3}s)",
                index + 1,
                result.lb_db,
                result.ep_dbuv_m,
                elapsed.as_secs_f64()
            );

            if index == 0 {
                points.push(transmitter_feature(&parameters));
            }
            points.push(receiver_feature(&parameters, index + 1, &result));
            lines.push(link_feature(&parameters, index, &result));
            ring.push(parameters.rx_lon_lat());

            records.push(record(index, tx_id, &parameters, result, elapsed));
        }

        let max_distance_km = records.iter().map(|r| r.distance_km).fold(0.0, f64::max);

        Ok(BatchOutput {
            points: points.into(),
            lines: lines.into(),
            polygon: coverage_polygon(ring),
            max_distance_km,
            records,
        })
    }

    /// Run with the current local time as the output timestamp.
    pub fn run(&self, loader: &dyn ProfileLoader, options: &BatchOptions) -> Result<BatchReport, BatchError> {
        self.run_at(loader, options, &run_timestamp(Local::now()))
    }

    /// Run with an explicit output timestamp.
    ///
    /// Output files already written are left in place if a later write fails.
    pub fn run_at(&self, loader: &dyn ProfileLoader, options: &BatchOptions, timestamp: &str) -> Result<BatchReport, BatchError> {
        self.require_model()?;

        let profiles_dir = options.profiles_dir();
        let output_dir = options.output_dir();
        fs::create_dir_all(&output_dir).map_err(|e| BatchError::Io {
            path: output_dir.clone(),
            message: e.to_string(),
        })?;

        let stopwatch = Stopwatch::start();
        let profiles = loader.load_profiles(&profiles_dir)?;
        let output = self.assemble(&profiles)?;

        let names = OutputNames::new(output.max_distance_km, timestamp);
        let points_path = output_dir.join(&names.points);
        let lines_path = output_dir.join(&names.lines);
        let polygon_path = output_dir.join(&names.polygon);

        write_collection(&points_path, &output.points)?;
        write_collection(&lines_path, &output.lines)?;
        write_collection(&polygon_path, &output.polygon)?;

        info!("Saved GeoJSON files:");
        for path in [&points_path, &lines_path, &polygon_path] {
            info!("  - {}", path.display());
        }
        info!(
            "Processed {} profiles, max distance {:.1} km, in {}",
            profiles.len(),
            output.max_distance_km,
            format_duration(stopwatch.elapsed())
        );

        Ok(BatchReport {
            points_path,
            lines_path,
            polygon_path,
            profile_count: profiles.len(),
            max_distance_km: output.max_distance_km,
        })
    }
}

fn record(index: usize, tx_id: String, parameters: &LossParameterSet, result: LossResult, elapsed: Duration) -> LinkRecord {
    LinkRecord {
        index,
        tx_id,
        result,
        distance_km: parameters.path_distance_km(),
        elapsed,
    }
}

fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<(), BatchError> {
    let io_error = |e: std::io::Error| BatchError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection).map_err(|e| BatchError::Serialize(e.to_string()))?;
    writer.flush().map_err(io_error)?;
    debug!("Wrote {} features to {}", collection.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gis::Geometry;
    use crate::propagation::parameters::tests::sample_profile;

    fn fixed_model(p: &LossParameterSet) -> Result<LossResult, LossModelError> {
        Ok(LossResult {
            lb_db: 100.0 + 10.0 * p.path_distance_km(),
            ep_dbuv_m: 60.0 - p.path_distance_km(),
        })
    }

    fn three_profiles() -> Vec<Profile> {
        vec![
            sample_profile(2.0, 9.36, -13.40),
            sample_profile(5.0, 9.39, -13.43),
            sample_profile(3.0, 9.33, -13.42),
        ]
    }

    #[test]
    fn distance_tag_uses_p_for_decimal_point() {
        assert_eq!(distance_tag(5.0), "5p0km");
        assert_eq!(distance_tag(10.96), "11p0km");
        assert_eq!(distance_tag(0.0), "0p0km");
    }

    #[test]
    fn output_names_combine_tag_and_timestamp() {
        let names = OutputNames::new(5.0, "20260101_120000");
        assert_eq!(names.points, "points_5p0km_20260101_120000.geojson");
        assert_eq!(names.lines, "lines_5p0km_20260101_120000.geojson");
        assert_eq!(names.polygon, "polygon_5p0km_20260101_120000.geojson");
    }

    #[test]
    fn timestamp_has_date_and_time_blocks() {
        use chrono::TimeZone;
        let now = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(run_timestamp(now), "20260304_050607");
    }

    #[test]
    fn assemble_builds_points_lines_and_polygon() {
        let profiles = three_profiles();
        let config = ConfigStore::from_defaults();
        let model: &dyn LossModel = &fixed_model;
        let orchestrator = BatchOrchestrator::new(Some(model), &config);
        let output = orchestrator.assemble(&profiles).unwrap();

        assert_eq!(output.points.len(), 4);
        assert_eq!(output.points.features[0].name(), Some("Transmitter"));
        assert_eq!(output.points.features[1].name(), Some("Receiver_1"));
        assert_eq!(output.points.features[3].name(), Some("Receiver_3"));

        assert_eq!(output.lines.len(), 3);
        let ids: Vec<_> = output.lines.features.iter().map(|f| f.property("rx_id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)]);

        assert_eq!(output.max_distance_km, 5.0);
        assert_eq!(output.records[1].result.lb_db, 150.0);

        match &output.polygon.features[0].geometry {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].len(), 4);
                assert_eq!(coordinates[0][0], coordinates[0][3]);
                assert_eq!(coordinates[0][1], [-13.43, 9.39]);
            }
            other => panic!("unexpected geometry {}", other.kind()),
        }
    }

    #[test]
    fn missing_model_is_an_environment_error() {
        let profiles = three_profiles();
        let config = ConfigStore::from_defaults();
        let orchestrator = BatchOrchestrator::new(None, &config);
        assert!(matches!(orchestrator.assemble(&profiles), Err(BatchError::Environment(_))));
    }

    #[test]
    fn model_failure_names_the_profile() {
        let profiles = three_profiles();
        let config = ConfigStore::from_defaults();
        let failing: &dyn LossModel = &|p: &LossParameterSet| -> Result<LossResult, LossModelError> {
            if p.path_distance_km() == 5.0 {
                Err(LossModelError::Model("diverged".to_string()))
            } else {
                fixed_model(p)
            }
        };
        let orchestrator = BatchOrchestrator::new(Some(failing), &config);
        let err = orchestrator.assemble(&profiles).unwrap_err();
        assert!(matches!(err, BatchError::LossModel { index: 1, .. }));
        assert!(err.to_string().starts_with("Profile 2:"));
    }

    #[test]
    fn malformed_profile_stops_the_run() {
        let mut profiles = three_profiles();
        let config = ConfigStore::from_defaults();
        profiles[2].d.clear();
        let model: &dyn LossModel = &fixed_model;
        let orchestrator = BatchOrchestrator::new(Some(model), &config);
        let err = orchestrator.assemble(&profiles).unwrap_err();
        assert!(matches!(err, BatchError::Profile(ProfileError::Malformed { index: 2, .. })));
    }

    #[test]
    fn zero_profiles_is_a_degenerate_run() {
        let profiles: Vec<Profile> = Vec::new();
        let config = ConfigStore::from_defaults();
        let model: &dyn LossModel = &fixed_model;
        let output = BatchOrchestrator::new(Some(model), &config).assemble(&profiles).unwrap();
        assert!(output.points.is_empty());
        assert!(output.lines.is_empty());
        assert_eq!(output.polygon.len(), 1);
        assert_eq!(output.max_distance_km, 0.0);
    }

    #[test]
    fn profile_prepared_for_another_frequency_is_rejected() {
        let profiles = three_profiles();
        let config = ConfigStore::new(Some(serde_json::json!({"P1812": {"frequency_ghz": 2.4}}))).unwrap();
        let model: &dyn LossModel = &fixed_model;
        let err = BatchOrchestrator::new(Some(model), &config).assemble(&profiles).unwrap_err();
        match err {
            BatchError::ConfigMismatch {
                index,
                parameter,
                profile,
                configured,
            } => {
                assert_eq!(index, 0);
                assert_eq!(parameter, "frequency_ghz");
                assert_eq!(profile, 0.9);
                assert_eq!(configured, 2.4);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn polarization_and_antenna_heights_are_checked() {
        let (params, _) = sample_profile(2.0, 9.36, -13.40).to_loss_parameters().unwrap();
        let mut settings = RunSettings::from_config(&ConfigStore::from_defaults()).unwrap();
        assert!(settings.check(0, &params).is_ok());

        settings.polarization = Polarization::Vertical;
        assert!(matches!(settings.check(3, &params), Err(BatchError::ConfigMismatch { index: 3, parameter: "polarization", .. })));

        settings.polarization = Polarization::Horizontal;
        settings.rx_antenna_height_m = 1.5;
        let err = settings.check(0, &params).unwrap_err();
        assert!(err.to_string().contains("antenna_height_rx is 10 but the configuration says 1.5"));
    }

    #[test]
    fn empty_tx_id_is_taken_from_the_configuration() {
        let mut profiles = three_profiles();
        profiles[1].tx_id.clear();
        let config = ConfigStore::new(Some(serde_json::json!({"TRANSMITTER": {"tx_id": "TX_0042"}}))).unwrap();
        let model: &dyn LossModel = &fixed_model;
        let output = BatchOrchestrator::new(Some(model), &config).assemble(&profiles).unwrap();
        assert_eq!(output.records[0].tx_id, "TX_0001");
        assert_eq!(output.records[1].tx_id, "TX_0042");
    }

    #[test]
    fn missing_model_error_names_the_remedy() {
        let config = ConfigStore::from_defaults();
        let err = BatchOrchestrator::new(None, &config).assemble(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment error: loss computation model not available; install or configure the P.1812 loss command"
        );
    }
}
