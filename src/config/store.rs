//! Validated configuration store.
//!
//! A `ConfigStore` is constructed once at startup (defaults deep-merged with
//! overrides) and handed to the components that need it. The tree is
//! re-validated after every mutation, so a store is never observed in an
//! invalid state.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::defaults::{
    SECTION_CT_TO_R, SECTION_LCM10_TO_CT, SECTION_P1812, SECTION_RECEIVER_GENERATION, SECTION_SENTINEL_HUB, SECTION_TRANSMITTER,
    default_config,
};
use super::error::ConfigError;
use super::sections::{LandCoverMappings, P1812Params, Polarization, ReceiverGenerationParams, SentinelHubParams, TransmitterInfo};
use super::validation::validate_config;

/// Supported textual encodings, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the encoding from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(format!(".{}", ext))),
        }
    }

    fn parse(self, content: &str) -> Result<Value, ConfigError> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Yaml => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
                yaml_to_json(yaml)
            }
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    fn render(self, config: &Value) -> Result<String, ConfigError> {
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }
}

/// YAML mappings may use bare integer keys (`100: 1`); JSON objects need
/// string keys, so scalars used as keys are stringified.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, ConfigError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => serde_json::to_value(&n).map_err(|e| ConfigError::Parse(e.to_string()))?,
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_, _>>()?),
        Yaml::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => return Err(ConfigError::Parse(format!("unsupported mapping key: {:?}", other))),
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

/// Recursively merge `source` into `target`.
///
/// Leaves in `source` replace those in `target`; mappings present on both
/// sides are merged key by key rather than replaced wholesale.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                let nested = value.is_object() && target_map.get(&key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = target_map.get_mut(&key) {
                        deep_merge(existing, value);
                    }
                } else {
                    target_map.insert(key, value);
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Owner of the validated configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    config: Value,
}

impl ConfigStore {
    /// Build a store from the defaults, deep-merged with optional overrides.
    pub fn new(overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut config = default_config();
        if let Some(overrides) = overrides {
            deep_merge(&mut config, overrides);
        }
        validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn from_defaults() -> Self {
        Self { config: default_config() }
    }

    /// Load a configuration file and merge it onto the defaults.
    ///
    /// # Parameters
    ///
    /// * `path` - `.json`, `.yaml`/`.yml` or `.toml` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let overrides = format.parse(&content)?;
        debug!("Loaded {:?} configuration from {}", format, path.display());
        Self::new(Some(overrides))
    }

    /// Save the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        let content = format.render(&self.config)?;
        fs::write(path, content).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Look up a whole section (`key = None`) or a single key within it.
    pub fn get(&self, section: &str, key: Option<&str>) -> Option<&Value> {
        let section_data = self.config.get(section)?;
        match key {
            None => Some(section_data),
            Some(key) => section_data.as_object()?.get(key),
        }
    }

    /// Like `get`, falling back to `default` when the value is absent.
    pub fn get_or(&self, section: &str, key: Option<&str>, default: Value) -> Value {
        self.get(section, key).cloned().unwrap_or(default)
    }

    /// Set a single key, creating the section if absent, and re-validate.
    ///
    /// If the resulting tree is invalid the previous tree is kept and the
    /// validation error is returned.
    pub fn set(&mut self, section: &str, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut candidate = self.config.clone();
        let root = candidate.as_object_mut().ok_or_else(|| ConfigError::NotASection("<root>".to_string()))?;
        let entry = root.entry(section.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Some(section_map) = entry.as_object_mut() {
            section_map.insert(key.to_string(), value);
        }
        validate_config(&candidate)?;
        self.config = candidate;
        Ok(())
    }

    /// Export the tree as a serializable value.
    pub fn export(&self) -> Value {
        self.config.clone()
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        ConfigFormat::Json.render(&self.config)
    }

    fn typed_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
        let value = self.get(section, None).ok_or_else(|| ConfigError::MissingSections(vec![section.to_string()]))?;
        serde_json::from_value(value.clone()).map_err(|e| ConfigError::Parse(format!("{}: {}", section, e)))
    }

    pub fn transmitter(&self) -> Result<TransmitterInfo, ConfigError> {
        self.typed_section(SECTION_TRANSMITTER)
    }

    pub fn p1812(&self) -> Result<P1812Params, ConfigError> {
        let number = |key: &str| -> Result<f64, ConfigError> {
            self.get(SECTION_P1812, Some(key))
                .and_then(Value::as_f64)
                .ok_or_else(|| ConfigError::MissingKeys {
                    section: SECTION_P1812.to_string(),
                    keys: vec![key.to_string()],
                })
        };
        let raw_polarization = number("polarization")?;
        let polarization = Polarization::try_from(raw_polarization as u8)
            .map_err(|_| ConfigError::InvalidPolarization(serde_json::json!(raw_polarization)))?;
        Ok(P1812Params {
            frequency_ghz: number("frequency_ghz")?,
            time_percentage: number("time_percentage")?,
            polarization,
        })
    }

    pub fn receiver_generation(&self) -> Result<ReceiverGenerationParams, ConfigError> {
        self.typed_section(SECTION_RECEIVER_GENERATION)
    }

    /// Imagery parameters, if the optional section is present.
    pub fn sentinel_hub(&self) -> Option<SentinelHubParams> {
        self.typed_section(SECTION_SENTINEL_HUB).ok()
    }

    pub fn land_cover_mappings(&self) -> Result<LandCoverMappings, ConfigError> {
        LandCoverMappings::from_sections(&self.config[SECTION_LCM10_TO_CT], &self.config[SECTION_CT_TO_R])
    }

    /// Log the configuration in readable form.
    pub fn log_summary(&self) {
        info!("Pipeline configuration");
        if let Ok(tx) = self.transmitter() {
            info!("  Transmitter: {} at ({}, {})", tx.tx_id, tx.longitude, tx.latitude);
            info!("  Antenna heights: tx {} m, rx {} m", tx.antenna_height_tx, tx.antenna_height_rx);
        }
        if let Ok(p1812) = self.p1812() {
            info!("  Frequency: {} GHz", p1812.frequency_ghz);
            info!("  Time percentage: {}%", p1812.time_percentage);
            info!("  Polarization: {} ({})", p1812.polarization, p1812.polarization.code());
        }
        if let Ok(rg) = self.receiver_generation() {
            info!(
                "  Receiver generation: max {} km, azimuth step {}°, distance step {} km, resolution {} m",
                rg.max_distance_km, rg.azimuth_step, rg.distance_step, rg.sampling_resolution
            );
        }
        if let Some(sh) = self.sentinel_hub() {
            info!("  Sentinel Hub: buffer {} m, chip {} px, year {}", sh.buffer_m, sh.chip_px, sh.year);
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::from_defaults()
    }
}
