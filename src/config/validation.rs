//! Whole-tree validation of the configuration.
//!
//! Validation is a pure function over the complete tree. It checks, in order:
//! - presence of every required section
//! - presence of the transmitter and P.1812 keys
//! - frequency, time percentage and polarization ranges

use serde_json::{Map, Value};

use super::defaults::{REQUIRED_SECTIONS, SECTION_P1812, SECTION_TRANSMITTER};
use super::error::ConfigError;

pub const FREQUENCY_GHZ_RANGE: (f64, f64) = (0.03, 6.0);
pub const TIME_PERCENTAGE_RANGE: (f64, f64) = (1.0, 50.0);

const REQUIRED_TRANSMITTER_KEYS: [&str; 4] = ["latitude", "longitude", "antenna_height_tx", "antenna_height_rx"];
const REQUIRED_P1812_KEYS: [&str; 3] = ["frequency_ghz", "time_percentage", "polarization"];

/// Validate a complete configuration tree.
///
/// # Returns
///
/// `Ok(())` if every invariant holds, otherwise the first violation found.
pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let missing: Vec<String> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| config.get(**section).is_none())
        .map(|section| section.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingSections(missing));
    }

    let tx = section(config, SECTION_TRANSMITTER)?;
    require_keys(SECTION_TRANSMITTER, tx, &REQUIRED_TRANSMITTER_KEYS)?;

    let p1812 = section(config, SECTION_P1812)?;
    require_keys(SECTION_P1812, p1812, &REQUIRED_P1812_KEYS)?;

    check_range("frequency_ghz", &p1812["frequency_ghz"], FREQUENCY_GHZ_RANGE)?;
    check_range("time_percentage", &p1812["time_percentage"], TIME_PERCENTAGE_RANGE)?;

    let polarization = &p1812["polarization"];
    match polarization.as_f64() {
        Some(p) if p == 1.0 || p == 2.0 => Ok(()),
        _ => Err(ConfigError::InvalidPolarization(polarization.clone())),
    }
}

fn section<'a>(config: &'a Value, name: &str) -> Result<&'a Map<String, Value>, ConfigError> {
    config
        .get(name)
        .and_then(Value::as_object)
        .ok_or_else(|| ConfigError::NotASection(name.to_string()))
}

fn require_keys(name: &str, section: &Map<String, Value>, keys: &[&str]) -> Result<(), ConfigError> {
    let missing: Vec<String> = keys.iter().filter(|key| !section.contains_key(**key)).map(|key| key.to_string()).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingKeys {
            section: name.to_string(),
            keys: missing,
        })
    }
}

fn check_range(parameter: &str, value: &Value, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    let number = value.as_f64().ok_or_else(|| ConfigError::InvalidType {
        parameter: parameter.to_string(),
        value: value.clone(),
        expected: "a number",
    })?;
    if number < min || number > max {
        return Err(ConfigError::OutOfRange {
            parameter: parameter.to_string(),
            value: value.clone(),
            min,
            max,
        });
    }
    Ok(())
}
