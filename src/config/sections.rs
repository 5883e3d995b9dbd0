//! Typed views over the validated configuration sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ConfigError;

/// Antenna polarization as used by the P.1812 model (1 = horizontal, 2 = vertical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Polarization {
    Horizontal,
    Vertical,
}

impl Polarization {
    pub fn code(self) -> u8 {
        match self {
            Polarization::Horizontal => 1,
            Polarization::Vertical => 2,
        }
    }
}

impl TryFrom<u8> for Polarization {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Polarization::Horizontal),
            2 => Ok(Polarization::Vertical),
            other => Err(format!("polarization {} must be 1 (H) or 2 (V)", other)),
        }
    }
}

impl From<Polarization> for u8 {
    fn from(p: Polarization) -> Self {
        p.code()
    }
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::Horizontal => write!(f, "Horizontal"),
            Polarization::Vertical => write!(f, "Vertical"),
        }
    }
}

/// Transmitter location and antenna heights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitterInfo {
    #[serde(default = "default_tx_id")]
    pub tx_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Transmitter antenna height above ground (m).
    pub antenna_height_tx: f64,
    /// Receiver antenna height above ground (m).
    pub antenna_height_rx: f64,
}

fn default_tx_id() -> String {
    "TX_0001".to_string()
}

/// P.1812 model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P1812Params {
    pub frequency_ghz: f64,
    pub time_percentage: f64,
    pub polarization: Polarization,
}

/// Sampling parameters for the radial receiver grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverGenerationParams {
    pub max_distance_km: f64,
    /// Degrees between radials.
    pub azimuth_step: f64,
    /// Kilometres between profile samples.
    pub distance_step: f64,
    /// Metres per raster sample.
    pub sampling_resolution: f64,
}

impl ReceiverGenerationParams {
    /// Number of radials covering a full circle.
    pub fn azimuth_count(&self) -> usize {
        if self.azimuth_step <= 0.0 {
            return 0;
        }
        (360.0 / self.azimuth_step) as usize
    }
}

/// Imagery request geometry. Credentials are deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelHubParams {
    pub buffer_m: f64,
    pub chip_px: u32,
    pub year: i32,
}

/// Land cover code → category → resistance lookup tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandCoverMappings {
    pub lcm10_to_ct: BTreeMap<u32, u32>,
    pub ct_to_r: BTreeMap<u32, f64>,
}

impl LandCoverMappings {
    pub(crate) fn from_sections(lcm10: &Value, ct_to_r: &Value) -> Result<Self, ConfigError> {
        let lcm10_to_ct = parse_mapping(lcm10, "LCM10_TO_CT", |v| v.as_u64().map(|n| n as u32))?;
        let ct_to_r = parse_mapping(ct_to_r, "CT_TO_R", Value::as_f64)?;
        Ok(Self { lcm10_to_ct, ct_to_r })
    }

    /// Land cover category for a raw LCM10 class code.
    pub fn category_for(&self, land_cover_code: u32) -> Option<u32> {
        self.lcm10_to_ct.get(&land_cover_code).copied()
    }

    /// Resistance for a land cover category.
    pub fn resistance_for(&self, category: u32) -> Option<f64> {
        self.ct_to_r.get(&category).copied()
    }

    /// Resistance for a raw LCM10 class code, chaining both tables.
    pub fn resistance_for_land_cover(&self, land_cover_code: u32) -> Option<f64> {
        self.category_for(land_cover_code).and_then(|ct| self.resistance_for(ct))
    }
}

fn parse_mapping<T>(section: &Value, name: &str, convert: impl Fn(&Value) -> Option<T>) -> Result<BTreeMap<u32, T>, ConfigError> {
    let object = section.as_object().ok_or_else(|| ConfigError::NotASection(name.to_string()))?;
    let mut mapping = BTreeMap::new();
    for (key, value) in object {
        let code: u32 = key.trim().parse().map_err(|_| ConfigError::InvalidType {
            parameter: format!("{}.{}", name, key),
            value: Value::String(key.clone()),
            expected: "a numeric key",
        })?;
        let converted = convert(value).ok_or_else(|| ConfigError::InvalidType {
            parameter: format!("{}.{}", name, key),
            value: value.clone(),
            expected: "a number",
        })?;
        mapping.insert(code, converted);
    }
    Ok(mapping)
}
