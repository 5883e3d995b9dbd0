//! Profile records and the named parameter set handed to the loss model.
//!
//! A `Profile` is the raw record as stored on disk, using the short P.1812
//! field names (`f`, `p`, `d`, `h`, `R`, `Ct`, `zone`, `htg`, `hrg`, `pol`,
//! `phi_t`, `phi_r`, `lam_t`, `lam_r`). `LossParameterSet` is the validated,
//! named form consumed by the loss model and by feature assembly.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::Polarization;

/// One terrain/clutter profile along the path from the transmitter to one receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub tx_id: String,
    /// Frequency (GHz).
    pub f: f64,
    /// Time percentage.
    pub p: f64,
    /// Distance of each profile point from the transmitter (km).
    pub d: Vec<f64>,
    /// Terrain height of each profile point (m).
    pub h: Vec<f64>,
    /// Representative clutter height / resistance per point.
    #[serde(rename = "R", default)]
    pub r: Vec<f64>,
    /// Land cover category per point.
    #[serde(rename = "Ct", default)]
    pub ct: Vec<u32>,
    /// Radio-climatic zone per point.
    #[serde(default)]
    pub zone: Vec<u32>,
    pub htg: f64,
    pub hrg: f64,
    pub pol: Polarization,
    /// Transmitter latitude.
    pub phi_t: f64,
    /// Receiver latitude.
    pub phi_r: f64,
    /// Transmitter longitude.
    pub lam_t: f64,
    /// Receiver longitude.
    pub lam_r: f64,
    /// Radial azimuth of the profile (degrees), informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<f64>,
}

/// Reason a profile record cannot be turned into a parameter set.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileDefect {
    EmptyDistances,
    LengthMismatch { field: &'static str, expected: usize, actual: usize },
}

impl std::fmt::Display for ProfileDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileDefect::EmptyDistances => write!(f, "profile has no distance samples"),
            ProfileDefect::LengthMismatch { field, expected, actual } => {
                write!(f, "profile field {} has {} samples, expected {}", field, actual, expected)
            }
        }
    }
}

impl Profile {
    /// Derive the named parameter set and the transmitter identifier.
    ///
    /// Per-point sequences (`h`, and `R`/`Ct`/`zone` when present) must have
    /// one entry per distance sample.
    pub fn to_loss_parameters(&self) -> Result<(LossParameterSet, String), ProfileDefect> {
        if self.d.is_empty() {
            return Err(ProfileDefect::EmptyDistances);
        }
        let expected = self.d.len();
        let lengths = [("h", self.h.len(), false), ("R", self.r.len(), true), ("Ct", self.ct.len(), true), ("zone", self.zone.len(), true)];
        for (field, actual, optional) in lengths {
            if actual != expected && !(optional && actual == 0) {
                return Err(ProfileDefect::LengthMismatch { field, expected, actual });
            }
        }

        let parameters = LossParameterSet {
            frequency_ghz: self.f,
            time_percentage: self.p,
            distances_km: self.d.clone(),
            heights_m: self.h.clone(),
            clutter_resistance: self.r.clone(),
            clutter_categories: self.ct.clone(),
            zones: self.zone.clone(),
            tx_antenna_height_m: self.htg,
            rx_antenna_height_m: self.hrg,
            polarization: self.pol,
            tx_lat: self.phi_t,
            tx_lon: self.lam_t,
            rx_lat: self.phi_r,
            rx_lon: self.lam_r,
        };
        Ok((parameters, self.tx_id.clone()))
    }
}

/// Inputs of one basic transmission loss computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossParameterSet {
    pub frequency_ghz: f64,
    pub time_percentage: f64,
    pub distances_km: Vec<f64>,
    pub heights_m: Vec<f64>,
    pub clutter_resistance: Vec<f64>,
    pub clutter_categories: Vec<u32>,
    pub zones: Vec<u32>,
    pub tx_antenna_height_m: f64,
    pub rx_antenna_height_m: f64,
    pub polarization: Polarization,
    pub tx_lat: f64,
    pub tx_lon: f64,
    pub rx_lat: f64,
    pub rx_lon: f64,
}

impl LossParameterSet {
    /// Total path length: the last distance sample (km).
    pub fn path_distance_km(&self) -> f64 {
        self.distances_km.last().copied().unwrap_or(0.0)
    }

    pub fn tx_lon_lat(&self) -> [f64; 2] {
        [self.tx_lon, self.tx_lat]
    }

    pub fn rx_lon_lat(&self) -> [f64; 2] {
        [self.rx_lon, self.rx_lat]
    }

    /// Positional argument list in the order of the P.1812 `bt_loss` call:
    /// `f, p, d, h, R, Ct, zone, htg, hrg, pol, phi_t, phi_r, lam_t, lam_r`.
    pub fn to_positional(&self) -> Vec<Value> {
        vec![
            json!(self.frequency_ghz),
            json!(self.time_percentage),
            json!(self.distances_km),
            json!(self.heights_m),
            json!(self.clutter_resistance),
            json!(self.clutter_categories),
            json!(self.zones),
            json!(self.tx_antenna_height_m),
            json!(self.rx_antenna_height_m),
            json!(self.polarization.code()),
            json!(self.tx_lat),
            json!(self.rx_lat),
            json!(self.tx_lon),
            json!(self.rx_lon),
        ]
    }
}

/// Output of one loss computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossResult {
    /// Basic transmission loss (dB).
    #[serde(rename = "Lb")]
    pub lb_db: f64,
    /// Electric field strength (dBμV/m).
    #[serde(rename = "Ep")]
    pub ep_dbuv_m: f64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Profile with `samples` evenly spaced points ending at `end_km`.
    pub(crate) fn sample_profile(end_km: f64, rx_lat: f64, rx_lon: f64) -> Profile {
        let samples = 5;
        let d: Vec<f64> = (0..samples).map(|i| end_km * i as f64 / (samples - 1) as f64).collect();
        Profile {
            tx_id: "TX_0001".to_string(),
            f: 0.9,
            p: 50.0,
            h: vec![100.0; samples],
            r: vec![0.0; samples],
            ct: vec![2; samples],
            zone: vec![4; samples],
            d,
            htg: 57.0,
            hrg: 10.0,
            pol: Polarization::Horizontal,
            phi_t: 9.345,
            phi_r: rx_lat,
            lam_t: -13.40694,
            lam_r: rx_lon,
            azimuth: None,
        }
    }

    #[test]
    fn parameters_carry_named_fields() {
        let profile = sample_profile(5.0, 9.39, -13.41);
        let (params, tx_id) = profile.to_loss_parameters().unwrap();
        assert_eq!(tx_id, "TX_0001");
        assert_eq!(params.path_distance_km(), 5.0);
        assert_eq!(params.tx_lon_lat(), [-13.40694, 9.345]);
        assert_eq!(params.rx_lon_lat(), [-13.41, 9.39]);
        assert_eq!(params.tx_antenna_height_m, 57.0);
    }

    #[test]
    fn positional_view_matches_bt_loss_argument_order() {
        let (params, _) = sample_profile(2.0, 9.36, -13.39).to_loss_parameters().unwrap();
        let positional = params.to_positional();
        assert_eq!(positional.len(), 14);
        assert_eq!(positional[2].as_array().unwrap().last().unwrap(), &json!(2.0));
        assert_eq!(positional[7], json!(57.0));
        assert_eq!(positional[8], json!(10.0));
        assert_eq!(positional[9], json!(1));
        assert_eq!(positional[10], json!(9.345));
        assert_eq!(positional[11], json!(9.36));
        assert_eq!(positional[12], json!(-13.40694));
        assert_eq!(positional[13], json!(-13.39));
    }

    #[test]
    fn empty_distances_are_rejected() {
        let mut profile = sample_profile(1.0, 0.0, 0.0);
        profile.d.clear();
        assert_eq!(profile.to_loss_parameters().unwrap_err(), ProfileDefect::EmptyDistances);
    }

    #[test]
    fn mismatched_heights_are_rejected() {
        let mut profile = sample_profile(1.0, 0.0, 0.0);
        profile.h.pop();
        assert!(matches!(profile.to_loss_parameters(), Err(ProfileDefect::LengthMismatch { field: "h", .. })));
    }

    #[test]
    fn optional_clutter_sequences_may_be_omitted() {
        let mut profile = sample_profile(1.0, 0.0, 0.0);
        profile.r.clear();
        profile.ct.clear();
        profile.zone.clear();
        assert!(profile.to_loss_parameters().is_ok());
    }

    #[test]
    fn profile_deserializes_from_short_field_names() {
        let raw = json!({
            "tx_id": "TX_7", "f": 0.9, "p": 50, "d": [0.0, 0.5, 1.0], "h": [10, 12, 11],
            "R": [0, 0, 10], "Ct": [2, 2, 3], "zone": [4, 4, 4],
            "htg": 57, "hrg": 10, "pol": 2,
            "phi_t": 9.0, "phi_r": 9.01, "lam_t": -13.0, "lam_r": -13.01
        });
        let profile: Profile = serde_json::from_value(raw).unwrap();
        assert_eq!(profile.pol, Polarization::Vertical);
        assert_eq!(profile.ct, vec![2, 2, 3]);
        assert_eq!(profile.to_loss_parameters().unwrap().0.path_distance_km(), 1.0);
    }
}
