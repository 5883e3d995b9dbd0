//! Uniformly distributed receiver points using a phyllotaxis (golden-angle) spiral.
//!
//! Point `i` of `n` sits at angle `i * GOLDEN_ANGLE` and radius
//! `scale * sqrt((i + 0.5) / n)`. Taking the square root of a uniform index
//! keeps areal density constant (area grows with r²), and the half-step offset
//! keeps the first point off the origin.
//!
//! Offsets are converted to degrees with an equirectangular approximation,
//! which is only accurate for extents of a few tens of kilometres.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Approximate metres per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Golden angle in radians (≈137.5°).
pub fn golden_angle() -> f64 {
    2.0 * PI * (1.0 - 1.0 / 5.0_f64.sqrt())
}

/// Generated receiver location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiverPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Generate `num_points` points around `(lat0, lon0)`.
///
/// # Parameters
///
/// * `lat0`, `lon0` - Origin in degrees
/// * `num_points` - Number of points; 0 yields an empty vector
/// * `scale` - Radius of the outermost point in metres
///
/// Latitude/longitude ranges are not checked.
pub fn generate_phyllotaxis(lat0: f64, lon0: f64, num_points: usize, scale: f64) -> Vec<ReceiverPoint> {
    let golden_angle = golden_angle();
    let meters_per_degree_lon = METERS_PER_DEGREE * lat0.to_radians().cos();

    (0..num_points)
        .map(|i| {
            let angle = i as f64 * golden_angle;
            let radius = scale * ((i as f64 + 0.5) / num_points as f64).sqrt();

            let x = radius * angle.cos();
            let y = radius * angle.sin();

            ReceiverPoint {
                lat: lat0 + y / METERS_PER_DEGREE,
                lon: lon0 + x / meters_per_degree_lon,
            }
        })
        .collect()
}

/// Render points as `lat,lon` lines.
pub fn points_to_csv(points: &[ReceiverPoint]) -> String {
    points.iter().map(|p| format!("{},{}\n", p.lat, p.lon)).collect()
}
