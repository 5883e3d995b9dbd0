//! Advisory data-quality checks for result collections.
//!
//! These checks are invoked by callers after a run; the pipeline itself does
//! not run them. They report structural problems (empty collections, missing
//! properties, missing categorical values) without changing the data.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::gis::{FeatureCollection, Geometry};

pub const RECEIVER_PROPERTIES: [&str; 7] = ["name", "Lb", "Ep", "hrg", "distance", "lon", "lat"];
pub const LINK_PROPERTIES: [&str; 9] = ["name", "rx_id", "tx_lon", "tx_lat", "rx_lon", "rx_lat", "distance_km", "Lb", "Ep"];

/// Error type for data-quality check failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The collection has no features.
    Empty,
    /// Features lack required properties; maps property name to the number of features missing it.
    MissingProperties(BTreeMap<String, usize>),
    /// A feature has an unexpected geometry kind.
    UnexpectedGeometry { index: usize, expected: &'static str, actual: &'static str },
    /// Expected categorical values are absent.
    MissingCategories(Vec<i64>),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "Feature collection is empty"),
            ValidationError::MissingProperties(missing) => {
                let names: Vec<_> = missing.iter().map(|(name, count)| format!("{} ({} features)", name, count)).collect();
                write!(f, "Missing properties: {}", names.join(", "))
            }
            ValidationError::UnexpectedGeometry { index, expected, actual } => {
                write!(f, "Feature {} has {} geometry, expected {}", index, actual, expected)
            }
            ValidationError::MissingCategories(values) => write!(f, "Missing categories: {:?}", values),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that a collection is non-empty and every feature carries `required` properties.
pub fn validate_feature_collection(collection: &FeatureCollection, required: &[&str]) -> Result<(), ValidationError> {
    if collection.is_empty() {
        return Err(ValidationError::Empty);
    }
    let mut missing = BTreeMap::new();
    for feature in &collection.features {
        for name in required {
            if !feature.properties.contains_key(*name) {
                *missing.entry(name.to_string()).or_insert(0) += 1;
            }
        }
    }
    if missing.is_empty() { Ok(()) } else { Err(ValidationError::MissingProperties(missing)) }
}

/// Summary of the receiver features of a points collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverPointStats {
    pub total_points: usize,
    pub distance_range: (f64, f64),
    pub lb_range: (f64, f64),
}

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Validate the receiver features of a points collection (the transmitter is skipped).
pub fn validate_receiver_points(points: &FeatureCollection) -> Result<ReceiverPointStats, ValidationError> {
    let receivers: FeatureCollection = points
        .features
        .iter()
        .filter(|f| f.name() != Some("Transmitter"))
        .cloned()
        .collect::<Vec<_>>()
        .into();
    validate_feature_collection(&receivers, &RECEIVER_PROPERTIES)?;
    for (index, feature) in receivers.features.iter().enumerate() {
        if !matches!(feature.geometry, Geometry::Point { .. }) {
            return Err(ValidationError::UnexpectedGeometry {
                index,
                expected: "Point",
                actual: feature.geometry.kind(),
            });
        }
    }

    let number = |name: &'static str| receivers.features.iter().filter_map(move |f| f.property(name).and_then(Value::as_f64));
    Ok(ReceiverPointStats {
        total_points: receivers.len(),
        distance_range: range(number("distance")),
        lb_range: range(number("Lb")),
    })
}

/// Validate a links collection; returns the number of links.
pub fn validate_link_lines(lines: &FeatureCollection) -> Result<usize, ValidationError> {
    validate_feature_collection(lines, &LINK_PROPERTIES)?;
    for (index, feature) in lines.features.iter().enumerate() {
        if !matches!(&feature.geometry, Geometry::LineString { coordinates } if coordinates.len() == 2) {
            return Err(ValidationError::UnexpectedGeometry {
                index,
                expected: "LineString",
                actual: feature.geometry.kind(),
            });
        }
    }
    Ok(lines.len())
}

/// Check that every `expected` categorical value occurs in `values`.
pub fn validate_categories(values: impl IntoIterator<Item = i64>, expected: &[i64]) -> Result<(), ValidationError> {
    let present: BTreeSet<i64> = values.into_iter().collect();
    let missing: Vec<i64> = expected.iter().copied().filter(|v| !present.contains(v)).collect();
    if missing.is_empty() { Ok(()) } else { Err(ValidationError::MissingCategories(missing)) }
}

/// Per-property completeness over a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessReport {
    pub total_rows: usize,
    /// Percentage of features with a non-null value, per property.
    pub completeness: BTreeMap<String, f64>,
    /// Number of features missing a value, for properties with gaps only.
    pub missing_rows: BTreeMap<String, usize>,
}

/// Report how complete the `critical` properties are; `true` when nothing is missing.
pub fn check_completeness(collection: &FeatureCollection, critical: &[&str]) -> (bool, CompletenessReport) {
    let total_rows = collection.len();
    let mut completeness = BTreeMap::new();
    let mut missing_rows = BTreeMap::new();
    for name in critical {
        let nulls = collection
            .features
            .iter()
            .filter(|f| f.property(name).is_none_or(Value::is_null))
            .count();
        let percent = if total_rows == 0 {
            0.0
        } else {
            (total_rows - nulls) as f64 / total_rows as f64 * 100.0
        };
        completeness.insert(name.to_string(), percent);
        if nulls > 0 {
            missing_rows.insert(name.to_string(), nulls);
        }
    }
    (
        missing_rows.is_empty(),
        CompletenessReport {
            total_rows,
            completeness,
            missing_rows,
        },
    )
}
