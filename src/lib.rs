//! Coverage analysis around a fixed transmitter using an external ITU-R P.1812
//! basic transmission loss model.
//!
//! The crate covers:
//! - uniform receiver point generation (golden-angle spiral)
//! - the validated pipeline configuration
//! - batch orchestration of loss computations over terrain/clutter profiles
//! - GeoJSON assembly of transmitter, receiver, link and coverage-area results
//!
//! The loss computation itself is not part of the crate; callers inject a
//! [`propagation::LossModel`].

pub mod config;
pub mod gis;
pub mod logging;
pub mod propagation;
pub mod validation;

pub use config::{ConfigError, ConfigStore};
pub use gis::{Feature, FeatureCollection, Geometry};
pub use propagation::{BatchError, BatchOptions, BatchOrchestrator, LossModel, LossParameterSet, LossResult, ProfileLoader, ReceiverPoint};
