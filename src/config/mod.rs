//! Configuration for the propagation pipeline.
//!
//! - `defaults`: built-in default tree and section names
//! - `store`: `ConfigStore` with deep-merge, get/set and file load/save
//! - `validation`: whole-tree invariant checks
//! - `sections`: typed views (transmitter, P.1812, receiver grid, land cover)

pub mod defaults;
pub mod error;
pub mod sections;
pub mod store;
pub mod validation;

pub use defaults::default_config;
pub use error::ConfigError;
pub use sections::{LandCoverMappings, P1812Params, Polarization, ReceiverGenerationParams, SentinelHubParams, TransmitterInfo};
pub use store::{ConfigFormat, ConfigStore, deep_merge};
pub use validation::validate_config;
