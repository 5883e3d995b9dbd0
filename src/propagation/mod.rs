//! Receiver point generation and the batch propagation pipeline.
//!
//! ## Module Organization
//!
//! - `point_generator`: phyllotaxis receiver points
//! - `parameters`: profile records, `LossParameterSet`, `LossResult`
//! - `profile_loader`: `ProfileLoader` trait and the JSON directory loader
//! - `loss_model`: `LossModel` trait and the external command model
//! - `batch`: `BatchOrchestrator`, output naming and writing
//!
//! The loss model, the profile loader and the configuration are passed in by
//! the caller, which decides if and when the underlying implementation is
//! constructed.

pub mod batch;
pub mod loss_model;
pub mod parameters;
pub mod point_generator;
pub mod profile_loader;

pub use batch::{BatchError, BatchOptions, BatchOrchestrator, BatchOutput, BatchReport, LinkRecord, OutputNames, RunSettings, distance_tag, run_timestamp};
pub use loss_model::{CommandLossModel, LossModel, LossModelError};
pub use parameters::{LossParameterSet, LossResult, Profile, ProfileDefect};
pub use point_generator::{ReceiverPoint, generate_phyllotaxis, golden_angle, points_to_csv};
pub use profile_loader::{JsonProfileLoader, ProfileError, ProfileLoader};
