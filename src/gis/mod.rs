//! GeoJSON output for propagation results.
//!
//! - `geojson`: feature / geometry / collection types
//! - `builder`: transmitter, receiver, link and coverage-area builders

pub mod builder;
pub mod geojson;

pub use builder::{close_ring, coverage_polygon, link_feature, points_feature_collection, receiver_feature, transmitter_feature};
pub use geojson::{Feature, FeatureCollection, Geometry, Position};
