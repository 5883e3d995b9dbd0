//! Feature construction for propagation results.
//!
//! All builders are pure: they take already computed values and return a
//! feature. No geometry validation is done beyond closing the coverage ring.

use serde_json::{Map, Value, json};

use super::geojson::{Feature, FeatureCollection, Geometry, Position};
use crate::propagation::{LossParameterSet, LossResult, ReceiverPoint};

fn properties(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Transmitter point shared by every profile of a run.
pub fn transmitter_feature(parameters: &LossParameterSet) -> Feature {
    let [tx_lon, tx_lat] = parameters.tx_lon_lat();
    Feature::new(
        Geometry::Point { coordinates: [tx_lon, tx_lat] },
        properties(vec![
            ("name", json!("Transmitter")),
            ("frequency", json!(parameters.frequency_ghz)),
            ("htg", json!(parameters.tx_antenna_height_m)),
            ("polarization", json!(parameters.polarization.code())),
            ("lon", json!(tx_lon)),
            ("lat", json!(tx_lat)),
        ]),
    )
}

/// Receiver point, numbered from 1.
pub fn receiver_feature(parameters: &LossParameterSet, number: usize, result: &LossResult) -> Feature {
    let [rx_lon, rx_lat] = parameters.rx_lon_lat();
    Feature::new(
        Geometry::Point { coordinates: [rx_lon, rx_lat] },
        properties(vec![
            ("name", json!(format!("Receiver_{}", number))),
            ("Lb", json!(result.lb_db)),
            ("Ep", json!(result.ep_dbuv_m)),
            ("hrg", json!(parameters.rx_antenna_height_m)),
            ("distance", json!(parameters.path_distance_km())),
            ("lon", json!(rx_lon)),
            ("lat", json!(rx_lat)),
        ]),
    )
}

/// Transmitter to receiver link. `index` is zero-based; the feature is labelled `index + 1`.
pub fn link_feature(parameters: &LossParameterSet, index: usize, result: &LossResult) -> Feature {
    let [tx_lon, tx_lat] = parameters.tx_lon_lat();
    let [rx_lon, rx_lat] = parameters.rx_lon_lat();
    let id = index + 1;
    Feature::new(
        Geometry::LineString {
            coordinates: vec![[tx_lon, tx_lat], [rx_lon, rx_lat]],
        },
        properties(vec![
            ("name", json!(format!("Link_{}", id))),
            ("rx_id", json!(id)),
            ("tx_lon", json!(tx_lon)),
            ("tx_lat", json!(tx_lat)),
            ("rx_lon", json!(rx_lon)),
            ("rx_lat", json!(rx_lat)),
            ("distance_km", json!(parameters.path_distance_km())),
            ("Lb", json!(result.lb_db)),
            ("Ep", json!(result.ep_dbuv_m)),
        ]),
    )
}

/// Close a ring by repeating its first vertex when the last one differs.
pub fn close_ring(mut ring: Vec<Position>) -> Vec<Position> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// Coverage area polygon wrapped in a single-feature collection.
///
/// An empty ring yields a degenerate polygon with one empty ring.
pub fn coverage_polygon(ring: Vec<Position>) -> FeatureCollection {
    let ring = close_ring(ring);
    let feature = Feature::new(
        Geometry::Polygon { coordinates: vec![ring] },
        properties(vec![("name", json!("Coverage area"))]),
    );
    FeatureCollection::new(vec![feature])
}

/// Plain point collection for generated receiver locations (empty properties).
pub fn points_feature_collection(points: &[ReceiverPoint]) -> FeatureCollection {
    points
        .iter()
        .map(|point| Feature::new(Geometry::Point { coordinates: [point.lon, point.lat] }, Map::new()))
        .collect::<Vec<_>>()
        .into()
}
