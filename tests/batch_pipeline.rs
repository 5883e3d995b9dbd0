use p1812_coverage::config::ConfigStore;
use p1812_coverage::gis::{FeatureCollection, Geometry, Position};
use p1812_coverage::propagation::{
    BatchError, BatchOptions, BatchOrchestrator, JsonProfileLoader, LossModel, LossModelError, LossParameterSet, LossResult, Profile,
};
use p1812_coverage::validation::{validate_link_lines, validate_receiver_points};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

fn profile_json(end_km: f64, rx_lat: f64, rx_lon: f64) -> Value {
    let d: Vec<f64> = (0..=4).map(|i| end_km * i as f64 / 4.0).collect();
    json!({
        "tx_id": "TX_0001",
        "f": 0.9,
        "p": 50,
        "d": d,
        "h": [120.0, 118.5, 131.0, 140.2, 125.0],
        "R": [0, 0, 10, 15, 0],
        "Ct": [2, 2, 3, 4, 2],
        "zone": [4, 4, 4, 4, 4],
        "htg": 57,
        "hrg": 10,
        "pol": 1,
        "phi_t": 9.345,
        "phi_r": rx_lat,
        "lam_t": -13.40694,
        "lam_r": rx_lon
    })
}

fn distance_model(parameters: &LossParameterSet) -> Result<LossResult, LossModelError> {
    Ok(LossResult {
        lb_db: 100.0 + 5.0 * parameters.path_distance_km(),
        ep_dbuv_m: 60.0 - parameters.path_distance_km(),
    })
}

fn read_collection(path: &Path) -> FeatureCollection {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn polygon_ring(polygon: &FeatureCollection) -> Vec<Position> {
    match &polygon.features[0].geometry {
        Geometry::Polygon { coordinates } => coordinates[0].clone(),
        other => panic!("unexpected geometry {:?}", other),
    }
}

#[test]
fn run_writes_three_named_collections() {
    let profiles_dir = tempfile::tempdir().unwrap();
    let output_root = tempfile::tempdir().unwrap();
    let output_dir = output_root.path().join("nested").join("geojson");

    let receivers = [(2.0, 9.36, -13.40), (5.0, 9.35, -13.36), (3.0, 9.33, -13.42)];
    for (i, (end_km, lat, lon)) in receivers.iter().enumerate() {
        let path = profiles_dir.path().join(format!("profile_{:03}.json", i + 1));
        fs::write(path, profile_json(*end_km, *lat, *lon).to_string()).unwrap();
    }

    let model: &dyn LossModel = &distance_model;
    let config = ConfigStore::from_defaults();
    let orchestrator = BatchOrchestrator::new(Some(model), &config);
    let options = BatchOptions {
        profiles_dir: Some(profiles_dir.path().to_path_buf()),
        output_dir: Some(output_dir.clone()),
    };
    let report = orchestrator.run_at(&JsonProfileLoader, &options, "20240101_120000").unwrap();

    assert_eq!(report.profile_count, 3);
    assert_eq!(report.max_distance_km, 5.0);
    assert_eq!(report.points_path, output_dir.join("points_5p0km_20240101_120000.geojson"));
    assert_eq!(report.lines_path, output_dir.join("lines_5p0km_20240101_120000.geojson"));
    assert_eq!(report.polygon_path, output_dir.join("polygon_5p0km_20240101_120000.geojson"));

    let points = read_collection(&report.points_path);
    assert_eq!(points.len(), 4);
    assert_eq!(points.features[0].name(), Some("Transmitter"));
    let names: Vec<_> = points.features[1..].iter().filter_map(|f| f.name()).collect();
    assert_eq!(names, ["Receiver_1", "Receiver_2", "Receiver_3"]);
    let stats = validate_receiver_points(&points).unwrap();
    assert_eq!(stats.distance_range, (2.0, 5.0));
    assert_eq!(stats.lb_range, (110.0, 125.0));

    let lines = read_collection(&report.lines_path);
    assert_eq!(validate_link_lines(&lines).unwrap(), 3);
    assert_eq!(lines.features[0].name(), Some("Link_1"));
    assert_eq!(lines.features[2].property("rx_id"), Some(&json!(3)));

    let polygon = read_collection(&report.polygon_path);
    assert_eq!(polygon.len(), 1);
    let ring = polygon_ring(&polygon);
    assert_eq!(ring, vec![[-13.40, 9.36], [-13.36, 9.35], [-13.42, 9.33], [-13.40, 9.36]]);
}

#[test]
fn input_order_drives_ring_order_but_not_membership() {
    let base: Vec<Profile> = (0..8)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / 8.0;
            let value = profile_json(1.0 + i as f64, 9.345 + 0.02 * angle.cos(), -13.40694 + 0.02 * angle.sin());
            serde_json::from_value(value).unwrap()
        })
        .collect();
    let mut shuffled = base.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(7));
    if shuffled == base {
        shuffled.reverse();
    }

    let model: &dyn LossModel = &distance_model;
    let config = ConfigStore::from_defaults();
    let orchestrator = BatchOrchestrator::new(Some(model), &config);
    let ordered = orchestrator.assemble(&base).unwrap();
    let permuted = orchestrator.assemble(&shuffled).unwrap();

    let ring_a = polygon_ring(&ordered.polygon);
    let ring_b = polygon_ring(&permuted.polygon);
    assert_ne!(ring_a, ring_b);

    let sorted = |ring: &[Position]| {
        let mut vertices = ring[..ring.len() - 1].to_vec();
        vertices.sort_by(|a, b| a.partial_cmp(b).unwrap());
        vertices
    };
    assert_eq!(sorted(&ring_a), sorted(&ring_b));
    assert_eq!(ordered.max_distance_km, permuted.max_distance_km);
}

#[test]
fn missing_loss_model_fails_before_writing() {
    let output_dir = tempfile::tempdir().unwrap();
    let profiles: Vec<Profile> = vec![serde_json::from_value(profile_json(2.0, 9.36, -13.4)).unwrap()];
    let config = ConfigStore::from_defaults();
    let orchestrator = BatchOrchestrator::new(None, &config);
    let options = BatchOptions {
        profiles_dir: None,
        output_dir: Some(output_dir.path().to_path_buf()),
    };

    let err = orchestrator.run_at(&profiles, &options, "20240101_120000").unwrap_err();
    assert!(matches!(err, BatchError::Environment(_)));
    assert_eq!(fs::read_dir(output_dir.path()).unwrap().count(), 0);
}

#[test]
fn configured_polarization_must_match_the_profiles() {
    let profiles_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("pipeline.json");
    fs::write(&config_path, r#"{"P1812": {"frequency_ghz": 0.9, "polarization": 2}}"#).unwrap();
    fs::write(profiles_dir.path().join("profile_001.json"), profile_json(2.0, 9.36, -13.40).to_string()).unwrap();

    let config = ConfigStore::load(&config_path).unwrap();
    let model: &dyn LossModel = &distance_model;
    let options = BatchOptions {
        profiles_dir: Some(profiles_dir.path().to_path_buf()),
        output_dir: Some(output_dir.path().to_path_buf()),
    };
    let err = BatchOrchestrator::new(Some(model), &config)
        .run_at(&JsonProfileLoader, &options, "20240101_120000")
        .unwrap_err();

    assert!(matches!(err, BatchError::ConfigMismatch { index: 0, parameter: "polarization", .. }));
    assert_eq!(fs::read_dir(output_dir.path()).unwrap().count(), 0);
}
