use p1812_coverage::config::{ConfigError, ConfigStore, Polarization};
use serde_json::json;
use std::fs;

#[test]
fn saved_configuration_loads_back_in_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConfigStore::from_defaults();
    store.set("P1812", "frequency_ghz", json!(2.4)).unwrap();
    store.set("TRANSMITTER", "tx_id", json!("TX_0042")).unwrap();

    for name in ["pipeline.json", "pipeline.yaml", "pipeline.yml", "pipeline.toml"] {
        let path = dir.path().join("configs").join(name);
        store.save(&path).unwrap();
        let loaded = ConfigStore::load(&path).unwrap();
        assert_eq!(loaded.export(), store.export(), "{}", name);
    }
}

#[test]
fn partial_yaml_overrides_merge_onto_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("override.yaml");
    fs::write(
        &path,
        "P1812:\n  polarization: 2\nCT_TO_R:\n  5: 25\nTRANSMITTER:\n  antenna_height_tx: 30\n",
    )
    .unwrap();

    let store = ConfigStore::load(&path).unwrap();
    let p1812 = store.p1812().unwrap();
    assert_eq!(p1812.polarization, Polarization::Vertical);
    assert_eq!(p1812.frequency_ghz, 0.9);
    assert_eq!(store.transmitter().unwrap().antenna_height_tx, 30.0);
    assert_eq!(store.get("TRANSMITTER", Some("tx_id")), Some(&json!("TX_0001")));

    let mappings = store.land_cover_mappings().unwrap();
    assert_eq!(mappings.resistance_for(5), Some(25.0));
    assert_eq!(mappings.resistance_for(4), Some(15.0));
}

#[test]
fn invalid_file_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[P1812]\ntime_percentage = 75\n").unwrap();

    let err = ConfigStore::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::OutOfRange { .. }));
    assert!(err.to_string().contains("[1, 50]"));
}

#[test]
fn missing_and_unknown_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(ConfigStore::load(&dir.path().join("absent.json")), Err(ConfigError::NotFound(_))));

    let ini = dir.path().join("pipeline.ini");
    fs::write(&ini, "[P1812]\n").unwrap();
    assert!(matches!(ConfigStore::load(&ini), Err(ConfigError::UnsupportedFormat(_))));
}
