//! Built-in default configuration tree.
//!
//! Every `ConfigStore` starts from this tree; overrides are deep-merged on top.

use serde_json::{Map, Value, json};

pub const SECTION_TRANSMITTER: &str = "TRANSMITTER";
pub const SECTION_P1812: &str = "P1812";
pub const SECTION_RECEIVER_GENERATION: &str = "RECEIVER_GENERATION";
pub const SECTION_SENTINEL_HUB: &str = "SENTINEL_HUB";
pub const SECTION_LCM10_TO_CT: &str = "LCM10_TO_CT";
pub const SECTION_CT_TO_R: &str = "CT_TO_R";

/// Sections that must be present in every valid configuration.
pub const REQUIRED_SECTIONS: [&str; 5] = [
    SECTION_TRANSMITTER,
    SECTION_P1812,
    SECTION_RECEIVER_GENERATION,
    SECTION_LCM10_TO_CT,
    SECTION_CT_TO_R,
];

/// ESA WorldCover (LCM10) class code to land cover category (Ct).
///
/// Water, urban, herbaceous and bare classes map to 1-2, shrubland to 3,
/// forest, herbaceous wetland and mangroves to 4.
const LCM10_TO_CT: [(u32, u32); 12] = [
    (100, 1),
    (80, 2),
    (30, 2),
    (40, 2),
    (70, 2),
    (110, 2),
    (254, 2),
    (20, 3),
    (50, 3),
    (10, 4),
    (60, 4),
    (90, 4),
];

/// Land cover category (Ct) to representative clutter resistance (R).
const CT_TO_R: [(u32, u32); 5] = [(1, 0), (2, 0), (3, 10), (4, 15), (5, 20)];

fn numeric_mapping(pairs: &[(u32, u32)]) -> Value {
    let map: Map<String, Value> = pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
    Value::Object(map)
}

/// Build a fresh copy of the default configuration tree.
pub fn default_config() -> Value {
    json!({
        SECTION_TRANSMITTER: {
            "tx_id": "TX_0001",
            "longitude": -13.40694,
            "latitude": 9.345,
            "antenna_height_tx": 57,
            "antenna_height_rx": 10,
        },
        SECTION_P1812: {
            "frequency_ghz": 0.9,
            "time_percentage": 50,
            // 1 = horizontal, 2 = vertical
            "polarization": 1,
        },
        SECTION_RECEIVER_GENERATION: {
            "max_distance_km": 11,
            "azimuth_step": 10,
            "distance_step": 0.03,
            "sampling_resolution": 30,
        },
        SECTION_SENTINEL_HUB: {
            "buffer_m": 11000,
            "chip_px": 734,
            "year": 2020,
        },
        SECTION_LCM10_TO_CT: numeric_mapping(&LCM10_TO_CT),
        SECTION_CT_TO_R: numeric_mapping(&CT_TO_R),
    })
}
