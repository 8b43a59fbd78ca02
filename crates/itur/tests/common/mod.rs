use std::sync::Arc;

use itur::{required_maps, Config, Predictor, Versions};
use itur_core::{GeophysicalMap, GridStore, MapSpec};

/// Grid resolution of the synthetic maps.
pub const RESOLUTION: f64 = 10.0;

/// A plausible temperate-climate value for every map the models read.
fn value_for(spec: &MapSpec) -> f64 {
    let file = spec.file.as_str();
    match spec.recommendation {
        "453" if file.contains("dn65") => -40.0,
        "453" if file.contains("dn1") => -55.0,
        "453" => 45.0,
        "836" if file.starts_with("v6_rho") => 9.0,
        "836" if file.starts_with("v6_vsch") => 2.0,
        "836" if file.starts_with("v6_v") => 22.0,
        "836" => 0.1,
        "837" if file.starts_with("v6_pr6") => 5.0,
        "837" if file.starts_with("v6_mt") => 900.0,
        "837" if file.starts_with("v6_beta") => 0.3,
        "837" if file.starts_with("v7_r001") => 42.0,
        "837" => 75.0,
        "839" => 3.2,
        "840" => 0.45,
        "1510" => 287.0,
        "1511" => 100.0,
        _ => 0.0,
    }
}

/// An in-memory Grid Store holding constant maps for every dataset the
/// given editions read.
pub fn synthetic_store(versions: &Versions) -> GridStore {
    let store = GridStore::in_memory();
    for spec in required_maps(versions) {
        let map = GeophysicalMap::constant(spec.id(), spec.unit, RESOLUTION, value_for(&spec))
            .expect("constant map");
        store.insert(&spec, map);
    }
    store
}

pub fn predictor() -> Predictor {
    predictor_with(Versions::default())
}

pub fn predictor_with(versions: Versions) -> Predictor {
    let config = Config {
        versions,
        ..Config::default()
    };
    Predictor::new(Arc::new(synthetic_store(&versions)), &config)
}
