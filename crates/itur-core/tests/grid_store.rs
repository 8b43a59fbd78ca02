use std::fs;
use std::sync::Arc;

use itur_core::{GridAxis, GridStore, Interpolation, MapSpec, StackSpec, Unit};

fn template() -> MapSpec {
    MapSpec::new(
        "999",
        "unused",
        Unit::MillimeterPerHour,
        GridAxis::spanning(-90.0, 90.0, 45.0).unwrap(),
        GridAxis::spanning(-180.0, 180.0, 90.0).unwrap(),
        (0.0, 500.0),
    )
}

fn write_layer(dir: &std::path::Path, file: &str, value: f64) {
    let folder = dir.join("999");
    fs::create_dir_all(&folder).unwrap();
    let row = vec![format!("{}", value); 5].join(" ");
    let body = vec![row; 5].join("\n");
    fs::write(folder.join(format!("{}.txt", file)), body).unwrap();
}

#[test]
fn percentile_stack_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_layer(dir.path(), "v1_r_0_01", 60.0);
    write_layer(dir.path(), "v1_r_0_1", 30.0);
    write_layer(dir.path(), "v1_r_1", 10.0);

    let store = GridStore::new(dir.path());
    let spec = StackSpec::percentiles(&template(), "v1_r", &[0.01, 0.1, 1.0]);
    let stack = store.stack(&spec).unwrap();

    let at = |m: &itur_core::GeophysicalMap| m.bilinear(12.3, 45.6);
    assert_eq!(stack.at_percentage("rain", 0.1, at).unwrap(), 30.0);
    let mid = stack.at_percentage("rain", 0.3, at).unwrap();
    assert!(mid < 30.0 && mid > 10.0);
    assert!(stack.at_percentage("rain", 5.0, at).unwrap_err().is_out_of_domain());
}

#[test]
fn repeated_lookups_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_layer(dir.path(), "v1_r_1", 10.0);
    let store = Arc::new(GridStore::new(dir.path()).with_parallel_threshold(2));
    let spec = template().with_file("v1_r_1");

    let lat = Unit::Degree.vec((0..50).map(|i| -89.0 + 3.5 * i as f64).collect());
    let lon = Unit::Degree.vec((0..50).map(|i| -179.0 + 7.1 * i as f64).collect());
    let a = store.lookup(&spec, &lat, &lon, Interpolation::Bilinear).unwrap();
    let b = store.lookup(&spec, &lat, &lon, Interpolation::Bilinear).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|v| (*v - 10.0).abs() < 1e-12));
}

#[test]
fn shape_mismatch_names_the_input() {
    let store = GridStore::in_memory();
    let spec = template().with_file("v1_r_1");
    let map = itur_core::GeophysicalMap::new(
        "seeded",
        spec.unit,
        spec.lat,
        spec.lon,
        ndarray::Array2::from_elem((spec.lat.len, spec.lon.len), 1.0),
    )
    .unwrap();
    store.insert(&spec, map);

    let lat = Unit::Degree.vec(vec![0.0, 1.0, 2.0]);
    let lon = Unit::Degree.vec(vec![0.0, 1.0]);
    match store.lookup(&spec, &lat, &lon, Interpolation::Bilinear).unwrap_err() {
        itur_core::ItuError::ShapeMismatch { input, .. } => assert_eq!(input, "lon"),
        other => panic!("unexpected {:?}", other),
    }
}
