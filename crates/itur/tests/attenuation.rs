mod common;

use std::sync::Arc;
use std::thread;

use itur::p618::TOTAL_PERCENTAGE_RANGE;
use itur::versions::P618Version;
use itur::{Config, Contributions, FrequencyPolicy, GridStore, ItuError, LinkParameters, Predictor, Unit, Versions};

fn deg(v: f64) -> itur::Quantity {
    Unit::Degree.of(v)
}

#[test]
fn total_attenuation_decreases_with_percentage() {
    let pred = common::predictor();
    let (lat, lon, f, el, d) = (deg(41.39), deg(-71.05), Unit::GigaHertz.of(22.5), deg(60.0), Unit::Meter.of(1.0));
    let ps = [0.001, 0.01, 0.1, 1.0, 5.0, 10.0, 50.0, 99.0];
    let p = Unit::Percent.vec(ps.to_vec());
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);

    let total = pred.total_attenuation(&link, Contributions::ALL).unwrap();
    assert_eq!(total.shape(), &[ps.len()]);
    let values: Vec<f64> = total.iter().copied().collect();
    for pair in values.windows(2) {
        assert!(pair[0] >= pair[1], "not monotone: {:?}", values);
    }
    assert!(values.iter().all(|a| a.is_finite() && *a > 0.0));
}

#[test]
fn breakdown_combines_contributions() {
    let pred = common::predictor();
    let (lat, lon, f, el, d) = (deg(10.0), deg(20.0), Unit::GigaHertz.of(14.25), deg(35.0), Unit::Meter.of(2.4));
    let p = Unit::Percent.vec(vec![0.05, 0.5, 2.0, 20.0]);
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);

    let b = pred.attenuation_breakdown(&link, Contributions::ALL).unwrap();
    for i in 0..4 {
        let at = |q: &itur::Quantity| q.get(&[i]).unwrap();
        let expected = at(&b.gas) + ((at(&b.rain) + at(&b.cloud)).powi(2) + at(&b.scintillation).powi(2)).sqrt();
        assert!((at(&b.total) - expected).abs() < 1e-9);
    }
    // rain stops contributing above 5 %
    assert_eq!(b.rain.get(&[3]), Some(0.0));
    // gas and cloud are held at their 1 % value below 1 %
    assert_eq!(b.gas.get(&[0]), b.gas.get(&[1]));
    assert_eq!(b.cloud.get(&[0]), b.cloud.get(&[1]));

    let no_scint = pred.total_attenuation(&link, Contributions::NO_SCINTILLATION).unwrap();
    for (with, without) in b.total.iter().zip(no_scint.iter()) {
        assert!(with >= without);
    }
}

#[test]
fn batch_matches_scalar_calls() {
    let pred = common::predictor();
    let lats = vec![-33.9, 0.0, 25.0, 51.5, 64.1];
    let lons = vec![18.4, -78.5, 55.3, -0.1, -21.9];
    let (f, el, p, d) = (Unit::GigaHertz.of(30.0), deg(40.0), Unit::Percent.of(0.1), Unit::Meter.of(1.2));

    let lat_q = Unit::Degree.vec(lats.clone());
    let lon_q = Unit::Degree.vec(lons.clone());
    let link = LinkParameters::new(&lat_q, &lon_q, &f, &el, &p).with_diameter(&d);
    let batch = pred.total_attenuation(&link, Contributions::ALL).unwrap();

    for (i, (la, lo)) in lats.iter().zip(&lons).enumerate() {
        let (la, lo) = (deg(*la), deg(*lo));
        let single = LinkParameters::new(&la, &lo, &f, &el, &p).with_diameter(&d);
        let a = pred.total_attenuation(&single, Contributions::ALL).unwrap();
        assert!(a.is_scalar());
        assert_eq!(a.value(), batch.get(&[i]));
    }

    // the parallel path gives the same answer as the sequential one
    let parallel = pred
        .clone()
        .with_parallel_threshold(1)
        .total_attenuation(&link, Contributions::ALL)
        .unwrap();
    assert_eq!(parallel, batch);
}

#[test]
fn concurrent_callers_see_identical_results() {
    let pred = Arc::new(common::predictor());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pred = pred.clone();
            thread::spawn(move || {
                let (lat, lon, f, el, p) = (deg(45.0), deg(7.0), Unit::GigaHertz.of(20.0), deg(30.0), Unit::Percent.of(0.01));
                pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f, &el, &p)).unwrap()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn out_of_domain_inputs_are_reported() {
    let pred = common::predictor();
    let (lat, lon, f, el, d) = (deg(40.0), deg(-3.7), Unit::GigaHertz.of(20.0), deg(45.0), Unit::Meter.of(1.0));

    let p = Unit::Percent.of(150.0);
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);
    let err = pred.total_attenuation(&link, Contributions::ALL).unwrap_err();
    assert!(err.is_out_of_domain(), "{:?}", err);

    let p = Unit::Percent.of(TOTAL_PERCENTAGE_RANGE.0 / 2.0);
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);
    assert!(pred.total_attenuation(&link, Contributions::ALL).unwrap_err().is_out_of_domain());

    let (bad_lat, p) = (deg(95.0), Unit::Percent.of(1.0));
    let link = LinkParameters::new(&bad_lat, &lon, &f, &el, &p).with_diameter(&d);
    assert!(pred.total_attenuation(&link, Contributions::ALL).unwrap_err().is_out_of_domain());

    // rain percentages above 5 % are outside the rain model itself
    let p = Unit::Percent.of(10.0);
    assert!(pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f, &el, &p)).unwrap_err().is_out_of_domain());
}

#[test]
fn frequency_policy_governs_soft_limits() {
    let (lat, lon, f, el, p) = (deg(40.0), deg(-3.7), Unit::GigaHertz.of(70.0), deg(45.0), Unit::Percent.of(0.1));
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p);

    let strict = common::predictor();
    assert!(strict.rain_attenuation(&link).unwrap_err().is_out_of_domain());

    let lenient = common::predictor().with_frequency_policy(FrequencyPolicy::Extrapolate);
    let a = lenient.rain_attenuation(&link).unwrap();
    assert!(a.value().unwrap() > 0.0);
}

#[test]
fn inputs_in_other_units_are_converted() {
    let pred = common::predictor();
    let (lat, lon, el, p) = (deg(40.0), deg(-3.7), deg(45.0), Unit::Percent.of(0.1));
    let f_ghz = Unit::GigaHertz.of(20.0);
    let f_mhz = Unit::MegaHertz.of(20_000.0);
    let a = pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f_ghz, &el, &p)).unwrap();
    let b = pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f_mhz, &el, &p)).unwrap();
    assert!((a.value().unwrap() - b.value().unwrap()).abs() < 1e-9);

    let wrong = Unit::Meter.of(20.0);
    let err = pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &wrong, &el, &p)).unwrap_err();
    assert!(matches!(err, ItuError::UnitMismatch { .. }), "{:?}", err);
}

#[test]
fn incompatible_shapes_are_rejected() {
    let pred = common::predictor();
    let lat = Unit::Degree.vec(vec![10.0, 20.0, 30.0]);
    let lon = Unit::Degree.vec(vec![0.0, 1.0]);
    let (f, el, p) = (Unit::GigaHertz.of(20.0), deg(45.0), Unit::Percent.of(1.0));
    let err = pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f, &el, &p)).unwrap_err();
    assert!(matches!(err, ItuError::ShapeMismatch { .. }), "{:?}", err);
}

#[test]
fn scintillation_needs_a_diameter() {
    let pred = common::predictor();
    let (lat, lon, f, el, p) = (deg(40.0), deg(-3.7), Unit::GigaHertz.of(12.0), deg(30.0), Unit::Percent.of(1.0));
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p);

    let err = pred.total_attenuation(&link, Contributions::ALL).unwrap_err();
    assert!(matches!(err, ItuError::MissingParameter { parameter: "diameter", .. }), "{:?}", err);
    assert!(pred.scintillation_attenuation(&link).is_err());
    assert!(pred.total_attenuation(&link, Contributions::NO_SCINTILLATION).is_ok());
}

#[test]
fn missing_data_is_reported_not_guessed() {
    let pred = Predictor::new(Arc::new(GridStore::in_memory()), &Config::default());
    let (lat, lon, f, el, p) = (deg(40.0), deg(-3.7), Unit::GigaHertz.of(20.0), deg(45.0), Unit::Percent.of(1.0));
    let err = pred.rain_attenuation(&LinkParameters::new(&lat, &lon, &f, &el, &p)).unwrap_err();
    assert!(err.is_data_unavailable(), "{:?}", err);
    assert!(!pred.missing_datasets().is_empty());

    assert!(common::predictor().missing_datasets().is_empty());

    // data-free models still work without any maps
    let a = pred.rain_specific_attenuation(&Unit::MillimeterPerHour.of(25.0), &Unit::GigaHertz.of(20.0), &deg(45.0), &deg(45.0));
    assert!(a.unwrap().value().unwrap() > 0.0);
}

#[test]
fn editions_can_be_pinned() {
    let v12 = Versions::for_p618(P618Version::V12);
    let old = common::predictor_with(v12);
    let new = common::predictor();
    assert!(old.missing_datasets().is_empty());

    let (lat, lon, f, el, d) = (deg(40.0), deg(-3.7), Unit::GigaHertz.of(20.0), deg(45.0), Unit::Meter.of(1.0));
    let p = Unit::Percent.vec(vec![0.01, 0.1, 1.0]);
    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);
    let a_old = old.total_attenuation(&link, Contributions::ALL).unwrap();
    let a_new = new.total_attenuation(&link, Contributions::ALL).unwrap();
    assert!(a_old.iter().all(|a| a.is_finite() && *a > 0.0));
    assert_ne!(a_old, a_new);

    // a predictor pinned to one edition cannot read another edition's maps
    let mismatched = Predictor::new(Arc::new(common::synthetic_store(&Versions::default())), &Config {
        versions: v12,
        ..Config::default()
    });
    assert!(mismatched.rain_attenuation(&link).unwrap_err().is_data_unavailable());
}
