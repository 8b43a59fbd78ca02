//! ITU-R P.1511: topography for Earth-to-space propagation modelling.

use std::sync::Arc;

use itur_core::{GeophysicalMap, Interpolation, MapSpec, Quantity, Result, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::predictor::{arg, Predictor};
use crate::versions::P1511Version;

lazy_static! {
    // Heights above mean sea level, stored in metres
    static ref TOPOGRAPHY: MapSpec = map_spec("1511", "v1_topo", Unit::Meter, 1.0 / 12.0, (-500.0, 9000.0));
}

pub fn datasets(_version: P1511Version) -> Vec<MapSpec> {
    vec![TOPOGRAPHY.clone()]
}

pub(crate) fn topography(pred: &Predictor) -> Result<Arc<GeophysicalMap>> {
    pred.store().map(&TOPOGRAPHY)
}

pub(crate) fn altitude_km(map: &GeophysicalMap, lat: f64, lon: f64) -> Result<f64> {
    Ok(map.interpolate(lat, lon, Interpolation::Bicubic)? / 1000.0)
}

/// Station altitude: the caller's value when given, otherwise the
/// topographic altitude. The topography is only loaded when needed.
pub(crate) struct SiteAltitude(Option<Arc<GeophysicalMap>>);

impl SiteAltitude {
    pub(crate) fn load(pred: &Predictor, given: bool) -> Result<Self> {
        Ok(Self(if given { None } else { Some(topography(pred)?) }))
    }

    pub(crate) fn resolve(&self, lat: f64, lon: f64, given: Option<f64>) -> Result<f64> {
        match (given, &self.0) {
            (Some(h), _) => Ok(h),
            (None, Some(map)) => altitude_km(map, lat, lon),
            (None, None) => Err(itur_core::ItuError::MissingParameter {
                phenomenon: "P.1511 topographic altitude",
                parameter: "altitude",
            }),
        }
    }
}

/// Topographic altitude (km) by bicubic interpolation of the 1/12° grid.
pub fn topographic_altitude(pred: &Predictor, lat: f64, lon: f64) -> Result<f64> {
    let map = topography(pred)?;
    altitude_km(&map, lat, lon)
}

impl Predictor {
    pub fn topographic_altitude(&self, lat: &Quantity, lon: &Quantity) -> Result<Quantity> {
        let map = topography(self)?;
        self.evaluate(
            &[arg("lat", lat, Unit::Degree), arg("lon", lon, Unit::Degree)],
            Unit::Kilometer,
            |r| altitude_km(&map, r.get(0), r.get(1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use itur_core::GridStore;

    fn flat_terrain(height_m: f64) -> Predictor {
        let store = GridStore::in_memory();
        store.insert(
            &TOPOGRAPHY,
            GeophysicalMap::constant(TOPOGRAPHY.id(), Unit::Meter, 1.0, height_m).unwrap(),
        );
        Predictor::new(Arc::new(store), &Config::default())
    }

    #[test]
    fn test_topographic_altitude_in_km() {
        let pred = flat_terrain(250.0);
        let h = topographic_altitude(&pred, 41.4, 2.2).unwrap();
        assert!((h - 0.25).abs() < 1e-9, "h = {}", h);

        let lat = Unit::Degree.vec(vec![-33.9, 0.0, 64.1]);
        let grid = pred.topographic_altitude(&lat, &Unit::Degree.of(18.4)).unwrap();
        assert_eq!(grid.shape(), &[3]);
        assert!(grid.iter().all(|v| (*v - 0.25).abs() < 1e-9));
    }

    #[test]
    fn test_given_altitude_skips_topography() {
        let pred = Predictor::new(Arc::new(GridStore::in_memory()), &Config::default());
        let site = SiteAltitude::load(&pred, true).unwrap();
        assert_eq!(site.resolve(10.0, 10.0, Some(1.2)).unwrap(), 1.2);
        assert!(topographic_altitude(&pred, 10.0, 10.0).unwrap_err().is_data_unavailable());
    }
}
