//! ITU-R P.839: rain height.

use std::sync::Arc;

use itur_core::{GeophysicalMap, MapSpec, Quantity, Result, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::predictor::{arg, Predictor};
use crate::versions::P839Version;

lazy_static! {
    static ref ISOTHERM_0: MapSpec = map_spec("839", "v4_h0", Unit::Kilometer, 1.5, (-1.0, 10.0));
}

pub fn datasets(_version: P839Version) -> Vec<MapSpec> {
    vec![ISOTHERM_0.clone()]
}

/// Height (km) of the mean rain top above the 0 °C isotherm.
pub const RAIN_HEIGHT_OFFSET: f64 = 0.36;

pub(crate) fn isotherm_map(pred: &Predictor) -> Result<Arc<GeophysicalMap>> {
    pred.store().map(&ISOTHERM_0)
}

/// Mean annual 0 °C isotherm height above mean sea level (km).
pub fn isotherm_0(pred: &Predictor, lat: f64, lon: f64) -> Result<f64> {
    isotherm_map(pred)?.bilinear(lat, lon)
}

/// Mean annual rain height above mean sea level (km).
pub fn rain_height(pred: &Predictor, lat: f64, lon: f64) -> Result<f64> {
    Ok(isotherm_0(pred, lat, lon)? + RAIN_HEIGHT_OFFSET)
}

impl Predictor {
    pub fn isotherm_0(&self, lat: &Quantity, lon: &Quantity) -> Result<Quantity> {
        let map = isotherm_map(self)?;
        self.evaluate(
            &[arg("lat", lat, Unit::Degree), arg("lon", lon, Unit::Degree)],
            Unit::Kilometer,
            |r| map.bilinear(r.get(0), r.get(1)),
        )
    }

    pub fn rain_height(&self, lat: &Quantity, lon: &Quantity) -> Result<Quantity> {
        Ok(self.isotherm_0(lat, lon)?.map(|h| h + RAIN_HEIGHT_OFFSET))
    }
}
