//! ITU-R P.1510: annual and monthly mean surface temperature.

use std::sync::Arc;

use itur_core::{check_range, GeophysicalMap, Interpolation, MapSpec, Quantity, Result, StackSpec, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::predictor::{arg, Predictor};
use crate::versions::P1510Version;

const PHENOMENON: &str = "P.1510 surface temperature";

lazy_static! {
    static ref ANNUAL: MapSpec = map_spec("1510", "v1_t_annual", Unit::Kelvin, 0.75, (150.0, 350.0));
    static ref MONTHLY: StackSpec = StackSpec::monthly(&ANNUAL, "v1_t");
}

pub fn datasets(_version: P1510Version) -> Vec<MapSpec> {
    let mut maps = vec![ANNUAL.clone()];
    maps.extend(MONTHLY.layers.iter().cloned());
    maps
}

pub(crate) fn annual_map(pred: &Predictor) -> Result<Arc<GeophysicalMap>> {
    pred.store().map(&ANNUAL)
}

/// Annual mean surface temperature (K).
pub fn surface_mean_temperature(pred: &Predictor, lat: f64, lon: f64) -> Result<f64> {
    annual_map(pred)?.interpolate(lat, lon, Interpolation::Bilinear)
}

/// Monthly mean surface temperature (K) for `month` in 1..=12.
pub fn surface_month_mean_temperature(pred: &Predictor, lat: f64, lon: f64, month: f64) -> Result<f64> {
    let month = check_range(PHENOMENON, "month", month, 1.0, 12.0)?;
    if month.fract() != 0.0 {
        return Err(itur_core::ItuError::out_of_domain(PHENOMENON, "month", month, "integer in [1, 12]"));
    }
    let layer = &MONTHLY.layers[month as usize - 1];
    pred.store().map(layer)?.bilinear(lat, lon)
}

/// The twelve monthly temperature maps, January first.
pub(crate) fn monthly_maps(pred: &Predictor) -> Result<itur_core::MapStack> {
    pred.store().stack(&MONTHLY)
}

impl Predictor {
    pub fn surface_mean_temperature(&self, lat: &Quantity, lon: &Quantity) -> Result<Quantity> {
        let map = annual_map(self)?;
        self.evaluate(
            &[arg("lat", lat, Unit::Degree), arg("lon", lon, Unit::Degree)],
            Unit::Kelvin,
            |r| map.bilinear(r.get(0), r.get(1)),
        )
    }

    pub fn surface_month_mean_temperature(&self, lat: &Quantity, lon: &Quantity, month: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("month", month, Unit::Dimensionless),
            ],
            Unit::Kelvin,
            |r| surface_month_mean_temperature(self, r.get(0), r.get(1), r.get(2)),
        )
    }
}
