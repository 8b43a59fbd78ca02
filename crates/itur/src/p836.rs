//! ITU-R P.836: water vapour, surface density and total columnar content.
//!
//! Each percentile map is scaled from the altitude of its grid nodes to the
//! altitude of interest with the node's scale height, then the four nodes
//! are combined bilinearly and the percentiles log-linearly.

use std::sync::Arc;

use itur_core::{log_interpolate, GeophysicalMap, ItuError, MapSpec, MapStack, Quantity, Result, StackSpec, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::p1511::SiteAltitude;
use crate::predictor::{arg, opt, Predictor};
use crate::versions::P836Version;

const PHENOMENON: &str = "P.836 water vapour";

const PERCENTILES: [f64; 18] = [
    0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0,
];

lazy_static! {
    static ref RHO: StackSpec = StackSpec::percentiles(
        &map_spec("836", "v6_rho", Unit::GramPerCubicMeter, 1.125, (0.0, 60.0)),
        "v6_rho",
        &PERCENTILES
    );
    static ref V: StackSpec = StackSpec::percentiles(
        &map_spec("836", "v6_v", Unit::KilogramPerSquareMeter, 1.125, (0.0, 120.0)),
        "v6_v",
        &PERCENTILES
    );
    static ref VSCH: StackSpec = StackSpec::percentiles(
        &map_spec("836", "v6_vsch", Unit::Kilometer, 1.125, (0.0, 50.0)),
        "v6_vsch",
        &PERCENTILES
    );
    static ref TOPO: MapSpec = map_spec("836", "v6_topo", Unit::Kilometer, 1.125, (-1.0, 10.0));
}

pub fn datasets(_version: P836Version) -> Vec<MapSpec> {
    let mut maps = Vec::new();
    maps.extend(RHO.layers.iter().cloned());
    maps.extend(V.layers.iter().cloned());
    maps.extend(VSCH.layers.iter().cloned());
    maps.push(TOPO.clone());
    maps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaterVapour {
    /// Surface water vapour density (g/m³).
    SurfaceDensity,
    /// Total columnar content (kg/m²).
    ColumnarContent,
}

/// Maps needed to evaluate one water vapour quantity.
pub(crate) struct WaterVapourMaps {
    quantity: MapStack,
    vsch: MapStack,
    topo: Arc<GeophysicalMap>,
    site: SiteAltitude,
}

impl WaterVapourMaps {
    pub(crate) fn load(pred: &Predictor, what: WaterVapour, need_site_altitude: bool) -> Result<Self> {
        let store = pred.store();
        let quantity = match what {
            WaterVapour::SurfaceDensity => store.stack(&RHO)?,
            WaterVapour::ColumnarContent => store.stack(&V)?,
        };
        let vsch = store.stack(&VSCH)?;
        let topo = store.map(&TOPO)?;
        for k in 0..quantity.len() {
            for layer in [quantity.layer(k)?, vsch.layer(k)?] {
                if layer.lat_axis() != topo.lat_axis() || layer.lon_axis() != topo.lon_axis() {
                    return Err(ItuError::data_unavailable(
                        layer.name(),
                        "",
                        "grid differs from the P.836 topography grid",
                    ));
                }
            }
        }
        let site = SiteAltitude::load(pred, !need_site_altitude)?;
        Ok(Self {
            quantity,
            vsch,
            topo,
            site,
        })
    }

    /// Value exceeded for `p` % at altitude `alt` (km); the P.1511
    /// topographic altitude when `alt` is `None`.
    pub(crate) fn at(&self, lat: f64, lon: f64, p: f64, alt: Option<f64>) -> Result<f64> {
        let alt = self.site.resolve(lat, lon, alt)?;
        let stencil = self.topo.stencil(lat, lon)?;
        let layer = |k: usize| -> Result<f64> {
            let values = self.quantity.layer(k)?;
            let vsch = self.vsch.layer(k)?;
            Ok(stencil
                .nodes
                .iter()
                .zip(stencil.weights)
                .filter(|(_, w)| *w != 0.0)
                .map(|(&(i, j), w)| {
                    let scale = vsch.node(i, j);
                    w * values.node(i, j) * (-(alt - self.topo.node(i, j)) / scale).exp()
                })
                .sum())
        };

        let (lo, hi) = self.quantity.bracket(PHENOMENON, p)?;
        let v_lo = layer(lo)?;
        if lo == hi {
            return Ok(v_lo);
        }
        let axis = self.quantity.axis();
        Ok(log_interpolate(p, axis[lo], axis[hi], v_lo, layer(hi)?))
    }
}

impl Predictor {
    fn water_vapour(
        &self,
        what: WaterVapour,
        unit: Unit,
        lat: &Quantity,
        lon: &Quantity,
        p: &Quantity,
        alt: Option<&Quantity>,
    ) -> Result<Quantity> {
        let maps = WaterVapourMaps::load(self, what, alt.is_none())?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("p", p, Unit::Percent),
                opt("alt", alt, Unit::Kilometer),
            ],
            unit,
            |r| maps.at(r.get(0), r.get(1), r.get(2), r.opt(3)),
        )
    }

    /// Surface water vapour density (g/m³) exceeded for `p` % of an average
    /// year, at altitude `alt` or the local topographic altitude.
    pub fn surface_water_vapour_density(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        p: &Quantity,
        alt: Option<&Quantity>,
    ) -> Result<Quantity> {
        self.water_vapour(WaterVapour::SurfaceDensity, Unit::GramPerCubicMeter, lat, lon, p, alt)
    }

    /// Total columnar water vapour content (kg/m²) exceeded for `p` %.
    pub fn total_water_vapour_content(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        p: &Quantity,
        alt: Option<&Quantity>,
    ) -> Result<Quantity> {
        self.water_vapour(WaterVapour::ColumnarContent, Unit::KilogramPerSquareMeter, lat, lon, p, alt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itur_core::GridStore;

    fn seeded(rho: impl Fn(f64) -> f64, vsch: f64, topo: f64) -> Predictor {
        let store = GridStore::in_memory();
        for (k, &p) in PERCENTILES.iter().enumerate() {
            let value = rho(p);
            store.insert(
                &RHO.layers[k],
                GeophysicalMap::constant("rho", Unit::GramPerCubicMeter, 10.0, value).unwrap(),
            );
            store.insert(
                &VSCH.layers[k],
                GeophysicalMap::constant("vsch", Unit::Kilometer, 10.0, vsch).unwrap(),
            );
        }
        store.insert(&TOPO, GeophysicalMap::constant("topo", Unit::Kilometer, 10.0, topo).unwrap());
        Predictor::new(Arc::new(store), &crate::Config::default())
    }

    #[test]
    fn test_altitude_scaling() {
        let pred = seeded(|p| 20.0 - p / 10.0, 2.0, 0.5);
        let maps = WaterVapourMaps::load(&pred, WaterVapour::SurfaceDensity, false).unwrap();
        let at_node = maps.at(45.0, 10.0, 1.0, Some(0.5)).unwrap();
        assert!((at_node - 19.9).abs() < 1e-9);
        let higher = maps.at(45.0, 10.0, 1.0, Some(2.5)).unwrap();
        assert!((higher - 19.9 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_interpolation_and_range() {
        let pred = seeded(|p| 20.0 - p / 10.0, 2.0, 0.0);
        let maps = WaterVapourMaps::load(&pred, WaterVapour::SurfaceDensity, false).unwrap();
        let v = maps.at(0.0, 0.0, 1.5, Some(0.0)).unwrap();
        assert!(v < 19.9 && v > 19.8);
        assert!(maps.at(0.0, 0.0, 0.05, Some(0.0)).unwrap_err().is_out_of_domain());
        assert!(maps.at(0.0, 0.0, 99.5, Some(0.0)).unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_missing_columnar_maps() {
        let pred = seeded(|_| 10.0, 2.0, 0.0);
        let err = WaterVapourMaps::load(&pred, WaterVapour::ColumnarContent, false).err().unwrap();
        assert!(err.is_data_unavailable());
    }
}
