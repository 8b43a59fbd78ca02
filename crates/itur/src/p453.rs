//! ITU-R P.453: the radio refractive index, its formula and refractivity
//! data.

use std::sync::Arc;

use itur_core::{check_range, GeophysicalMap, ItuError, MapSpec, MapStack, Quantity, Result, StackSpec, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::predictor::{arg, Predictor};
use crate::versions::P453Version;

const PHENOMENON: &str = "P.453 refractivity";

const NWET_PERCENTILES: [f64; 18] = [
    0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0,
];

const DN_PERCENTILES: [f64; 21] = [
    0.1, 0.2, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 98.0, 99.0, 99.5, 99.8,
    99.9,
];

lazy_static! {
    static ref V12_NWET: MapSpec = map_spec("453", "v12_nwet", Unit::NUnit, 1.5, (0.0, 500.0));
    static ref V13_NWET: StackSpec = StackSpec::percentiles(
        &map_spec("453", "v13_nwet", Unit::NUnit, 0.75, (0.0, 500.0)),
        "v13_nwet",
        &NWET_PERCENTILES
    );
    static ref V13_DN65: StackSpec = StackSpec::percentiles(
        &map_spec("453", "v13_dn65", Unit::NUnitPerKm, 1.5, (-3000.0, 3000.0)),
        "v13_dn65",
        &DN_PERCENTILES
    );
    static ref V13_DN1: StackSpec = StackSpec::percentiles(
        &map_spec("453", "v13_dn1", Unit::NUnitPerKm, 1.5, (-3000.0, 3000.0)),
        "v13_dn1",
        &DN_PERCENTILES
    );
}

pub fn datasets(version: P453Version) -> Vec<MapSpec> {
    match version {
        P453Version::V12 => vec![V12_NWET.clone()],
        P453Version::V13 => {
            let mut maps = V13_NWET.layers.clone();
            maps.extend(V13_DN65.layers.iter().cloned());
            maps.extend(V13_DN1.layers.iter().cloned());
            maps
        }
    }
}

/// Which refractivity gradient statistic to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gradient {
    /// Lowest 65 m above ground.
    Dn65,
    /// Lowest 1 km.
    Dn1,
}

/// Percentile maps of a refractivity gradient. Only -13 publishes them.
pub(crate) fn gradient_maps(pred: &Predictor, which: Gradient) -> Result<MapStack> {
    match pred.versions().p453 {
        P453Version::V12 => Err(ItuError::ModelVersion {
            recommendation: "P.453 refractivity gradient maps",
            version: 12,
        }),
        P453Version::V13 => pred.store().stack(match which {
            Gradient::Dn65 => &V13_DN65,
            Gradient::Dn1 => &V13_DN1,
        }),
    }
}

/// Gradient (N-units/km) exceeded for `p` % at one point of a loaded stack.
pub(crate) fn gradient_at(stack: &MapStack, lat: f64, lon: f64, p: f64) -> Result<f64> {
    stack.at_percentage(PHENOMENON, p, |m| m.bilinear(lat, lon))
}

/// Whether a vapour pressure is taken over liquid water or ice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydrometeor {
    Water,
    Ice,
}

/// Saturation vapour pressure (hPa) at temperature `t` (°C) and total
/// pressure `p` (hPa).
pub fn saturation_vapour_pressure(t: f64, p: f64, over: Hydrometeor) -> Result<f64> {
    match over {
        Hydrometeor::Water => {
            check_range(PHENOMENON, "temperature", t, -40.0, 50.0)?;
            let ef = 1.0 + 1e-4 * (7.2 + p * (0.0320 + 5.9e-6 * t * t));
            Ok(ef * 6.1121 * ((18.678 - t / 234.5) * t / (t + 257.14)).exp())
        }
        Hydrometeor::Ice => {
            check_range(PHENOMENON, "temperature", t, -80.0, 0.0)?;
            let ef = 1.0 + 1e-4 * (2.2 + p * (0.0383 + 6.4e-6 * t * t));
            Ok(ef * 6.1115 * ((23.036 - t / 333.7) * t / (t + 279.82)).exp())
        }
    }
}

/// Water vapour pressure (hPa) from relative humidity `h` (%).
pub fn water_vapour_pressure(t: f64, p: f64, h: f64, over: Hydrometeor) -> Result<f64> {
    check_range(PHENOMENON, "relative humidity", h, 0.0, 100.0)?;
    Ok(h * saturation_vapour_pressure(t, p, over)? / 100.0)
}

/// Dry term of the refractivity (N-units) for dry pressure `pd` (hPa) and
/// temperature `t` (K).
pub fn dry_term_radio_refractivity(pd: f64, t: f64) -> f64 {
    77.6 * pd / t
}

/// Wet term of the refractivity (N-units) for vapour pressure `e` (hPa).
pub fn wet_term_radio_refractivity(e: f64, t: f64) -> f64 {
    72.0 * e / t + 3.75e5 * e / (t * t)
}

/// Radio refractive index n = 1 + N 10⁻⁶.
pub fn radio_refractive_index(pd: f64, e: f64, t: f64) -> f64 {
    1.0 + 1e-6 * (dry_term_radio_refractivity(pd, t) + wet_term_radio_refractivity(e, t))
}

/// The wet-term refractivity data of one edition.
pub(crate) enum WetTermMaps {
    Median(Arc<GeophysicalMap>),
    Percentiles(MapStack),
}

impl WetTermMaps {
    pub(crate) fn load(pred: &Predictor) -> Result<Self> {
        Ok(match pred.versions().p453 {
            P453Version::V12 => Self::Median(pred.store().map(&V12_NWET)?),
            P453Version::V13 => Self::Percentiles(pred.store().stack(&V13_NWET)?),
        })
    }

    /// Wet-term refractivity (N-units) exceeded for `p` % of the average
    /// year. The -12 map only holds the median.
    pub(crate) fn at(&self, lat: f64, lon: f64, p: f64) -> Result<f64> {
        match self {
            Self::Median(map) => {
                if (p - 50.0).abs() > 1e-9 {
                    return Err(ItuError::out_of_domain(PHENOMENON, "p", p, "50 (median map only)"));
                }
                map.bilinear(lat, lon)
            }
            Self::Percentiles(stack) => stack.at_percentage(PHENOMENON, p, |m| m.bilinear(lat, lon)),
        }
    }
}

impl Predictor {
    pub fn saturation_vapour_pressure(&self, t: &Quantity, p: &Quantity, over: Hydrometeor) -> Result<Quantity> {
        self.evaluate(
            &[arg("t", t, Unit::Celsius), arg("p", p, Unit::HectoPascal)],
            Unit::HectoPascal,
            |r| saturation_vapour_pressure(r.get(0), r.get(1), over),
        )
    }

    pub fn water_vapour_pressure(&self, t: &Quantity, p: &Quantity, h: &Quantity, over: Hydrometeor) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("t", t, Unit::Celsius),
                arg("p", p, Unit::HectoPascal),
                arg("h", h, Unit::Percent),
            ],
            Unit::HectoPascal,
            |r| water_vapour_pressure(r.get(0), r.get(1), r.get(2), over),
        )
    }

    pub fn radio_refractive_index(&self, pd: &Quantity, e: &Quantity, t: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("pd", pd, Unit::HectoPascal),
                arg("e", e, Unit::HectoPascal),
                arg("t", t, Unit::Kelvin),
            ],
            Unit::Dimensionless,
            |r| Ok(radio_refractive_index(r.get(0), r.get(1), r.get(2))),
        )
    }

    /// Wet-term surface refractivity (N-units) exceeded for `p` %.
    pub fn map_wet_term_radio_refractivity(&self, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        let maps = WetTermMaps::load(self)?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("p", p, Unit::Percent),
            ],
            Unit::NUnit,
            |r| maps.at(r.get(0), r.get(1), r.get(2)),
        )
    }

    /// Refractivity gradient (N-units/km) in the lowest 65 m exceeded for
    /// `p` % of the average year.
    pub fn dn65(&self, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        let stack = gradient_maps(self, Gradient::Dn65)?;
        self.gradient(&stack, lat, lon, p)
    }

    /// Refractivity gradient (N-units/km) in the lowest 1 km exceeded for
    /// `p` % of the average year.
    pub fn dn1(&self, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        let stack = gradient_maps(self, Gradient::Dn1)?;
        self.gradient(&stack, lat, lon, p)
    }

    fn gradient(&self, stack: &MapStack, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("p", p, Unit::Percent),
            ],
            Unit::NUnitPerKm,
            |r| gradient_at(stack, r.get(0), r.get(1), r.get(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturation_pressure_reference() {
        // about 23.4 hPa at 20 °C over water
        let es = saturation_vapour_pressure(20.0, 1013.25, Hydrometeor::Water).unwrap();
        assert!((es - 23.4).abs() < 0.2, "es = {}", es);
        let ice = saturation_vapour_pressure(-10.0, 1013.25, Hydrometeor::Ice).unwrap();
        let water = saturation_vapour_pressure(-10.0, 1013.25, Hydrometeor::Water).unwrap();
        assert!(ice < water);
        assert!(saturation_vapour_pressure(10.0, 1013.25, Hydrometeor::Ice).is_err());
    }

    #[test]
    fn test_refractive_index_sea_level() {
        // standard surface: N around 300-350
        let t = 288.15;
        let e = water_vapour_pressure(15.0, 1013.25, 60.0, Hydrometeor::Water).unwrap();
        let n = radio_refractive_index(1013.25 - e, e, t);
        let big_n = (n - 1.0) * 1e6;
        assert!(big_n > 300.0 && big_n < 350.0, "N = {}", big_n);
    }

    #[test]
    fn test_median_map_rejects_other_percentages() {
        let map = GeophysicalMap::constant("nwet", Unit::NUnit, 10.0, 42.0).unwrap();
        let maps = WetTermMaps::Median(Arc::new(map));
        assert_eq!(maps.at(10.0, 20.0, 50.0).unwrap(), 42.0);
        assert!(maps.at(10.0, 20.0, 1.0).unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_gradient_maps_belong_to_v13() {
        let v12 = datasets(P453Version::V12);
        assert!(v12.iter().all(|m| !m.file.contains("dn")));
        let v13 = datasets(P453Version::V13);
        assert_eq!(v13.iter().filter(|m| m.file.starts_with("v13_dn65")).count(), DN_PERCENTILES.len());
        assert_eq!(v13.iter().filter(|m| m.file.starts_with("v13_dn1_")).count(), DN_PERCENTILES.len());
    }

    #[test]
    fn test_gradient_lookup_by_edition() {
        use crate::versions::Versions;
        use itur_core::GridStore;

        let store = GridStore::in_memory();
        for spec in V13_DN65.layers.iter() {
            store.insert(spec, GeophysicalMap::constant(spec.id(), spec.unit, 10.0, -45.0).unwrap());
        }
        let store = Arc::new(store);
        let pred = Predictor::new(store.clone(), &crate::Config::default());
        let (lat, lon) = (Unit::Degree.vec(vec![10.0, 50.0]), Unit::Degree.of(5.0));
        let dn = pred.dn65(&lat, &lon, &Unit::Percent.of(1.0)).unwrap();
        assert_eq!(dn.shape(), &[2]);
        assert!(dn.iter().all(|v| (*v + 45.0).abs() < 1e-9));
        // the 1 km gradient maps were never seeded
        assert!(pred.dn1(&lat, &lon, &Unit::Percent.of(1.0)).unwrap_err().is_data_unavailable());

        let old = pred.with_versions(Versions {
            p453: P453Version::V12,
            ..Versions::default()
        });
        let err = old.dn65(&lat, &lon, &Unit::Percent.of(1.0)).unwrap_err();
        assert!(matches!(err, ItuError::ModelVersion { version: 12, .. }), "{:?}", err);
    }
}
