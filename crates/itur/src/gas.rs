//! Vectorized surface of the P.676 gaseous attenuation models, plus the
//! location-driven slant path used by the P.618 combiner.

use std::sync::Arc;

use itur_core::{GeophysicalMap, Quantity, Result, Unit};
use p676::{PathAttenuation, SurfaceConditions};

use crate::p1510;
use crate::p1511::SiteAltitude;
use crate::p835::{self, StandardAtmosphere};
use crate::p836::{WaterVapour, WaterVapourMaps};
use crate::predictor::{arg, opt, Predictor};

/// Maps behind the location-driven gaseous attenuation.
pub(crate) struct GasMaps {
    rho: WaterVapourMaps,
    v_t: WaterVapourMaps,
    temperature: Arc<GeophysicalMap>,
    site: SiteAltitude,
}

impl GasMaps {
    pub(crate) fn load(pred: &Predictor, altitude_given: bool) -> Result<Self> {
        Ok(Self {
            rho: WaterVapourMaps::load(pred, WaterVapour::SurfaceDensity, false)?,
            v_t: WaterVapourMaps::load(pred, WaterVapour::ColumnarContent, false)?,
            temperature: p1510::annual_map(pred)?,
            site: SiteAltitude::load(pred, altitude_given)?,
        })
    }

    /// Slant path gaseous attenuation (dB) exceeded for `p` %, driven by the
    /// P.836 water vapour and P.1510 temperature climatologies at the site.
    pub(crate) fn at(
        &self,
        pred: &Predictor,
        lat: f64,
        lon: f64,
        f: f64,
        el: f64,
        p: f64,
        h_s: Option<f64>,
    ) -> Result<f64> {
        let h_s = self.site.resolve(lat, lon, h_s)?;
        let surface = SurfaceConditions {
            pressure: p835::pressure(h_s.clamp(-0.5, 100.0))?,
            water_vapour_density: self.rho.at(lat, lon, p, Some(h_s))?,
            temperature: self.temperature.bilinear(lat, lon)?,
        };
        let v_t = self.v_t.at(lat, lon, p, Some(h_s))?;
        Ok(p676::slant_path_approx(f, el, &surface, Some(v_t), pred.versions().p676)?.total())
    }
}

fn surface(rho: f64, p: f64, t: f64) -> SurfaceConditions {
    SurfaceConditions {
        pressure: p,
        water_vapour_density: rho,
        temperature: t,
    }
}

impl Predictor {
    /// Oxygen and water vapour specific attenuation (dB/km).
    pub fn gaseous_specific_attenuation(
        &self,
        f: &Quantity,
        p: &Quantity,
        rho: &Quantity,
        t: &Quantity,
    ) -> Result<[Quantity; 2]> {
        let version = self.versions().p676;
        self.evaluate_n(
            &[
                arg("f", f, Unit::GigaHertz),
                arg("p", p, Unit::HectoPascal),
                arg("rho", rho, Unit::GramPerCubicMeter),
                arg("t", t, Unit::Kelvin),
            ],
            [Unit::DecibelPerKm, Unit::DecibelPerKm],
            |r| {
                let gamma = p676::specific_attenuation(r.get(0), r.get(1), r.get(2), r.get(3), version)?;
                Ok([gamma.oxygen, gamma.water_vapour])
            },
        )
    }

    /// Attenuation (dB) over a horizontal path of length `d`.
    pub fn gaseous_attenuation_terrestrial_path(
        &self,
        d: &Quantity,
        f: &Quantity,
        rho: &Quantity,
        p: &Quantity,
        t: &Quantity,
    ) -> Result<Quantity> {
        let version = self.versions().p676;
        self.evaluate(
            &[
                arg("d", d, Unit::Kilometer),
                arg("f", f, Unit::GigaHertz),
                arg("rho", rho, Unit::GramPerCubicMeter),
                arg("p", p, Unit::HectoPascal),
                arg("t", t, Unit::Kelvin),
            ],
            Unit::Decibel,
            |r| {
                let s = surface(r.get(2), r.get(3), r.get(4));
                Ok(p676::terrestrial_path(r.get(1), r.get(0), &s, version)?.total())
            },
        )
    }

    /// Slant path attenuation (dB) by the equivalent-height method, from
    /// surface conditions and optionally the total columnar water vapour
    /// content `v_t`.
    pub fn gaseous_attenuation_slant_path(
        &self,
        f: &Quantity,
        el: &Quantity,
        rho: &Quantity,
        p: &Quantity,
        t: &Quantity,
        v_t: Option<&Quantity>,
    ) -> Result<Quantity> {
        let version = self.versions().p676;
        self.evaluate(
            &[
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("rho", rho, Unit::GramPerCubicMeter),
                arg("p", p, Unit::HectoPascal),
                arg("t", t, Unit::Kelvin),
                opt("v_t", v_t, Unit::KilogramPerSquareMeter),
            ],
            Unit::Decibel,
            |r| {
                let s = surface(r.get(2), r.get(3), r.get(4));
                let PathAttenuation { oxygen, water_vapour } =
                    p676::slant_path_approx(r.get(0), r.get(1), &s, r.opt(5), version)?;
                Ok(oxygen + water_vapour)
            },
        )
    }

    /// Slant path attenuation (dB) by ray tracing through the reference
    /// standard atmosphere, scaled to surface water vapour density `rho`,
    /// from station height `h_s`.
    pub fn gaseous_attenuation_inclined_path(
        &self,
        f: &Quantity,
        el: &Quantity,
        rho: &Quantity,
        h_s: &Quantity,
    ) -> Result<Quantity> {
        let version = self.versions().p676;
        self.evaluate(
            &[
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("rho", rho, Unit::GramPerCubicMeter),
                arg("h_s", h_s, Unit::Kilometer),
            ],
            Unit::Decibel,
            |r| {
                let profile = StandardAtmosphere {
                    rho_0: r.get(2),
                    ..StandardAtmosphere::default()
                };
                Ok(p676::slant_path_exact(r.get(0), r.get(1), r.get(3), &profile, version)?.total())
            },
        )
    }

    /// Zenith water vapour attenuation (dB) from total columnar content.
    pub fn zenith_water_vapour_attenuation(&self, f: &Quantity, v_t: &Quantity) -> Result<Quantity> {
        let version = self.versions().p676;
        self.evaluate(
            &[arg("f", f, Unit::GigaHertz), arg("v_t", v_t, Unit::KilogramPerSquareMeter)],
            Unit::Decibel,
            |r| p676::zenith_water_vapour_attenuation(r.get(0), r.get(1), version),
        )
    }

    /// Gaseous attenuation (dB) on an Earth-space path at a location,
    /// exceeded for `p` % of an average year. `h_s` defaults to the local
    /// topographic altitude.
    pub fn gaseous_attenuation(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        f: &Quantity,
        el: &Quantity,
        p: &Quantity,
        h_s: Option<&Quantity>,
    ) -> Result<Quantity> {
        let maps = GasMaps::load(self, h_s.is_some())?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("p", p, Unit::Percent),
                opt("h_s", h_s, Unit::Kilometer),
            ],
            Unit::Decibel,
            |r| maps.at(self, r.get(0), r.get(1), r.get(2), r.get(3), r.get(4), r.opt(5)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{p1510, p836};
    use itur_core::GridStore;

    fn empty() -> Predictor {
        Predictor::new(Arc::new(GridStore::in_memory()), &Config::default())
    }

    #[test]
    fn test_specific_attenuation_accepts_celsius() {
        let pred = empty();
        let f = Unit::GigaHertz.vec(vec![10.0, 22.235, 60.0]);
        let [o_k, w_k] = pred
            .gaseous_specific_attenuation(&f, &Unit::HectoPascal.of(1013.25), &Unit::GramPerCubicMeter.of(7.5), &Unit::Kelvin.of(288.15))
            .unwrap();
        let [o_c, w_c] = pred
            .gaseous_specific_attenuation(&f, &Unit::HectoPascal.of(1013.25), &Unit::GramPerCubicMeter.of(7.5), &Unit::Celsius.of(15.0))
            .unwrap();
        for i in 0..3 {
            assert!((o_k.get(&[i]).unwrap() - o_c.get(&[i]).unwrap()).abs() < 1e-9);
            assert!((w_k.get(&[i]).unwrap() - w_c.get(&[i]).unwrap()).abs() < 1e-9);
        }
        // the 60 GHz oxygen complex dominates
        assert!(o_k.get(&[2]).unwrap() > 10.0 * w_k.get(&[2]).unwrap());
    }

    #[test]
    fn test_terrestrial_path_is_specific_times_distance() {
        let pred = empty();
        let (f, p, rho, t) = (Unit::GigaHertz.of(30.0), Unit::HectoPascal.of(1013.25), Unit::GramPerCubicMeter.of(7.5), Unit::Kelvin.of(288.15));
        let [o, w] = pred.gaseous_specific_attenuation(&f, &p, &rho, &t).unwrap();
        let gamma = o.value().unwrap() + w.value().unwrap();
        let a = pred
            .gaseous_attenuation_terrestrial_path(&Unit::Meter.of(5000.0), &f, &rho, &p, &t)
            .unwrap();
        assert!((a.value().unwrap() - 5.0 * gamma).abs() < 1e-9);
    }

    #[test]
    fn test_location_path_uses_climatology() {
        let store = GridStore::in_memory();
        let versions = crate::Versions::default();
        let value = |file: &str| match file {
            f if f.starts_with("v6_rho") => 7.5,
            f if f.starts_with("v6_vsch") => 2.0,
            f if f.starts_with("v6_v") => 20.0,
            _ => 0.1,
        };
        for spec in p836::datasets(versions.p836) {
            store.insert(&spec, GeophysicalMap::constant(spec.id(), spec.unit, 15.0, value(&spec.file)).unwrap());
        }
        for spec in p1510::datasets(versions.p1510) {
            store.insert(&spec, GeophysicalMap::constant(spec.id(), spec.unit, 15.0, 288.15).unwrap());
        }
        let pred = Predictor::new(Arc::new(store), &Config::default());

        let (lat, lon, f, el, p) = (Unit::Degree.of(40.0), Unit::Degree.of(-3.0), Unit::GigaHertz.of(20.0), Unit::Degree.of(30.0), Unit::Percent.of(1.0));
        let a = pred
            .gaseous_attenuation(&lat, &lon, &f, &el, &p, Some(&Unit::Kilometer.of(0.1)))
            .unwrap();

        let surface = SurfaceConditions {
            pressure: p835::pressure(0.1).unwrap(),
            water_vapour_density: 7.5,
            temperature: 288.15,
        };
        let expected = p676::slant_path_approx(20.0, 30.0, &surface, Some(20.0), versions.p676)
            .unwrap()
            .total();
        assert!((a.value().unwrap() - expected).abs() < 1e-9);

        // without a station height the topography map is required
        assert!(pred.gaseous_attenuation(&lat, &lon, &f, &el, &p, None).unwrap_err().is_data_unavailable());
    }
}
