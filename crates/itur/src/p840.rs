//! ITU-R P.840: attenuation due to clouds and fog.

use itur_core::{check_range, MapSpec, MapStack, Quantity, Result, StackSpec, Unit};
use lazy_static::lazy_static;

use crate::datasets::map_spec;
use crate::predictor::{arg, Predictor};
use crate::versions::P840Version;

const PHENOMENON: &str = "P.840 cloud attenuation";

/// Frequencies (GHz) the Rayleigh approximation is stated for.
pub const FREQUENCY_RANGE: (f64, f64) = (1.0, 200.0);

/// Lowest elevation (deg) the cosecant law is applied at.
pub const MIN_ELEVATION: f64 = 5.0;

/// Temperature (K) the reduced liquid water content is normalised to.
pub const REDUCED_TEMPERATURE: f64 = 273.15;

const PERCENTILES: [f64; 18] = [
    0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0,
];

lazy_static! {
    static ref V7_LRED: StackSpec = StackSpec::percentiles(
        &map_spec("840", "v7_lred", Unit::KilogramPerSquareMeter, 1.125, (0.0, 50.0)),
        "v7_lred",
        &PERCENTILES
    );
    static ref V8_LRED: StackSpec = StackSpec::percentiles(
        &map_spec("840", "v8_lred", Unit::KilogramPerSquareMeter, 0.25, (0.0, 50.0)),
        "v8_lred",
        &PERCENTILES
    );
}

fn lred_stack(version: P840Version) -> &'static StackSpec {
    match version {
        P840Version::V7 => &V7_LRED,
        P840Version::V8 => &V8_LRED,
    }
}

pub fn datasets(version: P840Version) -> Vec<MapSpec> {
    lred_stack(version).layers.clone()
}

/// Specific attenuation coefficient K_l ((dB/km)/(g/m³)) of liquid water at
/// frequency `f` (GHz) and temperature `t` (K), from the double-Debye model
/// of the permittivity of water.
pub fn specific_attenuation_coefficient(f: f64, t: f64) -> Result<f64> {
    check_range(PHENOMENON, "frequency", f, 0.0, 1000.0)?;
    check_range(PHENOMENON, "temperature", t, 200.0, 350.0)?;
    let theta = 300.0 / t;
    let e0 = 77.66 + 103.3 * (theta - 1.0);
    let e1 = 0.0671 * e0;
    let e2 = 3.52;
    let fp = 20.20 - 146.0 * (theta - 1.0) + 316.0 * (theta - 1.0).powi(2);
    let fs = 39.8 * fp;

    let e_im = f * (e0 - e1) / (fp * (1.0 + (f / fp).powi(2))) + f * (e1 - e2) / (fs * (1.0 + (f / fs).powi(2)));
    let e_re = (e0 - e1) / (1.0 + (f / fp).powi(2)) + (e1 - e2) / (1.0 + (f / fs).powi(2)) + e2;
    let eta = (2.0 + e_re) / e_im;
    Ok(0.819 * f / (e_im * (1.0 + eta.powi(2))))
}

/// Specific attenuation (dB/km) within fog of liquid water density `m`
/// (g/m³) at temperature `t` (K).
pub fn fog_attenuation(f: f64, m: f64, t: f64) -> Result<f64> {
    check_range(PHENOMENON, "liquid water density", m, 0.0, f64::INFINITY)?;
    Ok(specific_attenuation_coefficient(f, t)? * m)
}

/// Reduced columnar liquid water content (kg/m²) exceeded for `p` % of an
/// average year.
pub(crate) fn columnar_content_reduced_liquid(stack: &MapStack, lat: f64, lon: f64, p: f64) -> Result<f64> {
    stack.at_percentage(PHENOMENON, p, |m| m.bilinear(lat, lon))
}

/// Cloud attenuation (dB) exceeded for `p` %, given the loaded reduced
/// liquid water stack.
pub(crate) fn cloud_attenuation(stack: &MapStack, lat: f64, lon: f64, el: f64, f: f64, p: f64) -> Result<f64> {
    check_range(PHENOMENON, "elevation", el, MIN_ELEVATION, 90.0)?;
    let lred = columnar_content_reduced_liquid(stack, lat, lon, p)?;
    let kl = specific_attenuation_coefficient(f, REDUCED_TEMPERATURE)?;
    Ok(lred * kl / el.to_radians().sin())
}

impl Predictor {
    pub(crate) fn lred_maps(&self) -> Result<MapStack> {
        self.store().stack(lred_stack(self.versions().p840))
    }

    pub fn specific_attenuation_coefficient(&self, f: &Quantity, t: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[arg("f", f, Unit::GigaHertz), arg("t", t, Unit::Kelvin)],
            Unit::Dimensionless,
            |r| specific_attenuation_coefficient(r.get(0), r.get(1)),
        )
    }

    pub fn fog_attenuation(&self, f: &Quantity, m: &Quantity, t: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("f", f, Unit::GigaHertz),
                arg("m", m, Unit::GramPerCubicMeter),
                arg("t", t, Unit::Kelvin),
            ],
            Unit::DecibelPerKm,
            |r| fog_attenuation(r.get(0), r.get(1), r.get(2)),
        )
    }

    pub fn columnar_content_reduced_liquid(&self, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        let stack = self.lred_maps()?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("p", p, Unit::Percent),
            ],
            Unit::KilogramPerSquareMeter,
            |r| columnar_content_reduced_liquid(&stack, r.get(0), r.get(1), r.get(2)),
        )
    }

    /// Cloud attenuation (dB) exceeded for `p` % of an average year on a
    /// slant path at elevation `el`.
    pub fn cloud_attenuation(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        el: &Quantity,
        f: &Quantity,
        p: &Quantity,
    ) -> Result<Quantity> {
        let stack = self.lred_maps()?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("el", el, Unit::Degree),
                arg("f", f, Unit::GigaHertz),
                arg("p", p, Unit::Percent),
            ],
            Unit::Decibel,
            |r| {
                let f = r.get(3);
                self.check_frequency(PHENOMENON, f, FREQUENCY_RANGE.0, FREQUENCY_RANGE.1)?;
                cloud_attenuation(&stack, r.get(0), r.get(1), r.get(2), f, r.get(4))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itur_core::GeophysicalMap;
    use std::sync::Arc;

    #[test]
    fn test_kl_reference_values() {
        let k = specific_attenuation_coefficient(30.0, 273.15).unwrap();
        assert!((k - 0.7708).abs() < 1e-3, "K_l = {}", k);
        // grows with frequency below the relaxation peak
        let k10 = specific_attenuation_coefficient(10.0, 273.15).unwrap();
        let k100 = specific_attenuation_coefficient(100.0, 273.15).unwrap();
        assert!(k10 < k && k < k100);
        // and falls as water warms
        assert!(specific_attenuation_coefficient(30.0, 283.0).unwrap() < k);
    }

    #[test]
    fn test_fog_scales_with_density() {
        let a1 = fog_attenuation(30.0, 0.05, 283.0).unwrap();
        let a2 = fog_attenuation(30.0, 0.1, 283.0).unwrap();
        assert!((a2 - 2.0 * a1).abs() < 1e-12);
        assert!(fog_attenuation(30.0, -0.1, 283.0).is_err());
    }

    fn stack() -> MapStack {
        // lred falls as p grows: 2 kg/m² at 0.1 %, 0.1 kg/m² at 99 %
        let layers = PERCENTILES
            .iter()
            .map(|&p| Arc::new(GeophysicalMap::constant("lred", Unit::KilogramPerSquareMeter, 30.0, 2.0 - 0.019 * p).unwrap()))
            .collect();
        MapStack::new("lred", PERCENTILES.to_vec(), layers).unwrap()
    }

    #[test]
    fn test_cloud_attenuation_cosecant_law() {
        let s = stack();
        let zenith = cloud_attenuation(&s, 45.0, 10.0, 90.0, 30.0, 1.0).unwrap();
        let low = cloud_attenuation(&s, 45.0, 10.0, 30.0, 30.0, 1.0).unwrap();
        assert!((low - 2.0 * zenith).abs() < 1e-9);
        assert!(cloud_attenuation(&s, 45.0, 10.0, 2.0, 30.0, 1.0).unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_cloud_percentage_range() {
        let s = stack();
        assert!(cloud_attenuation(&s, 45.0, 10.0, 30.0, 30.0, 0.05).unwrap_err().is_out_of_domain());
        let a1 = cloud_attenuation(&s, 45.0, 10.0, 30.0, 30.0, 1.0).unwrap();
        let a5 = cloud_attenuation(&s, 45.0, 10.0, 30.0, 30.0, 5.0).unwrap();
        assert!(a1 > a5);
    }
}
