//! Path attenuation: equivalent heights and slant paths (Annex 2), the exact
//! layered slant path (Annex 1) and terrestrial paths.

use std::f64::consts::PI;

use itur_core::{check_range, ItuError, Result};

use crate::lines::P676Version;
use crate::specific::{specific_attenuation, vapour_pressure, SpecificAttenuation, PHENOMENON};

/// Frequency range (GHz) of the equivalent-height approximation.
pub const APPROXIMATE_FREQUENCY_RANGE: (f64, f64) = (1.0, 350.0);

/// Effective Earth radius (km) used in the low-elevation correction.
const EFFECTIVE_EARTH_RADIUS: f64 = 8500.0;

/// Mean Earth radius (km) for the layered ray trace.
const EARTH_RADIUS: f64 = 6371.0;

const LAYERS: usize = 922;

/// Vertical distribution of the atmosphere used by the layered path.
pub trait AtmosphereProfile: Sync {
    /// Temperature (K) at geometric height `h` (km).
    fn temperature(&self, h: f64) -> f64;
    /// Total barometric pressure (hPa) at `h` (km).
    fn pressure(&self, h: f64) -> f64;
    /// Water vapour density (g/m³) at `h` (km).
    fn water_vapour_density(&self, h: f64) -> f64;
}

/// Surface conditions the equivalent-height method is driven by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConditions {
    /// Total pressure (hPa).
    pub pressure: f64,
    /// Water vapour density (g/m³).
    pub water_vapour_density: f64,
    /// Temperature (K).
    pub temperature: f64,
}

/// Oxygen and water-vapour equivalent heights (km).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalentHeights {
    pub oxygen: f64,
    pub water_vapour: f64,
}

pub fn equivalent_heights(f: f64, surface: &SurfaceConditions) -> Result<EquivalentHeights> {
    check_range(
        PHENOMENON,
        "frequency",
        f,
        APPROXIMATE_FREQUENCY_RANGE.0,
        APPROXIMATE_FREQUENCY_RANGE.1,
    )?;
    check_range(PHENOMENON, "pressure", surface.pressure, f64::MIN_POSITIVE, f64::INFINITY)?;
    let rp = surface.pressure / 1013.25;

    let t1 = 4.64 / (1.0 + 0.066 * rp.powf(-2.3))
        * (-((f - 59.7) / (2.87 + 12.4 * (-7.9 * rp).exp())).powi(2)).exp();
    let t2 = 0.14 * (2.12 * rp).exp() / ((f - 118.75).powi(2) + 0.031 * (2.2 * rp).exp());
    let t3 = 0.0114 / (1.0 + 0.14 * rp.powf(-2.6)) * f
        * (-0.0247 + 0.0001 * f + 1.61e-6 * f.powi(2))
        / (1.0 - 0.0169 * f + 4.1e-5 * f.powi(2) + 3.2e-7 * f.powi(3));

    let mut h_o = 6.1 / (1.0 + 0.17 * rp.powf(-1.1)) * (1.0 + t1 + t2 + t3);
    if f < 70.0 {
        h_o = h_o.min(10.7 * rp.powf(0.3));
    }

    let sigma_w = 1.013 / (1.0 + (-8.6 * (rp - 0.57)).exp());
    let h_w = 1.66
        * (1.0
            + 1.39 * sigma_w / ((f - 22.235).powi(2) + 2.56 * sigma_w)
            + 3.37 * sigma_w / ((f - 183.31).powi(2) + 4.69 * sigma_w)
            + 1.58 * sigma_w / ((f - 325.1).powi(2) + 2.89 * sigma_w));

    Ok(EquivalentHeights {
        oxygen: h_o,
        water_vapour: h_w,
    })
}

/// Slant path through a layer of equivalent height `h` (km) with specific
/// attenuation `gamma`; includes the curved-Earth correction below 5°.
fn slant_term(gamma: f64, h: f64, el: f64) -> f64 {
    if el >= 5.0 {
        return gamma * h / el.to_radians().sin();
    }
    let x = el.to_radians().tan() * (EFFECTIVE_EARTH_RADIUS / h).sqrt();
    let big_f = 1.0 / (0.661 * x + 0.339 * (x.powi(2) + 5.51).sqrt());
    gamma * (EFFECTIVE_EARTH_RADIUS * h).sqrt() * big_f / el.to_radians().cos()
}

/// Oxygen and water-vapour slant path attenuation (dB).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathAttenuation {
    pub oxygen: f64,
    pub water_vapour: f64,
}

impl PathAttenuation {
    pub fn total(&self) -> f64 {
        self.oxygen + self.water_vapour
    }
}

/// Approximate slant path attenuation from surface conditions.
///
/// When the total columnar water vapour content `v_t` (kg/m²) is known, the
/// water vapour term is derived from it instead of the surface density.
pub fn slant_path_approx(
    f: f64,
    el: f64,
    surface: &SurfaceConditions,
    v_t: Option<f64>,
    version: P676Version,
) -> Result<PathAttenuation> {
    if !(el > 0.0 && el <= 90.0) {
        return Err(ItuError::out_of_domain(PHENOMENON, "elevation", el, "(0, 90]"));
    }
    let heights = equivalent_heights(f, surface)?;
    let gamma = specific_attenuation(
        f,
        surface.pressure,
        surface.water_vapour_density,
        surface.temperature,
        version,
    )?;

    let oxygen = slant_term(gamma.oxygen, heights.oxygen, el);
    let water_vapour = match v_t {
        Some(v) => {
            let zenith = zenith_water_vapour_attenuation(f, v, version)?;
            if el >= 5.0 {
                zenith / el.to_radians().sin()
            } else if gamma.water_vapour > 0.0 {
                slant_term(gamma.water_vapour, zenith / gamma.water_vapour, el)
            } else {
                0.0
            }
        }
        None => slant_term(gamma.water_vapour, heights.water_vapour, el),
    };

    Ok(PathAttenuation { oxygen, water_vapour })
}

/// Zenith water vapour attenuation (dB) from total columnar content `v_t`
/// (kg/m²), scaled from the 20.6 GHz reference.
pub fn zenith_water_vapour_attenuation(f: f64, v_t: f64, version: P676Version) -> Result<f64> {
    check_range(PHENOMENON, "total water vapour content", v_t, 0.0, f64::INFINITY)?;
    if v_t == 0.0 {
        return Ok(0.0);
    }
    const F_REF: f64 = 20.6;
    const P_REF: f64 = 780.0;
    let rho_ref = v_t / 4.0;
    let t_ref = 14.0 * (0.22 * v_t / 4.0).ln() + 3.0 + 273.15;

    let gamma_w = |freq: f64| -> Result<f64> {
        Ok(specific_attenuation(freq, P_REF, rho_ref, t_ref, version)?.water_vapour)
    };
    Ok(0.0176 * v_t * gamma_w(f)? / gamma_w(F_REF)?)
}

/// Attenuation (dB) over a horizontal path of `d` km.
pub fn terrestrial_path(
    f: f64,
    d: f64,
    surface: &SurfaceConditions,
    version: P676Version,
) -> Result<PathAttenuation> {
    check_range(PHENOMENON, "path length", d, 0.0, f64::INFINITY)?;
    let SpecificAttenuation { oxygen, water_vapour } = specific_attenuation(
        f,
        surface.pressure,
        surface.water_vapour_density,
        surface.temperature,
        version,
    )?;
    Ok(PathAttenuation {
        oxygen: oxygen * d,
        water_vapour: water_vapour * d,
    })
}

fn refractive_index(t: f64, p: f64, rho: f64) -> f64 {
    let e = vapour_pressure(rho, t);
    1.0 + 1e-6 * (77.6 * p / t - 5.6 * e / t + 3.75e5 * e / t.powi(2))
}

/// Slant path attenuation by ray tracing through exponentially thickening
/// layers from height `h_s` (km) to 100 km.
pub fn slant_path_exact(
    f: f64,
    el: f64,
    h_s: f64,
    profile: &dyn AtmosphereProfile,
    version: P676Version,
) -> Result<PathAttenuation> {
    check_range(PHENOMENON, "elevation", el, 0.0, 90.0)?;
    check_range(PHENOMENON, "station height", h_s, -0.5, 100.0)?;

    let mut total = PathAttenuation::default();
    let mut h = h_s;
    let mut beta = PI / 2.0 - el.to_radians();

    let layer = |h: f64, delta: f64| {
        let mid = h + delta / 2.0;
        let t = profile.temperature(mid);
        let p = profile.pressure(mid);
        let rho = profile.water_vapour_density(mid);
        (t, p, rho, refractive_index(t, p, rho))
    };

    for i in 1..=LAYERS {
        if h >= 100.0 {
            break;
        }
        let delta = 1e-4 * ((i as f64 - 1.0) / 100.0).exp();
        let delta = delta.min(100.0 - h);
        let r = EARTH_RADIUS + h;
        let (t, p, rho, n) = layer(h, delta);

        let a = -r * beta.cos()
            + 0.5 * (4.0 * r.powi(2) * beta.cos().powi(2) + 8.0 * r * delta + 4.0 * delta.powi(2)).sqrt();
        let gamma = specific_attenuation(f, p, rho, t, version)?;
        total.oxygen += a * gamma.oxygen;
        total.water_vapour += a * gamma.water_vapour;

        let cos_alpha = (-a.powi(2) - 2.0 * r * delta - delta.powi(2)) / (2.0 * a * r + 2.0 * a * delta);
        let alpha = PI - cos_alpha.clamp(-1.0, 1.0).acos();
        let next_delta = 1e-4 * (i as f64 / 100.0).exp();
        let (_, _, _, n_next) = layer(h + delta, next_delta);
        beta = (n / n_next * alpha.sin()).clamp(-1.0, 1.0).asin();
        h += delta;
    }

    Ok(total)
}
