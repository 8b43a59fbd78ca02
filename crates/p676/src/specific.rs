//! Line-by-line specific attenuation, ITU-R P.676 Annex 1.

use itur_core::{check_range, Result};

use crate::lines::{lines_for, P676Version, SpectralLine};

pub const PHENOMENON: &str = "P.676 gaseous attenuation";

/// Frequency range (GHz) of the line-by-line model.
pub const FREQUENCY_RANGE: (f64, f64) = (1.0, 1000.0);

/// Oxygen and water-vapour specific attenuation (dB/km).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpecificAttenuation {
    pub oxygen: f64,
    pub water_vapour: f64,
}

impl SpecificAttenuation {
    pub fn total(&self) -> f64 {
        self.oxygen + self.water_vapour
    }
}

/// Water vapour partial pressure (hPa) from density (g/m³) and temperature (K).
pub fn vapour_pressure(rho: f64, t: f64) -> f64 {
    rho * t / 216.7
}

/// Specific attenuation at frequency `f` (GHz) for total barometric pressure
/// `p` (hPa), water vapour density `rho` (g/m³) and temperature `t` (K).
pub fn specific_attenuation(
    f: f64,
    p: f64,
    rho: f64,
    t: f64,
    version: P676Version,
) -> Result<SpecificAttenuation> {
    check_range(PHENOMENON, "frequency", f, FREQUENCY_RANGE.0, FREQUENCY_RANGE.1)?;
    check_range(PHENOMENON, "temperature", t, 1.0, f64::INFINITY)?;
    check_range(PHENOMENON, "pressure", p, 0.0, f64::INFINITY)?;
    check_range(PHENOMENON, "water vapour density", rho, 0.0, f64::INFINITY)?;

    let table = lines_for(version)?;
    let theta = 300.0 / t;
    let e = vapour_pressure(rho, t);
    // The tables are parameterised on dry air pressure
    let p_dry = (p - e).max(0.0);

    let n_oxygen: f64 = table
        .oxygen
        .iter()
        .map(|line| oxygen_line(line, f, p_dry, e, theta))
        .sum::<f64>()
        + dry_continuum(f, p_dry, e, theta);
    let n_water: f64 = table
        .water_vapour
        .iter()
        .map(|line| water_vapour_line(line, f, p_dry, e, theta))
        .sum();

    Ok(SpecificAttenuation {
        oxygen: 0.1820 * f * n_oxygen,
        water_vapour: 0.1820 * f * n_water,
    })
}

/// Van Vleck-Weisskopf line shape with interference term `delta`.
fn line_shape(f: f64, fi: f64, df: f64, delta: f64) -> f64 {
    f / fi
        * ((df - delta * (fi - f)) / ((fi - f).powi(2) + df.powi(2))
            + (df - delta * (fi + f)) / ((fi + f).powi(2) + df.powi(2)))
}

fn oxygen_line(line: &SpectralLine, f: f64, p: f64, e: f64, theta: f64) -> f64 {
    let [a1, a2, a3, a4, a5, a6] = line.coefficients;
    let fi = line.frequency;

    let strength = a1 * 1e-7 * p * theta.powi(3) * (a2 * (1.0 - theta)).exp();
    let mut df = a3 * 1e-4 * (p * theta.powf(0.8 - a4) + 1.1 * e * theta);
    // Zeeman splitting of oxygen lines
    df = (df.powi(2) + 2.25e-6).sqrt();
    let delta = (a5 + a6 * theta) * 1e-4 * (p + e) * theta.powf(0.8);

    strength * line_shape(f, fi, df, delta)
}

fn water_vapour_line(line: &SpectralLine, f: f64, p: f64, e: f64, theta: f64) -> f64 {
    let [b1, b2, b3, b4, b5, b6] = line.coefficients;
    let fi = line.frequency;

    let strength = b1 * 1e-1 * e * theta.powf(3.5) * (b2 * (1.0 - theta)).exp();
    let mut df = b3 * 1e-4 * (p * theta.powf(b4) + b5 * e * theta.powf(b6));
    // Doppler broadening
    df = 0.535 * df + (0.217 * df.powi(2) + 2.1316e-12 * fi.powi(2) / theta).sqrt();

    strength * line_shape(f, fi, df, 0.0)
}

/// Debye spectrum of dry air plus pressure-induced nitrogen absorption.
fn dry_continuum(f: f64, p: f64, e: f64, theta: f64) -> f64 {
    if p <= 0.0 {
        return 0.0;
    }
    let d = 5.6e-4 * (p + e) * theta.powf(0.8);
    f * p
        * theta.powi(2)
        * (6.14e-5 / (d * (1.0 + (f / d).powi(2)))
            + 1.4e-12 * p * theta.powf(1.5) / (1.0 + 1.9e-5 * f.powf(1.5)))
}
