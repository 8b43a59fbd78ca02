//! ITU-R P.835: reference standard atmosphere.
//!
//! Heights are geometric, in km. Below 86 km the temperature and pressure
//! profiles are defined on geopotential height.

use itur_core::{check_range, Quantity, Result, Unit};
use p676::AtmosphereProfile;

use crate::predictor::{arg, Predictor};

const PHENOMENON: &str = "P.835 standard atmosphere";

/// Surface water vapour density (g/m³) and scale height (km) of the mean
/// annual global reference.
pub const RHO_0: f64 = 7.5;
pub const H_0: f64 = 2.0;

fn geopotential(h: f64) -> f64 {
    6356.766 * h / (6356.766 + h)
}

fn check_height(h: f64) -> Result<f64> {
    check_range(PHENOMENON, "height", h, -0.5, 100.0)
}

/// Temperature (K) at geometric height `h` (km).
pub fn temperature(h: f64) -> Result<f64> {
    let h = check_height(h)?;
    let hp = geopotential(h);
    let t = if hp <= 11.0 {
        288.15 - 6.5 * hp
    } else if hp <= 20.0 {
        216.65
    } else if hp <= 32.0 {
        216.65 + (hp - 20.0)
    } else if hp <= 47.0 {
        228.65 + 2.8 * (hp - 32.0)
    } else if hp <= 51.0 {
        270.65
    } else if hp <= 71.0 {
        270.65 - 2.8 * (hp - 51.0)
    } else if hp <= 84.852 {
        214.65 - 2.0 * (hp - 71.0)
    } else if h <= 91.0 {
        186.8673
    } else {
        263.1905 - 76.3232 * (1.0 - ((h - 91.0) / 19.9429).powi(2)).sqrt()
    };
    Ok(t)
}

/// Total barometric pressure (hPa) at geometric height `h` (km).
pub fn pressure(h: f64) -> Result<f64> {
    let h = check_height(h)?;
    let hp = geopotential(h);
    let p = if hp <= 11.0 {
        1013.25 * (288.15 / (288.15 - 6.5 * hp)).powf(-34.1632 / 6.5)
    } else if hp <= 20.0 {
        226.3226 * (-34.1632 * (hp - 11.0) / 216.65).exp()
    } else if hp <= 32.0 {
        54.74980 * (216.65 / (216.65 + (hp - 20.0))).powf(34.1632)
    } else if hp <= 47.0 {
        8.680422 * (228.65 / (228.65 + 2.8 * (hp - 32.0))).powf(34.1632 / 2.8)
    } else if hp <= 51.0 {
        1.109106 * (-34.1632 * (hp - 47.0) / 270.65).exp()
    } else if hp <= 71.0 {
        0.6694167 * (270.65 / (270.65 - 2.8 * (hp - 51.0))).powf(-34.1632 / 2.8)
    } else if hp <= 84.852 {
        0.03956649 * (214.65 / (214.65 - 2.0 * (hp - 71.0))).powf(-34.1632 / 2.0)
    } else {
        (95.571899 - 4.011801 * h + 6.424731e-2 * h.powi(2) - 4.789660e-4 * h.powi(3)
            + 1.340543e-6 * h.powi(4))
        .exp()
    };
    Ok(p)
}

/// Water vapour density (g/m³) at `h` (km), exponential with scale height
/// `h_0` above a surface density `rho_0`. Above the height where the mixing
/// ratio falls to 2 ppmv the mixing ratio is held constant.
pub fn water_vapour_density(h: f64, rho_0: f64, h_0: f64) -> Result<f64> {
    let rho = rho_0 * (-h / h_0).exp();
    let t = temperature(h)?;
    let p = pressure(h)?;
    let floor = 2e-6 * p * 216.7 / t;
    Ok(rho.max(floor))
}

/// Water vapour partial pressure (hPa) at `h` (km).
pub fn water_vapour_pressure(h: f64, rho_0: f64, h_0: f64) -> Result<f64> {
    Ok(water_vapour_density(h, rho_0, h_0)? * temperature(h)? / 216.7)
}

/// The mean annual global reference atmosphere as a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardAtmosphere {
    pub rho_0: f64,
    pub h_0: f64,
}

impl Default for StandardAtmosphere {
    fn default() -> Self {
        Self { rho_0: RHO_0, h_0: H_0 }
    }
}

// Profile heights come from the layered ray trace, which stays inside
// [h_s, 100] km, so out-of-range heights are clamped rather than reported.
impl AtmosphereProfile for StandardAtmosphere {
    fn temperature(&self, h: f64) -> f64 {
        temperature(h.clamp(-0.5, 100.0)).unwrap_or(186.8673)
    }

    fn pressure(&self, h: f64) -> f64 {
        pressure(h.clamp(-0.5, 100.0)).unwrap_or(0.0)
    }

    fn water_vapour_density(&self, h: f64) -> f64 {
        water_vapour_density(h.clamp(-0.5, 100.0), self.rho_0, self.h_0).unwrap_or(0.0)
    }
}

impl Predictor {
    pub fn standard_temperature(&self, h: &Quantity) -> Result<Quantity> {
        self.evaluate(&[arg("h", h, Unit::Kilometer)], Unit::Kelvin, |r| temperature(r.get(0)))
    }

    pub fn standard_pressure(&self, h: &Quantity) -> Result<Quantity> {
        self.evaluate(&[arg("h", h, Unit::Kilometer)], Unit::HectoPascal, |r| pressure(r.get(0)))
    }

    pub fn standard_water_vapour_density(&self, h: &Quantity) -> Result<Quantity> {
        self.evaluate(&[arg("h", h, Unit::Kilometer)], Unit::GramPerCubicMeter, |r| {
            water_vapour_density(r.get(0), RHO_0, H_0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_level() {
        assert_eq!(temperature(0.0).unwrap(), 288.15);
        assert!((pressure(0.0).unwrap() - 1013.25).abs() < 1e-9);
        assert_eq!(water_vapour_density(0.0, RHO_0, H_0).unwrap(), 7.5);
    }

    #[test]
    fn test_tropopause() {
        let t = temperature(15.0).unwrap();
        assert!((t - 216.65).abs() < 1e-9);
        // ~226 hPa at 11 km geopotential
        let p = pressure(11.019).unwrap();
        assert!((p - 226.32).abs() < 0.5, "p = {}", p);
    }

    #[test]
    fn test_tabulated_profile_points() {
        // (h km, T K, P hPa) of the 1976 standard atmosphere tables
        let table = [
            (5.0, 255.68, 540.48),
            (10.0, 223.25, 264.99),
            (20.0, 216.65, 55.29),
            (30.0, 226.51, 11.97),
            (50.0, 270.65, 0.7978),
            (60.0, 247.02, 0.2196),
        ];
        for (h, t, p) in table {
            let tt = temperature(h).unwrap();
            let pp = pressure(h).unwrap();
            assert!(((tt - t) / t).abs() < 1e-3, "T({}) = {}", h, tt);
            assert!(((pp - p) / p).abs() < 1e-3, "P({}) = {}", h, pp);
        }
        let rho = water_vapour_density(2.0, RHO_0, H_0).unwrap();
        assert!((rho - 7.5 * (-1.0f64).exp()).abs() < 1e-9, "rho = {}", rho);
    }

    #[test]
    fn test_profiles_are_continuous() {
        for h in [11.02, 20.06, 32.16, 47.35, 51.41, 71.8, 86.0, 91.0] {
            let below = pressure(h - 1e-6).unwrap();
            let above = pressure(h + 1e-6).unwrap();
            assert!((below - above).abs() / below < 0.05, "pressure jump at {} km", h);
            let tb = temperature(h - 1e-6).unwrap();
            let ta = temperature(h + 1e-6).unwrap();
            assert!((tb - ta).abs() < 1.0, "temperature jump at {} km", h);
        }
    }

    #[test]
    fn test_water_vapour_floor() {
        let high = water_vapour_density(40.0, RHO_0, H_0).unwrap();
        assert!(high > RHO_0 * (-20.0f64).exp());
    }

    #[test]
    fn test_height_domain() {
        assert!(temperature(120.0).unwrap_err().is_out_of_domain());
        assert!(pressure(-1.0).is_err());
    }
}
