//! ITU-R P.618: propagation data and prediction methods for Earth-space
//! telecommunication systems. Rain attenuation, tropospheric scintillation,
//! rain cross-polarization discrimination and the total attenuation
//! combiner.

use std::sync::Arc;

use itur_core::{check_range, GeophysicalMap, ItuError, Quantity, Result, Unit};
use tracing::debug;

use crate::gas::GasMaps;
use crate::p1511::SiteAltitude;
use crate::p453::WetTermMaps;
use crate::p837::RainMaps;
use crate::p839::{self, RAIN_HEIGHT_OFFSET};
use crate::predictor::{arg, check_elevation, opt, Input, Predictor, Row};
use crate::{p838, p840};

const RAIN: &str = "P.618 rain attenuation";
const SCINTILLATION: &str = "P.618 scintillation";
const XPD: &str = "P.618 cross-polarization discrimination";
const TOTAL: &str = "P.618 total attenuation";

/// Effective radius of the Earth (km) for low-elevation rain paths.
const EFFECTIVE_EARTH_RADIUS: f64 = 8500.0;

pub const RAIN_PERCENTAGE_RANGE: (f64, f64) = (0.001, 5.0);
pub const RAIN_FREQUENCY_RANGE: (f64, f64) = (1.0, 55.0);
pub const SCINTILLATION_PERCENTAGE_RANGE: (f64, f64) = (0.01, 50.0);
pub const SCINTILLATION_FREQUENCY_RANGE: (f64, f64) = (4.0, 20.0);
pub const XPD_FREQUENCY_RANGE: (f64, f64) = (6.0, 55.0);
/// Percentages the combined attenuation is defined for.
pub const TOTAL_PERCENTAGE_RANGE: (f64, f64) = (0.001, 99.0);

/// Antenna efficiency assumed when none is given.
pub const DEFAULT_ANTENNA_EFFICIENCY: f64 = 0.5;
/// Polarization tilt (deg) assumed when none is given: circular.
pub const DEFAULT_POLARIZATION_TILT: f64 = 45.0;

/// Geometry and climate of one rain path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainPath {
    /// Station latitude (deg).
    pub lat: f64,
    /// Frequency (GHz).
    pub f: f64,
    /// Elevation angle (deg).
    pub el: f64,
    /// Polarization tilt angle (deg).
    pub tau: f64,
    /// Station height above mean sea level (km).
    pub h_s: f64,
    /// Rain height above mean sea level (km).
    pub h_r: f64,
    /// Rainfall rate exceeded for 0.01 % of an average year (mm/h).
    pub r001: f64,
}

/// Rain attenuation (dB) exceeded for `p` % of an average year, steps 1 to
/// 10 of the Earth-space rain method.
pub fn rain_attenuation_on_path(path: &RainPath, p: f64) -> Result<f64> {
    let p = check_range(RAIN, "p", p, RAIN_PERCENTAGE_RANGE.0, RAIN_PERCENTAGE_RANGE.1)?;
    let el = check_elevation(RAIN, path.el)?;
    let depth = path.h_r - path.h_s;
    if depth <= 0.0 || path.r001 <= 0.0 {
        return Ok(0.0);
    }
    let theta = el.to_radians();
    let sin_t = theta.sin();

    // slant path below the rain height and its horizontal projection
    let l_s = if el >= 5.0 {
        depth / sin_t
    } else {
        2.0 * depth / ((sin_t.powi(2) + 2.0 * depth / EFFECTIVE_EARTH_RADIUS).sqrt() + sin_t)
    };
    let l_g = l_s * theta.cos();

    let gamma = p838::rain_specific_attenuation(path.r001, path.f, el, path.tau)?;

    let r001 = 1.0 / (1.0 + 0.78 * (l_g * gamma / path.f).sqrt() - 0.38 * (1.0 - (-2.0 * l_g).exp()));
    let zeta = depth.atan2(l_g * r001).to_degrees();
    let l_r = if zeta > el {
        l_g * r001 / theta.cos()
    } else {
        depth / sin_t
    };
    let chi = if path.lat.abs() < 36.0 { 36.0 - path.lat.abs() } else { 0.0 };
    let v001 = 1.0
        / (1.0
            + sin_t.sqrt()
                * (31.0 * (1.0 - (-el / (1.0 + chi)).exp()) * (l_r * gamma).sqrt() / path.f.powi(2) - 0.45));
    let a001 = gamma * l_r * v001;
    if a001 <= 0.0 {
        return Ok(0.0);
    }

    let beta = if p >= 1.0 || path.lat.abs() >= 36.0 {
        0.0
    } else if el >= 25.0 {
        -0.005 * (path.lat.abs() - 36.0)
    } else {
        -0.005 * (path.lat.abs() - 36.0) + 1.8 - 4.25 * sin_t
    };
    let exponent = 0.655 + 0.033 * p.ln() - 0.045 * a001.ln() - beta * (1.0 - p) * sin_t;
    Ok(a001 * (p / 0.01).powf(-exponent))
}

/// Standard deviation (dB) of the scintillation amplitude for wet-term
/// refractivity `n_wet`, antenna diameter `d` (m) and efficiency `eta`.
/// Zero when the antenna averages the turbulence out completely.
pub fn scintillation_sigma(n_wet: f64, f: f64, el: f64, d: f64, eta: f64) -> Result<f64> {
    check_range(SCINTILLATION, "elevation", el, 5.0, 90.0)?;
    check_range(SCINTILLATION, "antenna diameter", d, f64::MIN_POSITIVE, f64::INFINITY)?;
    check_range(SCINTILLATION, "antenna efficiency", eta, f64::MIN_POSITIVE, 1.0)?;
    let sigma_ref = 3.6e-3 + 1e-4 * n_wet;
    let h_l = 1000.0;
    let sin_t = el.to_radians().sin();
    let l = 2.0 * h_l / ((sin_t.powi(2) + 2.35e-4).sqrt() + sin_t);
    let d_eff = eta.sqrt() * d;
    let x = 1.22 * d_eff.powi(2) * f / l;
    let radicand = 3.86 * (x.powi(2) + 1.0).powf(11.0 / 12.0) * (11.0 / 6.0 * (1.0 / x).atan()).sin()
        - 7.08 * x.powf(5.0 / 6.0);
    if radicand <= 0.0 {
        return Ok(0.0);
    }
    Ok(sigma_ref * f.powf(7.0 / 12.0) * radicand.sqrt() / sin_t.powf(1.2))
}

/// Time percentage factor a(p) of the scintillation fade depth.
pub fn scintillation_time_factor(p: f64) -> Result<f64> {
    let p = check_range(
        SCINTILLATION,
        "p",
        p,
        SCINTILLATION_PERCENTAGE_RANGE.0,
        SCINTILLATION_PERCENTAGE_RANGE.1,
    )?;
    let l = p.log10();
    Ok(-0.061 * l.powi(3) + 0.072 * l.powi(2) - 1.71 * l + 3.0)
}

/// Scintillation fade depth (dB) exceeded for `p` %.
pub fn scintillation_fade_depth(n_wet: f64, f: f64, el: f64, p: f64, d: f64, eta: f64) -> Result<f64> {
    Ok(scintillation_time_factor(p)? * scintillation_sigma(n_wet, f, el, d, eta)?)
}

/// Cross-polarization discrimination (dB) not exceeded for `p` %, given the
/// co-polar rain attenuation `a_p` (dB) exceeded for the same percentage.
pub fn rain_cross_polarization_discrimination(a_p: f64, f: f64, el: f64, p: f64, tau: f64) -> Result<f64> {
    check_range(XPD, "frequency", f, XPD_FREQUENCY_RANGE.0, XPD_FREQUENCY_RANGE.1)?;
    check_range(XPD, "elevation", el, 0.0, 60.0)?;
    check_range(XPD, "p", p, 0.001, 1.0)?;
    check_range(XPD, "rain attenuation", a_p, f64::MIN_POSITIVE, f64::INFINITY)?;

    let log_f = f.log10();
    let c_f = if f < 9.0 {
        60.0 * log_f - 28.3
    } else if f < 36.0 {
        26.0 * log_f + 4.1
    } else {
        35.9 * log_f - 11.3
    };
    let v = if f < 9.0 {
        30.8 * f.powf(-0.21)
    } else if f < 20.0 {
        12.8 * f.powf(0.19)
    } else if f < 40.0 {
        22.6
    } else {
        13.0 * f.powf(0.15)
    };
    let c_a = v * a_p.log10();
    let c_tau = -10.0 * (1.0 - 0.484 * (1.0 + (4.0 * tau.to_radians()).cos())).log10();
    let c_theta = -40.0 * el.to_radians().cos().log10();
    let sigma = -5.0 * p.log10();
    let c_sigma = 0.0053 * sigma.powi(2);

    let xpd_rain = c_f - c_a + c_tau + c_theta + c_sigma;
    let c_ice = xpd_rain * (0.3 + 0.1 * p.log10()) / 2.0;
    Ok(xpd_rain - c_ice)
}

/// Which contributions the combiner includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contributions {
    pub gas: bool,
    pub rain: bool,
    pub cloud: bool,
    pub scintillation: bool,
}

impl Contributions {
    pub const ALL: Self = Self {
        gas: true,
        rain: true,
        cloud: true,
        scintillation: true,
    };

    /// Everything except scintillation, which needs an antenna diameter.
    pub const NO_SCINTILLATION: Self = Self {
        scintillation: false,
        ..Self::ALL
    };
}

impl Default for Contributions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Inputs of an Earth-space link, broadcast against each other.
#[derive(Debug, Clone, Copy)]
pub struct LinkParameters<'a> {
    pub lat: &'a Quantity,
    pub lon: &'a Quantity,
    pub f: &'a Quantity,
    pub el: &'a Quantity,
    pub p: &'a Quantity,
    /// Antenna diameter; required for scintillation.
    pub diameter: Option<&'a Quantity>,
    /// Antenna efficiency, [`DEFAULT_ANTENNA_EFFICIENCY`] when absent.
    pub efficiency: Option<&'a Quantity>,
    /// Polarization tilt, [`DEFAULT_POLARIZATION_TILT`] when absent.
    pub tau: Option<&'a Quantity>,
    /// Station height, the P.1511 topographic altitude when absent.
    pub h_s: Option<&'a Quantity>,
    /// R0.01 rainfall rate, the P.837 value when absent.
    pub r001: Option<&'a Quantity>,
}

const LAT: usize = 0;
const LON: usize = 1;
const F: usize = 2;
const EL: usize = 3;
const P: usize = 4;
const DIAMETER: usize = 5;
const EFFICIENCY: usize = 6;
const TAU: usize = 7;
const H_S: usize = 8;
const R001: usize = 9;

impl<'a> LinkParameters<'a> {
    pub fn new(lat: &'a Quantity, lon: &'a Quantity, f: &'a Quantity, el: &'a Quantity, p: &'a Quantity) -> Self {
        Self {
            lat,
            lon,
            f,
            el,
            p,
            diameter: None,
            efficiency: None,
            tau: None,
            h_s: None,
            r001: None,
        }
    }

    pub fn with_diameter(mut self, diameter: &'a Quantity) -> Self {
        self.diameter = Some(diameter);
        self
    }

    pub fn with_efficiency(mut self, efficiency: &'a Quantity) -> Self {
        self.efficiency = Some(efficiency);
        self
    }

    pub fn with_polarization_tilt(mut self, tau: &'a Quantity) -> Self {
        self.tau = Some(tau);
        self
    }

    pub fn with_station_height(mut self, h_s: &'a Quantity) -> Self {
        self.h_s = Some(h_s);
        self
    }

    pub fn with_r001(mut self, r001: &'a Quantity) -> Self {
        self.r001 = Some(r001);
        self
    }

    fn inputs(&self) -> Vec<Input<'a>> {
        vec![
            arg("lat", self.lat, Unit::Degree),
            arg("lon", self.lon, Unit::Degree),
            arg("f", self.f, Unit::GigaHertz),
            arg("el", self.el, Unit::Degree),
            arg("p", self.p, Unit::Percent),
            opt("diameter", self.diameter, Unit::Meter),
            opt("efficiency", self.efficiency, Unit::Dimensionless),
            opt("tau", self.tau, Unit::Degree),
            opt("h_s", self.h_s, Unit::Kilometer),
            opt("r001", self.r001, Unit::MillimeterPerHour),
        ]
    }
}

/// Maps behind the location-driven rain attenuation.
struct RainContext {
    rates: Option<RainMaps>,
    isotherm: Arc<GeophysicalMap>,
    site: SiteAltitude,
}

impl RainContext {
    fn load(pred: &Predictor, link: &LinkParameters<'_>) -> Result<Self> {
        Ok(Self {
            rates: match link.r001 {
                Some(_) => None,
                None => Some(RainMaps::load(pred)?),
            },
            isotherm: p839::isotherm_map(pred)?,
            site: SiteAltitude::load(pred, link.h_s.is_some())?,
        })
    }

    fn at(&self, pred: &Predictor, r: &Row<'_>, p: f64) -> Result<f64> {
        let (lat, lon, f) = (r.get(LAT), r.get(LON), r.get(F));
        pred.check_frequency(RAIN, f, RAIN_FREQUENCY_RANGE.0, RAIN_FREQUENCY_RANGE.1)?;
        let r001 = match (r.opt(R001), &self.rates) {
            (Some(rate), _) => rate,
            (None, Some(rates)) => rates.rainfall_rate(lat, lon, 0.01)?,
            (None, None) => {
                return Err(ItuError::MissingParameter {
                    phenomenon: RAIN,
                    parameter: "r001",
                })
            }
        };
        let path = RainPath {
            lat,
            f,
            el: r.get(EL),
            tau: r.opt(TAU).unwrap_or(DEFAULT_POLARIZATION_TILT),
            h_s: self.site.resolve(lat, lon, r.opt(H_S))?,
            h_r: self.isotherm.bilinear(lat, lon)? + RAIN_HEIGHT_OFFSET,
            r001,
        };
        rain_attenuation_on_path(&path, p)
    }
}

fn scintillation_at(pred: &Predictor, n_wet: &WetTermMaps, r: &Row<'_>, p: f64) -> Result<f64> {
    let f = r.get(F);
    pred.check_frequency(SCINTILLATION, f, SCINTILLATION_FREQUENCY_RANGE.0, SCINTILLATION_FREQUENCY_RANGE.1)?;
    let d = r.opt(DIAMETER).ok_or(ItuError::MissingParameter {
        phenomenon: SCINTILLATION,
        parameter: "diameter",
    })?;
    let eta = r.opt(EFFICIENCY).unwrap_or(DEFAULT_ANTENNA_EFFICIENCY);
    let n_wet = n_wet.at(r.get(LAT), r.get(LON), 50.0)?;
    scintillation_fade_depth(n_wet, f, r.get(EL), p, d, eta)
}

/// Attenuation (dB) exceeded for `p` % of an average year, per contribution
/// and combined.
#[derive(Debug, Clone, PartialEq)]
pub struct AttenuationBreakdown {
    pub gas: Quantity,
    pub cloud: Quantity,
    pub rain: Quantity,
    pub scintillation: Quantity,
    pub total: Quantity,
}

impl Predictor {
    /// Rain attenuation (dB) exceeded for `p` % of an average year.
    pub fn rain_attenuation(&self, link: &LinkParameters<'_>) -> Result<Quantity> {
        let rain = RainContext::load(self, link)?;
        self.evaluate(&link.inputs(), Unit::Decibel, |r| rain.at(self, r, r.get(P)))
    }

    /// Tropospheric scintillation fade depth (dB) exceeded for `p` %.
    pub fn scintillation_attenuation(&self, link: &LinkParameters<'_>) -> Result<Quantity> {
        if link.diameter.is_none() {
            return Err(ItuError::MissingParameter {
                phenomenon: SCINTILLATION,
                parameter: "diameter",
            });
        }
        let n_wet = WetTermMaps::load(self)?;
        self.evaluate(&link.inputs(), Unit::Decibel, |r| scintillation_at(self, &n_wet, r, r.get(P)))
    }

    /// Standard deviation (dB) of the scintillation amplitude.
    pub fn scintillation_attenuation_sigma(&self, link: &LinkParameters<'_>) -> Result<Quantity> {
        if link.diameter.is_none() {
            return Err(ItuError::MissingParameter {
                phenomenon: SCINTILLATION,
                parameter: "diameter",
            });
        }
        let n_wet = WetTermMaps::load(self)?;
        self.evaluate(&link.inputs(), Unit::Decibel, |r| {
            let n = n_wet.at(r.get(LAT), r.get(LON), 50.0)?;
            let eta = r.opt(EFFICIENCY).unwrap_or(DEFAULT_ANTENNA_EFFICIENCY);
            scintillation_sigma(n, r.get(F), r.get(EL), r.get(DIAMETER), eta)
        })
    }

    /// Cross-polarization discrimination (dB) from rain attenuation `a_p`.
    pub fn rain_cross_polarization_discrimination(
        &self,
        a_p: &Quantity,
        f: &Quantity,
        el: &Quantity,
        p: &Quantity,
        tau: &Quantity,
    ) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("a_p", a_p, Unit::Decibel),
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("p", p, Unit::Percent),
                arg("tau", tau, Unit::Degree),
            ],
            Unit::Decibel,
            |r| rain_cross_polarization_discrimination(r.get(0), r.get(1), r.get(2), r.get(3), r.get(4)),
        )
    }

    /// Total attenuation (dB) exceeded for `p` % of an average year:
    /// A_T = A_G + sqrt((A_R + A_C)² + A_S²).
    pub fn total_attenuation(&self, link: &LinkParameters<'_>, contributions: Contributions) -> Result<Quantity> {
        Ok(self.attenuation_breakdown(link, contributions)?.total)
    }

    /// Every contribution of the combiner along with their combination.
    ///
    /// Gas and cloud attenuation are held at their 1 % value below 1 %;
    /// rain contributes nothing above 5 %, scintillation nothing above 50 %
    /// and its 0.01 % value below 0.01 %. Percentages outside
    /// [0.001, 99] are out of domain.
    pub fn attenuation_breakdown(
        &self,
        link: &LinkParameters<'_>,
        contributions: Contributions,
    ) -> Result<AttenuationBreakdown> {
        if contributions.scintillation && link.diameter.is_none() {
            return Err(ItuError::MissingParameter {
                phenomenon: TOTAL,
                parameter: "diameter",
            });
        }
        let gas = match contributions.gas {
            true => Some(GasMaps::load(self, link.h_s.is_some())?),
            false => None,
        };
        let cloud = match contributions.cloud {
            true => Some(self.lred_maps()?),
            false => None,
        };
        let rain = match contributions.rain {
            true => Some(RainContext::load(self, link)?),
            false => None,
        };
        let n_wet = match contributions.scintillation {
            true => Some(WetTermMaps::load(self)?),
            false => None,
        };
        debug!(?contributions, p618 = %self.versions().p618, "combining attenuation");

        let [gas_q, cloud_q, rain_q, scint_q, total_q] = self.evaluate_n(
            &link.inputs(),
            [Unit::Decibel; 5],
            |r| {
                let p = check_range(TOTAL, "p", r.get(P), TOTAL_PERCENTAGE_RANGE.0, TOTAL_PERCENTAGE_RANGE.1)?;
                let (lat, lon, f, el) = (r.get(LAT), r.get(LON), r.get(F), r.get(EL));

                let a_g = match &gas {
                    Some(maps) => maps.at(self, lat, lon, f, el, p.max(1.0), r.opt(H_S))?,
                    None => 0.0,
                };
                let a_c = match &cloud {
                    Some(stack) => {
                        self.check_frequency(TOTAL, f, p840::FREQUENCY_RANGE.0, p840::FREQUENCY_RANGE.1)?;
                        p840::cloud_attenuation(stack, lat, lon, el, f, p.max(1.0))?
                    }
                    None => 0.0,
                };
                let a_r = match &rain {
                    Some(ctx) if p <= RAIN_PERCENTAGE_RANGE.1 => ctx.at(self, r, p)?,
                    _ => 0.0,
                };
                let a_s = match &n_wet {
                    Some(maps) if p <= SCINTILLATION_PERCENTAGE_RANGE.1 => {
                        scintillation_at(self, maps, r, p.max(SCINTILLATION_PERCENTAGE_RANGE.0))?
                    }
                    _ => 0.0,
                };
                let total = a_g + ((a_r + a_c).powi(2) + a_s.powi(2)).sqrt();
                Ok([a_g, a_c, a_r, a_s, total])
            },
        )?;
        Ok(AttenuationBreakdown {
            gas: gas_q,
            cloud: cloud_q,
            rain: rain_q,
            scintillation: scint_q,
            total: total_q,
        })
    }
}
