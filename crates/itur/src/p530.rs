//! ITU-R P.530-17: propagation data for terrestrial line-of-sight systems.
//! Free-space loss, rain attenuation and multipath fading.

use itur_core::{check_range, Quantity, Result, Unit};

use crate::p453;
use crate::p837::RainMaps;
use crate::p838;
use crate::predictor::{arg, opt, Predictor};

const PHENOMENON: &str = "P.530 terrestrial link";

/// Percentages the terrestrial rain method is stated for.
pub const RAIN_PERCENTAGE_RANGE: (f64, f64) = (0.001, 1.0);

/// Free-space basic transmission loss (dB) over `d` km at `f` GHz.
pub fn free_space_loss(d: f64, f: f64) -> Result<f64> {
    check_range(PHENOMENON, "distance", d, f64::MIN_POSITIVE, f64::INFINITY)?;
    check_range(PHENOMENON, "frequency", f, f64::MIN_POSITIVE, f64::INFINITY)?;
    Ok(92.4 + 20.0 * f.log10() + 20.0 * d.log10())
}

/// Radius (m) of the first Fresnel ellipsoid at distances `d1`, `d2` (km)
/// from the path ends.
pub fn fresnel_ellipse_radius(d1: f64, d2: f64, f: f64) -> Result<f64> {
    check_range(PHENOMENON, "frequency", f, f64::MIN_POSITIVE, f64::INFINITY)?;
    let d = d1 + d2;
    check_range(PHENOMENON, "distance", d, f64::MIN_POSITIVE, f64::INFINITY)?;
    Ok(17.32 * (d1 * d2 / (f * d)).sqrt())
}

/// Rain attenuation (dB) exceeded for `p` % over a `d` km terrestrial path,
/// from the R0.01 rainfall rate `r001` (mm/h).
pub fn rain_attenuation(r001: f64, d: f64, f: f64, el: f64, tau: f64, p: f64) -> Result<f64> {
    check_range(PHENOMENON, "p", p, RAIN_PERCENTAGE_RANGE.0, RAIN_PERCENTAGE_RANGE.1)?;
    check_range(PHENOMENON, "distance", d, f64::MIN_POSITIVE, f64::INFINITY)?;
    if r001 <= 0.0 {
        return Ok(0.0);
    }
    let (k, alpha) = p838::rain_coefficients(f, el, tau)?;
    let gamma = k * r001.powf(alpha);

    // effective path length factor, capped
    let r = 1.0
        / (0.477 * d.powf(0.633) * r001.powf(0.073 * alpha) * f.powf(0.123) - 10.579 * (1.0 - (-0.024 * d).exp()));
    let r = if r > 0.0 { r.min(2.5) } else { 2.5 };
    let a001 = gamma * d * r;

    let c0 = if f >= 10.0 {
        0.12 + 0.4 * ((f / 10.0).powf(0.8)).log10()
    } else {
        0.12
    };
    let c1 = 0.07f64.powf(c0) * 0.12f64.powf(1.0 - c0);
    let c2 = 0.855 * c0 + 0.546 * (1.0 - c0);
    let c3 = 0.139 * c0 + 0.043 * (1.0 - c0);
    Ok(a001 * c1 * p.powf(-(c2 + c3 * p.log10())))
}

/// A multipath path: antenna heights above sea level (m), length (km) and
/// frequency (GHz).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultipathPath {
    pub h_e: f64,
    pub h_r: f64,
    pub d: f64,
    pub f: f64,
}

impl MultipathPath {
    /// Fading occurrence factor p0 (%) given the refractivity gradient
    /// dN1 (N-units/km) not exceeded for 1 % of an average year and, for
    /// the detailed method, the terrain roughness `s_a` (m).
    pub fn occurrence_factor(&self, dn1: f64, s_a: Option<f64>) -> Result<f64> {
        check_range(PHENOMENON, "distance", self.d, f64::MIN_POSITIVE, f64::INFINITY)?;
        let eps = (self.h_r - self.h_e).abs() / self.d;
        let h_l = self.h_e.min(self.h_r);
        Ok(match s_a {
            Some(s_a) => {
                let k = 10f64.powf(-4.4 - 0.0027 * dn1) * (10.0 + s_a).powf(-0.46);
                k * self.d.powf(3.4) * (1.0 + eps).powf(-1.03) * self.f.powf(0.8) * 10f64.powf(-0.00076 * h_l)
            }
            None => {
                let k = 10f64.powf(-4.6 - 0.0027 * dn1);
                k * self.d.powf(3.1) * (1.0 + eps).powf(-1.29) * self.f.powf(0.8) * 10f64.powf(-0.00089 * h_l)
            }
        })
    }
}

/// Percentage of time (%) the fade depth `a` (dB) is exceeded in the
/// average worst month, from the occurrence factor `p0`. Covers both the
/// deep-fading tail and the shallow-fading interpolation.
pub fn fade_exceedance(p0: f64, a: f64) -> Result<f64> {
    check_range(PHENOMENON, "fade depth", a, 0.0, f64::INFINITY)?;
    let a_t = 25.0 + 1.2 * p0.log10();
    if a >= a_t {
        return Ok(p0 * 10f64.powf(-a / 10.0));
    }
    let p_t = p0 * 10f64.powf(-a_t / 10.0);
    let qa_t = -20.0 * (-((100.0 - p_t) / 100.0).ln()).log10() / a_t;
    let q_t = (qa_t - 2.0) / ((1.0 + 0.3 * 10f64.powf(-a_t / 20.0)) * 10f64.powf(-0.016 * a_t))
        - 4.3 * (10f64.powf(-a_t / 20.0) + a_t / 800.0);
    let q_a = 2.0
        + (1.0 + 0.3 * 10f64.powf(-a / 20.0))
            * 10f64.powf(-0.016 * a)
            * (q_t + 4.3 * (10f64.powf(-a / 20.0) + a / 800.0));
    Ok(100.0 * (1.0 - (-(10f64.powf(-q_a * a / 20.0))).exp()))
}

/// Fade depth (dB) exceeded for `p_w` % of the worst month; inverse of
/// [`fade_exceedance`] by bisection.
pub fn fade_depth(p0: f64, p_w: f64) -> Result<f64> {
    check_range(PHENOMENON, "p_w", p_w, f64::MIN_POSITIVE, 100.0)?;
    if fade_exceedance(p0, 0.0)? <= p_w {
        return Ok(0.0);
    }
    let (mut lo, mut hi) = (0.0, 200.0);
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if fade_exceedance(p0, mid)? > p_w {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

impl Predictor {
    pub fn free_space_loss(&self, d: &Quantity, f: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[arg("d", d, Unit::Kilometer), arg("f", f, Unit::GigaHertz)],
            Unit::Decibel,
            |r| free_space_loss(r.get(0), r.get(1)),
        )
    }

    pub fn fresnel_ellipse_radius(&self, d1: &Quantity, d2: &Quantity, f: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("d1", d1, Unit::Kilometer),
                arg("d2", d2, Unit::Kilometer),
                arg("f", f, Unit::GigaHertz),
            ],
            Unit::Meter,
            |r| fresnel_ellipse_radius(r.get(0), r.get(1), r.get(2)),
        )
    }

    /// Rain attenuation (dB) exceeded for `p` % on a terrestrial path at a
    /// location. `r001` defaults to the P.837 value; `el` is the path
    /// inclination and `tau` the polarization tilt.
    #[allow(clippy::too_many_arguments)]
    pub fn terrestrial_rain_attenuation(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        d: &Quantity,
        f: &Quantity,
        el: &Quantity,
        p: &Quantity,
        tau: &Quantity,
        r001: Option<&Quantity>,
    ) -> Result<Quantity> {
        let rates = match r001 {
            Some(_) => None,
            None => Some(RainMaps::load(self)?),
        };
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("d", d, Unit::Kilometer),
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("p", p, Unit::Percent),
                arg("tau", tau, Unit::Degree),
                opt("r001", r001, Unit::MillimeterPerHour),
            ],
            Unit::Decibel,
            |r| {
                let r001 = match (r.opt(7), &rates) {
                    (Some(rate), _) => rate,
                    (_, Some(rates)) => rates.rainfall_rate(r.get(0), r.get(1), 0.01)?,
                    (None, None) => 0.0,
                };
                rain_attenuation(r001, r.get(2), r.get(3), r.get(4), r.get(6), r.get(5))
            },
        )
    }

    /// Percentage of the worst month (%) a multipath fade of depth `a` is
    /// exceeded. The detailed method is used when the terrain roughness
    /// `s_a` is given, the quick method otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn multipath_fade_exceedance(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        h_e: &Quantity,
        h_r: &Quantity,
        d: &Quantity,
        f: &Quantity,
        a: &Quantity,
        s_a: Option<&Quantity>,
    ) -> Result<Quantity> {
        let dn65 = p453::gradient_maps(self, p453::Gradient::Dn65)?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("h_e", h_e, Unit::Meter),
                arg("h_r", h_r, Unit::Meter),
                arg("d", d, Unit::Kilometer),
                arg("f", f, Unit::GigaHertz),
                arg("a", a, Unit::Decibel),
                opt("s_a", s_a, Unit::Meter),
            ],
            Unit::Percent,
            |r| {
                let path = MultipathPath {
                    h_e: r.get(2),
                    h_r: r.get(3),
                    d: r.get(4),
                    f: r.get(5),
                };
                let dn1 = p453::gradient_at(&dn65, r.get(0), r.get(1), 1.0)?;
                fade_exceedance(path.occurrence_factor(dn1, r.opt(7))?, r.get(6))
            },
        )
    }

    /// Multipath fade depth (dB) exceeded for `p_w` % of the worst month.
    #[allow(clippy::too_many_arguments)]
    pub fn multipath_fade_depth(
        &self,
        lat: &Quantity,
        lon: &Quantity,
        h_e: &Quantity,
        h_r: &Quantity,
        d: &Quantity,
        f: &Quantity,
        p_w: &Quantity,
        s_a: Option<&Quantity>,
    ) -> Result<Quantity> {
        let dn65 = p453::gradient_maps(self, p453::Gradient::Dn65)?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("h_e", h_e, Unit::Meter),
                arg("h_r", h_r, Unit::Meter),
                arg("d", d, Unit::Kilometer),
                arg("f", f, Unit::GigaHertz),
                arg("p_w", p_w, Unit::Percent),
                opt("s_a", s_a, Unit::Meter),
            ],
            Unit::Decibel,
            |r| {
                let path = MultipathPath {
                    h_e: r.get(2),
                    h_r: r.get(3),
                    d: r.get(4),
                    f: r.get(5),
                };
                let dn1 = p453::gradient_at(&dn65, r.get(0), r.get(1), 1.0)?;
                fade_depth(path.occurrence_factor(dn1, r.opt(7))?, r.get(6))
            },
        )
    }
}
