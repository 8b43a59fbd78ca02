//! ITU-R P.1853: tropospheric attenuation time series synthesis.
//!
//! Rain attenuation is modelled as a lognormal process: white Gaussian noise
//! is low-pass filtered by a first order Markov filter, exponentiated with
//! the lognormal parameters fitted to the P.618 distribution, and offset so
//! that the rain probability matches P.837.

use itur_core::{ItuError, Quantity, Result, Unit};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf::erfc;
use tracing::debug;

use crate::p618::{LinkParameters, RAIN_PERCENTAGE_RANGE};
use crate::p837::RainMaps;
use crate::predictor::Predictor;

const PHENOMENON: &str = "P.1853 time series";

/// Dynamic parameter β (1/s) of the rain attenuation process.
pub const BETA: f64 = 2e-4;

/// Percentages the lognormal fit is made at, kept below the rain
/// probability.
const FIT_PERCENTAGES: [f64; 13] = [0.01, 0.02, 0.03, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 3.0, 5.0, 10.0];

/// Complementary cumulative normal distribution Q(x).
pub fn q_function(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Inverse of [`q_function`].
pub fn inverse_q_function(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(ItuError::out_of_domain(PHENOMENON, "probability", p, "(0, 1)"));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|_| ItuError::out_of_domain(PHENOMENON, "sigma", 1.0, "(0, inf)"))?;
    Ok(normal.inverse_cdf(1.0 - p))
}

/// Lognormal parameters of the rain attenuation distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LognormalFit {
    pub m: f64,
    pub sigma: f64,
    /// Probability of rain (%).
    pub p_rain: f64,
}

impl LognormalFit {
    /// Least-squares fit of ln A against Q⁻¹(P / P_rain) over the
    /// (percentage, attenuation) pairs with 0 < P < P_rain and A > 0.
    pub fn fit(percentages: &[f64], attenuations: &[f64], p_rain: f64) -> Result<Self> {
        let mut points = Vec::new();
        for (&p, &a) in percentages.iter().zip(attenuations) {
            if p < p_rain && a > 0.0 {
                points.push((inverse_q_function(p / p_rain)?, a.ln()));
            }
        }
        if points.len() < 2 {
            return Err(ItuError::out_of_domain(
                PHENOMENON,
                "rain probability",
                p_rain,
                "at least two percentages below the rain probability",
            ));
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
        let sigma = sxy / sxx;
        Ok(Self {
            m: mean_y - sigma * mean_x,
            sigma,
            p_rain,
        })
    }

    /// Attenuation (dB) the process is shifted down by.
    pub fn offset(&self) -> Result<f64> {
        Ok((self.m + self.sigma * inverse_q_function(self.p_rain / 100.0)?).exp())
    }
}

/// Synthesize `samples` values of rain attenuation (dB) at interval `ts`
/// (s). The same seed always yields the same series.
pub fn synthesize(fit: &LognormalFit, samples: usize, ts: f64, seed: u64) -> Result<Vec<f64>> {
    if !(ts > 0.0) {
        return Err(ItuError::out_of_domain(PHENOMENON, "sampling interval", ts, "(0, inf)"));
    }
    let offset = fit.offset()?;
    let rho = (-BETA * ts).exp();
    let gain = (1.0 - rho * rho).sqrt();
    let mut rng = StdRng::seed_from_u64(seed);

    // start from the stationary distribution, no warm-up needed
    let mut x: f64 = StandardNormal.sample(&mut rng);
    let mut series = Vec::with_capacity(samples);
    for _ in 0..samples {
        let y = (fit.m + fit.sigma * x).exp();
        series.push((y - offset).max(0.0));
        let n: f64 = StandardNormal.sample(&mut rng);
        x = rho * x + gain * n;
    }
    Ok(series)
}

impl Predictor {
    /// Lognormal fit of the P.618 rain attenuation distribution at one
    /// location and link.
    pub fn rain_attenuation_lognormal_fit(&self, lat: f64, lon: f64, f: f64, el: f64, tau: f64) -> Result<LognormalFit> {
        let p_rain = RainMaps::load(self)?.rainfall_probability(lat, lon)?;
        let percentages: Vec<f64> = FIT_PERCENTAGES
            .iter()
            .copied()
            .filter(|&p| p < p_rain && p <= RAIN_PERCENTAGE_RANGE.1)
            .collect();
        let (lat_q, lon_q) = (Unit::Degree.of(lat), Unit::Degree.of(lon));
        let (f_q, el_q, tau_q) = (Unit::GigaHertz.of(f), Unit::Degree.of(el), Unit::Degree.of(tau));
        let p_q = Unit::Percent.vec(percentages.clone());
        let link = LinkParameters::new(&lat_q, &lon_q, &f_q, &el_q, &p_q).with_polarization_tilt(&tau_q);
        let attenuation = self.rain_attenuation(&link)?;
        let attenuation: Vec<f64> = attenuation.iter().copied().collect();
        LognormalFit::fit(&percentages, &attenuation, p_rain)
    }

    /// Rain attenuation time series (dB) of `samples` values every `ts`
    /// seconds at one location.
    #[allow(clippy::too_many_arguments)]
    pub fn rain_attenuation_synthesis(
        &self,
        lat: f64,
        lon: f64,
        f: f64,
        el: f64,
        tau: f64,
        samples: usize,
        ts: f64,
        seed: u64,
    ) -> Result<Quantity> {
        let fit = self.rain_attenuation_lognormal_fit(lat, lon, f, el, tau)?;
        debug!(m = fit.m, sigma = fit.sigma, p_rain = fit.p_rain, samples, "synthesizing rain attenuation");
        Ok(Unit::Decibel.vec(synthesize(&fit, samples, ts, seed)?))
    }
}
