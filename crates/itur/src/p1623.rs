//! ITU-R P.1623: fade slope statistics on Earth-space paths.

use std::f64::consts::PI;

use itur_core::{check_range, Quantity, Result, Unit};

use crate::predictor::{arg, Predictor};

const PHENOMENON: &str = "P.1623 fade slope";

/// Shape parameter of the low-pass response of the fade slope filter.
const B: f64 = 2.3;

/// Climate parameter s for a global average.
pub const DEFAULT_CLIMATE: f64 = 0.01;
/// 3 dB cut-off frequency (Hz) of the scintillation low-pass filter.
pub const DEFAULT_CUTOFF: f64 = 0.02;

/// Parameters of the fade slope distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSlope {
    /// Attenuation (dB) the slope is conditioned on.
    pub attenuation: f64,
    /// Time interval (s) the slope is computed over.
    pub interval: f64,
    /// Low-pass cut-off frequency (Hz).
    pub cutoff: f64,
    /// Climate parameter s.
    pub climate: f64,
}

impl FadeSlope {
    pub fn new(attenuation: f64, interval: f64) -> Self {
        Self {
            attenuation,
            interval,
            cutoff: DEFAULT_CUTOFF,
            climate: DEFAULT_CLIMATE,
        }
    }

    fn check(&self) -> Result<()> {
        check_range(PHENOMENON, "attenuation", self.attenuation, 0.0, f64::INFINITY)?;
        check_range(PHENOMENON, "interval", self.interval, f64::MIN_POSITIVE, f64::INFINITY)?;
        check_range(PHENOMENON, "cutoff", self.cutoff, f64::MIN_POSITIVE, f64::INFINITY)?;
        Ok(())
    }

    /// Filter factor F(f_B, Δt).
    fn filter(&self) -> f64 {
        (2.0 * PI * PI).sqrt() / ((1.0 / self.cutoff).powf(B) + (2.0 * self.interval).powf(B)).powf(1.0 / B)
    }

    /// Standard deviation (dB/s) of the conditional fade slope.
    pub fn sigma(&self) -> Result<f64> {
        self.check()?;
        Ok(self.climate * self.filter() * self.attenuation)
    }

    /// Conditional probability density (s/dB) of fade slope `zeta` (dB/s).
    pub fn pdf(&self, zeta: f64) -> Result<f64> {
        let sigma = self.sigma()?;
        if sigma == 0.0 {
            return Ok(0.0);
        }
        Ok(2.0 / (PI * sigma * (1.0 + (zeta / sigma).powi(2)).powi(2)))
    }

    /// Conditional probability that the fade slope exceeds `zeta` (dB/s).
    pub fn exceedance(&self, zeta: f64) -> Result<f64> {
        let sigma = self.sigma()?;
        if sigma == 0.0 {
            return Ok(if zeta < 0.0 { 1.0 } else { 0.0 });
        }
        let x = zeta / sigma;
        Ok(0.5 - (x / (1.0 + x * x) + x.atan()) / PI)
    }

    /// Conditional probability that the absolute fade slope exceeds
    /// `zeta` (dB/s).
    pub fn absolute_exceedance(&self, zeta: f64) -> Result<f64> {
        check_range(PHENOMENON, "fade slope", zeta, 0.0, f64::INFINITY)?;
        Ok(2.0 * self.exceedance(zeta)?)
    }
}

impl Predictor {
    /// Standard deviation (dB/s) of the fade slope at attenuation `a` over
    /// interval `dt`, with the global average climate and cut-off.
    pub fn fade_slope_sigma(&self, a: &Quantity, dt: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[arg("a", a, Unit::Decibel), arg("dt", dt, Unit::Second)],
            Unit::Dimensionless,
            |r| FadeSlope::new(r.get(0), r.get(1)).sigma(),
        )
    }

    /// Probability (%) the fade slope exceeds `zeta` (dB/s) given the
    /// attenuation `a`. With `absolute`, the probability for |ζ|.
    pub fn fade_slope_exceedance(&self, zeta: &Quantity, a: &Quantity, dt: &Quantity, absolute: bool) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("zeta", zeta, Unit::Dimensionless),
                arg("a", a, Unit::Decibel),
                arg("dt", dt, Unit::Second),
            ],
            Unit::Percent,
            |r| {
                let slope = FadeSlope::new(r.get(1), r.get(2));
                let p = match absolute {
                    true => slope.absolute_exceedance(r.get(0))?,
                    false => slope.exceedance(r.get(0))?,
                };
                Ok(100.0 * p)
            },
        )
    }

    /// Conditional probability density of the fade slope.
    pub fn fade_slope_pdf(&self, zeta: &Quantity, a: &Quantity, dt: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("zeta", zeta, Unit::Dimensionless),
                arg("a", a, Unit::Decibel),
                arg("dt", dt, Unit::Second),
            ],
            Unit::Dimensionless,
            |r| FadeSlope::new(r.get(1), r.get(2)).pdf(r.get(0)),
        )
    }
}
