//! ITU-R P.837: characteristics of precipitation for propagation modelling.
//!
//! Edition 6 derives the rainfall rate from the Pr6, Mt and beta maps.
//! Edition 7 reads R0.01 directly and derives other percentages from monthly
//! mean rainfall and monthly mean surface temperature.

use std::sync::Arc;

use itur_core::{check_range, GeophysicalMap, MapSpec, MapStack, Quantity, Result, StackSpec, Unit};
use lazy_static::lazy_static;
use statrs::function::erf::erfc;

use crate::datasets::map_spec;
use crate::p1510;
use crate::predictor::{arg, Predictor};
use crate::versions::P837Version;

const PHENOMENON: &str = "P.837 rainfall rate";

/// Percentage range the rainfall rate is defined for.
pub const PERCENTAGE_RANGE: (f64, f64) = (0.001, 10.0);

const DAYS_IN_MONTH: [f64; 12] = [31.0, 28.25, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0];

lazy_static! {
    static ref V6_PR6: MapSpec = map_spec("837", "v6_pr6", Unit::Percent, 1.125, (0.0, 100.0));
    static ref V6_MT: MapSpec = map_spec("837", "v6_mt", Unit::Millimeter, 1.125, (0.0, 15000.0));
    static ref V6_BETA: MapSpec = map_spec("837", "v6_beta", Unit::Dimensionless, 1.125, (0.0, 1.0));
    static ref V7_R001: MapSpec = map_spec("837", "v7_r001", Unit::MillimeterPerHour, 0.125, (0.0, 400.0));
    static ref V7_MT: StackSpec = StackSpec::monthly(
        &map_spec("837", "v7_mt", Unit::Millimeter, 0.25, (0.0, 3000.0)),
        "v7_mt"
    );
}

pub fn datasets(version: P837Version) -> Vec<MapSpec> {
    match version {
        P837Version::V6 => vec![V6_PR6.clone(), V6_MT.clone(), V6_BETA.clone()],
        P837Version::V7 => {
            let mut maps = vec![V7_R001.clone()];
            maps.extend(V7_MT.layers.iter().cloned());
            maps
        }
    }
}

/// The maps one edition reads, resolved once per vectorized call.
pub(crate) enum RainMaps {
    V6 {
        pr6: Arc<GeophysicalMap>,
        mt: Arc<GeophysicalMap>,
        beta: Arc<GeophysicalMap>,
    },
    V7 {
        r001: Arc<GeophysicalMap>,
        mt: MapStack,
        t: MapStack,
    },
}

impl RainMaps {
    pub(crate) fn load(pred: &Predictor) -> Result<Self> {
        let store = pred.store();
        Ok(match pred.versions().p837 {
            P837Version::V6 => Self::V6 {
                pr6: store.map(&V6_PR6)?,
                mt: store.map(&V6_MT)?,
                beta: store.map(&V6_BETA)?,
            },
            P837Version::V7 => Self::V7 {
                r001: store.map(&V7_R001)?,
                mt: store.stack(&V7_MT)?,
                t: p1510::monthly_maps(pred)?,
            },
        })
    }

    /// Rainfall rate (mm/h) exceeded for `p` % of an average year.
    pub(crate) fn rainfall_rate(&self, lat: f64, lon: f64, p: f64) -> Result<f64> {
        check_range(PHENOMENON, "p", p, PERCENTAGE_RANGE.0, PERCENTAGE_RANGE.1)?;
        match self {
            Self::V6 { pr6, mt, beta } => {
                let pr6 = pr6.bilinear(lat, lon)?;
                let mt = mt.bilinear(lat, lon)?;
                let beta = beta.bilinear(lat, lon)?;
                Ok(salonen_baptista(p, pr6, mt, beta))
            }
            Self::V7 { r001, .. } if (p - 0.01).abs() < 1e-12 => r001.bilinear(lat, lon),
            Self::V7 { mt, t, .. } => Ok(MonthlyRain::at(mt, t, lat, lon)?.rate_exceeded(p)),
        }
    }

    /// Probability (%) of rain in an average year.
    pub(crate) fn rainfall_probability(&self, lat: f64, lon: f64) -> Result<f64> {
        match self {
            Self::V6 { pr6, mt, beta } => {
                let pr6 = pr6.bilinear(lat, lon)?;
                let ms = (1.0 - beta.bilinear(lat, lon)?) * mt.bilinear(lat, lon)?;
                Ok(if pr6 > 0.0 {
                    pr6 * (1.0 - (-0.0079 * ms / pr6).exp())
                } else {
                    0.0
                })
            }
            Self::V7 { mt, t, .. } => Ok(MonthlyRain::at(mt, t, lat, lon)?.p0_annual()),
        }
    }

    /// Percentage of time (%) the rainfall rate `r` (mm/h) is exceeded.
    pub(crate) fn exceedance_of_rate(&self, lat: f64, lon: f64, r: f64) -> Result<f64> {
        check_range(PHENOMENON, "rainfall rate", r, 0.0, f64::INFINITY)?;
        match self {
            Self::V6 { pr6, mt, beta } => {
                let pr6 = pr6.bilinear(lat, lon)?;
                let mt = mt.bilinear(lat, lon)?;
                let beta = beta.bilinear(lat, lon)?;
                Ok(salonen_baptista_exceedance(r, pr6, mt, beta))
            }
            Self::V7 { mt, t, .. } => Ok(MonthlyRain::at(mt, t, lat, lon)?.exceedance(r)),
        }
    }
}

/// P.837-6 Annex 1: rate from the probability of rain and the convective
/// and stratiform rainfall amounts.
fn salonen_baptista(p: f64, pr6: f64, mt: f64, beta: f64) -> f64 {
    if pr6 <= 0.0 {
        return 0.0;
    }
    let ms = (1.0 - beta) * mt;
    let p0 = pr6 * (1.0 - (-0.0079 * ms / pr6).exp());
    if p > p0 || p0 <= 0.0 {
        return 0.0;
    }
    let a = 1.09;
    let b = mt / (21797.0 * p0);
    let c = 26.02 * b;

    let big_a = a * b;
    let big_b = a + c * (p / p0).ln();
    let big_c = (p / p0).ln();
    let r = (-big_b + (big_b.powi(2) - 4.0 * big_a * big_c).sqrt()) / (2.0 * big_a);
    r.max(0.0)
}

/// Inverse of [`salonen_baptista`]: p = P0 exp(-a R (1 + b R) / (1 + c R)).
fn salonen_baptista_exceedance(r: f64, pr6: f64, mt: f64, beta: f64) -> f64 {
    if pr6 <= 0.0 {
        return 0.0;
    }
    let ms = (1.0 - beta) * mt;
    let p0 = pr6 * (1.0 - (-0.0079 * ms / pr6).exp());
    if p0 <= 0.0 {
        return 0.0;
    }
    let a = 1.09;
    let b = mt / (21797.0 * p0);
    let c = 26.02 * b;
    p0 * (-a * r * (1.0 + b * r) / (1.0 + c * r)).exp()
}

fn q(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// P.837-7 Annex 1 monthly parameters at one location.
struct MonthlyRain {
    // (days, P0 %, r mm/h) per month
    months: [(f64, f64, f64); 12],
}

impl MonthlyRain {
    fn at(mt: &MapStack, t: &MapStack, lat: f64, lon: f64) -> Result<Self> {
        let mut months = [(0.0, 0.0); 12];
        for (i, month) in months.iter_mut().enumerate() {
            *month = (mt.layer(i)?.bilinear(lat, lon)?, t.layer(i)?.bilinear(lat, lon)?);
        }
        Ok(Self::new(&months))
    }

    /// `months` holds (mean total rainfall mm, mean surface temperature K).
    fn new(months: &[(f64, f64); 12]) -> Self {
        let mut out = [(0.0, 0.0, 0.0); 12];
        for (i, &(mt, t)) in months.iter().enumerate() {
            let n = DAYS_IN_MONTH[i];
            let tc = t - 273.15;
            let mut r = if tc >= 0.0 { 0.5874 * (0.0883 * tc).exp() } else { 0.5874 };
            let mut p0 = 100.0 * mt / (24.0 * n * r);
            if p0 > 70.0 {
                p0 = 70.0;
                r = 100.0 * mt / (70.0 * 24.0 * n);
            }
            out[i] = (n, p0, r);
        }
        Self { months: out }
    }

    fn p0_annual(&self) -> f64 {
        self.months.iter().map(|&(n, p0, _)| n * p0).sum::<f64>() / 365.25
    }

    fn exceedance(&self, rate: f64) -> f64 {
        if rate <= 0.0 {
            return self.p0_annual();
        }
        self.months
            .iter()
            .filter(|&&(_, p0, r)| p0 > 0.0 && r > 0.0)
            .map(|&(n, p0, r)| n * p0 * q((rate.ln() + 0.7938 - r.ln()) / 1.26))
            .sum::<f64>()
            / 365.25
    }

    /// Rate exceeded for `p` %: bisection on ln R of the decreasing
    /// exceedance curve.
    fn rate_exceeded(&self, p: f64) -> f64 {
        if p >= self.p0_annual() {
            return 0.0;
        }
        let (mut lo, mut hi) = (-10.0_f64, 8.0_f64);
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            if self.exceedance(mid.exp()) > p {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (0.5 * (lo + hi)).exp()
    }
}

impl Predictor {
    /// Rainfall rate (mm/h) exceeded for `p` % of an average year.
    pub fn rainfall_rate(&self, lat: &Quantity, lon: &Quantity, p: &Quantity) -> Result<Quantity> {
        let maps = RainMaps::load(self)?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("p", p, Unit::Percent),
            ],
            Unit::MillimeterPerHour,
            |r| maps.rainfall_rate(r.get(0), r.get(1), r.get(2)),
        )
    }

    /// Probability of rain (%) in an average year.
    pub fn rainfall_probability(&self, lat: &Quantity, lon: &Quantity) -> Result<Quantity> {
        let maps = RainMaps::load(self)?;
        self.evaluate(
            &[arg("lat", lat, Unit::Degree), arg("lon", lon, Unit::Degree)],
            Unit::Percent,
            |r| maps.rainfall_probability(r.get(0), r.get(1)),
        )
    }

    /// Percentage of an average year a rainfall rate is exceeded.
    pub fn unavailability_from_rainfall_rate(&self, lat: &Quantity, lon: &Quantity, rate: &Quantity) -> Result<Quantity> {
        let maps = RainMaps::load(self)?;
        self.evaluate(
            &[
                arg("lat", lat, Unit::Degree),
                arg("lon", lon, Unit::Degree),
                arg("rate", rate, Unit::MillimeterPerHour),
            ],
            Unit::Percent,
            |r| maps.exceedance_of_rate(r.get(0), r.get(1), r.get(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salonen_baptista_is_decreasing_in_p() {
        let rates: Vec<f64> = [0.001, 0.01, 0.1, 1.0]
            .iter()
            .map(|&p| salonen_baptista(p, 5.0, 800.0, 0.5))
            .collect();
        assert!(rates.windows(2).all(|w| w[0] > w[1]), "{:?}", rates);
        assert!(rates[1] > 10.0 && rates[1] < 150.0, "R0.01 = {}", rates[1]);
    }

    #[test]
    fn test_salonen_baptista_inverse() {
        let r = salonen_baptista(0.1, 5.0, 800.0, 0.5);
        let p = salonen_baptista_exceedance(r, 5.0, 800.0, 0.5);
        assert!((p - 0.1).abs() < 1e-9, "p = {}", p);
    }

    #[test]
    fn test_salonen_baptista_dry_location() {
        assert_eq!(salonen_baptista(0.01, 0.0, 800.0, 0.5), 0.0);
        // more rain time asked for than it rains
        assert_eq!(salonen_baptista(9.0, 5.0, 800.0, 0.5), 0.0);
    }

    fn temperate() -> MonthlyRain {
        MonthlyRain::new(&[(70.0, 278.0); 12])
    }

    #[test]
    fn test_monthly_method_round_trip() {
        let rain = temperate();
        let r = rain.rate_exceeded(0.1);
        assert!(r > 0.0);
        assert!((rain.exceedance(r) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_monthly_method_zero_beyond_p0() {
        let rain = temperate();
        let p0 = rain.p0_annual();
        assert!(p0 > 0.0 && p0 < 70.0);
        assert_eq!(rain.rate_exceeded(p0 + 0.5), 0.0);
        assert!((rain.exceedance(0.0) - p0).abs() < 1e-12);
    }

    #[test]
    fn test_monthly_p0_is_capped() {
        // a monsoon month saturates at 70 %
        let rain = MonthlyRain::new(&[(5000.0, 300.0); 12]);
        assert!((rain.p0_annual() - 70.0).abs() < 1e-9);
    }
}
