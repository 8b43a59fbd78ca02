//! ITU-R P.841: conversion of annual statistics to worst-month statistics.

use itur_core::{check_range, Quantity, Result, Unit};

use crate::predictor::{arg, Predictor};

const PHENOMENON: &str = "P.841 worst month";

/// Global average parameters of the ratio Q = Q1 p^-β.
pub const Q1: f64 = 2.85;
pub const BETA: f64 = 0.13;

/// Percentage above which the ratio tapers off towards 1 at 30 %.
const P1: f64 = 12.0;

/// Ratio Q of the worst-month to the annual exceedance percentage at the
/// annual percentage `p`.
pub fn worst_month_ratio(p: f64, q1: f64, beta: f64) -> f64 {
    let q3 = q1 * 3f64.powf(-beta);
    if p < (q1 / 12.0).powf(1.0 / beta) {
        12.0
    } else if p < 3.0 {
        q1 * p.powf(-beta)
    } else if p < P1 {
        q3
    } else if p < 30.0 {
        q3 * (p / P1).powf(q3.ln() / (P1 / 30.0).ln())
    } else {
        1.0
    }
}

/// Worst-month exceedance percentage for an annual percentage `p`.
pub fn convert_annual_to_worst_month(p: f64) -> Result<f64> {
    let p = check_range(PHENOMENON, "p", p, f64::MIN_POSITIVE, 100.0)?;
    Ok((worst_month_ratio(p, Q1, BETA) * p).min(100.0))
}

/// Annual exceedance percentage whose worst-month value is `p_w`.
///
/// Q p grows monotonically with p, so the annual value is found by
/// bisection in ln p.
pub fn convert_worst_month_to_annual(p_w: f64) -> Result<f64> {
    let p_w = check_range(PHENOMENON, "p_w", p_w, f64::MIN_POSITIVE, 100.0)?;
    let (mut lo, mut hi) = ((p_w / 12.0).ln() - 1.0, 100f64.ln());
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let p = mid.exp();
        if worst_month_ratio(p, Q1, BETA) * p < p_w {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok((0.5 * (lo + hi)).exp())
}

impl Predictor {
    pub fn convert_annual_to_worst_month(&self, p: &Quantity) -> Result<Quantity> {
        self.evaluate(&[arg("p", p, Unit::Percent)], Unit::Percent, |r| {
            convert_annual_to_worst_month(r.get(0))
        })
    }

    pub fn convert_worst_month_to_annual(&self, p_w: &Quantity) -> Result<Quantity> {
        self.evaluate(&[arg("p_w", p_w, Unit::Percent)], Unit::Percent, |r| {
            convert_worst_month_to_annual(r.get(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_regions() {
        assert_eq!(worst_month_ratio(1e-6, Q1, BETA), 12.0);
        assert!((worst_month_ratio(1.0, Q1, BETA) - 2.85).abs() < 1e-12);
        assert_eq!(worst_month_ratio(50.0, Q1, BETA), 1.0);
        // continuous where the pieces meet
        for p in [3.0, P1, 30.0] {
            let below = worst_month_ratio(p - 1e-9, Q1, BETA);
            let above = worst_month_ratio(p + 1e-9, Q1, BETA);
            assert!((below - above).abs() < 1e-6, "jump at {}", p);
        }
    }

    #[test]
    fn test_annual_to_worst_month() {
        let pw = convert_annual_to_worst_month(0.01).unwrap();
        assert!((pw - 2.85 * 0.01f64.powf(0.87)).abs() < 1e-12);
        assert!(convert_annual_to_worst_month(0.0).is_err());
    }

    #[test]
    fn test_inverse() {
        for p in [0.001, 0.01, 0.3, 5.0, 20.0] {
            let pw = convert_annual_to_worst_month(p).unwrap();
            let back = convert_worst_month_to_annual(pw).unwrap();
            assert!(((back - p) / p).abs() < 1e-9, "{} -> {} -> {}", p, pw, back);
        }
    }
}
