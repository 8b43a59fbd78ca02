//! ITU-R P.838-3: specific attenuation model for rain, γ_R = k R^α.

use itur_core::{check_range, Quantity, Result, Unit};

use crate::predictor::{arg, Predictor};

const PHENOMENON: &str = "P.838 rain specific attenuation";

pub const FREQUENCY_RANGE: (f64, f64) = (1.0, 1000.0);

/// Gaussian terms (a_j, b_j, c_j) plus the linear terms m and c of one
/// coefficient fit in log10 f (Table 1 to 4).
struct Fit {
    a: &'static [f64],
    b: &'static [f64],
    c: &'static [f64],
    m: f64,
    c0: f64,
}

impl Fit {
    fn eval(&self, log_f: f64) -> f64 {
        let sum: f64 = self
            .a
            .iter()
            .zip(self.b)
            .zip(self.c)
            .map(|((a, b), c)| a * (-((log_f - b) / c).powi(2)).exp())
            .sum();
        sum + self.m * log_f + self.c0
    }
}

const K_H: Fit = Fit {
    a: &[-5.33980, -0.35351, -0.23789, -0.94158],
    b: &[-0.10008, 1.26970, 0.86036, 0.64552],
    c: &[1.13098, 0.45400, 0.15354, 0.16817],
    m: -0.18961,
    c0: 0.71147,
};

const K_V: Fit = Fit {
    a: &[-3.80595, -3.44965, -0.39902, 0.50167],
    b: &[0.56934, -0.22911, 0.73042, 1.07319],
    c: &[0.81061, 0.51059, 0.11899, 0.27195],
    m: -0.16398,
    c0: 0.63297,
};

const ALPHA_H: Fit = Fit {
    a: &[-0.14318, 0.29591, 0.32177, -5.37610, 16.1721],
    b: &[1.82442, 0.77564, 0.63773, -0.96230, -3.29980],
    c: &[-0.55187, 0.19822, 0.13164, 1.47828, 3.43990],
    m: 0.67849,
    c0: -1.95537,
};

const ALPHA_V: Fit = Fit {
    a: &[-0.07771, 0.56727, -0.20238, -48.2991, 48.5833],
    b: &[2.33840, 0.95545, 1.14520, 0.791669, 0.791459],
    c: &[-0.76284, 0.54039, 0.26809, 0.116226, 0.116479],
    m: -0.053739,
    c0: 0.83433,
};

/// Regression coefficients k and α for a path at elevation `el` (deg)
/// with polarization tilt `tau` (deg, 0 horizontal, 90 vertical, 45
/// circular).
pub fn rain_coefficients(f: f64, el: f64, tau: f64) -> Result<(f64, f64)> {
    check_range(PHENOMENON, "frequency", f, FREQUENCY_RANGE.0, FREQUENCY_RANGE.1)?;
    let log_f = f.log10();
    let kh = 10f64.powf(K_H.eval(log_f));
    let kv = 10f64.powf(K_V.eval(log_f));
    let ah = ALPHA_H.eval(log_f);
    let av = ALPHA_V.eval(log_f);

    let geometry = el.to_radians().cos().powi(2) * (2.0 * tau.to_radians()).cos();
    let k = (kh + kv + (kh - kv) * geometry) / 2.0;
    let alpha = (kh * ah + kv * av + (kh * ah - kv * av) * geometry) / (2.0 * k);
    Ok((k, alpha))
}

/// Specific attenuation (dB/km) for rain rate `r` (mm/h).
pub fn rain_specific_attenuation(r: f64, f: f64, el: f64, tau: f64) -> Result<f64> {
    check_range(PHENOMENON, "rain rate", r, 0.0, f64::INFINITY)?;
    let (k, alpha) = rain_coefficients(f, el, tau)?;
    Ok(k * r.powf(alpha))
}

impl Predictor {
    /// Coefficients k (dimensionless) and α (dimensionless), broadcast.
    pub fn rain_coefficients(&self, f: &Quantity, el: &Quantity, tau: &Quantity) -> Result<[Quantity; 2]> {
        self.evaluate_n(
            &[
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("tau", tau, Unit::Degree),
            ],
            [Unit::Dimensionless, Unit::Dimensionless],
            |r| {
                let (k, alpha) = rain_coefficients(r.get(0), r.get(1), r.get(2))?;
                Ok([k, alpha])
            },
        )
    }

    pub fn rain_specific_attenuation(
        &self,
        rate: &Quantity,
        f: &Quantity,
        el: &Quantity,
        tau: &Quantity,
    ) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("rate", rate, Unit::MillimeterPerHour),
                arg("f", f, Unit::GigaHertz),
                arg("el", el, Unit::Degree),
                arg("tau", tau, Unit::Degree),
            ],
            Unit::DecibelPerKm,
            |r| rain_specific_attenuation(r.get(0), r.get(1), r.get(2), r.get(3)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        ((a - b) / b).abs() < rel
    }

    #[test]
    fn test_horizontal_and_vertical_tables() {
        // (f, kH, αH, kV, αV) from the recommendation's tabulated values
        let table = [
            (10.0, 0.01217, 1.2571, 0.01129, 1.2156),
            (20.0, 0.09164, 1.0568, 0.09611, 0.9847),
            (30.0, 0.2403, 0.9485, 0.2291, 0.9129),
        ];
        for (f, kh, ah, kv, av) in table {
            let (k, a) = rain_coefficients(f, 0.0, 0.0).unwrap();
            assert!(close(k, kh, 1e-3) && close(a, ah, 1e-3), "H at {} GHz: {} {}", f, k, a);
            let (k, a) = rain_coefficients(f, 0.0, 90.0).unwrap();
            assert!(close(k, kv, 1e-3) && close(a, av, 1e-3), "V at {} GHz: {} {}", f, k, a);
        }
    }

    #[test]
    fn test_specific_attenuation_reference() {
        // k R^α with the tabulated coefficients
        let cases = [
            (10.0, 0.0, 10.0, 0.2200),
            (10.0, 0.0, 50.0, 1.6637),
            (20.0, 0.0, 50.0, 5.7221),
            (20.0, 90.0, 50.0, 4.5263),
            (30.0, 0.0, 10.0, 2.1343),
            (30.0, 0.0, 50.0, 9.8226),
        ];
        for (f, tau, r, expected) in cases {
            let g = rain_specific_attenuation(r, f, 0.0, tau).unwrap();
            assert!(close(g, expected, 1e-2), "gamma_R({} GHz, {} mm/h) = {}", f, r, g);
        }
    }

    #[test]
    fn test_circular_polarization_averages() {
        let (kh, _) = rain_coefficients(20.0, 0.0, 0.0).unwrap();
        let (kv, _) = rain_coefficients(20.0, 0.0, 90.0).unwrap();
        let (kc, _) = rain_coefficients(20.0, 30.0, 45.0).unwrap();
        assert!((kc - (kh + kv) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rain_no_attenuation() {
        assert_eq!(rain_specific_attenuation(0.0, 20.0, 30.0, 45.0).unwrap(), 0.0);
        assert!(rain_specific_attenuation(-1.0, 20.0, 30.0, 45.0).is_err());
        assert!(rain_coefficients(0.5, 30.0, 45.0).unwrap_err().is_out_of_domain());
    }
}
