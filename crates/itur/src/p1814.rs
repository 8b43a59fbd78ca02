//! ITU-R P.1814-1: prediction methods for terrestrial free-space optical
//! links.

use itur_core::{check_range, ItuError, Quantity, Result, Unit};

use crate::predictor::{arg, Predictor};

const PHENOMENON: &str = "P.1814 optical link";

/// Wavelengths (µm) the visibility model is stated for.
pub const WAVELENGTH_RANGE: (f64, f64) = (0.4, 1.55);

/// Power law (k, α) of the rain specific attenuation per drop size
/// distribution shape μ = -2..=2.
const RAIN_POWER_LAW: [(f64, f64); 5] = [
    (2.2838, 0.4050),
    (1.5921, 0.5506),
    (1.2924, 0.6436),
    (1.1394, 0.7057),
    (1.0505, 0.7497),
];

/// Multiple-scattering correction (p0, p1, p2, k0, k1, k2) per μ.
const MULTIPLE_SCATTERING: [[f64; 6]; 5] = [
    [0.010012, 0.025381, -0.001606, 0.250329, -0.035278, 0.008349],
    [0.014551, 0.010932, 0.001532, 0.279336, 0.023974, 0.004421],
    [0.015940, -0.001476, 0.008297, 0.117663, 0.029602, 0.002142],
    [0.023468, 0.002897, 0.008912, 0.090689, 0.034955, 0.004583],
    [-0.000316, 0.062233, -0.007835, 0.192092, -0.081869, 0.033669],
];

/// Link margin (dB): emitter power `p_e` and receiver sensitivity `s_r`
/// (dBm) less every loss (dB).
pub fn link_margin(p_e: f64, s_r: f64, a_geo: f64, a_atmo: f64, a_scintillation: f64, a_system: f64) -> f64 {
    p_e - s_r - a_geo - a_atmo - a_scintillation - a_system
}

/// Geometrical attenuation (dB) of a beam of divergence `divergence`
/// (mrad) over `distance` (km) into a circular aperture of `diameter` (m).
/// Zero when the aperture collects the whole beam.
pub fn geometrical_attenuation(diameter: f64, distance: f64, divergence: f64) -> Result<f64> {
    if !(diameter > 0.0) {
        return Err(ItuError::out_of_domain(PHENOMENON, "capture diameter", diameter, "(0, inf)"));
    }
    let capture = std::f64::consts::FRAC_PI_4 * diameter.powi(2);
    // km x mrad = m
    let beam = std::f64::consts::FRAC_PI_4 * (distance * divergence).powi(2);
    if capture >= beam {
        return Ok(0.0);
    }
    Ok(10.0 * (beam / capture).log10())
}

/// Extinction coefficient (dB/km): clear-air plus excess attenuation.
pub fn specific_atmospheric_attenuation(gamma_clear_air: f64, gamma_excess: f64) -> f64 {
    gamma_clear_air + gamma_excess
}

/// Specific attenuation (dB/km) by haze and fog for a visibility (km,
/// 2 % contrast threshold) at a wavelength (µm).
pub fn suspended_particles_attenuation(visibility: f64, wavelength: f64) -> Result<f64> {
    check_range(PHENOMENON, "wavelength", wavelength, WAVELENGTH_RANGE.0, WAVELENGTH_RANGE.1)?;
    check_range(PHENOMENON, "visibility", visibility, f64::MIN_POSITIVE, f64::INFINITY)?;
    let q = if visibility > 50.0 {
        1.6
    } else if visibility > 6.0 {
        1.3
    } else if visibility >= 1.0 {
        0.16 * visibility + 0.34
    } else if visibility >= 0.5 {
        visibility - 0.5
    } else {
        0.0
    };
    Ok(17.0 / visibility * (0.55 / wavelength).powf(q))
}

fn shape_index(mu: f64) -> Result<usize> {
    if mu.fract() != 0.0 || !(-2.0..=2.0).contains(&mu) {
        return Err(ItuError::out_of_domain(PHENOMENON, "DSD shape", mu, "integer in [-2, 2]"));
    }
    Ok((mu + 2.0) as usize)
}

/// Rain specific attenuation (dB/km) for rate `r` (mm/h) and drop size
/// distribution shape `mu`.
pub fn rain_specific_attenuation(r: f64, mu: f64) -> Result<f64> {
    let (k, alpha) = RAIN_POWER_LAW[shape_index(mu)?];
    check_range(PHENOMENON, "rain rate", r, 0.0, f64::INFINITY)?;
    Ok(k * r.powf(alpha))
}

/// Rain attenuation (dB) over `length` km, with the path reduction and the
/// multiple-scattering gain removed.
pub fn rain_path_attenuation(r: f64, mu: f64, length: f64) -> Result<f64> {
    let gamma = rain_specific_attenuation(r, mu)?;
    check_range(PHENOMENON, "path length", length, 0.0, f64::INFINITY)?;
    if r <= 0.0 {
        return Ok(0.0);
    }
    let reduction = 1.0 / (1.0 + length * (r - 6.2) / 2623.0);
    let [p0, p1, p2, k0, k1, k2] = MULTIPLE_SCATTERING[shape_index(mu)?];
    let ln_r = r.ln();
    let a_ms = p0 + p1 * ln_r + p2 * ln_r.powi(2);
    let b_ms = k0 + k1 * ln_r + k2 * ln_r.powi(2);
    let gain = a_ms * length.powf(b_ms);
    Ok((gamma * length * reduction - gain).max(0.0))
}

impl Predictor {
    pub fn optical_link_margin(
        &self,
        p_e: &Quantity,
        s_r: &Quantity,
        a_geo: &Quantity,
        a_atmo: &Quantity,
        a_scintillation: &Quantity,
        a_system: &Quantity,
    ) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("p_e", p_e, Unit::DecibelMilliwatt),
                arg("s_r", s_r, Unit::DecibelMilliwatt),
                arg("a_geo", a_geo, Unit::Decibel),
                arg("a_atmo", a_atmo, Unit::Decibel),
                arg("a_scintillation", a_scintillation, Unit::Decibel),
                arg("a_system", a_system, Unit::Decibel),
            ],
            Unit::Decibel,
            |r| Ok(link_margin(r.get(0), r.get(1), r.get(2), r.get(3), r.get(4), r.get(5))),
        )
    }

    pub fn geometrical_attenuation(&self, diameter: &Quantity, distance: &Quantity, divergence: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("diameter", diameter, Unit::Meter),
                arg("distance", distance, Unit::Kilometer),
                arg("divergence", divergence, Unit::Milliradian),
            ],
            Unit::Decibel,
            |r| geometrical_attenuation(r.get(0), r.get(1), r.get(2)),
        )
    }

    pub fn suspended_particles_attenuation(&self, visibility: &Quantity, wavelength: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("visibility", visibility, Unit::Kilometer),
                arg("wavelength", wavelength, Unit::Micrometer),
            ],
            Unit::DecibelPerKm,
            |r| suspended_particles_attenuation(r.get(0), r.get(1)),
        )
    }

    pub fn optical_rain_specific_attenuation(&self, rate: &Quantity, mu: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("rate", rate, Unit::MillimeterPerHour),
                arg("mu", mu, Unit::Dimensionless),
            ],
            Unit::DecibelPerKm,
            |r| rain_specific_attenuation(r.get(0), r.get(1)),
        )
    }

    pub fn optical_rain_path_attenuation(&self, rate: &Quantity, mu: &Quantity, length: &Quantity) -> Result<Quantity> {
        self.evaluate(
            &[
                arg("rate", rate, Unit::MillimeterPerHour),
                arg("mu", mu, Unit::Dimensionless),
                arg("length", length, Unit::Kilometer),
            ],
            Unit::Decibel,
            |r| rain_path_attenuation(r.get(0), r.get(1), r.get(2)),
        )
    }
}
