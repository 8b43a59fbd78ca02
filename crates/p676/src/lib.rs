//! Attenuation by atmospheric gases, ITU-R P.676.
//!
//! Scalar model functions take frequencies in GHz, pressures in hPa,
//! temperatures in K, water vapour density in g/m³, angles in degrees and
//! lengths in km.

pub mod lines;
pub mod slant;
pub mod specific;

pub use lines::{lines_for, P676Version, SpectralLine, SpectralLineTable};
pub use slant::{
    equivalent_heights, slant_path_approx, slant_path_exact, terrestrial_path,
    zenith_water_vapour_attenuation, AtmosphereProfile, EquivalentHeights, PathAttenuation,
    SurfaceConditions, APPROXIMATE_FREQUENCY_RANGE,
};
pub use specific::{
    specific_attenuation, vapour_pressure, SpecificAttenuation, FREQUENCY_RANGE, PHENOMENON,
};
