//! ITU-R atmospheric attenuation prediction.
//!
//! Every model is available as a method of [`Predictor`], which pins the Grid
//! Store, the recommendation editions and the evaluation policy. Inputs are
//! unit-tagged [`Quantity`] values that broadcast against each other; the
//! result takes the broadcast shape. The free functions below evaluate with
//! the process-wide configuration.

pub mod config;
pub mod datasets;
pub mod gas;
pub mod p1510;
pub mod p1511;
pub mod p1623;
pub mod p1814;
pub mod p1853;
pub mod p453;
pub mod p530;
pub mod p618;
pub mod p835;
pub mod p836;
pub mod p837;
pub mod p838;
pub mod p839;
pub mod p840;
pub mod p841;
pub mod predictor;
pub mod utils;
pub mod versions;

pub use config::{Config, FrequencyPolicy};
pub use datasets::required_maps;
pub use itur_core::{GridStore, ItuError, Quantity, Result, Unit};
pub use p618::{AttenuationBreakdown, Contributions, LinkParameters};
pub use predictor::Predictor;
pub use utils::{regular_lat_lon_grid, LatLonGrid};
pub use versions::Versions;

/// Total attenuation (dB) exceeded for `p` % of an average year on an
/// Earth-space link, combining gas, rain, cloud and scintillation.
///
/// Scintillation needs an antenna diameter; without one the call fails with
/// [`ItuError::MissingParameter`] rather than assuming a size.
pub fn total_attenuation(
    lat: &Quantity,
    lon: &Quantity,
    f: &Quantity,
    el: &Quantity,
    p: &Quantity,
    diameter: Option<&Quantity>,
) -> Result<Quantity> {
    let mut link = LinkParameters::new(lat, lon, f, el, p);
    link.diameter = diameter;
    Predictor::global().total_attenuation(&link, Contributions::ALL)
}

/// Gaseous attenuation (dB) exceeded for `p` % on an Earth-space path.
pub fn gaseous_attenuation(lat: &Quantity, lon: &Quantity, f: &Quantity, el: &Quantity, p: &Quantity) -> Result<Quantity> {
    Predictor::global().gaseous_attenuation(lat, lon, f, el, p, None)
}

/// Rain attenuation (dB) exceeded for `p` % on an Earth-space path, for
/// circular polarization.
pub fn rain_attenuation(lat: &Quantity, lon: &Quantity, f: &Quantity, el: &Quantity, p: &Quantity) -> Result<Quantity> {
    Predictor::global().rain_attenuation(&LinkParameters::new(lat, lon, f, el, p))
}

/// Cloud attenuation (dB) exceeded for `p` % on an Earth-space path.
pub fn cloud_attenuation(lat: &Quantity, lon: &Quantity, f: &Quantity, el: &Quantity, p: &Quantity) -> Result<Quantity> {
    Predictor::global().cloud_attenuation(lat, lon, el, f, p)
}

/// Scintillation fade depth (dB) exceeded for `p` % for an antenna of the
/// given diameter and an efficiency of 0.5.
pub fn scintillation_attenuation(
    lat: &Quantity,
    lon: &Quantity,
    f: &Quantity,
    el: &Quantity,
    p: &Quantity,
    diameter: &Quantity,
) -> Result<Quantity> {
    Predictor::global().scintillation_attenuation(&LinkParameters::new(lat, lon, f, el, p).with_diameter(diameter))
}
