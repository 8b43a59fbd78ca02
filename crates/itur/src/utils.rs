//! Helpers for batch evaluation.

use itur_core::{ItuError, Quantity, Result, Unit};
use ndarray::Array2;

/// A regular latitude/longitude mesh. Latitude runs north to south down the
/// rows, longitude west to east along the columns; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonGrid {
    pub resolution_lat: f64,
    pub resolution_lon: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for LatLonGrid {
    fn default() -> Self {
        Self {
            resolution_lat: 1.0,
            resolution_lon: 1.0,
            lat_min: -90.0,
            lat_max: 90.0,
            lon_min: -180.0,
            lon_max: 180.0,
        }
    }
}

impl LatLonGrid {
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution_lat: resolution,
            resolution_lon: resolution,
            ..Self::default()
        }
    }

    pub fn with_resolution(mut self, lat: f64, lon: f64) -> Self {
        self.resolution_lat = lat;
        self.resolution_lon = lon;
        self
    }

    pub fn with_bounds(mut self, lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        self.lat_min = lat_min;
        self.lat_max = lat_max;
        self.lon_min = lon_min;
        self.lon_max = lon_max;
        self
    }

    fn axis(name: &'static str, min: f64, max: f64, step: f64) -> Result<Vec<f64>> {
        if !(step > 0.0) || !(max >= min) {
            return Err(ItuError::out_of_domain("lat/lon grid", name, step, "positive step over a non-empty range"));
        }
        let n = ((max - min) / step + 1e-9).floor() as usize + 1;
        Ok((0..n).map(|i| min + step * i as f64).collect())
    }

    /// The mesh as two arrays of shape (n_lat, n_lon).
    pub fn build(&self) -> Result<(Quantity, Quantity)> {
        let mut lats = Self::axis("lat resolution", self.lat_min, self.lat_max, self.resolution_lat)?;
        lats.reverse();
        let lons = Self::axis("lon resolution", self.lon_min, self.lon_max, self.resolution_lon)?;
        let shape = (lats.len(), lons.len());
        let lat = Array2::from_shape_fn(shape, |(i, _)| lats[i]);
        let lon = Array2::from_shape_fn(shape, |(_, j)| lons[j]);
        Ok((Unit::Degree.array(lat), Unit::Degree.array(lon)))
    }
}

/// A global mesh at `resolution` degrees.
pub fn regular_lat_lon_grid(resolution: f64) -> Result<(Quantity, Quantity)> {
    LatLonGrid::new(resolution).build()
}
