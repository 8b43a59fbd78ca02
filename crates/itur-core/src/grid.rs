//! Digitized geophysical maps on regular latitude/longitude grids.

use ndarray::Array2;

use crate::error::{check_range, ItuError, Result};
use crate::units::Unit;

const EPS: f64 = 1e-9;

/// A regular, strictly increasing grid axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub start: f64,
    pub step: f64,
    pub len: usize,
}

impl GridAxis {
    pub fn new(start: f64, step: f64, len: usize) -> Result<Self> {
        if !(step > 0.0) || len == 0 || !start.is_finite() {
            return Err(ItuError::out_of_domain(
                "grid",
                "axis step",
                step,
                "strictly increasing axis with at least one node",
            ));
        }
        Ok(Self { start, step, len })
    }

    /// Axis spanning `[start, end]` inclusive at `step` resolution.
    pub fn spanning(start: f64, end: f64, step: f64) -> Result<Self> {
        let len = ((end - start) / step).round() as usize + 1;
        Self::new(start, step, len)
    }

    pub fn end(&self) -> f64 {
        self.start + self.step * (self.len - 1) as f64
    }

    pub fn node(&self, i: usize) -> f64 {
        self.start + self.step * i as f64
    }

    /// Fractional index of `x` along the axis.
    fn position(&self, x: f64) -> f64 {
        (x - self.start) / self.step
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Bilinear,
    Bicubic,
    Nearest,
}

/// The four grid nodes surrounding a point, with bilinear weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    pub nodes: [(usize, usize); 4],
    pub weights: [f64; 4],
}

/// An immutable gridded field of one scalar quantity.
///
/// Row `i` holds latitude `lat.node(i)`, column `j` longitude `lon.node(j)`.
#[derive(Debug, Clone)]
pub struct GeophysicalMap {
    name: String,
    unit: Unit,
    lat: GridAxis,
    lon: GridAxis,
    values: Array2<f64>,
    // Longitude columns cover the full circle without a duplicated seam,
    // so the column after the last is column 0.
    periodic: bool,
}

impl GeophysicalMap {
    pub fn new(
        name: impl Into<String>,
        unit: Unit,
        lat: GridAxis,
        lon: GridAxis,
        values: Array2<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if values.dim() != (lat.len, lon.len) {
            return Err(ItuError::data_unavailable(
                name.as_str(),
                "",
                format!(
                    "grid has shape {:?} but axes describe ({}, {})",
                    values.dim(),
                    lat.len,
                    lon.len
                ),
            ));
        }
        let periodic = ((lon.len as f64) * lon.step - 360.0).abs() < EPS;
        Ok(Self {
            name,
            unit,
            lat,
            lon,
            values,
            periodic,
        })
    }

    /// A map holding the same value everywhere on a global grid.
    pub fn constant(name: impl Into<String>, unit: Unit, resolution: f64, value: f64) -> Result<Self> {
        let lat = GridAxis::spanning(-90.0, 90.0, resolution)?;
        let lon = GridAxis::spanning(-180.0, 180.0, resolution)?;
        let values = Array2::from_elem((lat.len, lon.len), value);
        Self::new(name, unit, lat, lon, values)
    }

    /// Build a global map by sampling `f(lat, lon)` at every node.
    pub fn from_fn(
        name: impl Into<String>,
        unit: Unit,
        lat: GridAxis,
        lon: GridAxis,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        let values = Array2::from_shape_fn((lat.len, lon.len), |(i, j)| f(lat.node(i), lon.node(j)));
        Self::new(name, unit, lat, lon, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn lat_axis(&self) -> GridAxis {
        self.lat
    }

    pub fn lon_axis(&self) -> GridAxis {
        self.lon
    }

    /// (latitude, longitude) resolution in degrees.
    pub fn resolution(&self) -> (f64, f64) {
        (self.lat.step, self.lon.step)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn node(&self, row: usize, col: usize) -> f64 {
        self.values[[row, col]]
    }

    /// Smallest and largest finite value stored.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    fn check_coordinates(&self, lat: f64, lon: f64) -> Result<()> {
        check_range("geophysical grid", "lat", lat, -90.0, 90.0)?;
        check_range("geophysical grid", "lon", lon, -180.0, 180.0)?;
        Ok(())
    }

    /// Longitude expressed in the grid's native range.
    fn native_lon(&self, lon: f64) -> f64 {
        if lon >= self.lon.start - EPS && lon <= self.lon.end() + EPS {
            return lon;
        }
        self.lon.start + (lon - self.lon.start).rem_euclid(360.0)
    }

    /// Integer row and fractional offset; rows clamp at the grid edges.
    fn row_bracket(&self, lat: f64) -> (usize, usize, f64) {
        let pos = self.lat.position(lat).clamp(0.0, (self.lat.len - 1) as f64);
        let i0 = pos.floor() as usize;
        let i1 = (i0 + 1).min(self.lat.len - 1);
        (i0, i1, pos - i0 as f64)
    }

    /// Integer column and fractional offset; wraps around for periodic grids.
    fn col_bracket(&self, lon: f64) -> (usize, usize, f64) {
        let last = (self.lon.len - 1) as f64;
        let mut pos = self.lon.position(self.native_lon(lon));
        if self.periodic {
            pos = pos.rem_euclid(self.lon.len as f64);
            let j0 = (pos.floor() as usize).min(self.lon.len - 1);
            let j1 = (j0 + 1) % self.lon.len;
            (j0, j1, pos - j0 as f64)
        } else {
            pos = pos.clamp(0.0, last);
            let j0 = pos.floor() as usize;
            let j1 = (j0 + 1).min(self.lon.len - 1);
            (j0, j1, pos - j0 as f64)
        }
    }

    pub fn stencil(&self, lat: f64, lon: f64) -> Result<Stencil> {
        self.check_coordinates(lat, lon)?;
        let (i0, i1, t) = self.row_bracket(lat);
        let (j0, j1, u) = self.col_bracket(lon);
        Ok(Stencil {
            nodes: [(i0, j0), (i0, j1), (i1, j0), (i1, j1)],
            weights: [
                (1.0 - t) * (1.0 - u),
                (1.0 - t) * u,
                t * (1.0 - u),
                t * u,
            ],
        })
    }

    /// Bilinear interpolation over the four surrounding nodes.
    pub fn bilinear(&self, lat: f64, lon: f64) -> Result<f64> {
        let s = self.stencil(lat, lon)?;
        Ok(self.apply(&s, |v| v))
    }

    /// Weighted sum of `f(node value)` over a stencil, skipping zero weights
    /// so that values at exact nodes are reproduced bit for bit.
    pub fn apply(&self, stencil: &Stencil, f: impl Fn(f64) -> f64) -> f64 {
        stencil
            .nodes
            .iter()
            .zip(stencil.weights)
            .filter(|(_, w)| *w != 0.0)
            .map(|(&(i, j), w)| w * f(self.values[[i, j]]))
            .sum()
    }

    pub fn nearest(&self, lat: f64, lon: f64) -> Result<f64> {
        self.check_coordinates(lat, lon)?;
        let (i0, i1, t) = self.row_bracket(lat);
        let (j0, j1, u) = self.col_bracket(lon);
        let i = if t < 0.5 { i0 } else { i1 };
        let j = if u < 0.5 { j0 } else { j1 };
        Ok(self.values[[i, j]])
    }

    /// Bicubic convolution (Keys kernel, a = -0.5) over the 4x4 surrounding
    /// nodes, as recommended by ITU-R P.1144 for topographic data.
    pub fn bicubic(&self, lat: f64, lon: f64) -> Result<f64> {
        self.check_coordinates(lat, lon)?;
        let (i0, _, t) = self.row_bracket(lat);
        let (j0, _, u) = self.col_bracket(lon);

        let row = |k: isize| -> usize {
            (i0 as isize + k).clamp(0, self.lat.len as isize - 1) as usize
        };
        let col = |k: isize| -> usize {
            let j = j0 as isize + k;
            if self.periodic {
                j.rem_euclid(self.lon.len as isize) as usize
            } else {
                j.clamp(0, self.lon.len as isize - 1) as usize
            }
        };

        let mut total = 0.0;
        for di in -1..=2isize {
            let wi = keys_kernel(t - di as f64);
            if wi == 0.0 {
                continue;
            }
            let mut acc = 0.0;
            for dj in -1..=2isize {
                let wj = keys_kernel(u - dj as f64);
                if wj == 0.0 {
                    continue;
                }
                acc += wj * self.values[[row(di), col(dj)]];
            }
            total += wi * acc;
        }
        Ok(total)
    }

    pub fn interpolate(&self, lat: f64, lon: f64, method: Interpolation) -> Result<f64> {
        match method {
            Interpolation::Bilinear => self.bilinear(lat, lon),
            Interpolation::Bicubic => self.bicubic(lat, lon),
            Interpolation::Nearest => self.nearest(lat, lon),
        }
    }
}

fn keys_kernel(x: f64) -> f64 {
    const A: f64 = -0.5;
    let x = x.abs();
    if x <= 1.0 {
        (A + 2.0) * x.powi(3) - (A + 3.0) * x.powi(2) + 1.0
    } else if x < 2.0 {
        A * x.powi(3) - 5.0 * A * x.powi(2) + 8.0 * A * x - 4.0 * A
    } else {
        0.0
    }
}

/// Three-dimensional map: 2-D layers indexed by a strictly increasing axis
/// (exceedance percentage or month).
#[derive(Debug, Clone)]
pub struct MapStack {
    name: String,
    axis: Vec<f64>,
    layers: Vec<std::sync::Arc<GeophysicalMap>>,
}

impl MapStack {
    pub fn new(
        name: impl Into<String>,
        axis: Vec<f64>,
        layers: Vec<std::sync::Arc<GeophysicalMap>>,
    ) -> Result<Self> {
        let name = name.into();
        if axis.is_empty() || axis.len() != layers.len() || axis.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ItuError::data_unavailable(
                name.as_str(),
                "",
                "layer axis must be strictly increasing with one layer per entry",
            ));
        }
        Ok(Self { name, axis, layers })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The layer at `index` along the axis.
    pub fn layer(&self, index: usize) -> Result<&GeophysicalMap> {
        self.layers.get(index).map(|m| m.as_ref()).ok_or_else(|| {
            ItuError::data_unavailable(
                self.name.as_str(),
                "",
                format!("no layer {} in a stack of {}", index, self.layers.len()),
            )
        })
    }

    /// Indices of the layers bracketing `p`; equal when `p` is tabulated.
    pub fn bracket(&self, phenomenon: &'static str, p: f64) -> Result<(usize, usize)> {
        let first = self.axis[0];
        let last = self.axis[self.axis.len() - 1];
        check_range(phenomenon, "p", p, first, last)?;
        if let Some(k) = self.axis.iter().position(|&a| (a - p).abs() < 1e-12) {
            return Ok((k, k));
        }
        let upper = self.axis.iter().position(|&a| a > p).unwrap_or(self.axis.len() - 1);
        Ok((upper - 1, upper))
    }

    /// Value at `p`, interpolating log-linearly in `p` between tabulated
    /// layers; `at` evaluates one layer at the point of interest.
    pub fn at_percentage(
        &self,
        phenomenon: &'static str,
        p: f64,
        at: impl Fn(&GeophysicalMap) -> Result<f64>,
    ) -> Result<f64> {
        let (lo, hi) = self.bracket(phenomenon, p)?;
        let v_lo = at(&self.layers[lo])?;
        if lo == hi {
            return Ok(v_lo);
        }
        let v_hi = at(&self.layers[hi])?;
        Ok(log_interpolate(p, self.axis[lo], self.axis[hi], v_lo, v_hi))
    }
}

/// Interpolate linearly in `ln p` between `(p_lo, v_lo)` and `(p_hi, v_hi)`.
pub fn log_interpolate(p: f64, p_lo: f64, p_hi: f64, v_lo: f64, v_hi: f64) -> f64 {
    v_lo + (v_hi - v_lo) * (p.ln() - p_lo.ln()) / (p_hi.ln() - p_lo.ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ramp() -> GeophysicalMap {
        // 1 degree global grid with a seam column at +180
        let lat = GridAxis::spanning(-90.0, 90.0, 1.0).unwrap();
        let lon = GridAxis::spanning(-180.0, 180.0, 1.0).unwrap();
        GeophysicalMap::from_fn("ramp", Unit::Kelvin, lat, lon, |la, lo| 2.0 * la + 0.5 * lo).unwrap()
    }

    #[test]
    fn test_node_values_are_exact() {
        let map = ramp();
        for &(la, lo) in &[(0.0, 0.0), (45.0, -120.0), (-90.0, 180.0), (90.0, -180.0), (12.0, 33.0)] {
            let expected = 2.0 * la + 0.5 * lo;
            assert_eq!(map.bilinear(la, lo).unwrap(), expected);
            assert_eq!(map.bicubic(la, lo).unwrap(), expected);
            assert_eq!(map.nearest(la, lo).unwrap(), expected);
        }
    }

    #[test]
    fn test_bilinear_reproduces_linear_field() {
        let map = ramp();
        let v = map.bilinear(10.25, 20.75).unwrap();
        assert!((v - (2.0 * 10.25 + 0.5 * 20.75)).abs() < 1e-9);
    }

    #[test]
    fn test_periodic_grid_wraps_at_dateline() {
        // 0..359 degrees, no seam column
        let lat = GridAxis::spanning(-90.0, 90.0, 1.0).unwrap();
        let lon = GridAxis::new(0.0, 1.0, 360).unwrap();
        let map = GeophysicalMap::from_fn("wrap", Unit::Dimensionless, lat, lon, |_, lo| {
            if lo == 0.0 {
                10.0
            } else if lo == 359.0 {
                20.0
            } else {
                0.0
            }
        })
        .unwrap();

        // -0.5 maps to 359.5, halfway between column 359 and column 0
        let v = map.bilinear(0.0, -0.5).unwrap();
        assert!((v - 15.0).abs() < 1e-12);
        assert_eq!(map.bilinear(0.0, -180.0).unwrap(), map.bilinear(0.0, 180.0).unwrap());
    }

    #[test]
    fn test_poles_clamp_to_edge_rows() {
        // grid stops short of the poles
        let lat = GridAxis::spanning(-88.0, 88.0, 2.0).unwrap();
        let lon = GridAxis::spanning(-180.0, 180.0, 2.0).unwrap();
        let map = GeophysicalMap::from_fn("edge", Unit::Kelvin, lat, lon, |la, _| la).unwrap();
        assert_eq!(map.bilinear(90.0, 0.0).unwrap(), 88.0);
        assert_eq!(map.bilinear(-90.0, 0.0).unwrap(), -88.0);
        assert_eq!(map.bicubic(89.5, 10.0).unwrap(), 88.0);
    }

    #[test]
    fn test_out_of_range_coordinates_fail() {
        let map = ramp();
        assert!(map.bilinear(95.0, 0.0).unwrap_err().is_out_of_domain());
        assert!(map.bilinear(0.0, 181.0).unwrap_err().is_out_of_domain());
        assert!(map.bilinear(f64::NAN, 0.0).unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let lat = GridAxis::new(-90.0, 90.0, 3).unwrap();
        let lon = GridAxis::new(-180.0, 180.0, 3).unwrap();
        let err = GeophysicalMap::new("bad", Unit::Kelvin, lat, lon, Array2::zeros((2, 3))).unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_axis_must_increase() {
        assert!(GridAxis::new(90.0, -1.0, 181).is_err());
        assert!(GridAxis::new(0.0, 0.0, 10).is_err());
    }

    #[test]
    fn test_stack_log_interpolation() {
        let mk = |v: f64| Arc::new(GeophysicalMap::constant("c", Unit::Kelvin, 10.0, v).unwrap());
        let stack = MapStack::new("stack", vec![0.1, 1.0, 10.0], vec![mk(30.0), mk(20.0), mk(10.0)]).unwrap();

        let at = |m: &GeophysicalMap| m.bilinear(0.0, 0.0);
        assert_eq!(stack.at_percentage("test", 1.0, at).unwrap(), 20.0);
        let v = stack.at_percentage("test", 10f64.sqrt(), at).unwrap();
        assert!((v - 15.0).abs() < 1e-9);
        assert!(stack.at_percentage("test", 20.0, at).unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_stack_layer_index_is_checked() {
        let mk = |v: f64| Arc::new(GeophysicalMap::constant("c", Unit::Kelvin, 10.0, v).unwrap());
        let stack = MapStack::new("stack", vec![1.0, 2.0], vec![mk(1.0), mk(2.0)]).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.layer(1).unwrap().node(0, 0), 2.0);
        assert!(stack.layer(2).unwrap_err().is_data_unavailable());
    }

    #[test]
    fn test_stack_requires_increasing_axis() {
        let m = Arc::new(GeophysicalMap::constant("c", Unit::Kelvin, 10.0, 1.0).unwrap());
        assert!(MapStack::new("s", vec![1.0, 0.5], vec![m.clone(), m]).is_err());
    }
}
