//! Shape unification at the public boundary.
//!
//! Inputs of any compatible shapes are broadcast once (NumPy rules) into
//! equal-length columns. Model code then runs on plain scalars, row by row,
//! and the results are reshaped back to the broadcast shape.

use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ItuError, Result};
use crate::units::{Quantity, Unit};

/// Broadcast shape of the named input shapes.
pub fn broadcast_shape(shapes: &[(&str, &[usize])]) -> Result<Vec<usize>> {
    let ndim = shapes.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];

    for (name, shape) in shapes {
        let pad = ndim - shape.len();
        for (i, &len) in shape.iter().enumerate() {
            let slot = &mut out[pad + i];
            if *slot == len || len == 1 {
                continue;
            }
            if *slot == 1 {
                *slot = len;
                continue;
            }
            return Err(ItuError::ShapeMismatch {
                input: name.to_string(),
                expected: out.clone(),
                found: shape.to_vec(),
            });
        }
    }

    Ok(out)
}

/// Collects named inputs for a single evaluation and unifies their shapes.
pub struct Broadcaster {
    names: Vec<String>,
    arrays: Vec<ArrayD<f64>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            arrays: Vec::new(),
        }
    }

    /// Register an input converted to `unit`; returns its column index.
    pub fn input(&mut self, name: &str, quantity: &Quantity, unit: Unit) -> Result<usize> {
        let values = quantity.values_in(unit, name)?;
        Ok(self.raw(name, values))
    }

    /// Register an optional input; `None` yields no column.
    pub fn optional(
        &mut self,
        name: &str,
        quantity: Option<&Quantity>,
        unit: Unit,
    ) -> Result<Option<usize>> {
        quantity.map(|q| self.input(name, q, unit)).transpose()
    }

    /// Register an already unit-normalized array.
    pub fn raw(&mut self, name: &str, values: ArrayD<f64>) -> usize {
        self.names.push(name.to_string());
        self.arrays.push(values);
        self.arrays.len() - 1
    }

    pub fn finish(self) -> Result<Canonical> {
        let shapes: Vec<(&str, &[usize])> = self
            .names
            .iter()
            .zip(&self.arrays)
            .map(|(n, a)| (n.as_str(), a.shape()))
            .collect();
        let shape = broadcast_shape(&shapes)?;
        let len = shape.iter().product::<usize>();

        let mut columns = Vec::with_capacity(self.arrays.len());
        for (name, array) in self.names.iter().zip(&self.arrays) {
            let view = array
                .broadcast(IxDyn(&shape))
                .ok_or_else(|| ItuError::ShapeMismatch {
                    input: name.clone(),
                    expected: shape.clone(),
                    found: array.shape().to_vec(),
                })?;
            columns.push(view.iter().copied().collect::<Vec<f64>>());
        }

        Ok(Canonical {
            shape,
            len,
            columns,
        })
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal-length input columns sharing one broadcast shape.
#[derive(Debug, Clone)]
pub struct Canonical {
    shape: Vec<usize>,
    len: usize,
    columns: Vec<Vec<f64>>,
}

impl Canonical {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Evaluate `f` on every row; rows are evaluated in parallel once the
    /// element count reaches `parallel_threshold`.
    ///
    /// The first error encountered (in row order for sequential runs) is
    /// returned.
    pub fn try_map<F>(&self, parallel_threshold: usize, f: F) -> Result<ArrayD<f64>>
    where
        F: Fn(&[f64]) -> Result<f64> + Sync,
    {
        let row = |i: usize| {
            let values: Vec<f64> = self.columns.iter().map(|c| c[i]).collect();
            f(&values)
        };

        let out: Vec<f64> = if self.len >= parallel_threshold.max(1) && self.len > 1 {
            debug!(elements = self.len, "parallel evaluation");
            (0..self.len).into_par_iter().map(row).collect::<Result<_>>()?
        } else {
            (0..self.len).map(row).collect::<Result<_>>()?
        };

        ArrayD::from_shape_vec(IxDyn(&self.shape), out).map_err(|e| ItuError::ShapeMismatch {
            input: format!("output ({e})"),
            expected: self.shape.clone(),
            found: vec![self.len],
        })
    }

    /// Like [`Canonical::try_map`] for models returning several outputs per
    /// row; yields one array per output.
    pub fn try_map_n<const N: usize, F>(
        &self,
        parallel_threshold: usize,
        f: F,
    ) -> Result<[ArrayD<f64>; N]>
    where
        F: Fn(&[f64]) -> Result<[f64; N]> + Sync,
    {
        let row = |i: usize| {
            let values: Vec<f64> = self.columns.iter().map(|c| c[i]).collect();
            f(&values)
        };

        let rows: Vec<[f64; N]> = if self.len >= parallel_threshold.max(1) && self.len > 1 {
            (0..self.len).into_par_iter().map(row).collect::<Result<_>>()?
        } else {
            (0..self.len).map(row).collect::<Result<_>>()?
        };

        let mut outputs: [Vec<f64>; N] = std::array::from_fn(|_| Vec::with_capacity(self.len));
        for r in &rows {
            for (k, v) in r.iter().enumerate() {
                outputs[k].push(*v);
            }
        }

        let mut arrays = Vec::with_capacity(N);
        for data in outputs {
            let array = ArrayD::from_shape_vec(IxDyn(&self.shape), data).map_err(|e| {
                ItuError::ShapeMismatch {
                    input: format!("output ({e})"),
                    expected: self.shape.clone(),
                    found: vec![self.len],
                }
            })?;
            arrays.push(array);
        }
        arrays.try_into().map_err(|_| ItuError::ShapeMismatch {
            input: "outputs".to_string(),
            expected: vec![N],
            found: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_broadcast_shape_rules() {
        let s = |a: &[usize], b: &[usize]| broadcast_shape(&[("a", a), ("b", b)]);
        assert_eq!(s(&[3, 1], &[4]).unwrap(), vec![3, 4]);
        assert_eq!(s(&[], &[2, 2]).unwrap(), vec![2, 2]);
        assert_eq!(s(&[5], &[5]).unwrap(), vec![5]);
    }

    #[test]
    fn test_broadcast_shape_mismatch_names_input() {
        let lat: &[usize] = &[3];
        let lon: &[usize] = &[4];
        let err = broadcast_shape(&[("lat", lat), ("lon", lon)]).unwrap_err();
        match err {
            ItuError::ShapeMismatch { input, found, .. } => {
                assert_eq!(input, "lon");
                assert_eq!(found, vec![4]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scalar_and_vector_inputs_unify() {
        let mut b = Broadcaster::new();
        let lat = b.input("lat", &Unit::Degree.vec(vec![10.0, 20.0, 30.0]), Unit::Degree).unwrap();
        let f = b.input("f", &Unit::MegaHertz.of(14_000.0), Unit::GigaHertz).unwrap();
        let canon = b.finish().unwrap();
        assert_eq!(canon.shape(), &[3]);

        let out = canon.try_map(usize::MAX, |row| Ok(row[lat] + row[f])).unwrap();
        assert_eq!(out.as_slice().unwrap(), &[24.0, 34.0, 44.0]);
    }

    #[test]
    fn test_outer_product_broadcast() {
        let mut b = Broadcaster::new();
        let lat = b.raw("lat", array![[1.0], [2.0]].into_dyn());
        let lon = b.raw("lon", array![10.0, 20.0, 30.0].into_dyn());
        let canon = b.finish().unwrap();
        assert_eq!(canon.shape(), &[2, 3]);
        let out = canon.try_map(usize::MAX, |row| Ok(row[lat] * row[lon])).unwrap();
        assert_eq!(out[[1, 2]], 60.0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let values: Vec<f64> = (0..1000).map(|i| i as f64 * 0.1).collect();
        let mut b = Broadcaster::new();
        let x = b.raw("x", ArrayD::from_shape_vec(IxDyn(&[1000]), values).unwrap());
        let canon = b.finish().unwrap();
        let seq = canon.try_map(usize::MAX, |r| Ok(r[x].sin())).unwrap();
        let par = canon.try_map(1, |r| Ok(r[x].sin())).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_error_propagates_from_row() {
        let mut b = Broadcaster::new();
        let x = b.raw("x", array![1.0, -1.0].into_dyn());
        let canon = b.finish().unwrap();
        let res = canon.try_map(usize::MAX, |r| {
            if r[x] < 0.0 {
                Err(ItuError::out_of_domain("test", "x", r[x], "[0, inf)"))
            } else {
                Ok(r[x])
            }
        });
        assert!(res.unwrap_err().is_out_of_domain());
    }

    #[test]
    fn test_try_map_n_splits_outputs() {
        let mut b = Broadcaster::new();
        let x = b.raw("x", array![1.0, 2.0].into_dyn());
        let canon = b.finish().unwrap();
        let [a, c] = canon.try_map_n(usize::MAX, |r| Ok([r[x], 2.0 * r[x]])).unwrap();
        assert_eq!(a.as_slice().unwrap(), &[1.0, 2.0]);
        assert_eq!(c.as_slice().unwrap(), &[2.0, 4.0]);
    }
}
