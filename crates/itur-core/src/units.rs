//! Unit-tagged quantities.
//!
//! Every value crossing the public boundary is a [`Quantity`]: an n-dimensional
//! array of `f64` tagged with a [`Unit`]. Conversion is only allowed between
//! units that share a [`PhysicalDimension`].

use std::fmt;

use ndarray::{Array, ArrayD, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{ItuError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalDimension {
    Frequency,
    Angle,
    Length,
    Attenuation,
    SpecificAttenuation,
    Power,
    Temperature,
    Pressure,
    Density,
    ColumnarContent,
    RainRate,
    Probability,
    Time,
    Refractivity,
    RefractivityGradient,
    Dimensionless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Hertz,
    MegaHertz,
    GigaHertz,
    Degree,
    Radian,
    Milliradian,
    Micrometer,
    Millimeter,
    Meter,
    Kilometer,
    Decibel,
    DecibelPerKm,
    DecibelMilliwatt,
    Kelvin,
    Celsius,
    Pascal,
    HectoPascal,
    GramPerCubicMeter,
    KilogramPerSquareMeter,
    MillimeterPerHour,
    Percent,
    Second,
    NUnit,
    NUnitPerKm,
    Dimensionless,
}

impl Unit {
    pub fn dimension(self) -> PhysicalDimension {
        use PhysicalDimension as D;
        match self {
            Unit::Hertz | Unit::MegaHertz | Unit::GigaHertz => D::Frequency,
            Unit::Degree | Unit::Radian | Unit::Milliradian => D::Angle,
            Unit::Micrometer | Unit::Millimeter | Unit::Meter | Unit::Kilometer => D::Length,
            Unit::Decibel => D::Attenuation,
            Unit::DecibelPerKm => D::SpecificAttenuation,
            Unit::DecibelMilliwatt => D::Power,
            Unit::Kelvin | Unit::Celsius => D::Temperature,
            Unit::Pascal | Unit::HectoPascal => D::Pressure,
            Unit::GramPerCubicMeter => D::Density,
            Unit::KilogramPerSquareMeter => D::ColumnarContent,
            Unit::MillimeterPerHour => D::RainRate,
            Unit::Percent => D::Probability,
            Unit::Second => D::Time,
            Unit::NUnit => D::Refractivity,
            Unit::NUnitPerKm => D::RefractivityGradient,
            Unit::Dimensionless => D::Dimensionless,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Hertz => "Hz",
            Unit::MegaHertz => "MHz",
            Unit::GigaHertz => "GHz",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::Milliradian => "mrad",
            Unit::Micrometer => "um",
            Unit::Millimeter => "mm",
            Unit::Meter => "m",
            Unit::Kilometer => "km",
            Unit::Decibel => "dB",
            Unit::DecibelPerKm => "dB/km",
            Unit::DecibelMilliwatt => "dBm",
            Unit::Kelvin => "K",
            Unit::Celsius => "degC",
            Unit::Pascal => "Pa",
            Unit::HectoPascal => "hPa",
            Unit::GramPerCubicMeter => "g/m3",
            Unit::KilogramPerSquareMeter => "kg/m2",
            Unit::MillimeterPerHour => "mm/h",
            Unit::Percent => "%",
            Unit::Second => "s",
            Unit::NUnit => "N-units",
            Unit::NUnitPerKm => "N-units/km",
            Unit::Dimensionless => "",
        }
    }

    // (scale, offset) such that base = value * scale + offset, where the base
    // unit of each dimension is the first listed in `Unit`.
    fn to_base(self) -> (f64, f64) {
        match self {
            Unit::MegaHertz => (1e6, 0.0),
            Unit::GigaHertz => (1e9, 0.0),
            Unit::Radian => (180.0 / std::f64::consts::PI, 0.0),
            Unit::Milliradian => (0.18 / std::f64::consts::PI, 0.0),
            Unit::Millimeter => (1e3, 0.0),
            Unit::Meter => (1e6, 0.0),
            Unit::Kilometer => (1e9, 0.0),
            Unit::Celsius => (1.0, 273.15),
            Unit::HectoPascal => (100.0, 0.0),
            _ => (1.0, 0.0),
        }
    }

    /// Factor and offset converting a value in `self` into `target`.
    pub fn conversion(self, target: Unit) -> Option<(f64, f64)> {
        if self.dimension() != target.dimension() {
            return None;
        }
        let (s1, o1) = self.to_base();
        let (s2, o2) = target.to_base();
        // base = v*s1 + o1 = w*s2 + o2
        Some((s1 / s2, (o1 - o2) / s2))
    }

    pub fn of(self, value: f64) -> Quantity {
        Quantity::scalar(value, self)
    }

    pub fn array<D: Dimension>(self, values: Array<f64, D>) -> Quantity {
        Quantity::new(values, self)
    }

    pub fn vec(self, values: Vec<f64>) -> Quantity {
        Quantity::from_vec(values, self)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Unit::Dimensionless {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", self.symbol())
        }
    }
}

/// A value, or array of values, tagged with a physical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    values: ArrayD<f64>,
    unit: Unit,
}

impl Quantity {
    pub fn new<D: Dimension>(values: Array<f64, D>, unit: Unit) -> Self {
        Self {
            values: values.into_dyn(),
            unit,
        }
    }

    pub fn scalar(value: f64, unit: Unit) -> Self {
        Self {
            values: ArrayD::from_elem(IxDyn(&[]), value),
            unit,
        }
    }

    pub fn from_vec(values: Vec<f64>, unit: Unit) -> Self {
        Self::new(Array::from_vec(values), unit)
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.values
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.values.ndim() == 0
    }

    /// The single value of a one-element quantity.
    pub fn value(&self) -> Option<f64> {
        if self.values.len() == 1 {
            self.values.iter().next().copied()
        } else {
            None
        }
    }

    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.values.get(IxDyn(index)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Convert to `unit`, failing when the dimensions differ.
    pub fn to(&self, unit: Unit) -> Result<Quantity> {
        self.to_named(unit, "quantity")
    }

    /// Like [`Quantity::to`], naming the offending input in the error.
    pub fn to_named(&self, unit: Unit, input: &str) -> Result<Quantity> {
        let (scale, offset) =
            self.unit
                .conversion(unit)
                .ok_or_else(|| ItuError::UnitMismatch {
                    input: input.to_string(),
                    expected: unit,
                    found: self.unit,
                })?;
        if scale == 1.0 && offset == 0.0 {
            return Ok(Quantity {
                values: self.values.clone(),
                unit,
            });
        }
        Ok(Quantity {
            values: self.values.mapv(|v| v * scale + offset),
            unit,
        })
    }

    /// Values expressed in `unit`.
    pub fn values_in(&self, unit: Unit, input: &str) -> Result<ArrayD<f64>> {
        Ok(self.to_named(unit, input)?.values)
    }

    pub fn checked_add(&self, other: &Quantity) -> Result<Quantity> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &Quantity) -> Result<Quantity> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &Quantity, f: impl Fn(f64, f64) -> f64) -> Result<Quantity> {
        // Offset units (degC) cannot be summed meaningfully.
        if self.unit.to_base().1 != 0.0 || other.unit.to_base().1 != 0.0 {
            return Err(ItuError::UnitMismatch {
                input: "operand".to_string(),
                expected: Unit::Kelvin,
                found: self.unit,
            });
        }
        let rhs = other.values_in(self.unit, "operand")?;
        let shape = crate::broadcast::broadcast_shape(&[
            ("lhs", self.values.shape()),
            ("rhs", rhs.shape()),
        ])?;
        let lhs = self.values.broadcast(IxDyn(&shape)).ok_or_else(|| {
            ItuError::ShapeMismatch {
                input: "lhs".to_string(),
                expected: shape.clone(),
                found: self.values.shape().to_vec(),
            }
        })?;
        let rhs = rhs.broadcast(IxDyn(&shape)).ok_or_else(|| ItuError::ShapeMismatch {
            input: "rhs".to_string(),
            expected: shape.clone(),
            found: other.values.shape().to_vec(),
        })?;
        let values = ndarray::Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| f(a, b));
        Ok(Quantity {
            values,
            unit: self.unit,
        })
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Quantity {
        Quantity {
            values: self.values.mapv(f),
            unit: self.unit,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) if self.is_scalar() => match f.precision() {
                Some(p) => write!(f, "{:.*} {}", p, v, self.unit.symbol()),
                None => write!(f, "{} {}", v, self.unit.symbol()),
            },
            _ => write!(f, "{} {}", self.values, self.unit.symbol()),
        }
    }
}
