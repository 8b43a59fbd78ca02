//! Error taxonomy shared by every recommendation model.

use std::path::PathBuf;

use thiserror::Error;

use crate::units::Unit;

pub type Result<T> = std::result::Result<T, ItuError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItuError {
    /// A coordinate, frequency, angle or percentage lies outside the range a
    /// recommendation is stated to be valid for.
    #[error("{phenomenon}: {input} = {value} is outside the valid range {bound}")]
    OutOfDomain {
        phenomenon: &'static str,
        input: &'static str,
        value: f64,
        bound: String,
    },

    /// A reference dataset is missing, unreadable or malformed.
    #[error("dataset '{dataset}' unavailable at {}: {reason}", path.display())]
    DataUnavailable {
        dataset: String,
        path: PathBuf,
        reason: String,
    },

    #[error("ITU-R {recommendation}-{version} is not implemented")]
    ModelVersion {
        recommendation: &'static str,
        version: u32,
    },

    #[error("cannot broadcast '{input}' with shape {found:?} against shape {expected:?}")]
    ShapeMismatch {
        input: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("'{input}' must be expressed in a unit compatible with {expected}, found {found}")]
    UnitMismatch {
        input: String,
        expected: Unit,
        found: Unit,
    },

    #[error("{phenomenon}: missing required parameter '{parameter}'")]
    MissingParameter {
        phenomenon: &'static str,
        parameter: &'static str,
    },
}

impl ItuError {
    pub fn out_of_domain(
        phenomenon: &'static str,
        input: &'static str,
        value: f64,
        bound: impl Into<String>,
    ) -> Self {
        Self::OutOfDomain {
            phenomenon,
            input,
            value,
            bound: bound.into(),
        }
    }

    pub fn data_unavailable(
        dataset: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        Self::DataUnavailable {
            dataset: dataset.into(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_out_of_domain(&self) -> bool {
        matches!(self, Self::OutOfDomain { .. })
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

/// Check that `value` lies in the closed interval `[min, max]`.
///
/// NaN never satisfies the check.
pub fn check_range(
    phenomenon: &'static str,
    input: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64> {
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(ItuError::out_of_domain(
            phenomenon,
            input,
            value,
            format!("[{min}, {max}]"),
        ))
    }
}

/// Check that `value` lies in the open interval `(min, max)`.
pub fn check_open_range(
    phenomenon: &'static str,
    input: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64> {
    if value > min && value < max {
        Ok(value)
    } else {
        Err(ItuError::out_of_domain(
            phenomenon,
            input,
            value,
            format!("({min}, {max})"),
        ))
    }
}
