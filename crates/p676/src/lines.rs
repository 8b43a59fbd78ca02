//! Spectral Line Data Store.
//!
//! The line-by-line tables of each supported edition are embedded at compile
//! time and parsed once, on first use.

use std::fmt;

use itur_core::{ItuError, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Editions of ITU-R P.676 with a line-by-line model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum P676Version {
    #[default]
    V11,
}

impl TryFrom<u32> for P676Version {
    type Error = ItuError;

    fn try_from(version: u32) -> Result<Self> {
        match version {
            11 => Ok(Self::V11),
            _ => Err(ItuError::ModelVersion {
                recommendation: "P.676",
                version,
            }),
        }
    }
}

impl From<P676Version> for u32 {
    fn from(version: P676Version) -> u32 {
        match version {
            P676Version::V11 => 11,
        }
    }
}

impl fmt::Display for P676Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P.676-{}", u32::from(*self))
    }
}

/// One absorption line: centre frequency (GHz) and the six tabulated
/// coefficients (a1..a6 for oxygen, b1..b6 for water vapour).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralLine {
    pub frequency: f64,
    pub coefficients: [f64; 6],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralLineTable {
    pub version: P676Version,
    pub oxygen: Vec<SpectralLine>,
    pub water_vapour: Vec<SpectralLine>,
}

lazy_static! {
    static ref V11_LINES: std::result::Result<SpectralLineTable, ItuError> = load_v11();
}

fn load_v11() -> Result<SpectralLineTable> {
    let oxygen = parse_lines(
        "v11_lines_oxygen",
        include_str!("../static_data/v11_lines_oxygen.txt"),
    )?;
    let water_vapour = parse_lines(
        "v11_lines_water_vapour",
        include_str!("../static_data/v11_lines_water_vapour.txt"),
    )?;
    debug!(
        oxygen = oxygen.len(),
        water_vapour = water_vapour.len(),
        "parsed P.676-11 spectral lines"
    );
    Ok(SpectralLineTable {
        version: P676Version::V11,
        oxygen,
        water_vapour,
    })
}

/// The line table of `version`.
pub fn lines_for(version: P676Version) -> Result<&'static SpectralLineTable> {
    match version {
        P676Version::V11 => {
            let table: &'static std::result::Result<SpectralLineTable, ItuError> = &V11_LINES;
            table.as_ref().map_err(Clone::clone)
        }
    }
}

fn parse_lines(dataset: &str, content: &str) -> Result<Vec<SpectralLine>> {
    let mut lines = Vec::new();
    for (n, row) in content.lines().enumerate() {
        let row = row.split('#').next().unwrap_or("").trim();
        if row.is_empty() {
            continue;
        }
        let values = row
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ItuError::data_unavailable(dataset, "", format!("line {}: {}", n + 1, e)))?;
        if values.len() != 7 {
            return Err(ItuError::data_unavailable(
                dataset,
                "",
                format!("line {}: expected 7 columns, found {}", n + 1, values.len()),
            ));
        }
        let mut coefficients = [0.0; 6];
        coefficients.copy_from_slice(&values[1..]);
        lines.push(SpectralLine {
            frequency: values[0],
            coefficients,
        });
    }
    if lines.windows(2).any(|w| w[1].frequency <= w[0].frequency) {
        return Err(ItuError::data_unavailable(dataset, "", "line frequencies must increase"));
    }
    Ok(lines)
}
