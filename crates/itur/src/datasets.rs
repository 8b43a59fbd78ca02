//! Catalogue of the reference datasets each recommendation reads.

use itur_core::{GridAxis, MapSpec, Unit};

use crate::predictor::Predictor;
use crate::versions::Versions;
use crate::{p1510, p1511, p453, p836, p837, p839, p840};

/// A global grid at `resolution` degrees spanning -90..90 and -180..180.
pub(crate) fn global_grid(resolution: f64) -> (GridAxis, GridAxis) {
    let lat = GridAxis {
        start: -90.0,
        step: resolution,
        len: (180.0 / resolution).round() as usize + 1,
    };
    let lon = GridAxis {
        start: -180.0,
        step: resolution,
        len: (360.0 / resolution).round() as usize + 1,
    };
    (lat, lon)
}

pub(crate) fn map_spec(
    recommendation: &'static str,
    file: &str,
    unit: Unit,
    resolution: f64,
    valid_range: (f64, f64),
) -> MapSpec {
    let (lat, lon) = global_grid(resolution);
    MapSpec::new(recommendation, file, unit, lat, lon, valid_range)
}

/// Every map the given editions may read.
pub fn required_maps(versions: &Versions) -> Vec<MapSpec> {
    let mut maps = Vec::new();
    maps.extend(p453::datasets(versions.p453));
    maps.extend(p836::datasets(versions.p836));
    maps.extend(p837::datasets(versions.p837));
    maps.extend(p839::datasets(versions.p839));
    maps.extend(p840::datasets(versions.p840));
    maps.extend(p1510::datasets(versions.p1510));
    maps.extend(p1511::datasets(versions.p1511));
    maps
}

impl Predictor {
    /// Maps required by the pinned editions that cannot be loaded, with the
    /// reason each failed. Loads everything that can be loaded.
    pub fn missing_datasets(&self) -> Vec<(MapSpec, itur_core::ItuError)> {
        required_maps(self.versions())
            .into_iter()
            .filter_map(|spec| match self.store().map(&spec) {
                Ok(_) => None,
                Err(e) => Some((spec, e)),
            })
            .collect()
    }
}
