//! The Grid Store: named geophysical maps loaded lazily from a versioned
//! directory tree and retained for the life of the store.
//!
//! Layout on disk is `{data_dir}/{recommendation}/{file}.npy` or
//! `{data_dir}/{recommendation}/{file}.txt`. Row 0 of every file holds the
//! southernmost latitude and column 0 the westernmost longitude.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use ndarray::Array2;
use tracing::debug;

use crate::broadcast::Broadcaster;
use crate::error::{ItuError, Result};
use crate::grid::{GeophysicalMap, GridAxis, Interpolation, MapStack};
use crate::units::{Quantity, Unit};

/// Element count at which lookups switch to parallel evaluation.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Static description of one persisted map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSpec {
    /// Recommendation directory, e.g. `"837"`.
    pub recommendation: &'static str,
    /// File stem, e.g. `"v7_r001"`.
    pub file: String,
    pub unit: Unit,
    pub lat: GridAxis,
    pub lon: GridAxis,
    /// Inclusive range every stored value must fall in.
    pub valid_range: (f64, f64),
}

impl MapSpec {
    pub fn new(
        recommendation: &'static str,
        file: impl Into<String>,
        unit: Unit,
        lat: GridAxis,
        lon: GridAxis,
        valid_range: (f64, f64),
    ) -> Self {
        Self {
            recommendation,
            file: file.into(),
            unit,
            lat,
            lon,
            valid_range,
        }
    }

    /// Cache key, also the path relative to the data directory.
    pub fn id(&self) -> String {
        format!("{}/{}", self.recommendation, self.file)
    }

    /// Same grid and unit, different file.
    pub fn with_file(&self, file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..self.clone()
        }
    }
}

/// A family of maps forming one [`MapStack`].
#[derive(Debug, Clone, PartialEq)]
pub struct StackSpec {
    pub name: String,
    pub axis: Vec<f64>,
    pub layers: Vec<MapSpec>,
}

impl StackSpec {
    /// One layer per exceedance percentage, named `{prefix}_{p}` with the
    /// decimal point written as `_` (`v13_nwet_0_1`).
    pub fn percentiles(template: &MapSpec, prefix: &str, percentiles: &[f64]) -> Self {
        let layers = percentiles
            .iter()
            .map(|&p| template.with_file(format!("{}_{}", prefix, percentile_label(p))))
            .collect();
        Self {
            name: format!("{}/{}", template.recommendation, prefix),
            axis: percentiles.to_vec(),
            layers,
        }
    }

    /// Twelve monthly layers named `{prefix}_month01` .. `{prefix}_month12`.
    pub fn monthly(template: &MapSpec, prefix: &str) -> Self {
        let layers = (1..=12)
            .map(|m| template.with_file(format!("{}_month{:02}", prefix, m)))
            .collect();
        Self {
            name: format!("{}/{}", template.recommendation, prefix),
            axis: (1..=12).map(f64::from).collect(),
            layers,
        }
    }
}

pub fn percentile_label(p: f64) -> String {
    format!("{}", p).replace('.', "_")
}

/// Thread-safe cache of geophysical maps.
///
/// Lookups take a read lock only. The first request for a map takes the load
/// mutex, re-checks the cache and loads the file, so concurrent callers never
/// load the same map twice. Failed loads are not cached.
#[derive(Debug)]
pub struct GridStore {
    data_dir: Option<PathBuf>,
    parallel_threshold: usize,
    maps: RwLock<HashMap<String, Arc<GeophysicalMap>>>,
    load_lock: Mutex<()>,
}

impl GridStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_root(Some(data_dir.into()))
    }

    /// A store with no backing directory; only inserted maps resolve.
    pub fn in_memory() -> Self {
        Self::with_root(None)
    }

    fn with_root(data_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            maps: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Seed the cache with a prepared map under `spec.id()`.
    pub fn insert(&self, spec: &MapSpec, map: GeophysicalMap) {
        let mut maps = self.maps.write().unwrap_or_else(|e| e.into_inner());
        maps.insert(spec.id(), Arc::new(map));
    }

    pub fn is_loaded(&self, spec: &MapSpec) -> bool {
        self.cached(&spec.id()).is_some()
    }

    fn cached(&self, id: &str) -> Option<Arc<GeophysicalMap>> {
        let maps = self.maps.read().unwrap_or_else(|e| e.into_inner());
        maps.get(id).cloned()
    }

    /// The map described by `spec`, loading it on first use.
    pub fn map(&self, spec: &MapSpec) -> Result<Arc<GeophysicalMap>> {
        let id = spec.id();
        if let Some(map) = self.cached(&id) {
            return Ok(map);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(map) = self.cached(&id) {
            return Ok(map);
        }

        let map = Arc::new(self.load(spec)?);
        let mut maps = self.maps.write().unwrap_or_else(|e| e.into_inner());
        maps.insert(id, map.clone());
        Ok(map)
    }

    pub fn stack(&self, spec: &StackSpec) -> Result<MapStack> {
        let layers = spec
            .layers
            .iter()
            .map(|layer| self.map(layer))
            .collect::<Result<Vec<_>>>()?;
        MapStack::new(spec.name.clone(), spec.axis.clone(), layers)
    }

    /// Interpolated values of a map at every broadcast (lat, lon) pair.
    pub fn lookup(
        &self,
        spec: &MapSpec,
        lat: &Quantity,
        lon: &Quantity,
        method: Interpolation,
    ) -> Result<Quantity> {
        let map = self.map(spec)?;
        let mut b = Broadcaster::new();
        let la = b.input("lat", lat, Unit::Degree)?;
        let lo = b.input("lon", lon, Unit::Degree)?;
        let canon = b.finish()?;
        debug!(map = %spec.id(), elements = canon.len(), "grid lookup");
        let values = canon.try_map(self.parallel_threshold, |row| {
            map.interpolate(row[la], row[lo], method)
        })?;
        Ok(Quantity::new(values, map.unit()))
    }

    fn load(&self, spec: &MapSpec) -> Result<GeophysicalMap> {
        let id = spec.id();
        let root = self.data_dir.as_ref().ok_or_else(|| {
            ItuError::data_unavailable(id.as_str(), "", "store has no data directory")
        })?;
        let stem = root.join(spec.recommendation).join(&spec.file);
        let npy = stem.with_extension("npy");
        let txt = stem.with_extension("txt");

        let (path, values) = if npy.is_file() {
            let values = read_npy(&npy).map_err(|e| ItuError::data_unavailable(id.as_str(), &npy, e))?;
            (npy, values)
        } else if txt.is_file() {
            let values = read_txt(&txt).map_err(|e| ItuError::data_unavailable(id.as_str(), &txt, e))?;
            (txt, values)
        } else {
            return Err(ItuError::data_unavailable(
                id.as_str(),
                npy,
                "file not found (.npy or .txt)",
            ));
        };

        validate(spec, &values).map_err(|reason| ItuError::data_unavailable(id.as_str(), &path, reason))?;
        debug!(map = %id, path = %path.display(), rows = values.nrows(), cols = values.ncols(), "loaded geophysical map");

        GeophysicalMap::new(id.as_str(), spec.unit, spec.lat, spec.lon, values).map_err(|e| match e {
            ItuError::DataUnavailable { dataset, reason, .. } => ItuError::DataUnavailable {
                dataset,
                path,
                reason,
            },
            other => other,
        })
    }
}

fn validate(spec: &MapSpec, values: &Array2<f64>) -> std::result::Result<(), String> {
    if values.dim() != (spec.lat.len, spec.lon.len) {
        return Err(format!(
            "expected a {}x{} grid, found {}x{}",
            spec.lat.len,
            spec.lon.len,
            values.nrows(),
            values.ncols()
        ));
    }
    let (lo, hi) = spec.valid_range;
    if let Some(bad) = values.iter().find(|v| !(**v >= lo && **v <= hi)) {
        return Err(format!("value {} outside valid range [{}, {}]", bad, lo, hi));
    }
    Ok(())
}

fn read_npy(path: &Path) -> std::io::Result<Array2<f64>> {
    let bytes = fs::read(path)?;
    let reader = npyz::NpyFile::new(&bytes[..])?;
    let shape = reader.shape().to_vec();
    let fortran = reader.order() == npyz::Order::Fortran;
    let data = match reader.into_vec::<f64>() {
        Ok(data) => data,
        Err(_) => npyz::NpyFile::new(&bytes[..])?
            .into_vec::<f32>()?
            .into_iter()
            .map(f64::from)
            .collect(),
    };

    let (rows, cols) = match shape.as_slice() {
        [r, c] => (*r as usize, *c as usize),
        other => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("expected a 2-D array, found shape {:?}", other),
            ))
        }
    };
    let array = if fortran {
        Array2::from_shape_vec((cols, rows), data).map(|a| a.reversed_axes())
    } else {
        Array2::from_shape_vec((rows, cols), data)
    };
    array.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

fn read_txt(path: &Path) -> std::io::Result<Array2<f64>> {
    let content = fs::read_to_string(path)?;
    parse_txt(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Parse whitespace-separated rows, ignoring blank lines and `#` comments.
pub fn parse_txt(content: &str) -> std::result::Result<Array2<f64>, String> {
    let mut data = Vec::new();
    let mut cols = None;
    let mut rows = 0;

    for (n, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().map_err(|e| format!("line {}: '{}': {}", n + 1, tok, e)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match cols {
            None => cols = Some(row.len()),
            Some(c) if c != row.len() => {
                return Err(format!("line {}: expected {} columns, found {}", n + 1, c, row.len()))
            }
            _ => {}
        }
        data.extend(row);
        rows += 1;
    }

    let cols = cols.ok_or_else(|| "file contains no data rows".to_string())?;
    Array2::from_shape_vec((rows, cols), data).map_err(|e| e.to_string())
}
