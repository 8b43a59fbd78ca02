//! Process configuration.
//!
//! Resolved once, on first use: the JSON file named by `ITUR_CONFIG` (if
//! any) is read, then `ITUR_DATA_DIR` overrides the data directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itur_core::store::DEFAULT_PARALLEL_THRESHOLD;
use itur_core::{GridStore, ItuError, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::versions::Versions;

pub const CONFIG_ENV: &str = "ITUR_CONFIG";
pub const DATA_DIR_ENV: &str = "ITUR_DATA_DIR";

/// What to do with a frequency outside a model's stated (soft) range.
/// Hard limits, such as the 1-1000 GHz of the line-by-line gas model, always
/// fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPolicy {
    #[default]
    Strict,
    /// Evaluate anyway and log a warning.
    Extrapolate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub versions: Versions,
    pub frequency_policy: FrequencyPolicy,
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            versions: Versions::default(),
            frequency_policy: FrequencyPolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ItuError::data_unavailable("configuration", "", e))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ItuError::data_unavailable("configuration", path, e))?;
        serde_json::from_str(&content).map_err(|e| ItuError::data_unavailable("configuration", path, e))
    }

    /// Configuration from the environment. An unreadable `ITUR_CONFIG` file
    /// is reported and the defaults are used instead.
    pub fn from_env() -> Self {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring configuration file");
                Self::default()
            }),
            None => Self::default(),
        };
        if let Some(dir) = env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        config
    }

    /// A fresh Grid Store rooted at this configuration's data directory.
    pub fn grid_store(&self) -> GridStore {
        GridStore::new(&self.data_dir).with_parallel_threshold(self.parallel_threshold)
    }
}

lazy_static! {
    static ref CONFIG: Config = {
        let config = Config::from_env();
        info!(
            data_dir = %config.data_dir.display(),
            frequency_policy = ?config.frequency_policy,
            parallel_threshold = config.parallel_threshold,
            "resolved configuration"
        );
        config
    };
    static ref STORE: Arc<GridStore> = Arc::new(CONFIG.grid_store());
}

/// The process-wide configuration.
pub fn global() -> &'static Config {
    &CONFIG
}

/// The process-wide Grid Store.
pub fn global_store() -> Arc<GridStore> {
    STORE.clone()
}
