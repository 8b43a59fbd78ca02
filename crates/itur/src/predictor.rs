//! The evaluation context every model call runs in.

use std::sync::Arc;

use itur_core::{check_range, Broadcaster, GridStore, ItuError, Quantity, Result, Unit};
use tracing::{debug, warn};

use crate::config::{self, Config, FrequencyPolicy};
use crate::versions::Versions;

/// Pins a Grid Store, the recommendation editions and the evaluation policy
/// for a set of calls. Cheap to clone; holds no mutable state.
#[derive(Debug, Clone)]
pub struct Predictor {
    store: Arc<GridStore>,
    versions: Versions,
    frequency_policy: FrequencyPolicy,
    parallel_threshold: usize,
}

impl Predictor {
    pub fn new(store: Arc<GridStore>, config: &Config) -> Self {
        Self {
            store,
            versions: config.versions,
            frequency_policy: config.frequency_policy,
            parallel_threshold: config.parallel_threshold,
        }
    }

    /// A predictor with its own Grid Store rooted at `config.data_dir`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(config.grid_store()), config)
    }

    /// The process-wide configuration and Grid Store.
    pub fn global() -> Self {
        Self::new(config::global_store(), config::global())
    }

    pub fn with_versions(mut self, versions: Versions) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_frequency_policy(mut self, policy: FrequencyPolicy) -> Self {
        self.frequency_policy = policy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    pub fn frequency_policy(&self) -> FrequencyPolicy {
        self.frequency_policy
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Check a frequency (GHz) against a model's stated range, honouring the
    /// frequency policy.
    pub(crate) fn check_frequency(&self, phenomenon: &'static str, f: f64, min: f64, max: f64) -> Result<()> {
        if f >= min && f <= max {
            return Ok(());
        }
        match self.frequency_policy {
            FrequencyPolicy::Extrapolate if f.is_finite() && f > 0.0 => {
                warn!(phenomenon, frequency = f, min, max, "frequency outside stated range, extrapolating");
                Ok(())
            }
            _ => Err(ItuError::out_of_domain(
                phenomenon,
                "frequency",
                f,
                format!("[{min}, {max}] GHz"),
            )),
        }
    }
}

/// One named input of a vectorized call, converted to `unit` before the
/// model sees it.
pub(crate) struct Input<'a> {
    name: &'static str,
    quantity: Option<&'a Quantity>,
    unit: Unit,
}

pub(crate) fn arg<'a>(name: &'static str, quantity: &'a Quantity, unit: Unit) -> Input<'a> {
    Input {
        name,
        quantity: Some(quantity),
        unit,
    }
}

pub(crate) fn opt<'a>(name: &'static str, quantity: Option<&'a Quantity>, unit: Unit) -> Input<'a> {
    Input { name, quantity, unit }
}

/// Values of one broadcast element, in input order.
pub(crate) struct Row<'r> {
    values: &'r [f64],
    slots: &'r [Option<usize>],
}

impl Row<'_> {
    pub fn get(&self, i: usize) -> f64 {
        self.opt(i).unwrap_or(f64::NAN)
    }

    pub fn opt(&self, i: usize) -> Option<f64> {
        self.slots[i].map(|k| self.values[k])
    }
}

impl Predictor {
    /// Broadcast `inputs` and evaluate `f` element-wise, returning a quantity
    /// in `unit` with the broadcast shape.
    pub(crate) fn evaluate<F>(&self, inputs: &[Input<'_>], unit: Unit, f: F) -> Result<Quantity>
    where
        F: Fn(&Row<'_>) -> Result<f64> + Sync,
    {
        let [out] = self.evaluate_n(inputs, [unit], |row| Ok([f(row)?]))?;
        Ok(out)
    }

    /// Like [`Predictor::evaluate`] for models with several outputs.
    pub(crate) fn evaluate_n<const N: usize, F>(
        &self,
        inputs: &[Input<'_>],
        units: [Unit; N],
        f: F,
    ) -> Result<[Quantity; N]>
    where
        F: Fn(&Row<'_>) -> Result<[f64; N]> + Sync,
    {
        let mut b = Broadcaster::new();
        let slots = inputs
            .iter()
            .map(|input| b.optional(input.name, input.quantity, input.unit))
            .collect::<Result<Vec<_>>>()?;
        let canon = b.finish()?;
        debug!(elements = canon.len(), inputs = inputs.len(), "vectorized evaluation");

        let arrays = canon.try_map_n(self.parallel_threshold, |values| {
            f(&Row {
                values,
                slots: &slots,
            })
        })?;

        let mut units = units.into_iter();
        Ok(arrays.map(|a| Quantity::new(a, units.next().unwrap_or(Unit::Dimensionless))))
    }
}

/// Exceedance percentages must lie in (0, 100).
pub(crate) fn check_percentage(phenomenon: &'static str, p: f64) -> Result<f64> {
    itur_core::check_open_range(phenomenon, "p", p, 0.0, 100.0)
}

pub(crate) fn check_elevation(phenomenon: &'static str, el: f64) -> Result<f64> {
    check_range(phenomenon, "elevation", el, 0.0, 90.0)
}
