//! Per-triangle, per-time-step scalar fields.
//!
//! [`FieldStore`] is the only way the detection engine reads field values.
//! [`FieldSection`] keeps a whole regridded field resident in memory; any
//! `(triangle, time step)` pair that was never populated reads back as
//! [`ExtremaError::DataMissing`].

use hashbrown::HashMap;

use crate::extrema_error::ExtremaError;
use crate::topology::point::TriLabel;

/// Read access to regridded field values.
pub trait FieldStore: Send + Sync {
    /// Number of time steps held by the store.
    fn n_time_steps(&self) -> usize;

    /// Field value of `label` at `time_step`.
    fn value(&self, label: TriLabel, time_step: usize) -> Result<f64, ExtremaError>;
}

/// Dense in-memory field: one series of `n_time_steps` slots per triangle.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct FieldSection {
    n_time_steps: usize,
    series: HashMap<TriLabel, Vec<Option<f64>>>,
}

impl FieldSection {
    /// Creates an empty field with `n_time_steps` slots per triangle.
    pub fn new(n_time_steps: usize) -> Self {
        Self {
            n_time_steps,
            series: HashMap::new(),
        }
    }

    /// Builds a field by evaluating `f(label, t)` for every label and step.
    pub fn from_fn<I, F>(labels: I, n_time_steps: usize, mut f: F) -> Self
    where
        I: IntoIterator<Item = TriLabel>,
        F: FnMut(TriLabel, usize) -> f64,
    {
        let mut out = Self::new(n_time_steps);
        for label in labels {
            let values = (0..n_time_steps).map(|t| Some(f(label, t))).collect();
            out.series.insert(label, values);
        }
        out
    }

    /// Sets one value; returns the previous one, if any.
    pub fn set(&mut self, label: TriLabel, time_step: usize, value: f64) -> Result<Option<f64>, ExtremaError> {
        if time_step >= self.n_time_steps {
            return Err(ExtremaError::Config(format!(
                "time step {time_step} out of range (field has {} steps)",
                self.n_time_steps
            )));
        }
        let slots = self
            .series
            .entry(label)
            .or_insert_with(|| vec![None; self.n_time_steps]);
        Ok(slots[time_step].replace(value))
    }

    /// Replaces the whole series of `label`.
    pub fn set_series(&mut self, label: TriLabel, values: &[f64]) -> Result<(), ExtremaError> {
        if values.len() != self.n_time_steps {
            return Err(ExtremaError::Config(format!(
                "series for triangle {label} has {} values, expected {}",
                values.len(),
                self.n_time_steps
            )));
        }
        self.series
            .insert(label, values.iter().copied().map(Some).collect());
        Ok(())
    }

    /// Number of triangles with at least one slot allocated.
    pub fn n_triangles(&self) -> usize {
        self.series.len()
    }
}

impl FieldStore for FieldSection {
    fn n_time_steps(&self) -> usize {
        self.n_time_steps
    }

    fn value(&self, label: TriLabel, time_step: usize) -> Result<f64, ExtremaError> {
        self.series
            .get(&label)
            .and_then(|s| s.get(time_step).copied().flatten())
            .ok_or(ExtremaError::DataMissing { label, time_step })
    }
}
