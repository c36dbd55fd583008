use crate::prelude::ModelError;
use serde::Serialize;
use std::sync::Mutex;

/// Thread-safe counters for model activity across a workflow.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time copy of the recorded counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub fits: usize,
    pub transmissions: usize,
    pub trainings: usize,
    pub invalid_parameters: usize,
    pub shape_mismatches: usize,
    pub degeneracies: usize,
    pub best_fit_nmse: Option<f64>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_fit(&self, nmse: f64) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.fits += 1;
            metrics.best_fit_nmse = Some(match metrics.best_fit_nmse {
                Some(best) => best.min(nmse),
                None => nmse,
            });
        }
    }

    pub fn record_transmission(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.transmissions += 1;
        }
    }

    pub fn record_training(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.trainings += 1;
        }
    }

    pub fn record_error(&self, error: &ModelError) {
        if let Ok(mut metrics) = self.inner.lock() {
            match error {
                ModelError::InvalidParameter(_) => metrics.invalid_parameters += 1,
                ModelError::ShapeMismatch(_) => metrics.shape_mismatches += 1,
                ModelError::NumericalDegeneracy(_) => metrics.degeneracies += 1,
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            metrics.clone()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
