use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Shape of a memory polynomial shared by every model built on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialConfig {
    pub order: usize,
    pub memory_depth: usize,
    pub memory_stride: usize,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self {
            order: 5,
            memory_depth: 4,
            memory_stride: 1,
        }
    }
}

/// Construction parameters for the power amplifier simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerAmpConfig {
    pub order: usize,
    pub memory_depth: usize,
    pub memory_stride: usize,
    pub noise_variance: f64,
    pub add_lo_leakage: bool,
    pub add_iq_imbalance: bool,
    pub seed: u64,
}

impl Default for PowerAmpConfig {
    fn default() -> Self {
        Self {
            order: 5,
            memory_depth: 4,
            memory_stride: 1,
            noise_variance: 0.05,
            add_lo_leakage: true,
            add_iq_imbalance: true,
            seed: 1,
        }
    }
}

impl PowerAmpConfig {
    pub fn polynomial(&self) -> PolynomialConfig {
        PolynomialConfig {
            order: self.order,
            memory_depth: self.memory_depth,
            memory_stride: self.memory_stride,
        }
    }
}

/// Construction parameters for the ILA predistorter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredistorterConfig {
    pub order: usize,
    pub memory_depth: usize,
    pub memory_stride: usize,
    pub iteration_count: usize,
    /// Tikhonov weight applied to every least-squares solve; 0 disables it.
    pub regularization: f64,
}

impl Default for PredistorterConfig {
    fn default() -> Self {
        Self {
            order: 5,
            memory_depth: 1,
            memory_stride: 1,
            iteration_count: 2,
            regularization: 0.0,
        }
    }
}

impl PredistorterConfig {
    pub fn polynomial(&self) -> PolynomialConfig {
        PolynomialConfig {
            order: self.order,
            memory_depth: self.memory_depth,
            memory_stride: self.memory_stride,
        }
    }
}

/// Common error type for model construction, fitting and evaluation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Anything that maps a complex baseband sequence to another one.
///
/// Takes `&mut self` because some transforms (the PA's noise source) advance
/// internal state on every call.
pub trait SignalTransform {
    fn transform(&mut self, input: ArrayView1<'_, Complex64>) -> ModelResult<Array1<Complex64>>;
}
