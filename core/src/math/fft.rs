use crate::prelude::{ModelError, ModelResult};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps planned forward and inverse transforms of one size.
#[derive(Clone)]
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            forward,
            inverse,
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unnormalized forward transform, in place.
    pub fn forward(&self, buffer: &mut [Complex64]) -> ModelResult<()> {
        self.check_len(buffer.len())?;
        self.forward.process(buffer);
        Ok(())
    }

    /// Inverse transform scaled by `1 / size`, in place.
    pub fn inverse(&self, buffer: &mut [Complex64]) -> ModelResult<()> {
        self.check_len(buffer.len())?;
        self.inverse.process(buffer);
        let scale = 1.0 / self.size as f64;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> ModelResult<()> {
        if len != self.size {
            return Err(ModelError::ShapeMismatch(format!(
                "FFT planned for {} points, got {}",
                self.size, len
            )));
        }
        Ok(())
    }
}
