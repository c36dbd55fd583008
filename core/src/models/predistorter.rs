use crate::math::stats::StatsHelper;
use crate::models::memory_polynomial::MemoryPolynomialModel;
use crate::prelude::{ModelError, ModelResult, PredistorterConfig, SignalTransform};
use crate::telemetry::log::LogManager;
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;

/// Memory-polynomial predistorter trained with the indirect learning
/// architecture.
///
/// Each pass fits a postdistorter from the gain-normalized PA output back to
/// the PA input and copies it in front of the PA.
#[derive(Debug, Clone)]
pub struct PredistorterModel {
    polynomial: MemoryPolynomialModel,
    iteration_count: usize,
    regularization: f64,
    logger: LogManager,
}

impl PredistorterModel {
    pub fn new(config: &PredistorterConfig) -> ModelResult<Self> {
        if config.iteration_count == 0 {
            return Err(ModelError::InvalidParameter(
                "iteration count must be at least 1".into(),
            ));
        }
        if !config.regularization.is_finite() || config.regularization < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "regularization must be finite and >= 0, got {}",
                config.regularization
            )));
        }

        let mut polynomial = MemoryPolynomialModel::from_config(&config.polynomial())?;
        polynomial.set_coefficients(identity_coefficients(&polynomial))?;

        Ok(Self {
            polynomial,
            iteration_count: config.iteration_count,
            regularization: config.regularization,
            logger: LogManager::new("ila-dpd"),
        })
    }

    pub fn polynomial(&self) -> &MemoryPolynomialModel {
        &self.polynomial
    }

    pub fn coefficients(&self) -> &Array2<Complex64> {
        self.polynomial.coefficients()
    }

    pub fn set_coefficients(&mut self, coefficients: Array2<Complex64>) -> ModelResult<()> {
        self.polynomial.set_coefficients(coefficients)
    }

    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// Back to pass-through coefficients.
    pub fn reset(&mut self) -> ModelResult<()> {
        self.polynomial
            .set_coefficients(identity_coefficients(&self.polynomial))
    }

    pub fn evaluate(&self, signal: ArrayView1<'_, Complex64>) -> Array1<Complex64> {
        self.polynomial.evaluate(signal)
    }

    /// Runs `iteration_count` ILA passes of `training` through `amplifier`.
    pub fn train<T>(
        &mut self,
        amplifier: &mut T,
        training: ArrayView1<'_, Complex64>,
    ) -> ModelResult<()>
    where
        T: SignalTransform + ?Sized,
    {
        for iteration in 1..=self.iteration_count {
            let predistorted = self.polynomial.evaluate(training);
            let drive_norm = StatsHelper::norm(predistorted.view());
            if !drive_norm.is_finite() || drive_norm == 0.0 {
                return Err(ModelError::NumericalDegeneracy(format!(
                    "predistorted drive has norm {} on ILA iteration {}",
                    drive_norm, iteration
                )));
            }

            let amplified = amplifier.transform(predistorted.view())?;
            let normalized = StatsHelper::normalize_gain(predistorted.view(), amplified.view())?;
            let coefficients = self.polynomial.fit_regularized(
                normalized.view(),
                predistorted.view(),
                self.regularization,
            )?;
            self.polynomial.set_coefficients(coefficients)?;

            self.logger.detail(&format!(
                "iteration {}/{}: PA gain {:.4}",
                iteration,
                self.iteration_count,
                StatsHelper::norm(amplified.view()) / drive_norm
            ));
        }

        self.logger.record(&format!(
            "trained {} coefficients over {} samples in {} iterations",
            self.polynomial.num_coeffs(),
            training.len(),
            self.iteration_count
        ));
        Ok(())
    }
}

impl SignalTransform for PredistorterModel {
    fn transform(&mut self, input: ArrayView1<'_, Complex64>) -> ModelResult<Array1<Complex64>> {
        Ok(self.evaluate(input))
    }
}

fn identity_coefficients(polynomial: &MemoryPolynomialModel) -> Array2<Complex64> {
    let mut coefficients = Array2::zeros((polynomial.num_branches(), polynomial.memory_depth()));
    coefficients[[0, 0]] = Complex64::new(1.0, 0.0);
    coefficients
}
