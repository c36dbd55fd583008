use crate::prelude::{ModelError, ModelResult};
use ndarray::{Array1, ArrayView1, ArrayView2};
use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    /// Euclidean norm of a complex sequence.
    pub fn norm(samples: ArrayView1<'_, Complex64>) -> f64 {
        samples.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn rms(samples: ArrayView1<'_, Complex64>) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Normalized mean squared error `||desired - actual||² / ||desired||²`.
    pub fn nmse(
        desired: ArrayView1<'_, Complex64>,
        actual: ArrayView1<'_, Complex64>,
    ) -> ModelResult<f64> {
        if desired.len() != actual.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "NMSE over {} desired and {} actual samples",
                desired.len(),
                actual.len()
            )));
        }
        let reference: f64 = desired.iter().map(|v| v.norm_sqr()).sum();
        if reference == 0.0 {
            return Err(ModelError::NumericalDegeneracy(
                "NMSE reference signal has zero energy".into(),
            ));
        }
        let error: f64 = desired
            .iter()
            .zip(actual.iter())
            .map(|(d, a)| (d - a).norm_sqr())
            .sum();
        Ok(error / reference)
    }

    /// Scales `signal` so its norm equals the norm of `reference`.
    pub fn normalize_gain(
        reference: ArrayView1<'_, Complex64>,
        signal: ArrayView1<'_, Complex64>,
    ) -> ModelResult<Array1<Complex64>> {
        let signal_norm = Self::norm(signal);
        if !signal_norm.is_finite() || signal_norm == 0.0 {
            return Err(ModelError::NumericalDegeneracy(format!(
                "cannot normalize gain of a signal with norm {}",
                signal_norm
            )));
        }
        let gain = Self::norm(reference) / signal_norm;
        Ok(signal.mapv(|v| v * gain))
    }

    /// NMSE after removing the overall gain difference between the signals.
    pub fn gain_normalized_nmse(
        desired: ArrayView1<'_, Complex64>,
        actual: ArrayView1<'_, Complex64>,
    ) -> ModelResult<f64> {
        let normalized = Self::normalize_gain(desired, actual)?;
        Self::nmse(desired, normalized.view())
    }

    /// Error vector magnitude in percent between transmitted and received grids.
    pub fn evm_percent(
        transmitted: ArrayView2<'_, Complex64>,
        received: ArrayView2<'_, Complex64>,
    ) -> ModelResult<f64> {
        if transmitted.dim() != received.dim() {
            return Err(ModelError::ShapeMismatch(format!(
                "EVM over {:?} transmitted and {:?} received symbols",
                transmitted.dim(),
                received.dim()
            )));
        }
        let reference: f64 = transmitted.iter().map(|v| v.norm_sqr()).sum();
        if reference == 0.0 {
            return Err(ModelError::NumericalDegeneracy(
                "EVM reference symbols have zero energy".into(),
            ));
        }
        let error: f64 = transmitted
            .iter()
            .zip(received.iter())
            .map(|(t, r)| (r - t).norm_sqr())
            .sum();
        Ok(100.0 * (error / reference).sqrt())
    }

    pub fn to_db(ratio: f64) -> f64 {
        10.0 * ratio.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn rms_zero_sequence_yields_zero() {
        assert_eq!(StatsHelper::rms(Array1::<Complex64>::zeros(0).view()), 0.0);
        assert_eq!(StatsHelper::rms(Array1::<Complex64>::zeros(3).view()), 0.0);
    }

    #[test]
    fn rms_handles_single_value() {
        assert_eq!(StatsHelper::rms(array![c(3.0, 4.0)].view()), 5.0);
    }

    #[test]
    fn nmse_is_zero_for_identical_signals() {
        let desired = array![c(1.0, -1.0), c(0.5, 2.0), c(-3.0, 0.0)];
        assert_eq!(StatsHelper::nmse(desired.view(), desired.view()).unwrap(), 0.0);
    }

    #[test]
    fn nmse_of_scaled_copy_is_squared_gain_error() {
        let desired = array![c(1.0, -1.0), c(0.5, 2.0), c(-3.0, 0.25)];
        for k in [0.0, 0.5, 0.9, 1.5, -2.0] {
            let actual = desired.mapv(|v| v * k);
            let nmse = StatsHelper::nmse(desired.view(), actual.view()).unwrap();
            assert_relative_eq!(nmse, (1.0_f64 - k).powi(2), epsilon = 1e-12);
        }
    }

    #[test]
    fn nmse_rejects_silent_reference_and_length_mismatch() {
        let silent = Array1::<Complex64>::zeros(2);
        let other = array![c(1.0, 0.0), c(1.0, 0.0)];
        assert!(matches!(
            StatsHelper::nmse(silent.view(), other.view()),
            Err(ModelError::NumericalDegeneracy(_))
        ));
        assert!(matches!(
            StatsHelper::nmse(other.view(), array![c(1.0, 0.0)].view()),
            Err(ModelError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn normalize_gain_matches_reference_norm() {
        let reference = array![c(1.0, 0.0), c(0.0, 1.0)];
        let signal = array![c(4.0, 0.0), c(0.0, 4.0)];
        let normalized = StatsHelper::normalize_gain(reference.view(), signal.view()).unwrap();
        assert_relative_eq!(StatsHelper::norm(normalized.view()), 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            StatsHelper::gain_normalized_nmse(reference.view(), signal.view()).unwrap(),
            0.0,
            epsilon = 1e-12
        );

        let silent = Array1::<Complex64>::zeros(2);
        assert!(matches!(
            StatsHelper::normalize_gain(reference.view(), silent.view()),
            Err(ModelError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn evm_reports_percent_error() {
        let tx = Array2::from_elem((2, 2), c(1.0, 1.0));
        let rx = tx.mapv(|v| v * 1.1);
        assert_relative_eq!(
            StatsHelper::evm_percent(tx.view(), rx.view()).unwrap(),
            10.0,
            epsilon = 1e-9
        );
        assert_eq!(StatsHelper::evm_percent(tx.view(), tx.view()).unwrap(), 0.0);
    }

    #[test]
    fn db_conversion() {
        assert_relative_eq!(StatsHelper::to_db(0.01), -20.0, epsilon = 1e-12);
    }
}
