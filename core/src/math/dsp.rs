use crate::prelude::{ModelError, ModelResult};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Shifts `signal` in frequency by mixing with a complex exponential.
pub fn frequency_shift(
    signal: ArrayView1<'_, Complex64>,
    shift_hz: f64,
    sampling_rate: f64,
) -> ModelResult<Array1<Complex64>> {
    let step = phase_step(shift_hz, sampling_rate)?;
    Ok(signal
        .iter()
        .enumerate()
        .map(|(n, &sample)| sample * Complex64::from_polar(1.0, step * n as f64))
        .collect())
}

/// Unit-magnitude complex exponential `exp(j 2π f n / fs)`.
pub fn complex_tone(
    length: usize,
    frequency_hz: f64,
    sampling_rate: f64,
) -> ModelResult<Array1<Complex64>> {
    let step = phase_step(frequency_hz, sampling_rate)?;
    Ok((0..length)
        .map(|n| Complex64::from_polar(1.0, step * n as f64))
        .collect())
}

fn phase_step(frequency_hz: f64, sampling_rate: f64) -> ModelResult<f64> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(ModelError::InvalidParameter(format!(
            "sampling rate must be positive, got {}",
            sampling_rate
        )));
    }
    Ok(2.0 * PI * frequency_hz / sampling_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shifting_a_tone_moves_its_frequency() {
        let tone = complex_tone(64, 1.0e6, 10.0e6).unwrap();
        let shifted = frequency_shift(tone.view(), 0.5e6, 10.0e6).unwrap();
        let expected = complex_tone(64, 1.5e6, 10.0e6).unwrap();
        for (got, want) in shifted.iter().zip(expected.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-9);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn shift_and_unshift_round_trip() {
        let tone = complex_tone(32, 2.0e3, 48.0e3).unwrap();
        let there = frequency_shift(tone.view(), 3.0e3, 48.0e3).unwrap();
        let back = frequency_shift(there.view(), -3.0e3, 48.0e3).unwrap();
        for (got, want) in back.iter().zip(tone.iter()) {
            assert!((got - want).norm() < 1e-12);
        }
    }

    #[test]
    fn rejects_non_positive_sampling_rate() {
        assert!(matches!(
            complex_tone(4, 1.0, 0.0),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_signal_stays_empty() {
        let empty = Array1::<Complex64>::zeros(0);
        assert!(frequency_shift(empty.view(), 1.0, 1.0).unwrap().is_empty());
    }
}
