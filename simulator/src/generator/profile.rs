use anyhow::Context;
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use phycore::math::dsp::frequency_shift;
use phycore::math::StatsHelper;
use phycore::waveform::{OfdmConfig, OfdmFrame, OfdmModulator};
use serde::{Deserialize, Serialize};

/// Configuration for the OFDM training signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub ofdm: OfdmConfig,
    pub n_symbols: usize,
    pub target_rms: f64,
    pub frequency_offset_hz: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            ofdm: OfdmConfig::default(),
            n_symbols: 10,
            target_rms: 0.3,
            frequency_offset_hz: 0.0,
        }
    }
}

/// Drive signal handed to the PA, plus what is needed to score it later.
pub struct TrainingSignal {
    pub samples: Array1<Complex64>,
    pub frame: OfdmFrame,
    pub modulator: OfdmModulator,
    pub scale: f64,
    pub frequency_offset_hz: f64,
}

impl TrainingSignal {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// EVM of `received` against the transmitted grid after undoing gain,
    /// frequency offset and drive scaling.
    pub fn evm_percent(&self, received: ArrayView1<'_, Complex64>) -> anyhow::Result<f64> {
        let normalized = StatsHelper::normalize_gain(self.samples.view(), received)
            .context("normalizing received gain")?;
        let unshifted = frequency_shift(
            normalized.view(),
            -self.frequency_offset_hz,
            self.modulator.sampling_rate(),
        )
        .context("removing frequency offset")?;
        let unscaled = unshifted.mapv(|v| v / self.scale);
        let grid = self
            .modulator
            .demodulate(unscaled.view(), self.frame.n_symbols())
            .context("demodulating received signal")?;
        let evm = OfdmModulator::evm_percent(self.frame.symbols.view(), grid.view())
            .context("scoring EVM")?;
        Ok(evm)
    }
}

pub fn build_training_signal(config: &GeneratorConfig) -> anyhow::Result<TrainingSignal> {
    if !config.target_rms.is_finite() || config.target_rms <= 0.0 {
        anyhow::bail!("target RMS must be positive, got {}", config.target_rms);
    }
    let modulator =
        OfdmModulator::new(config.ofdm.clone()).context("configuring OFDM modulator")?;
    let frame = modulator
        .modulate(config.n_symbols)
        .context("modulating training frame")?;

    let rms = StatsHelper::rms(frame.samples.view());
    if rms == 0.0 {
        anyhow::bail!("training frame of {} symbols is silent", config.n_symbols);
    }
    let scale = config.target_rms / rms;
    let scaled = frame.samples.mapv(|v| v * scale);
    let samples = frequency_shift(
        scaled.view(),
        config.frequency_offset_hz,
        modulator.sampling_rate(),
    )
    .context("applying frequency offset")?;

    log::info!(
        "training signal: {} samples at {:.2} MS/s, RMS {}",
        samples.len(),
        modulator.sampling_rate() / 1e6,
        config.target_rms
    );

    Ok(TrainingSignal {
        samples,
        frame,
        modulator,
        scale,
        frequency_offset_hz: config.frequency_offset_hz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_generator() -> GeneratorConfig {
        GeneratorConfig {
            ofdm: OfdmConfig {
                n_subcarriers: 72,
                cp_length: 9,
                seed: 3,
                ..Default::default()
            },
            n_symbols: 4,
            ..Default::default()
        }
    }

    #[test]
    fn training_signal_hits_target_rms() {
        let signal = build_training_signal(&small_generator()).unwrap();
        assert_eq!(signal.len(), 4 * (128 + 9));
        assert!((StatsHelper::rms(signal.samples.view()) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn clean_channel_scores_zero_evm() {
        let signal = build_training_signal(&small_generator()).unwrap();
        let received = signal.samples.mapv(|v| v * 2.5);
        assert!(signal.evm_percent(received.view()).unwrap() < 1e-9);
    }

    #[test]
    fn frequency_offset_is_removed_before_demodulation() {
        let config = GeneratorConfig {
            frequency_offset_hz: 250_000.0,
            ..small_generator()
        };
        let signal = build_training_signal(&config).unwrap();
        assert!(signal.evm_percent(signal.samples.view()).unwrap() < 1e-9);
    }

    #[test]
    fn rejects_bad_generator_settings() {
        let silent = GeneratorConfig {
            target_rms: 0.0,
            ..small_generator()
        };
        assert!(build_training_signal(&silent).is_err());

        let empty = GeneratorConfig {
            n_symbols: 0,
            ..small_generator()
        };
        assert!(build_training_signal(&empty).is_err());
    }
}
