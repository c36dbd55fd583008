use crate::generator::profile::TrainingSignal;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use phycore::math::StatsHelper;
use phycore::prelude::ModelResult;
use phycore::telemetry::MetricsRecorder;
use phycore::{PowerAmpModel, PredistorterModel};
use serde::Serialize;
use std::sync::Arc;

/// Scores of one identification and linearization run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub pa_order: usize,
    pub pa_memory_depth: usize,
    pub dpd_order: usize,
    pub dpd_memory_depth: usize,
    pub iterations: usize,
    pub samples: usize,
    pub pa_identification_nmse_db: f64,
    pub nmse_without_dpd_db: f64,
    pub nmse_with_dpd_db: f64,
    pub evm_without_dpd: f64,
    pub evm_with_dpd: f64,
    /// `[re, im]` pairs, branch-major.
    pub dpd_coefficients: Vec<[f64; 2]>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRecorder::new()))
    }

    pub fn with_metrics(config: WorkflowConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self { config, metrics }
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn execute(&self, training: &TrainingSignal) -> anyhow::Result<WorkflowResult> {
        let x = training.samples.view();

        let mut pa = self
            .track(PowerAmpModel::new(&self.config.pa))
            .context("building PA model")?;
        let bypassed = pa.transmit(x);
        self.metrics.record_transmission();
        let nmse_without = self
            .track(StatsHelper::gain_normalized_nmse(x, bypassed.view()))
            .context("scoring PA without DPD")?;
        let evm_without = training
            .evm_percent(bypassed.view())
            .context("scoring EVM without DPD")?;

        let mut identified = self
            .track(PowerAmpModel::new(&self.config.pa))
            .context("building PA model for identification")?;
        let identification_nmse = self
            .track(identified.fit_from(x, bypassed.view()))
            .context("identifying PA model")?;
        self.metrics.record_fit(identification_nmse);

        let mut dpd = self
            .track(PredistorterModel::new(&self.config.dpd))
            .context("building predistorter")?;
        self.track(dpd.train(&mut pa, x))
            .context("training predistorter")?;
        self.metrics.record_training();

        let linearized = pa.transmit(dpd.evaluate(x).view());
        self.metrics.record_transmission();
        let nmse_with = self
            .track(StatsHelper::gain_normalized_nmse(x, linearized.view()))
            .context("scoring PA with DPD")?;
        let evm_with = training
            .evm_percent(linearized.view())
            .context("scoring EVM with DPD")?;

        log::info!(
            "DPD order {} depth {}: NMSE {:.2} -> {:.2} dB, EVM {:.3} -> {:.3} %",
            self.config.dpd.order,
            self.config.dpd.memory_depth,
            StatsHelper::to_db(nmse_without),
            StatsHelper::to_db(nmse_with),
            evm_without,
            evm_with
        );

        Ok(WorkflowResult {
            pa_order: self.config.pa.order,
            pa_memory_depth: self.config.pa.memory_depth,
            dpd_order: self.config.dpd.order,
            dpd_memory_depth: self.config.dpd.memory_depth,
            iterations: self.config.dpd.iteration_count,
            samples: training.len(),
            pa_identification_nmse_db: StatsHelper::to_db(identification_nmse),
            nmse_without_dpd_db: StatsHelper::to_db(nmse_without),
            nmse_with_dpd_db: StatsHelper::to_db(nmse_with),
            evm_without_dpd: evm_without,
            evm_with_dpd: evm_with,
            dpd_coefficients: dpd.coefficients().iter().map(|c| [c.re, c.im]).collect(),
        })
    }

    fn track<T>(&self, result: ModelResult<T>) -> ModelResult<T> {
        if let Err(err) = &result {
            self.metrics.record_error(err);
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generator::profile::{build_training_signal, GeneratorConfig};
    use phycore::prelude::{PowerAmpConfig, PredistorterConfig};
    use phycore::waveform::OfdmConfig;

    pub(crate) fn small_workflow() -> WorkflowConfig {
        WorkflowConfig {
            pa: PowerAmpConfig {
                noise_variance: 0.0,
                add_iq_imbalance: false,
                ..Default::default()
            },
            dpd: PredistorterConfig {
                memory_depth: 4,
                ..Default::default()
            },
            generator: GeneratorConfig {
                ofdm: OfdmConfig {
                    n_subcarriers: 72,
                    cp_length: 9,
                    seed: 3,
                    ..Default::default()
                },
                n_symbols: 4,
                ..Default::default()
            },
        }
    }

    #[test]
    fn runner_linearizes_noiseless_pa() {
        let cfg = small_workflow();
        let training = build_training_signal(&cfg.generator).unwrap();
        let runner = Runner::new(cfg.clone());
        let result = runner.execute(&training).unwrap();

        assert!(
            result.nmse_with_dpd_db < result.nmse_without_dpd_db - 6.0,
            "{:?}",
            result
        );
        assert!(result.evm_with_dpd < result.evm_without_dpd, "{:?}", result);
        assert!(result.pa_identification_nmse_db < -100.0, "{:?}", result);
        assert_eq!(result.dpd_coefficients.len(), 3 * 4);
        assert_eq!(result.samples, training.len());

        let metrics = runner.metrics().snapshot();
        assert_eq!(metrics.fits, 1);
        assert_eq!(metrics.trainings, 1);
        assert!(metrics.transmissions >= 2);
    }

    #[test]
    fn runner_counts_model_errors() {
        let mut cfg = small_workflow();
        cfg.dpd.order = 4;
        let training = build_training_signal(&cfg.generator).unwrap();
        let runner = Runner::new(cfg);

        let err = runner.execute(&training).unwrap_err();
        assert!(format!("{:#}", err).contains("building predistorter"));
        assert_eq!(runner.metrics().snapshot().invalid_parameters, 1);
    }
}
