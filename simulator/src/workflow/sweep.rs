use crate::generator::profile::{build_training_signal, TrainingSignal};
use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::{Runner, WorkflowResult};
use anyhow::Context;
use phycore::telemetry::MetricsRecorder;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;

/// Runs the workflow once per predistorter order on blocking worker threads.
///
/// Every job shares one training signal and one metrics recorder. Results
/// come back sorted by order.
pub fn run_order_sweep(
    config: &WorkflowConfig,
    orders: &[usize],
    metrics: Arc<MetricsRecorder>,
) -> anyhow::Result<Vec<WorkflowResult>> {
    let training: Arc<TrainingSignal> = Arc::new(
        build_training_signal(&config.generator).context("building sweep training signal")?,
    );

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for order sweep")?;

    let mut results = runtime.block_on(async {
        let mut handles = Vec::with_capacity(orders.len());
        for &order in orders {
            let runner = Runner::with_metrics(config.with_dpd_order(order), metrics.clone());
            let training = training.clone();
            handles.push((
                order,
                tokio::task::spawn_blocking(move || runner.execute(&training)),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (order, handle) in handles {
            let result = handle
                .await
                .with_context(|| format!("joining sweep job for DPD order {}", order))?
                .with_context(|| format!("running workflow for DPD order {}", order))?;
            results.push(result);
        }
        Ok::<_, anyhow::Error>(results)
    })?;

    results.sort_by_key(|result| result.dpd_order);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runner::tests::small_workflow;

    #[test]
    fn sweep_returns_one_result_per_order_sorted() {
        let metrics = Arc::new(MetricsRecorder::new());
        let results = run_order_sweep(&small_workflow(), &[5, 1, 3], metrics.clone()).unwrap();

        let orders: Vec<usize> = results.iter().map(|r| r.dpd_order).collect();
        assert_eq!(orders, vec![1, 3, 5]);
        assert_eq!(results[0].dpd_coefficients.len(), 4);
        assert_eq!(results[2].dpd_coefficients.len(), 12);
        assert_eq!(metrics.snapshot().trainings, 3);
    }

    #[test]
    fn sweep_fails_on_invalid_order() {
        let metrics = Arc::new(MetricsRecorder::new());
        let err = run_order_sweep(&small_workflow(), &[5, 2], metrics.clone()).unwrap_err();
        assert!(format!("{:#}", err).contains("DPD order 2"));
        assert_eq!(metrics.snapshot().invalid_parameters, 1);
    }
}
