use anyhow::Context;
use clap::Parser;
use generator::profile::build_training_signal;
use phycore::prelude::{PowerAmpConfig, PredistorterConfig};
use phycore::telemetry::MetricsRecorder;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, WorkflowResult};
use workflow::sweep::run_order_sweep;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline PA identification and DPD training driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// PA nonlinearity order (odd)
    #[arg(long, default_value_t = 5)]
    order: usize,
    #[arg(long, default_value_t = 4)]
    memory_depth: usize,
    #[arg(long, default_value_t = 0.05)]
    noise_variance: f64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, default_value_t = 5)]
    dpd_order: usize,
    #[arg(long, default_value_t = 4)]
    dpd_memory_depth: usize,
    /// ILA iterations
    #[arg(long, default_value_t = 2)]
    iterations: usize,
    /// OFDM symbols in the training signal
    #[arg(long, default_value_t = 10)]
    symbols: usize,
    /// Run one workflow per DPD order, e.g. `--sweep 1,3,5,7`
    #[arg(long, value_delimiter = ',')]
    sweep: Vec<usize>,
    /// JSON-lines report, appended to
    #[arg(long, default_value = "tools/data/dpd_report.jsonl")]
    report: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        let pa = PowerAmpConfig {
            order: args.order,
            memory_depth: args.memory_depth,
            noise_variance: args.noise_variance,
            seed: args.seed,
            ..Default::default()
        };
        let dpd = PredistorterConfig {
            order: args.dpd_order,
            memory_depth: args.dpd_memory_depth,
            iteration_count: args.iterations,
            ..Default::default()
        };
        WorkflowConfig::from_args(pa, dpd, args.symbols)
    };

    let metrics = Arc::new(MetricsRecorder::new());
    let results = if args.sweep.is_empty() {
        let training = build_training_signal(&workflow_config.generator)?;
        let runner = Runner::with_metrics(workflow_config, metrics.clone());
        vec![runner.execute(&training)?]
    } else {
        run_order_sweep(&workflow_config, &args.sweep, metrics.clone())?
    };

    for result in &results {
        println!(
            "DPD order {} depth {} -> NMSE {:.2} dB (without {:.2} dB), EVM {:.3}% (without {:.3}%), PA fit {:.2} dB",
            result.dpd_order,
            result.dpd_memory_depth,
            result.nmse_with_dpd_db,
            result.nmse_without_dpd_db,
            result.evm_with_dpd,
            result.evm_without_dpd,
            result.pa_identification_nmse_db
        );
    }

    append_report(&args.report, &results)?;
    log::info!("metrics: {:?}", metrics.snapshot());
    Ok(())
}

fn append_report(path: &Path, results: &[WorkflowResult]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    for result in results {
        let line = serde_json::to_string(result).context("serializing workflow result")?;
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runner::tests::small_workflow;

    #[test]
    fn report_appends_one_line_per_result() {
        let cfg = small_workflow();
        let training = build_training_signal(&cfg.generator).unwrap();
        let result = Runner::new(cfg).execute(&training).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("dpd.jsonl");
        append_report(&path, &[result.clone()]).unwrap();
        append_report(&path, &[result]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["dpd_order"], 5);
        assert_eq!(parsed["dpd_coefficients"].as_array().unwrap().len(), 12);
    }
}
