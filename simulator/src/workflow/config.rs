use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use phycore::prelude::{PowerAmpConfig, PredistorterConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub pa: PowerAmpConfig,
    pub dpd: PredistorterConfig,
    pub generator: GeneratorConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(pa: PowerAmpConfig, dpd: PredistorterConfig, n_symbols: usize) -> Self {
        Self {
            pa,
            dpd,
            generator: GeneratorConfig {
                n_symbols,
                ..Default::default()
            },
        }
    }

    /// Copy of this workflow with a different predistorter order.
    pub fn with_dpd_order(&self, order: usize) -> Self {
        let mut config = self.clone();
        config.dpd.order = order;
        config
    }
}
