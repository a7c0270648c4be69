//! Scenario loading from YAML, plus the CLI overrides applied on top.

use crate::analysis::export::CsvLayout;
use crate::config::{Config, OutputConfig};
use crate::topology::PlacementStrategy;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse a scenario from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    info!(
        "Loaded {} topology with {} jobs",
        config.topology.kind_name(),
        config.jobs.len()
    );

    config.validate()?;

    Ok(config)
}

/// Parse and validate a scenario held in memory
pub fn load_config_str(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml).wrap_err("Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct AnalysisOverrides {
    pub layout: Option<CsvLayout>,
    /// Forces random placement with this seed
    pub seed: Option<u64>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &AnalysisOverrides) -> Result<()> {
    if let Some(layout) = overrides.layout {
        info!("Overriding CSV layout: {:?}", layout);
        config
            .output
            .get_or_insert_with(OutputConfig::default)
            .layout = Some(layout);
    }

    if let Some(seed) = overrides.seed {
        info!("Overriding placement: random with seed {}", seed);
        config.placement = PlacementStrategy::Random { seed };
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
