use crate::config::LaunchConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load and parse a launch configuration from a YAML or JSON file.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
/// The configuration is validated before it is returned.
pub fn load_config(config_path: &Path) -> Result<LaunchConfig> {
    info!("Loading launch configuration from: {:?}", config_path);

    let content = fs::read_to_string(config_path)
        .wrap_err_with(|| format!("Failed to read config file '{}'", config_path.display()))?;

    let is_json = config_path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

    let config: LaunchConfig = if is_json {
        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse JSON config '{}'", config_path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse YAML config '{}'", config_path.display()))?
    };

    config.validate()?;

    info!("Loaded configuration for network '{}'", config.network_name);
    Ok(config)
}

/// CLI arguments that can override file settings
#[derive(Debug, Clone, Default)]
pub struct LaunchCliOverrides {
    pub api_port: Option<u16>,
    pub sync_tolerance: Option<Duration>,
}

/// Apply CLI overrides to a launch configuration
pub fn apply_overrides(config: &mut LaunchConfig, overrides: &LaunchCliOverrides) -> Result<()> {
    if let Some(port) = overrides.api_port {
        if let Some(previous) = config.explicit_api_port() {
            warn!("Overriding configured API port {} with {}", previous, port);
        }
        config.api_port = Some(port);
    }

    if let Some(tolerance) = overrides.sync_tolerance {
        info!("Sync tolerance override: {:?}", tolerance);
        config.sync_tolerance = Some(tolerance);
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
