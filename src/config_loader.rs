use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load the configuration file if one was given, otherwise use the defaults
pub fn load_or_default(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using built-in defaults");
            Ok(Config::default())
        }
    }
}

/// Command-line flags that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub control_plane: Option<bool>,
    pub vlan_hosts: Option<bool>,
    pub debug_xcs: Option<bool>,
    pub run_scripts: Option<bool>,
    pub log_level: Option<String>,
}

/// Apply CLI overrides to a configuration and re-validate it
pub fn apply_cli_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(control_plane) = overrides.control_plane {
        info!("Control plane for site fabrics overridden to {}", control_plane);
        config.scenario.control_plane = control_plane;
    }

    if let Some(vlan_hosts) = overrides.vlan_hosts {
        config.scenario.vlan_hosts = vlan_hosts;
    }

    if let Some(debug_xcs) = overrides.debug_xcs {
        config.scenario.debug_xcs = debug_xcs;
    }

    if let Some(run_scripts) = overrides.run_scripts {
        config.scripts.enabled = run_scripts;
    }

    if let Some(level) = &overrides.log_level {
        config.general.log_level = Some(level.clone());
    }

    config.validate()?;

    Ok(())
}
