use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use netdomains::assembler::{AssemblySettings, TopologyAssembler};
use netdomains::config_loader::{self, CliOverrides};
use netdomains::process::{run_shell, ScriptConfigurator};
use netdomains::runtime::{EmulatedNetwork, Runtime, TopologySnapshot};
use netdomains::scenario::{EcordScenario, PRIMARY_DOMAIN};
use netdomains::utils::{validate_controller_args, UsageError};

/// Assemble a multi-domain metro-ethernet topology
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Controller IP sets, each a comma-separated list of addresses. Give one
    /// set shared by every domain, or four: one per site, then the metro core.
    #[arg(value_name = "CONTROLLER_SETS", required = true)]
    controller_sets: Vec<String>,

    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the assembled topology here (JSON if the extension is .json, YAML otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Command to hand control to once the topology is up
    #[arg(long)]
    shell: Option<String>,

    /// Configure site fabrics statically instead of through their controllers
    #[arg(long)]
    no_control_plane: bool,

    /// Use VLAN hosts at the Ethernet edges
    #[arg(long)]
    vlan: bool,

    /// Wire VLAN hosts straight to the cross-connects
    #[arg(long)]
    debug_xcs: bool,

    /// Do not launch the static configuration scripts
    #[arg(long)]
    skip_scripts: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            control_plane: self.no_control_plane.then_some(false),
            vlan_hosts: self.vlan.then_some(true),
            debug_xcs: self.debug_xcs.then_some(true),
            run_scripts: self.skip_scripts.then_some(false),
            log_level: self.log_level.clone(),
        }
    }
}

fn write_snapshot(snapshot: &TopologySnapshot, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::to_string_pretty(snapshot).wrap_err("Failed to serialize topology to JSON")?
    } else {
        serde_yaml::to_string(snapshot).wrap_err("Failed to serialize topology to YAML")?
    };
    fs::write(path, content).wrap_err_with(|| format!("Failed to write topology to '{}'", path.display()))?;
    info!("Topology written to {:?}", path);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Reject malformed controller sets before anything is constructed
    let sets = match validate_controller_args(&args.controller_sets) {
        Ok(sets) => sets,
        Err(e) => {
            let kind = match e {
                UsageError::WrongSetCount { .. } => ErrorKind::WrongNumberOfValues,
                UsageError::InvalidSet { .. } => ErrorKind::ValueValidation,
            };
            Args::command().error(kind, e).exit()
        }
    };

    let mut config = config_loader::load_or_default(args.config.as_deref())?;
    config_loader::apply_cli_overrides(&mut config, &args.overrides())?;

    let level = config.general.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Assembling topology with {} controller set(s)", sets.len());
    if let Some(path) = &args.config {
        info!("Configuration file: {:?}", path);
    }

    let scenario = EcordScenario::new(&config.scenario);
    let mut assembler = TopologyAssembler::new(scenario.domains(), scenario.wiring(), AssemblySettings::from(&config))?
        .with_primary_domain(PRIMARY_DOMAIN)?;
    let mut runtime = EmulatedNetwork::new();
    let mut configurator = ScriptConfigurator::new(&config.scripts, config.scenario.control_plane);

    let report = assembler
        .run(&mut runtime, &sets, &mut configurator)
        .wrap_err("Topology assembly failed")?;
    info!(
        "Assembled {} domains with {} cross-domain links",
        report.domains, report.cross_links
    );

    if let Some(path) = &args.output {
        write_snapshot(&runtime.snapshot(), path)?;
    }

    if let Some(command) = &args.shell {
        let status = run_shell(command, args.output.as_deref())?;
        if !status.success() {
            warn!("Shell exited with {}", status);
        }
    }

    runtime.stop()?;
    configurator.wait_all()?;
    info!("Topology torn down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["netdomains", "10.0.0.1,10.0.0.2"]);

        assert_eq!(args.controller_sets, vec!["10.0.0.1,10.0.0.2".to_string()]);
        assert_eq!(args.config, None);
        assert!(!args.no_control_plane);

        let overrides = args.overrides();
        assert_eq!(overrides.control_plane, None);
        assert_eq!(overrides.run_scripts, None);
    }

    #[test]
    fn test_flags_become_overrides() {
        let args = Args::parse_from([
            "netdomains",
            "10.0.1.1",
            "10.0.2.1",
            "10.0.3.1",
            "10.0.4.1",
            "--config",
            "demo.yaml",
            "--no-control-plane",
            "--vlan",
            "--skip-scripts",
            "--output",
            "topo.json",
        ]);

        assert_eq!(args.controller_sets.len(), 4);
        assert_eq!(args.config, Some(PathBuf::from("demo.yaml")));
        assert_eq!(args.output, Some(PathBuf::from("topo.json")));

        let overrides = args.overrides();
        assert_eq!(overrides.control_plane, Some(false));
        assert_eq!(overrides.vlan_hosts, Some(true));
        assert_eq!(overrides.debug_xcs, None);
        assert_eq!(overrides.run_scripts, Some(false));
    }

    #[test]
    fn test_controller_sets_required() {
        assert!(Args::try_parse_from(["netdomains"]).is_err());
    }

    #[test]
    fn test_snapshot_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = TopologySnapshot::default();

        let json = dir.path().join("topo.json");
        write_snapshot(&snapshot, &json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert!(parsed.get("switches").is_some());

        let yaml = dir.path().join("topo.yaml");
        write_snapshot(&snapshot, &yaml).unwrap();
        assert!(fs::read_to_string(&yaml).unwrap().contains("switches"));
    }
}
