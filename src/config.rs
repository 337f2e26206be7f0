use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// VLAN id to endpoint IP address handled by a VLAN-aware host
pub type VlanMap = BTreeMap<u16, String>;

/// Top-level run configuration.
///
/// Every section is optional in YAML; missing sections take the demo defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub scenario: ScenarioConfig,
    pub scripts: ScriptsConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.general.validate()?;
        self.scenario.validate()?;
        self.scripts.validate()?;
        Ok(())
    }
}

/// Logging and timing settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Upper bound on waiting for the runtime to report ready after start
    #[serde(with = "humantime_serde")]
    pub settle_timeout: Duration,
    /// How often readiness is polled during the settle phase
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl GeneralConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.log_level {
            match level.to_lowercase().as_str() {
                "error" | "warn" | "info" | "debug" | "trace" | "off" => {}
                _ => {
                    return Err(ValidationError::InvalidGeneral(format!(
                        "unknown log_level '{}'",
                        level
                    )))
                }
            }
        }
        if self.poll_interval.is_zero() {
            return Err(ValidationError::InvalidGeneral(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            settle_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Toggles that decide which entities and links the demo topology contains
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Connect site fabrics to their own control plane. When false the sites
    /// are configured statically by the static script.
    pub control_plane: bool,
    /// Use VLAN-aware traffic sources at the Ethernet edges
    pub vlan_hosts: bool,
    /// Replace the edges and transport with VLAN hosts wired straight to the
    /// cross-connects
    pub debug_xcs: bool,
    /// VLANs handled at the Ethernet edge of each site, in site order
    pub site_vlans: Vec<VlanMap>,
    /// VLANs of the four debug-mode VLAN hosts
    pub debug_vlans: Vec<VlanMap>,
}

/// Number of sites in the demo claw topology
pub const SITE_COUNT: usize = 3;
/// Number of VLAN hosts created in debug mode
pub const DEBUG_HOST_COUNT: usize = 4;

fn vlan_map(entries: &[(u16, &str)]) -> VlanMap {
    entries.iter().map(|(vlan, ip)| (*vlan, ip.to_string())).collect()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            control_plane: true,
            vlan_hosts: false,
            debug_xcs: false,
            site_vlans: vec![
                vlan_map(&[(100, "10.0.0.1"), (200, "10.0.0.2")]),
                vlan_map(&[(100, "10.0.0.3")]),
                vlan_map(&[(200, "10.0.0.4")]),
            ],
            debug_vlans: vec![
                vlan_map(&[(100, "10.0.0.100"), (200, "10.0.0.101")]),
                vlan_map(&[(101, "10.0.0.102"), (201, "10.0.0.103")]),
                vlan_map(&[(101, "10.0.0.104")]),
                vlan_map(&[(100, "10.0.0.105")]),
            ],
        }
    }
}

impl ScenarioConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.vlan_hosts && self.site_vlans.len() != SITE_COUNT {
            return Err(ValidationError::InvalidScenario(format!(
                "site_vlans must list {} VLAN maps when vlan_hosts is enabled, found {}",
                SITE_COUNT,
                self.site_vlans.len()
            )));
        }
        if self.debug_xcs && self.debug_vlans.len() != DEBUG_HOST_COUNT {
            return Err(ValidationError::InvalidScenario(format!(
                "debug_vlans must list {} VLAN maps when debug_xcs is enabled, found {}",
                DEBUG_HOST_COUNT,
                self.debug_vlans.len()
            )));
        }
        for map in self.site_vlans.iter().chain(self.debug_vlans.iter()) {
            Self::validate_vlan_map(map)?;
        }
        Ok(())
    }

    fn validate_vlan_map(map: &VlanMap) -> Result<(), ValidationError> {
        for (vlan, ip) in map {
            if !(1..=4094).contains(vlan) {
                return Err(ValidationError::InvalidScenario(format!(
                    "VLAN id {} is outside 1-4094",
                    vlan
                )));
            }
            if ip.parse::<IpAddr>().is_err() {
                return Err(ValidationError::InvalidScenario(format!(
                    "VLAN {} has invalid IP address '{}'",
                    vlan, ip
                )));
            }
        }
        Ok(())
    }
}

/// External static-configuration step
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Run the scripts at all
    pub enabled: bool,
    /// Interpreter used to run the scripts
    pub shell: String,
    /// Configures the statically managed nodes
    pub static_script: PathBuf,
    /// Pushes network configuration to the primary controller
    pub netcfg_script: PathBuf,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shell: "sh".to_string(),
            static_script: PathBuf::from("./static.sh"),
            netcfg_script: PathBuf::from("./netcfgs.sh"),
        }
    }
}

impl ScriptsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.shell.trim().is_empty() {
            return Err(ValidationError::InvalidScripts(
                "shell cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid scenario configuration: {0}")]
    InvalidScenario(String),
    #[error("Invalid scripts configuration: {0}")]
    InvalidScripts(String),
}
