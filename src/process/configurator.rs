//! Static-configuration step.
//!
//! After every domain has started, the statically managed nodes are
//! configured by a shell script, and the network configuration is pushed to
//! the primary controller by a second script. Both are launched and left
//! running; the assembler does not wait for them to finish.

use super::ProcessError;
use crate::config::ScriptsConfig;
use log::{info, warn};
use std::path::PathBuf;
use std::process::{Child, Command};

/// The opaque configuration step invoked at the end of assembly
pub trait StaticConfigurator {
    /// `primary_controller` is the address of the metro domain's first
    /// controller, if there is one
    fn configure(&mut self, primary_controller: Option<&str>) -> Result<(), ProcessError>;
}

/// Runs the static and netcfg scripts through a shell
#[derive(Debug)]
pub struct ScriptConfigurator {
    shell: String,
    static_script: PathBuf,
    netcfg_script: PathBuf,
    control_plane: bool,
    enabled: bool,
    children: Vec<(String, Child)>,
}

impl ScriptConfigurator {
    pub fn new(scripts: &ScriptsConfig, control_plane: bool) -> Self {
        Self {
            shell: scripts.shell.clone(),
            static_script: scripts.static_script.clone(),
            netcfg_script: scripts.netcfg_script.clone(),
            control_plane,
            enabled: scripts.enabled,
            children: Vec::new(),
        }
    }

    /// `sh static.sh static` when sites are statically configured, otherwise
    /// the mode argument is empty
    pub fn static_command(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.static_script)
            .arg(if self.control_plane { "" } else { "static" });
        cmd
    }

    /// `sh netcfgs.sh <controller address>`
    pub fn netcfg_command(&self, primary_controller: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.netcfg_script).arg(primary_controller.unwrap_or(""));
        cmd
    }

    fn spawn(&mut self, label: String, mut cmd: Command) -> Result<(), ProcessError> {
        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: label.clone(),
            source,
        })?;
        info!("Launched {} (pid {})", label, child.id());
        self.children.push((label, child));
        Ok(())
    }

    /// Reap every script launched so far
    pub fn wait_all(&mut self) -> Result<(), ProcessError> {
        for (label, mut child) in self.children.drain(..) {
            let status = child.wait().map_err(|source| ProcessError::Wait {
                program: label.clone(),
                source,
            })?;
            if !status.success() {
                warn!("{} exited with {}", label, status);
            }
        }
        Ok(())
    }
}

impl StaticConfigurator for ScriptConfigurator {
    fn configure(&mut self, primary_controller: Option<&str>) -> Result<(), ProcessError> {
        if !self.enabled {
            info!("Static configuration scripts disabled, skipping");
            return Ok(());
        }

        info!("Configuring static nodes...");
        let static_label = self.static_script.display().to_string();
        let cmd = self.static_command();
        self.spawn(static_label, cmd)?;

        let netcfg_label = self.netcfg_script.display().to_string();
        let cmd = self.netcfg_command(primary_controller);
        self.spawn(netcfg_label, cmd)?;
        Ok(())
    }
}
