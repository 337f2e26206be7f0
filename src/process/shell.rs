//! Hand-off to an external interactive shell.

use super::ProcessError;
use log::info;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Environment variable pointing the shell at the topology snapshot
pub const TOPOLOGY_ENV: &str = "NETDOMAINS_TOPOLOGY";

/// Run `command` through `sh -c` with inherited stdio and wait for it to
/// exit. The snapshot path, if any, is exported as [`TOPOLOGY_ENV`].
pub fn run_shell(command: &str, topology: Option<&Path>) -> Result<ExitStatus, ProcessError> {
    info!("Handing control to '{}'", command);
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(path) = topology {
        cmd.env(TOPOLOGY_ENV, path);
    }

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: command.to_string(),
        source,
    })?;
    let status = child.wait().map_err(|source| ProcessError::Wait {
        program: command.to_string(),
        source,
    })?;
    info!("Shell exited with {}", status);
    Ok(status)
}
