//! External processes around an assembled topology.
//!
//! Two boundaries live here: the static-configuration step run once every
//! domain has started, and the interactive shell that takes over afterwards.
//! Neither is implemented by this crate; both are delegated to external
//! programs.

pub mod configurator;
pub mod shell;

pub use configurator::{ScriptConfigurator, StaticConfigurator};
pub use shell::run_shell;

/// Errors launching or waiting on an external process
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
