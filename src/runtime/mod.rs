//! Network-emulation runtime boundary.
//!
//! Domains never construct switches, hosts, links or controllers themselves.
//! They hand their declarations to a [`Runtime`], which materializes them and
//! returns live handles. The handle types are chosen by the runtime; the core
//! only stores and passes them back.
//!
//! [`emulator::EmulatedNetwork`] is the in-process implementation used by the
//! binary and the tests.

pub mod emulator;
pub mod types;

use crate::utils::options::Attrs;
use std::fmt;

pub use emulator::{ControllerId, EmulatedNetwork, LinkId, NodeId};
pub use types::{ControllerSnapshot, LinkSnapshot, NodeSnapshot, TopologySnapshot};

/// Default OpenFlow port used when a controller binding carries no port
pub const DEFAULT_CONTROLLER_PORT: u16 = 6653;

/// Errors reported by a runtime while materializing or starting entities
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("a node or controller named '{name}' already exists in the runtime")]
    DuplicateNode { name: String },

    #[error("unknown runtime handle {0}")]
    UnknownHandle(String),

    #[error("port {port} on '{node}' is already connected")]
    PortInUse { node: String, port: u16 },

    #[error("'{name}' is not a switch")]
    NotASwitch { name: String },

    #[error("invalid attribute '{key}' on '{name}': {reason}")]
    InvalidAttribute { name: String, key: String, reason: String },

    #[error("runtime has been stopped")]
    Stopped,
}

/// Operations a network-emulation runtime exposes to domains
pub trait Runtime {
    /// Handle of a switch or host
    type Node: Clone + fmt::Debug;
    /// Handle of a link
    type Link: Clone + fmt::Debug;
    /// Handle of a controller
    type Controller: Clone + fmt::Debug;

    fn add_switch(&mut self, name: &str, attrs: &Attrs) -> Result<Self::Node, RuntimeError>;

    fn add_host(&mut self, name: &str, attrs: &Attrs) -> Result<Self::Node, RuntimeError>;

    fn add_link(&mut self, a: &Self::Node, b: &Self::Node, attrs: &Attrs) -> Result<Self::Link, RuntimeError>;

    fn add_controller(&mut self, name: &str, attrs: &Attrs) -> Result<Self::Controller, RuntimeError>;

    fn start_controller(&mut self, controller: &Self::Controller) -> Result<(), RuntimeError>;

    /// Bring a switch up. The runtime decides which of `controllers` the
    /// switch actually connects to.
    fn start_switch(&mut self, switch: &Self::Node, controllers: &[Self::Controller]) -> Result<(), RuntimeError>;

    /// Network address a controller listens on, if it has one
    fn controller_address(&self, controller: &Self::Controller) -> Option<String>;

    /// Whether every started entity reports ready
    fn is_ready(&self) -> bool {
        true
    }

    /// Tear down everything the runtime created
    fn stop(&mut self) -> Result<(), RuntimeError>;
}
