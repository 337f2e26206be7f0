//! Serializable view of an emulated network.
//!
//! The binary writes a [`TopologySnapshot`] to disk after assembly so the
//! materialized topology can be inspected or fed to other tooling.

use crate::utils::options::Attrs;
use serde::{Deserialize, Serialize};

/// A switch or host as materialized by the runtime
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub name: String,
    /// Attributes exactly as declared
    #[serde(skip_serializing_if = "Attrs::is_empty", default)]
    pub attrs: Attrs,
    /// Interface ports in use on this node
    pub ports: Vec<u16>,
    /// Number of times the node has been started (switches only)
    #[serde(skip_serializing_if = "is_zero", default)]
    pub starts: u32,
    /// Controllers handed to the switch on its last start
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub controllers: Vec<String>,
}

/// One side of a link
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkEnd {
    pub node: String,
    pub port: u16,
}

/// A link between two nodes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkSnapshot {
    pub a: LinkEnd,
    pub b: LinkEnd,
    #[serde(skip_serializing_if = "Attrs::is_empty", default)]
    pub attrs: Attrs,
}

/// A controller instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub port: u16,
    pub started: bool,
}

/// Complete emulated topology
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TopologySnapshot {
    pub switches: Vec<NodeSnapshot>,
    pub hosts: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
    pub controllers: Vec<ControllerSnapshot>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}
