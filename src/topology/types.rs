//! Cross-domain link type definitions.

use crate::registry::EntityKind;
use crate::utils::options::Attrs;
use std::fmt;

/// Kind of node a cross-domain endpoint refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Switch,
    Host,
}

impl NodeKind {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            NodeKind::Switch => EntityKind::Switch,
            NodeKind::Host => EntityKind::Host,
        }
    }
}

/// A node named locally inside one domain of the assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    /// Position of the domain in the assembler's domain list
    pub domain: usize,
    pub kind: NodeKind,
    pub name: String,
}

impl EndpointRef {
    pub fn switch(domain: usize, name: &str) -> Self {
        Self {
            domain,
            kind: NodeKind::Switch,
            name: name.to_string(),
        }
    }

    pub fn host(domain: usize, name: &str) -> Self {
        Self {
            domain,
            kind: NodeKind::Host,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.domain, self.name)
    }
}

/// A link between two endpoints that may live in different domains
#[derive(Debug, Clone, PartialEq)]
pub struct CrossLink {
    pub a: EndpointRef,
    pub b: EndpointRef,
    pub attrs: Attrs,
}

impl fmt::Display for CrossLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}
