//! Domain type definitions.

use crate::registry::{EntityKind, RegistryError};
use crate::runtime::RuntimeError;
use std::fmt;

/// Role a domain plays when controllers are allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainRole {
    /// Statically configured nodes. Always the first domain.
    Static,
    /// A site fabric (central office)
    Site,
    /// Metro or transport nodes
    Metro,
}

impl DomainRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainRole::Static => "static",
            DomainRole::Site => "site",
            DomainRole::Metro => "metro",
        }
    }

    /// Single-letter tag used in synthesized controller names
    pub fn tag(&self) -> char {
        match self {
            DomainRole::Static => 's',
            DomainRole::Site => 'f',
            DomainRole::Metro => 'm',
        }
    }
}

impl fmt::Display for DomainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while declaring, injecting or starting a domain
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("domain {domain}: {source}")]
    Registry {
        domain: u32,
        #[source]
        source: RegistryError,
    },

    #[error("domain {domain}: link {link} references '{endpoint}', which is not a switch or host of this domain")]
    UnresolvedEndpoint { domain: u32, link: String, endpoint: String },

    #[error("domain {domain} has already been injected")]
    AlreadyInjected { domain: u32 },

    #[error("domain {domain}: runtime rejected {kind} '{name}': {source}")]
    Runtime {
        domain: u32,
        kind: EntityKind,
        name: String,
        #[source]
        source: RuntimeError,
    },
}
