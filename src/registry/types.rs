//! Registry type definitions.

use std::fmt;

/// Kind of entity held by a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Switch,
    Host,
    Link,
    Controller,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Switch => "switch",
            EntityKind::Host => "host",
            EntityKind::Link => "link",
            EntityKind::Controller => "controller",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a name is declared twice in the same registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with [`RegistryError::DuplicateName`]
    #[default]
    Reject,
    /// Replace the earlier declaration (last write wins)
    Overwrite,
}

/// Key of a link declaration: an ordered pair of names local to one domain
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkKey {
    pub src: String,
    pub dst: String,
}

impl LinkKey {
    pub fn new(src: &str, dst: &str) -> Self {
        Self {
            src: src.to_string(),
            dst: dst.to_string(),
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// Registry lookup and declaration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already declared")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("no {kind} named '{name}' has been resolved")]
    UnknownName { kind: EntityKind, name: String },
}
