//! # Entity Registry Module
//!
//! Per-domain bookkeeping that maps symbolic names to declared construction
//! attributes, and later to the live handles the runtime returns for them.
//!
//! ## Two phases, two maps
//!
//! Runtime objects do not exist until a domain is injected, so every registry
//! keeps two separate maps:
//!
//! - **declared**: name -> [`Attrs`](crate::utils::options::Attrs), filled by
//!   `add_switch`/`add_host`/`add_link`/`add_controller`
//! - **resolved**: name -> handle, filled only by `inject_into`
//!
//! A name is resolvable only if it was declared and then injected; nothing
//! ever appears in the resolved map without a matching declaration.
//!
//! ## Duplicate declarations
//!
//! By default a second declaration of the same name is rejected with
//! [`RegistryError::DuplicateName`]. Callers that want the last declaration to
//! win must opt in with [`DuplicatePolicy::Overwrite`].

pub mod types;
pub mod entity;

pub use types::{DuplicatePolicy, EntityKind, LinkKey, RegistryError};
pub use entity::Registry;
