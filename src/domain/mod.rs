//! Control domains.
//!
//! A [`Domain`] is a network subgraph associated with its own set of
//! controllers. It is a container of switch, host, link and controller
//! declarations that gets dumped into a [`Runtime`](crate::runtime::Runtime),
//! after which every declared name maps to a live handle.
//!
//! ## Lifecycle
//!
//! 1. **Declare**: a [`Blueprint`] populates the domain through the
//!    [`Declarer`] API. No runtime objects exist yet.
//! 2. **Inject**: [`Domain::inject_into`] materializes switches, then hosts,
//!    then links, then controllers, and records each returned handle.
//! 3. **Lookup**: [`Domain::switch`], [`Domain::host`] and
//!    [`Domain::controller`] resolve names to handles, which is how other
//!    domains and the assembler reach entities across domain boundaries.
//! 4. **Start**: [`Domain::start`] starts the controllers, then every switch
//!    with the full controller set of the domain.

pub mod types;
pub mod blueprint;
pub mod lifecycle;

pub use types::{DomainError, DomainRole};
pub use blueprint::{Blueprint, Declarer, EmptyBlueprint};
pub use lifecycle::Domain;
