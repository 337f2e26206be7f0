//! Cross-domain topology.
//!
//! A domain's own link declarations can only reference names local to that
//! domain. Links that span domains are described here instead, as a
//! [`WiringPlan`] of endpoint pairs that is checked against the domains'
//! declarations and applied once every domain has been injected.

pub mod types;
pub mod interconnect;
pub mod wiring;

// Re-export key types and functions for easier access
pub use types::{CrossLink, EndpointRef, NodeKind};
pub use interconnect::connect;
pub use wiring::{WiringError, WiringPlan};
