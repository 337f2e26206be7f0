//! Controller allocation.
//!
//! Decides which controller cluster each domain connects to, based on how
//! many controller IP sets were supplied and whether site fabrics run their
//! own control plane.

pub mod policy;

pub use policy::{
    assign_controllers, ControllerBinding, ControllerSet, ControllerSetError, DomainSlot, PolicyError,
    LOOPBACK_CONTROLLER_IP, LOOPBACK_CONTROLLER_PORT,
};
