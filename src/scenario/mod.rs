//! Concrete multi-domain topologies.

pub mod ecord;

pub use ecord::{CentralOffice, EcordScenario, EtherEdge, MetroCore, StaticNodes, PRIMARY_DOMAIN};
