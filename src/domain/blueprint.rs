//! Declare-phase API.
//!
//! Blueprints describe what a domain contains. They only ever see names and
//! attributes; runtime handles do not exist at this point and cannot leak in.

use crate::registry::RegistryError;
use crate::utils::options::Attrs;

/// Declaration operations available while a domain is being built
pub trait Declarer {
    /// Identity of the domain being declared
    fn id(&self) -> u32;

    fn add_switch(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError>;

    fn add_host(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError>;

    fn add_controller(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError>;

    /// Declare a link between two names local to this domain
    fn add_link(&mut self, src: &str, dst: &str, attrs: Attrs) -> Result<(String, String), RegistryError>;
}

/// Topology content of a domain, similar to a Mininet `Topo`
pub trait Blueprint {
    /// Short name used in logs
    fn name(&self) -> &str {
        "domain"
    }

    /// Populate the domain. The default declares nothing.
    fn build(&self, _domain: &mut dyn Declarer) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Blueprint that declares nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBlueprint;

impl Blueprint for EmptyBlueprint {}
