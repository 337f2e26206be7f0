//! Declarative cross-domain wiring.

use super::interconnect::connect;
use super::types::{CrossLink, EndpointRef, NodeKind};
use crate::domain::Domain;
use crate::registry::{EntityKind, RegistryError};
use crate::runtime::{Runtime, RuntimeError};
use crate::utils::options::Attrs;
use log::{debug, info};

/// Errors validating or applying a wiring plan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WiringError {
    #[error("endpoint {endpoint} refers to domain position {position}, but only {count} domains exist")]
    UnknownDomain { endpoint: String, position: usize, count: usize },

    #[error("endpoint {endpoint}: domain {domain} declares no {kind} named '{name}'")]
    UndeclaredEndpoint { endpoint: String, domain: u32, kind: EntityKind, name: String },

    #[error("cross-domain link {link}: {source}")]
    Unresolved {
        link: String,
        #[source]
        source: RegistryError,
    },

    #[error("cross-domain link {link}: {source}")]
    Runtime {
        link: String,
        #[source]
        source: RuntimeError,
    },
}

/// Ordered list of links that span domains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WiringPlan {
    links: Vec<CrossLink>,
}

impl WiringPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn link(mut self, a: EndpointRef, b: EndpointRef, attrs: Attrs) -> Self {
        self.push(a, b, attrs);
        self
    }

    pub fn push(&mut self, a: EndpointRef, b: EndpointRef, attrs: Attrs) {
        self.links.push(CrossLink { a, b, attrs });
    }

    pub fn links(&self) -> &[CrossLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Check every endpoint against the declarations of the domains, before
    /// anything has been injected
    pub fn validate<R: Runtime>(&self, domains: &[Domain<R>]) -> Result<(), WiringError> {
        for link in &self.links {
            for endpoint in [&link.a, &link.b] {
                let domain = domain_at(domains, endpoint)?;
                let kind = endpoint.kind.entity_kind();
                if !domain.is_declared(kind, &endpoint.name) {
                    return Err(WiringError::UndeclaredEndpoint {
                        endpoint: endpoint.to_string(),
                        domain: domain.id(),
                        kind,
                        name: endpoint.name.clone(),
                    });
                }
            }
        }
        debug!("Wiring plan of {} links validated against {} domains", self.links.len(), domains.len());
        Ok(())
    }

    /// Resolve both ends of every link through the owning domains and connect
    /// them. Returns the number of links created.
    pub fn apply<R: Runtime>(&self, domains: &[Domain<R>], runtime: &mut R) -> Result<usize, WiringError> {
        for link in &self.links {
            let a = resolve(domains, link, &link.a)?;
            let b = resolve(domains, link, &link.b)?;
            connect(runtime, &a, &b, &link.attrs).map_err(|source| WiringError::Runtime {
                link: link.to_string(),
                source,
            })?;
            debug!("Wired {}", link);
        }
        info!("Wired {} cross-domain links", self.links.len());
        Ok(self.links.len())
    }
}

fn domain_at<'a, R: Runtime>(domains: &'a [Domain<R>], endpoint: &EndpointRef) -> Result<&'a Domain<R>, WiringError> {
    domains.get(endpoint.domain).ok_or_else(|| WiringError::UnknownDomain {
        endpoint: endpoint.to_string(),
        position: endpoint.domain,
        count: domains.len(),
    })
}

fn resolve<R: Runtime>(domains: &[Domain<R>], link: &CrossLink, endpoint: &EndpointRef) -> Result<R::Node, WiringError> {
    let domain = domain_at(domains, endpoint)?;
    let handle = match endpoint.kind {
        NodeKind::Switch => domain.switch(&endpoint.name),
        NodeKind::Host => domain.host(&endpoint.name),
    };
    handle.cloned().map_err(|source| WiringError::Unresolved {
        link: link.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Declarer, DomainRole};
    use crate::runtime::EmulatedNetwork;

    type EmuDomain = Domain<EmulatedNetwork>;

    fn two_domains() -> Vec<EmuDomain> {
        let mut stat: EmuDomain = Domain::empty(0, DomainRole::Static);
        stat.add_switch("ovs1", Attrs::new()).unwrap();
        stat.add_host("vh1", Attrs::new()).unwrap();
        let mut site: EmuDomain = Domain::empty(1, DomainRole::Site);
        site.add_switch("xc1", Attrs::new()).unwrap();
        vec![stat, site]
    }

    #[test]
    fn test_validate_catches_unknown_domain_and_name() {
        let domains = two_domains();

        let plan = WiringPlan::new().link(EndpointRef::switch(1, "xc1"), EndpointRef::switch(5, "ovs1"), Attrs::new());
        assert!(matches!(
            plan.validate(&domains),
            Err(WiringError::UnknownDomain { position: 5, count: 2, .. })
        ));

        // vh1 is a host, not a switch
        let plan = WiringPlan::new().link(EndpointRef::switch(1, "xc1"), EndpointRef::switch(0, "vh1"), Attrs::new());
        assert!(matches!(
            plan.validate(&domains),
            Err(WiringError::UndeclaredEndpoint { domain: 0, kind: EntityKind::Switch, .. })
        ));

        let plan = WiringPlan::new().link(EndpointRef::host(0, "vh1"), EndpointRef::switch(1, "xc1"), Attrs::new());
        assert!(plan.validate(&domains).is_ok());
    }

    #[test]
    fn test_apply_connects_resolved_nodes() {
        let mut net = EmulatedNetwork::new();
        let mut domains = two_domains();
        for domain in domains.iter_mut() {
            domain.inject_into(&mut net).unwrap();
        }

        let plan = WiringPlan::new()
            .link(EndpointRef::switch(1, "xc1"), EndpointRef::switch(0, "ovs1"), Attrs::new().with("port1", 3i64).with("port2", 1i64))
            .link(EndpointRef::host(0, "vh1"), EndpointRef::switch(1, "xc1"), Attrs::new().with("port2", 1i64));

        assert_eq!(plan.apply(&domains, &mut net), Ok(2));
        assert_eq!(net.links_between("xc1", "ovs1"), vec![(3, 1)]);
        assert_eq!(net.links_between("vh1", "xc1"), vec![(0, 1)]);
    }

    #[test]
    fn test_apply_before_injection_is_unresolved() {
        let mut net = EmulatedNetwork::new();
        let domains = two_domains();
        let plan = WiringPlan::new().link(EndpointRef::switch(1, "xc1"), EndpointRef::switch(0, "ovs1"), Attrs::new());

        assert!(matches!(plan.apply(&domains, &mut net), Err(WiringError::Unresolved { .. })));
        assert_eq!(net.link_count(), 0);
    }
}
