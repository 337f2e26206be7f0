//! Domain state and its declare / inject / start lifecycle.

use super::blueprint::{Blueprint, Declarer, EmptyBlueprint};
use super::types::{DomainError, DomainRole};
use crate::registry::{DuplicatePolicy, EntityKind, LinkKey, Registry, RegistryError};
use crate::runtime::Runtime;
use crate::utils::options::Attrs;
use log::{debug, info};
use std::fmt;
use std::rc::Rc;

/// A network subgraph with its own controller set
pub struct Domain<R: Runtime> {
    id: u32,
    role: DomainRole,
    blueprint: Rc<dyn Blueprint>,
    switches: Registry<String, R::Node>,
    hosts: Registry<String, R::Node>,
    links: Registry<LinkKey, R::Link>,
    controllers: Registry<String, R::Controller>,
    injected: bool,
}

impl<R: Runtime> Domain<R> {
    /// Create an empty domain that rejects duplicate declarations
    pub fn new(id: u32, role: DomainRole, blueprint: impl Blueprint + 'static) -> Self {
        Self::with_policy(id, role, blueprint, DuplicatePolicy::Reject)
    }

    /// Create a domain whose blueprint declares nothing
    pub fn empty(id: u32, role: DomainRole) -> Self {
        Self::new(id, role, EmptyBlueprint)
    }

    pub fn with_policy(id: u32, role: DomainRole, blueprint: impl Blueprint + 'static, policy: DuplicatePolicy) -> Self {
        Domain {
            id,
            role,
            blueprint: Rc::new(blueprint),
            switches: Registry::new(EntityKind::Switch, policy),
            hosts: Registry::new(EntityKind::Host, policy),
            links: Registry::new(EntityKind::Link, policy),
            controllers: Registry::new(EntityKind::Controller, policy),
            injected: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn role(&self) -> DomainRole {
        self.role
    }

    /// Label for logs, e.g. `co1`
    pub fn label(&self) -> String {
        format!("{}{}", self.blueprint.name(), self.id)
    }

    pub fn is_injected(&self) -> bool {
        self.injected
    }

    /// Run the blueprint. Calling this twice re-declares everything, which
    /// fails under [`DuplicatePolicy::Reject`] unless the blueprint is empty.
    pub fn build(&mut self) -> Result<(), DomainError> {
        let blueprint = Rc::clone(&self.blueprint);
        blueprint.build(self).map_err(|source| DomainError::Registry { domain: self.id, source })?;
        debug!(
            "{}: declared {} switches, {} hosts, {} links, {} controllers",
            self.label(),
            self.switches.declared_len(),
            self.hosts.declared_len(),
            self.links.declared_len(),
            self.controllers.declared_len()
        );
        Ok(())
    }

    /// Whether `name` has been declared as an entity of `kind`. For links this
    /// asks whether `name` is an endpoint of any declared link.
    pub fn is_declared(&self, kind: EntityKind, name: &str) -> bool {
        let key = name.to_string();
        match kind {
            EntityKind::Switch => self.switches.is_declared(&key),
            EntityKind::Host => self.hosts.is_declared(&key),
            EntityKind::Controller => self.controllers.is_declared(&key),
            EntityKind::Link => self.links.declarations().any(|(link, _)| link.src == name || link.dst == name),
        }
    }

    /// Materialize every declaration in `runtime`.
    ///
    /// Order is fixed regardless of declaration order: switches, hosts,
    /// links, controllers. Links need their endpoints to exist already.
    pub fn inject_into(&mut self, runtime: &mut R) -> Result<(), DomainError> {
        if self.injected {
            return Err(DomainError::AlreadyInjected { domain: self.id });
        }
        self.injected = true;
        let domain = self.id;

        let runtime_err = |kind: EntityKind, name: &str| {
            let name = name.to_string();
            move |source| DomainError::Runtime { domain, kind, name, source }
        };

        for (name, attrs) in owned(self.switches.declarations()) {
            let handle = runtime.add_switch(&name, &attrs).map_err(runtime_err(EntityKind::Switch, &name))?;
            self.switches.bind(name, handle);
        }

        for (name, attrs) in owned(self.hosts.declarations()) {
            let handle = runtime.add_host(&name, &attrs).map_err(runtime_err(EntityKind::Host, &name))?;
            self.hosts.bind(name, handle);
        }

        for (key, attrs) in owned(self.links.declarations()) {
            let src = self.local_node(&key, &key.src)?;
            let dst = self.local_node(&key, &key.dst)?;
            let handle = runtime
                .add_link(&src, &dst, &attrs)
                .map_err(runtime_err(EntityKind::Link, &key.to_string()))?;
            self.links.bind(key, handle);
        }

        for (name, attrs) in owned(self.controllers.declarations()) {
            let handle = runtime
                .add_controller(&name, &attrs)
                .map_err(runtime_err(EntityKind::Controller, &name))?;
            self.controllers.bind(name, handle);
        }

        info!(
            "Injected {}: {} switches, {} hosts, {} links, {} controllers",
            self.label(),
            self.switches.resolved_len(),
            self.hosts.resolved_len(),
            self.links.resolved_len(),
            self.controllers.resolved_len()
        );
        Ok(())
    }

    /// Resolve a link endpoint to a switch of this domain, falling back to a host
    fn local_node(&self, link: &LinkKey, name: &str) -> Result<R::Node, DomainError> {
        let key = name.to_string();
        self.switches
            .get(&key)
            .or_else(|| self.hosts.get(&key))
            .cloned()
            .ok_or_else(|| DomainError::UnresolvedEndpoint {
                domain: self.id,
                link: link.to_string(),
                endpoint: name.to_string(),
            })
    }

    /// Start the controllers, then every switch with all of them.
    ///
    /// Only resolved handles are touched, so calling this again never
    /// creates anything new.
    pub fn start(&self, runtime: &mut R) -> Result<(), DomainError> {
        let domain = self.id;

        for (name, ctl) in self.controllers.resolved_keys().zip(self.controllers.handles()) {
            runtime.start_controller(ctl).map_err(|source| DomainError::Runtime {
                domain,
                kind: EntityKind::Controller,
                name: name.clone(),
                source,
            })?;
        }

        let controllers: Vec<R::Controller> = self.controllers.handles().cloned().collect();
        for (name, switch) in self.switches.resolved_keys().zip(self.switches.handles()) {
            runtime.start_switch(switch, &controllers).map_err(|source| DomainError::Runtime {
                domain,
                kind: EntityKind::Switch,
                name: name.clone(),
                source,
            })?;
        }

        debug!(
            "Started {}: {} controllers, {} switches",
            self.label(),
            controllers.len(),
            self.switches.resolved_len()
        );
        Ok(())
    }

    pub fn switch(&self, name: &str) -> Result<&R::Node, RegistryError> {
        self.switches.resolve(&name.to_string())
    }

    pub fn switches(&self) -> impl Iterator<Item = &R::Node> {
        self.switches.handles()
    }

    pub fn host(&self, name: &str) -> Result<&R::Node, RegistryError> {
        self.hosts.resolve(&name.to_string())
    }

    pub fn hosts(&self) -> impl Iterator<Item = &R::Node> {
        self.hosts.handles()
    }

    pub fn controller(&self, name: &str) -> Result<&R::Controller, RegistryError> {
        self.controllers.resolve(&name.to_string())
    }

    pub fn controllers(&self) -> impl Iterator<Item = &R::Controller> {
        self.controllers.handles()
    }

    /// Resolved handle of the link declared from `src` to `dst`
    pub fn link(&self, src: &str, dst: &str) -> Result<&R::Link, RegistryError> {
        self.links.resolve(&LinkKey::new(src, dst))
    }
}

impl<R: Runtime> Declarer for Domain<R> {
    fn id(&self) -> u32 {
        self.id
    }

    fn add_switch(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError> {
        self.switches.declare(name.to_string(), attrs)
    }

    fn add_host(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError> {
        self.hosts.declare(name.to_string(), attrs)
    }

    fn add_controller(&mut self, name: &str, attrs: Attrs) -> Result<String, RegistryError> {
        self.controllers.declare(name.to_string(), attrs)
    }

    fn add_link(&mut self, src: &str, dst: &str, attrs: Attrs) -> Result<(String, String), RegistryError> {
        let key = self.links.declare(LinkKey::new(src, dst), attrs)?;
        Ok((key.src, key.dst))
    }
}

impl<R: Runtime> fmt::Debug for Domain<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("blueprint", &self.blueprint.name())
            .field("switches", &self.switches.declared_len())
            .field("hosts", &self.hosts.declared_len())
            .field("links", &self.links.declared_len())
            .field("controllers", &self.controllers.declared_len())
            .field("injected", &self.injected)
            .finish()
    }
}

/// Copy declarations out so the registry can be mutated while binding
fn owned<'a, K: Clone + 'a>(decls: impl Iterator<Item = (&'a K, &'a Attrs)>) -> Vec<(K, Attrs)> {
    decls.map(|(k, a)| (k.clone(), a.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{EmulatedNetwork, RuntimeError};

    struct Edge;

    impl Blueprint for Edge {
        fn name(&self) -> &str {
            "edge"
        }

        fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
            let id = domain.id();
            // Link declared before its endpoints on purpose
            domain.add_link(&format!("ee{}", id), &format!("h{}0", id), Attrs::new().with("port1", 1i64))?;
            let ee = domain.add_switch(&format!("ee{}", id), Attrs::new().with("dpid", format!("000000000ee{}", id)))?;
            let h = domain.add_host(&format!("h{}0", id), Attrs::new().with("ip", format!("10.0.0.{}", id)))?;
            assert_eq!(ee, "ee2");
            assert_eq!(h, "h20");
            Ok(())
        }
    }

    type EmuDomain = Domain<EmulatedNetwork>;

    #[test]
    fn test_every_declared_name_resolves_after_injection() {
        let mut net = EmulatedNetwork::new();
        let mut domain: EmuDomain = Domain::new(2, DomainRole::Metro, Edge);
        domain.build().unwrap();
        domain.add_controller("cm2-0", Attrs::new().with("ip", "10.0.0.1")).unwrap();
        domain.inject_into(&mut net).unwrap();

        assert!(domain.switch("ee2").is_ok());
        assert!(domain.host("h20").is_ok());
        assert!(domain.controller("cm2-0").is_ok());
        assert!(domain.link("ee2", "h20").is_ok());
        assert_eq!(domain.switches().count(), 1);
        assert_eq!(domain.hosts().count(), 1);

        // Nothing resolves that was not declared
        assert!(matches!(domain.switch("h20"), Err(RegistryError::UnknownName { .. })));
        assert!(matches!(domain.host("ee1"), Err(RegistryError::UnknownName { .. })));

        // Link order did not matter, and the explicit port was honoured
        assert_eq!(net.links_between("ee2", "h20"), vec![(1, 0)]);
    }

    #[test]
    fn test_inject_before_build_resolves_nothing() {
        let mut net = EmulatedNetwork::new();
        let mut domain: EmuDomain = Domain::new(1, DomainRole::Metro, Edge);
        domain.inject_into(&mut net).unwrap();

        assert_eq!(domain.switches().count(), 0);
        assert_eq!(domain.hosts().count(), 0);
        assert_eq!(domain.controllers().count(), 0);
        assert!(domain.switch("ee1").is_err());
        assert_eq!(net.node_count(), 0);
    }

    #[test]
    fn test_lookups_fail_before_injection() {
        let mut domain: EmuDomain = Domain::new(2, DomainRole::Metro, Edge);
        domain.build().unwrap();
        assert!(domain.is_declared(EntityKind::Switch, "ee2"));
        assert!(matches!(domain.switch("ee2"), Err(RegistryError::UnknownName { .. })));
    }

    #[test]
    fn test_foreign_link_endpoint_is_unresolved() {
        let mut net = EmulatedNetwork::new();
        let mut domain: EmuDomain = Domain::empty(3, DomainRole::Site);
        domain.add_switch("xc3", Attrs::new()).unwrap();
        domain.add_link("xc3", "ovs3", Attrs::new()).unwrap();

        let err = domain.inject_into(&mut net).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnresolvedEndpoint {
                domain: 3,
                link: "xc3->ovs3".to_string(),
                endpoint: "ovs3".to_string(),
            }
        );
    }

    #[test]
    fn test_second_injection_is_rejected() {
        let mut net = EmulatedNetwork::new();
        let mut domain: EmuDomain = Domain::empty(0, DomainRole::Static);
        domain.add_switch("ovs1", Attrs::new()).unwrap();
        domain.inject_into(&mut net).unwrap();
        assert_eq!(domain.inject_into(&mut net), Err(DomainError::AlreadyInjected { domain: 0 }));
        assert_eq!(net.node_count(), 1);
    }

    #[test]
    fn test_start_twice_creates_nothing_new() {
        let mut net = EmulatedNetwork::new();
        let mut domain: EmuDomain = Domain::new(2, DomainRole::Metro, Edge);
        domain.build().unwrap();
        domain.add_controller("cm2-0", Attrs::new().with("ip", "10.0.0.1")).unwrap();
        domain.add_controller("cm2-1", Attrs::new().with("ip", "10.0.0.2")).unwrap();
        domain.inject_into(&mut net).unwrap();

        domain.start(&mut net).unwrap();
        let nodes = net.node_count();
        domain.start(&mut net).unwrap();

        assert_eq!(net.node_count(), nodes);
        assert_eq!(net.controller_count(), 2);
        assert_eq!(net.start_count("ee2"), 2);
        assert_eq!(net.start_count("cm2-0"), 2);
        // The switch receives the whole controller set of its domain
        assert_eq!(net.switch_controllers("ee2"), vec!["cm2-0".to_string(), "cm2-1".to_string()]);
        // Hosts are never started
        assert_eq!(net.start_count("h20"), 0);
    }

    #[test]
    fn test_runtime_failure_names_the_entity() {
        let mut net = EmulatedNetwork::new();
        net.add_switch("ee2", &Attrs::new()).unwrap();

        let mut domain: EmuDomain = Domain::new(2, DomainRole::Metro, Edge);
        domain.build().unwrap();
        let err = domain.inject_into(&mut net).unwrap_err();
        assert_eq!(
            err,
            DomainError::Runtime {
                domain: 2,
                kind: EntityKind::Switch,
                name: "ee2".to_string(),
                source: RuntimeError::DuplicateNode { name: "ee2".to_string() },
            }
        );
    }

    #[test]
    fn test_rebuild_rejected_under_default_policy() {
        let mut domain: EmuDomain = Domain::new(2, DomainRole::Metro, Edge);
        domain.build().unwrap();
        assert!(matches!(domain.build(), Err(DomainError::Registry { domain: 2, .. })));

        let mut lenient: EmuDomain = Domain::with_policy(2, DomainRole::Metro, Edge, DuplicatePolicy::Overwrite);
        lenient.build().unwrap();
        lenient.build().unwrap();
        assert!(lenient.is_declared(EntityKind::Host, "h20"));
    }
}
