//! The metro-ethernet "claw" demo: three sites hanging off a metro transport.
//!
//! Domain positions are fixed:
//!
//! | position | domain | role |
//! |----------|--------|------|
//! | 0 | static nodes (`ovs1..3`, debug `vh1..4`) | static |
//! | 1-3 | central offices (`xc1..3`) | site |
//! | 4-6 | Ethernet edges (`ee1..3` with one host each) | metro |
//! | 7 | metro core (`txp1`) | metro |
//!
//! The metro core is the primary domain: its first controller receives the
//! network configuration.

use crate::config::{ScenarioConfig, VlanMap};
use crate::domain::{Blueprint, Declarer, Domain, DomainRole};
use crate::registry::RegistryError;
use crate::runtime::Runtime;
use crate::topology::{EndpointRef, WiringPlan};
use crate::utils::options::{Attrs, OptionValue};
use std::collections::BTreeMap;

/// Position of the metro core in [`EcordScenario::domains`]
pub const PRIMARY_DOMAIN: usize = 7;

const STATIC: usize = 0;
const METRO_CORE: usize = 7;

fn central_office(site: usize) -> usize {
    site
}

fn ether_edge(site: usize) -> usize {
    3 + site
}

fn ports(port1: u16, port2: u16) -> Attrs {
    Attrs::new().with("port1", port1).with("port2", port2)
}

/// VLAN map as a nested attribute, keyed by VLAN id
fn vmap(map: &VlanMap) -> OptionValue {
    let entries: BTreeMap<String, OptionValue> =
        map.iter().map(|(vlan, ip)| (vlan.to_string(), OptionValue::from(ip.as_str()))).collect();
    OptionValue::from(entries)
}

/// Statically configured OVS switches, plus VLAN hosts in debug mode
#[derive(Debug, Clone)]
pub struct StaticNodes {
    debug_vlans: Option<Vec<VlanMap>>,
}

impl Blueprint for StaticNodes {
    fn name(&self) -> &str {
        "static"
    }

    fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
        for i in 1..=3 {
            domain.add_switch(&format!("ovs{}", i), Attrs::new().with("dpid", format!("{:016x}", i)))?;
        }
        if let Some(vlans) = &self.debug_vlans {
            for (i, map) in vlans.iter().enumerate() {
                domain.add_host(&format!("vh{}", i + 1), Attrs::new().with("cls", "vlan").with("vmap", vmap(map)))?;
            }
        }
        Ok(())
    }
}

/// A site's cross-connect
#[derive(Debug, Clone, Copy)]
pub struct CentralOffice;

impl Blueprint for CentralOffice {
    fn name(&self) -> &str {
        "co"
    }

    fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
        let id = domain.id();
        domain.add_switch(
            &format!("xc{}", id),
            Attrs::new().with("dpid", format!("0000ffffff0{}", id)).with("cls", "user"),
        )?;
        Ok(())
    }
}

/// A site's Ethernet edge switch and its traffic source
#[derive(Debug, Clone)]
pub struct EtherEdge {
    vlans: Option<VlanMap>,
}

impl Blueprint for EtherEdge {
    fn name(&self) -> &str {
        "ee"
    }

    fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
        let id = domain.id();
        let ee = domain.add_switch(
            &format!("ee{}", id),
            Attrs::new().with("dpid", format!("000000000ee{}", id)).with("cls", "user"),
        )?;
        let host = match &self.vlans {
            Some(map) => domain.add_host(&format!("vh{}0", id), Attrs::new().with("cls", "vlan").with("vmap", vmap(map)))?,
            None => domain.add_host(&format!("h{}0", id), Attrs::new().with("ip", format!("10.0.0.{}", id)))?,
        };
        domain.add_link(&ee, &host, Attrs::new().with("port1", 1u16))?;
        Ok(())
    }
}

/// The metro transport switch
#[derive(Debug, Clone, Copy)]
pub struct MetroCore;

impl Blueprint for MetroCore {
    fn name(&self) -> &str {
        "metro"
    }

    fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
        domain.add_switch("txp1", Attrs::new().with("dpid", "00000c072ee1").with("cls", "user"))?;
        Ok(())
    }
}

/// Domain set and cross-domain wiring of the claw topology
#[derive(Debug, Clone)]
pub struct EcordScenario {
    config: ScenarioConfig,
}

impl EcordScenario {
    pub fn new(config: &ScenarioConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Every domain, in the order controller assignment and wiring expect
    pub fn domains<R: Runtime>(&self) -> Vec<Domain<R>> {
        let debug_vlans = self.config.debug_xcs.then(|| self.config.debug_vlans.clone());
        let mut domains = vec![Domain::new(0, DomainRole::Static, StaticNodes { debug_vlans })];

        for id in 1..=3 {
            domains.push(Domain::new(id, DomainRole::Site, CentralOffice));
        }
        for id in 1..=3u32 {
            let vlans = if self.config.vlan_hosts {
                self.config.site_vlans.get(id as usize - 1).cloned()
            } else {
                None
            };
            domains.push(Domain::new(id, DomainRole::Metro, EtherEdge { vlans }));
        }
        domains.push(Domain::new(4, DomainRole::Metro, MetroCore));
        domains
    }

    /// Links between domains. Debug mode hangs VLAN hosts straight off the
    /// cross-connects instead of wiring the edges and transport.
    pub fn wiring(&self) -> WiringPlan {
        let mut plan = WiringPlan::new();
        let xc = |site: usize| EndpointRef::switch(central_office(site), &format!("xc{}", site));
        let ovs = |site: usize| EndpointRef::switch(STATIC, &format!("ovs{}", site));

        if self.config.debug_xcs {
            let vh = |i: usize| EndpointRef::host(STATIC, &format!("vh{}", i));
            plan.push(vh(1), xc(1), Attrs::new().with("port2", 1u16));
            plan.push(xc(1), vh(2), Attrs::new().with("port1", 2u16));
            plan.push(vh(3), xc(2), Attrs::new().with("port2", 2u16));
            plan.push(ovs(2), vh(4), Attrs::new().with("port2", 1u16));
        } else {
            let txp = EndpointRef::switch(METRO_CORE, "txp1");
            let ee = |site: usize| EndpointRef::switch(ether_edge(site), &format!("ee{}", site));
            for site in 1..=3u16 {
                plan.push(txp.clone(), xc(site as usize), ports(site, 2));
            }
            plan.push(xc(1), ee(1), ports(1, 2));
            plan.push(ovs(2), ee(2), ports(1, 2));
            plan.push(ovs(3), ee(3), ports(1, 2));
        }

        plan.push(xc(1), ovs(1), ports(3, 1));
        plan.push(xc(2), ovs(2), ports(1, 2));
        plan.push(xc(3), ovs(3), ports(1, 2));
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityKind;
    use crate::runtime::EmulatedNetwork;

    type EmuDomain = Domain<EmulatedNetwork>;

    fn built(config: &ScenarioConfig) -> Vec<EmuDomain> {
        let mut domains = EcordScenario::new(config).domains();
        for domain in domains.iter_mut() {
            domain.build().unwrap();
        }
        domains
    }

    #[test]
    fn test_domain_order_and_roles() {
        let domains = built(&ScenarioConfig::default());
        let layout: Vec<(u32, DomainRole)> = domains.iter().map(|d| (d.id(), d.role())).collect();
        assert_eq!(
            layout,
            vec![
                (0, DomainRole::Static),
                (1, DomainRole::Site),
                (2, DomainRole::Site),
                (3, DomainRole::Site),
                (1, DomainRole::Metro),
                (2, DomainRole::Metro),
                (3, DomainRole::Metro),
                (4, DomainRole::Metro),
            ]
        );
        assert_eq!(domains[PRIMARY_DOMAIN].label(), "metro4");
        assert!(domains[1].is_declared(EntityKind::Switch, "xc1"));
        assert!(domains[5].is_declared(EntityKind::Host, "h20"));
        assert!(!domains[0].is_declared(EntityKind::Host, "vh1"));
    }

    #[test]
    fn test_default_wiring_validates() {
        let config = ScenarioConfig::default();
        let scenario = EcordScenario::new(&config);
        let plan = scenario.wiring();
        assert_eq!(plan.len(), 9);
        plan.validate(&built(&config)).unwrap();
    }

    #[test]
    fn test_debug_wiring_uses_vlan_hosts() {
        let config = ScenarioConfig {
            debug_xcs: true,
            ..ScenarioConfig::default()
        };
        let domains = built(&config);
        assert!(domains[0].is_declared(EntityKind::Host, "vh4"));

        let plan = EcordScenario::new(&config).wiring();
        assert_eq!(plan.len(), 7);
        assert!(plan.links().iter().all(|link| link.a.name != "txp1"));
        plan.validate(&domains).unwrap();
    }

    #[test]
    fn test_vlan_edges_get_vlan_hosts() {
        let config = ScenarioConfig {
            vlan_hosts: true,
            ..ScenarioConfig::default()
        };
        let domains = built(&config);
        assert!(domains[4].is_declared(EntityKind::Host, "vh10"));
        assert!(!domains[4].is_declared(EntityKind::Host, "h10"));
        assert!(domains[4].is_declared(EntityKind::Link, "vh10"));
    }

    #[test]
    fn test_vmap_attribute_shape() {
        let map: VlanMap = [(100u16, "10.0.0.1".to_string())].into_iter().collect();
        assert_eq!(vmap(&map).to_string(), "{100:10.0.0.1}");
    }
}
