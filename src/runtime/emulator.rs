//! In-process network emulator.
//!
//! Keeps a model of every switch, host, link and controller handed to it,
//! allocates interface ports, and tracks start state. Node and controller
//! names share one namespace, as they would in a real emulator where each
//! name becomes a process or network namespace.

use super::types::{ControllerSnapshot, LinkEnd, LinkSnapshot, NodeSnapshot, TopologySnapshot};
use super::{Runtime, RuntimeError, DEFAULT_CONTROLLER_PORT};
use crate::utils::options::{merge_options, options_to_args, Attrs};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Handle of an emulated switch or host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle of an emulated link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(usize);

/// Handle of an emulated controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRole {
    Switch,
    Host,
}

#[derive(Debug)]
struct NodeRecord {
    name: String,
    role: NodeRole,
    attrs: Attrs,
    ports: BTreeSet<u16>,
    starts: u32,
    controllers: Vec<String>,
}

impl NodeRecord {
    /// Switch ports are numbered from 1, host interfaces from 0
    fn first_port(&self) -> u16 {
        match self.role {
            NodeRole::Switch => 1,
            NodeRole::Host => 0,
        }
    }

    fn next_free_port(&self) -> u16 {
        let mut port = self.first_port();
        while self.ports.contains(&port) {
            port += 1;
        }
        port
    }
}

#[derive(Debug)]
struct LinkRecord {
    a: NodeId,
    port_a: u16,
    b: NodeId,
    port_b: u16,
    attrs: Attrs,
}

#[derive(Debug)]
struct ControllerRecord {
    name: String,
    ip: Option<String>,
    port: u16,
    starts: u32,
}

/// Network emulator model
#[derive(Debug, Default)]
pub struct EmulatedNetwork {
    nodes: Vec<NodeRecord>,
    links: Vec<LinkRecord>,
    controllers: Vec<ControllerRecord>,
    /// Shared namespace of node and controller names
    names: HashMap<String, usize>,
    stopped: bool,
}

impl EmulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str, index: usize) -> Result<(), RuntimeError> {
        if self.stopped {
            return Err(RuntimeError::Stopped);
        }
        if self.names.contains_key(name) {
            return Err(RuntimeError::DuplicateNode { name: name.to_string() });
        }
        self.names.insert(name.to_string(), index);
        Ok(())
    }

    fn add_node(&mut self, name: &str, role: NodeRole, attrs: &Attrs) -> Result<NodeId, RuntimeError> {
        let index = self.nodes.len();
        self.claim_name(name, index)?;
        debug!("emulator: add {:?} {} {}", role, name, options_to_args(attrs).join(" "));
        self.nodes.push(NodeRecord {
            name: name.to_string(),
            role,
            attrs: attrs.clone(),
            ports: BTreeSet::new(),
            starts: 0,
            controllers: Vec::new(),
        });
        Ok(NodeId(index))
    }

    fn node(&self, id: NodeId) -> Result<&NodeRecord, RuntimeError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| RuntimeError::UnknownHandle(id.to_string()))
    }

    fn controller(&self, id: ControllerId) -> Result<&ControllerRecord, RuntimeError> {
        self.controllers
            .get(id.0)
            .ok_or_else(|| RuntimeError::UnknownHandle(id.to_string()))
    }

    /// Pick the port for one end of a new link, honouring an explicit request
    fn link_port(&self, id: NodeId, attrs: &Attrs, key: &str) -> Result<u16, RuntimeError> {
        let node = self.node(id)?;
        match attrs.get_i64(key) {
            Some(requested) => {
                let port = u16::try_from(requested).map_err(|_| RuntimeError::InvalidAttribute {
                    name: node.name.clone(),
                    key: key.to_string(),
                    reason: format!("{} is not a valid port number", requested),
                })?;
                if node.ports.contains(&port) {
                    return Err(RuntimeError::PortInUse { node: node.name.clone(), port });
                }
                Ok(port)
            }
            None => Ok(node.next_free_port()),
        }
    }

    /// Look up a switch or host by name
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        let index = *self.names.get(name)?;
        self.nodes
            .get(index)
            .filter(|node| node.name == name)
            .map(|_| NodeId(index))
    }

    /// Look up a controller by name
    pub fn controller_by_name(&self, name: &str) -> Option<ControllerId> {
        let index = *self.names.get(name)?;
        self.controllers
            .get(index)
            .filter(|ctl| ctl.name == name)
            .map(|_| ControllerId(index))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Ports of the links between two named nodes, in either direction,
    /// reported as (port on `a`, port on `b`)
    pub fn links_between(&self, a: &str, b: &str) -> Vec<(u16, u16)> {
        self.links
            .iter()
            .filter_map(|link| {
                let name_a = &self.nodes[link.a.0].name;
                let name_b = &self.nodes[link.b.0].name;
                if name_a == a && name_b == b {
                    Some((link.port_a, link.port_b))
                } else if name_a == b && name_b == a {
                    Some((link.port_b, link.port_a))
                } else {
                    None
                }
            })
            .collect()
    }

    /// How many times a switch or controller has been started
    pub fn start_count(&self, name: &str) -> u32 {
        if let Some(id) = self.node_by_name(name) {
            return self.nodes[id.0].starts;
        }
        if let Some(id) = self.controller_by_name(name) {
            return self.controllers[id.0].starts;
        }
        0
    }

    /// Controllers handed to a switch on its last start
    pub fn switch_controllers(&self, name: &str) -> Vec<String> {
        self.node_by_name(name)
            .map(|id| self.nodes[id.0].controllers.clone())
            .unwrap_or_default()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Serializable view of everything created so far
    pub fn snapshot(&self) -> TopologySnapshot {
        let node_snapshot = |node: &NodeRecord| NodeSnapshot {
            name: node.name.clone(),
            attrs: node.attrs.clone(),
            ports: node.ports.iter().copied().collect(),
            starts: node.starts,
            controllers: node.controllers.clone(),
        };

        TopologySnapshot {
            switches: self
                .nodes
                .iter()
                .filter(|n| n.role == NodeRole::Switch)
                .map(node_snapshot)
                .collect(),
            hosts: self
                .nodes
                .iter()
                .filter(|n| n.role == NodeRole::Host)
                .map(node_snapshot)
                .collect(),
            links: self
                .links
                .iter()
                .map(|link| LinkSnapshot {
                    a: LinkEnd { node: self.nodes[link.a.0].name.clone(), port: link.port_a },
                    b: LinkEnd { node: self.nodes[link.b.0].name.clone(), port: link.port_b },
                    attrs: link.attrs.clone(),
                })
                .collect(),
            controllers: self
                .controllers
                .iter()
                .map(|ctl| ControllerSnapshot {
                    name: ctl.name.clone(),
                    ip: ctl.ip.clone(),
                    port: ctl.port,
                    started: ctl.starts > 0,
                })
                .collect(),
        }
    }
}

impl Runtime for EmulatedNetwork {
    type Node = NodeId;
    type Link = LinkId;
    type Controller = ControllerId;

    fn add_switch(&mut self, name: &str, attrs: &Attrs) -> Result<NodeId, RuntimeError> {
        self.add_node(name, NodeRole::Switch, attrs)
    }

    fn add_host(&mut self, name: &str, attrs: &Attrs) -> Result<NodeId, RuntimeError> {
        self.add_node(name, NodeRole::Host, attrs)
    }

    fn add_link(&mut self, a: &NodeId, b: &NodeId, attrs: &Attrs) -> Result<LinkId, RuntimeError> {
        if self.stopped {
            return Err(RuntimeError::Stopped);
        }
        let port_a = self.link_port(*a, attrs, "port1")?;
        let port_b = self.link_port(*b, attrs, "port2")?;
        if a == b && port_a == port_b {
            return Err(RuntimeError::PortInUse { node: self.node(*a)?.name.clone(), port: port_a });
        }

        self.nodes[a.0].ports.insert(port_a);
        self.nodes[b.0].ports.insert(port_b);
        debug!(
            "emulator: link {}:{} <-> {}:{}",
            self.nodes[a.0].name, port_a, self.nodes[b.0].name, port_b
        );

        let id = LinkId(self.links.len());
        self.links.push(LinkRecord {
            a: *a,
            port_a,
            b: *b,
            port_b,
            attrs: attrs.clone(),
        });
        Ok(id)
    }

    fn add_controller(&mut self, name: &str, attrs: &Attrs) -> Result<ControllerId, RuntimeError> {
        let index = self.controllers.len();
        let defaults = Attrs::new().with("port", DEFAULT_CONTROLLER_PORT);
        let attrs = merge_options(Some(&defaults), Some(attrs));
        let port = attrs.get_i64("port").unwrap_or(i64::from(DEFAULT_CONTROLLER_PORT));
        let port = u16::try_from(port).map_err(|_| RuntimeError::InvalidAttribute {
            name: name.to_string(),
            key: "port".to_string(),
            reason: format!("{} is not a valid port number", port),
        })?;
        self.claim_name(name, index)?;
        debug!("emulator: add controller {} {}", name, options_to_args(&attrs).join(" "));
        self.controllers.push(ControllerRecord {
            name: name.to_string(),
            ip: attrs.get_str("ip").map(str::to_string),
            port,
            starts: 0,
        });
        Ok(ControllerId(index))
    }

    fn start_controller(&mut self, controller: &ControllerId) -> Result<(), RuntimeError> {
        if self.stopped {
            return Err(RuntimeError::Stopped);
        }
        self.controller(*controller)?;
        self.controllers[controller.0].starts += 1;
        Ok(())
    }

    fn start_switch(&mut self, switch: &NodeId, controllers: &[ControllerId]) -> Result<(), RuntimeError> {
        if self.stopped {
            return Err(RuntimeError::Stopped);
        }
        let node = self.node(*switch)?;
        if node.role != NodeRole::Switch {
            return Err(RuntimeError::NotASwitch { name: node.name.clone() });
        }
        let names = controllers
            .iter()
            .map(|c| self.controller(*c).map(|ctl| ctl.name.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let node = &mut self.nodes[switch.0];
        node.controllers = names;
        node.starts += 1;
        Ok(())
    }

    fn controller_address(&self, controller: &ControllerId) -> Option<String> {
        self.controllers.get(controller.0).and_then(|ctl| ctl.ip.clone())
    }

    fn is_ready(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::Switch)
            .all(|n| n.starts > 0)
            && self.controllers.iter().all(|c| c.starts > 0)
    }

    fn stop(&mut self) -> Result<(), RuntimeError> {
        if !self.stopped {
            info!(
                "Stopping emulated network ({} nodes, {} links, {} controllers)",
                self.nodes.len(),
                self.links.len(),
                self.controllers.len()
            );
            self.stopped = true;
        }
        Ok(())
    }
}
