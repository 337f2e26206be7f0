//! Controller assignment policy.
//!
//! Pure function from (ordered domains, controller IP sets, control-plane
//! flag) to the controller bindings of each domain.
//!
//! ## Rules
//!
//! - **One IP set**: every controller-requiring domain binds that set.
//! - **Four or more IP sets, control plane on**: site domains bind successive
//!   sets in site order; metro domains share the next unconsumed set.
//! - **Control plane off**: site domains get a single loopback controller;
//!   metro domains bind the first set.
//! - **Static domain** (always position 0): a single loopback controller.
//!
//! Two or three sets (or none) is not a defined combination and is rejected.

use crate::domain::DomainRole;
use crate::utils::options::Attrs;
use log::{debug, info};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address of the placeholder controller for statically managed nodes
pub const LOOPBACK_CONTROLLER_IP: &str = "127.0.0.1";
/// Port of the placeholder controller for statically managed nodes
pub const LOOPBACK_CONTROLLER_PORT: u16 = 6666;

/// Errors parsing a comma-separated controller IP set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerSetError {
    #[error("controller IP set is empty")]
    Empty,

    #[error("'{0}' is not a valid IP address")]
    InvalidAddress(String),
}

/// Errors raised by [`assign_controllers`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("{count} controller IP sets supplied; exactly one, or four or more, are required")]
    InvalidControllerSetCount { count: usize },

    #[error("{sets} controller IP sets cannot serve {sites} site domains and the metro domains")]
    TooFewControllerSets { sets: usize, sites: usize },

    #[error("static domain {id} must be the first domain, found at position {position}")]
    StaticDomainPosition { id: u32, position: usize },

    #[error("the first domain must be the static domain, found {role} domain {id}")]
    MissingStaticDomain { id: u32, role: DomainRole },
}

/// One controller cluster: the addresses of its instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSet {
    addresses: Vec<IpAddr>,
}

impl ControllerSet {
    pub fn new(addresses: Vec<IpAddr>) -> Result<Self, ControllerSetError> {
        if addresses.is_empty() {
            return Err(ControllerSetError::Empty);
        }
        Ok(Self { addresses })
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// Parse every command-line controller set
    pub fn parse_all<S: AsRef<str>>(args: &[S]) -> Result<Vec<Self>, ControllerSetError> {
        args.iter().map(|arg| arg.as_ref().parse()).collect()
    }
}

impl FromStr for ControllerSet {
    type Err = ControllerSetError;

    /// Parse `"10.0.0.1,10.0.0.2"`. Blank entries are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addresses = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<IpAddr>()
                    .map_err(|_| ControllerSetError::InvalidAddress(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(addresses)
    }
}

impl fmt::Display for ControllerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.addresses.iter().map(|a| a.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

/// Identity and role of a domain, as seen by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSlot {
    pub id: u32,
    pub role: DomainRole,
}

/// A controller instance to declare in one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerBinding {
    pub name: String,
    pub ip: IpAddr,
    pub port: Option<u16>,
}

impl ControllerBinding {
    fn new(slot: &DomainSlot, index: usize, ip: IpAddr, port: Option<u16>) -> Self {
        Self {
            name: controller_name(slot, index),
            ip,
            port,
        }
    }

    fn loopback(slot: &DomainSlot) -> Self {
        let ip = IpAddr::from([127, 0, 0, 1]);
        Self::new(slot, 0, ip, Some(LOOPBACK_CONTROLLER_PORT))
    }

    /// Runtime attributes for `add_controller`
    pub fn attrs(&self) -> Attrs {
        let attrs = Attrs::new().with("controller", "remote").with("ip", self.ip.to_string());
        match self.port {
            Some(port) => attrs.with("port", port),
            None => attrs,
        }
    }
}

/// Unique controller name: role tag, domain id, instance index
pub fn controller_name(slot: &DomainSlot, index: usize) -> String {
    format!("c{}{}-{}", slot.role.tag(), slot.id, index)
}

fn bind_set(slot: &DomainSlot, set: &ControllerSet) -> Vec<ControllerBinding> {
    set.addresses()
        .iter()
        .enumerate()
        .map(|(index, ip)| ControllerBinding::new(slot, index, *ip, None))
        .collect()
}

/// Decide the controller bindings of every domain.
///
/// The result has one entry per domain, in the same order as `domains`.
pub fn assign_controllers(
    domains: &[DomainSlot],
    sets: &[ControllerSet],
    control_plane: bool,
) -> Result<Vec<Vec<ControllerBinding>>, PolicyError> {
    let count = sets.len();
    if !(count == 1 || count >= 4) {
        return Err(PolicyError::InvalidControllerSetCount { count });
    }

    if let Some(first) = domains.first() {
        if first.role != DomainRole::Static {
            return Err(PolicyError::MissingStaticDomain { id: first.id, role: first.role });
        }
    }
    if let Some((position, slot)) = domains
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, slot)| slot.role == DomainRole::Static)
    {
        return Err(PolicyError::StaticDomainPosition { id: slot.id, position });
    }

    let sites = domains.iter().filter(|d| d.role == DomainRole::Site).count();
    let has_metro = domains.iter().any(|d| d.role == DomainRole::Metro);
    let per_site = control_plane && count >= 4;
    if per_site && count < sites + usize::from(has_metro) {
        return Err(PolicyError::TooFewControllerSets { sets: count, sites });
    }

    let mut cursor = 0;
    let mut bindings = Vec::with_capacity(domains.len());

    // Sites first, so metro domains see the cursor after every site
    let mut site_bindings = Vec::with_capacity(sites);
    for slot in domains.iter().filter(|d| d.role == DomainRole::Site) {
        if control_plane {
            site_bindings.push(bind_set(slot, &sets[cursor]));
            if per_site {
                cursor += 1;
            }
        } else {
            site_bindings.push(vec![ControllerBinding::loopback(slot)]);
        }
    }

    let metro_set = sets.get(cursor).cloned();
    let mut site_bindings = site_bindings.into_iter();

    for slot in domains {
        let assigned = match slot.role {
            DomainRole::Static => vec![ControllerBinding::loopback(slot)],
            DomainRole::Site => site_bindings.next().unwrap_or_default(),
            DomainRole::Metro => metro_set.as_ref().map(|set| bind_set(slot, set)).unwrap_or_default(),
        };
        for binding in &assigned {
            debug!("{} domain {}: controller {} at {}", slot.role, slot.id, binding.name, binding.ip);
        }
        bindings.push(assigned);
    }

    if per_site && count > cursor + usize::from(has_metro) {
        debug!("{} controller IP sets left unused", count - cursor - usize::from(has_metro));
    }
    info!(
        "Assigned controllers to {} domains from {} IP sets (control plane {})",
        domains.len(),
        count,
        if control_plane { "enabled" } else { "disabled" }
    );

    Ok(bindings)
}
