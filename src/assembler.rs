//! Topology assembler.
//!
//! Drives an ordered list of domains through the staged lifecycle against a
//! single runtime:
//!
//! 1. assign controllers (policy only, nothing is created)
//! 2. declare every domain and validate the cross-domain wiring plan
//! 3. inject every domain
//! 4. wire cross-domain links
//! 5. start every domain
//! 6. wait for the runtime to settle, then run the static configurator
//!
//! Each stage completes for all domains before the next begins, and the first
//! error stops the run. Stages must be entered in order.

use crate::config::Config;
use crate::controller::{assign_controllers, ControllerSet, DomainSlot, PolicyError};
use crate::domain::{Declarer, Domain, DomainError, DomainRole};
use crate::process::{ProcessError, StaticConfigurator};
use crate::runtime::Runtime;
use crate::topology::{WiringError, WiringPlan};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// How far assembly has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyState {
    New,
    ControllersAssigned,
    Declared,
    Injected,
    Wired,
    Started,
    Configured,
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssemblyState::New => "new",
            AssemblyState::ControllersAssigned => "controllers assigned",
            AssemblyState::Declared => "declared",
            AssemblyState::Injected => "injected",
            AssemblyState::Wired => "wired",
            AssemblyState::Started => "started",
            AssemblyState::Configured => "configured",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("static configuration failed: {0}")]
    Process(#[from] ProcessError),

    #[error("cannot move from {current} to {next}")]
    OutOfOrder { current: AssemblyState, next: AssemblyState },

    #[error("{role} domain {id} appears more than once")]
    DuplicateDomain { role: DomainRole, id: u32 },

    #[error("primary domain position {position} is out of range for {count} domains")]
    UnknownPrimaryDomain { position: usize, count: usize },
}

/// Knobs for [`TopologyAssembler`]
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySettings {
    pub control_plane: bool,
    /// Upper bound on waiting for the runtime to report ready
    pub settle_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            control_plane: true,
            settle_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&Config> for AssemblySettings {
    fn from(config: &Config) -> Self {
        Self {
            control_plane: config.scenario.control_plane,
            settle_timeout: config.general.settle_timeout,
            poll_interval: config.general.poll_interval,
        }
    }
}

/// Outcome of a full [`TopologyAssembler::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub domains: usize,
    pub cross_links: usize,
    pub primary_controller: Option<String>,
    /// Whether the runtime reported ready before the settle timeout
    pub settled: bool,
}

/// Owns the domains of one assembly and moves them through the lifecycle
pub struct TopologyAssembler<R: Runtime> {
    domains: Vec<Domain<R>>,
    wiring: WiringPlan,
    settings: AssemblySettings,
    primary: Option<usize>,
    state: AssemblyState,
    cross_links: usize,
}

impl<R: Runtime> TopologyAssembler<R> {
    /// Domains are kept in the given order. The same (role, id) may not
    /// appear twice.
    pub fn new(domains: Vec<Domain<R>>, wiring: WiringPlan, settings: AssemblySettings) -> Result<Self, AssemblyError> {
        let mut seen = HashSet::new();
        for domain in &domains {
            if !seen.insert((domain.role(), domain.id())) {
                return Err(AssemblyError::DuplicateDomain {
                    role: domain.role(),
                    id: domain.id(),
                });
            }
        }

        Ok(Self {
            domains,
            wiring,
            settings,
            primary: None,
            state: AssemblyState::New,
            cross_links: 0,
        })
    }

    /// Domain whose first controller is handed to the configurator. Defaults
    /// to the last metro domain.
    pub fn with_primary_domain(mut self, position: usize) -> Result<Self, AssemblyError> {
        if position >= self.domains.len() {
            return Err(AssemblyError::UnknownPrimaryDomain {
                position,
                count: self.domains.len(),
            });
        }
        self.primary = Some(position);
        Ok(self)
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn domains(&self) -> &[Domain<R>] {
        &self.domains
    }

    pub fn wiring(&self) -> &WiringPlan {
        &self.wiring
    }

    fn enter(&self, expected: AssemblyState, next: AssemblyState) -> Result<(), AssemblyError> {
        if self.state != expected {
            return Err(AssemblyError::OutOfOrder {
                current: self.state,
                next,
            });
        }
        debug!("Assembly moving from {} to {}", self.state, next);
        Ok(())
    }

    /// Run the controller policy and declare the resulting controllers in
    /// each domain
    pub fn assign_controllers(&mut self, sets: &[ControllerSet]) -> Result<(), AssemblyError> {
        self.enter(AssemblyState::New, AssemblyState::ControllersAssigned)?;

        let slots: Vec<DomainSlot> = self
            .domains
            .iter()
            .map(|d| DomainSlot { id: d.id(), role: d.role() })
            .collect();
        let bindings = assign_controllers(&slots, sets, self.settings.control_plane)?;

        for (domain, assigned) in self.domains.iter_mut().zip(bindings) {
            for binding in assigned {
                domain
                    .add_controller(&binding.name, binding.attrs())
                    .map_err(|source| DomainError::Registry { domain: domain.id(), source })?;
            }
        }

        self.state = AssemblyState::ControllersAssigned;
        Ok(())
    }

    /// Run every blueprint, then check the wiring plan against what was
    /// declared
    pub fn declare(&mut self) -> Result<(), AssemblyError> {
        self.enter(AssemblyState::ControllersAssigned, AssemblyState::Declared)?;
        for domain in self.domains.iter_mut() {
            domain.build()?;
        }
        self.wiring.validate(&self.domains)?;
        info!("Declared {} domains", self.domains.len());
        self.state = AssemblyState::Declared;
        Ok(())
    }

    pub fn inject(&mut self, runtime: &mut R) -> Result<(), AssemblyError> {
        self.enter(AssemblyState::Declared, AssemblyState::Injected)?;
        for domain in self.domains.iter_mut() {
            domain.inject_into(runtime)?;
        }
        self.state = AssemblyState::Injected;
        Ok(())
    }

    pub fn wire(&mut self, runtime: &mut R) -> Result<(), AssemblyError> {
        self.enter(AssemblyState::Injected, AssemblyState::Wired)?;
        self.cross_links = self.wiring.apply(&self.domains, runtime)?;
        self.state = AssemblyState::Wired;
        Ok(())
    }

    pub fn start(&mut self, runtime: &mut R) -> Result<(), AssemblyError> {
        self.enter(AssemblyState::Wired, AssemblyState::Started)?;
        for domain in &self.domains {
            domain.start(runtime)?;
        }
        info!("Started {} domains", self.domains.len());
        self.state = AssemblyState::Started;
        Ok(())
    }

    /// Poll the runtime until it reports ready or the settle timeout runs
    /// out. Returns whether it became ready.
    pub fn settle(&self, runtime: &R) -> bool {
        let deadline = Instant::now() + self.settings.settle_timeout;
        loop {
            if runtime.is_ready() {
                debug!("Runtime ready");
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "Runtime not ready after {:?}, continuing anyway",
                    self.settings.settle_timeout
                );
                return false;
            }
            thread::sleep(self.settings.poll_interval.min(deadline - now));
        }
    }

    /// Position of the primary domain, if any
    pub fn primary_domain(&self) -> Option<usize> {
        self.primary.or_else(|| {
            self.domains
                .iter()
                .rposition(|d| d.role() == DomainRole::Metro)
        })
    }

    /// Address of the primary domain's first controller
    pub fn primary_controller_address(&self, runtime: &R) -> Option<String> {
        let domain = self.domains.get(self.primary_domain()?)?;
        let controller = domain.controllers().next()?;
        runtime.controller_address(controller)
    }

    /// Settle, then hand the primary controller address to the configurator
    pub fn configure(
        &mut self,
        runtime: &R,
        configurator: &mut dyn StaticConfigurator,
    ) -> Result<bool, AssemblyError> {
        self.enter(AssemblyState::Started, AssemblyState::Configured)?;
        let settled = self.settle(runtime);
        let primary = self.primary_controller_address(runtime);
        match &primary {
            Some(address) => info!("Primary controller at {}", address),
            None => warn!("No primary controller, network configuration gets an empty address"),
        }
        configurator.configure(primary.as_deref())?;
        self.state = AssemblyState::Configured;
        Ok(settled)
    }

    /// Every stage in order, stopping at the first failure
    pub fn run(
        &mut self,
        runtime: &mut R,
        sets: &[ControllerSet],
        configurator: &mut dyn StaticConfigurator,
    ) -> Result<AssemblyReport, AssemblyError> {
        self.assign_controllers(sets)?;
        self.declare()?;
        self.inject(runtime)?;
        self.wire(runtime)?;
        self.start(runtime)?;
        let settled = self.configure(runtime, configurator)?;

        Ok(AssemblyReport {
            domains: self.domains.len(),
            cross_links: self.cross_links,
            primary_controller: self.primary_controller_address(runtime),
            settled,
        })
    }
}

impl<R: Runtime> fmt::Debug for TopologyAssembler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyAssembler")
            .field("domains", &self.domains)
            .field("wiring", &self.wiring.len())
            .field("settings", &self.settings)
            .field("primary", &self.primary)
            .field("state", &self.state)
            .finish()
    }
}
