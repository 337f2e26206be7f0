//! # netdomains - multi-domain network topology assembly
//!
//! Builds one emulated network out of several independently declared
//! *domains*, each a subgraph of switches, hosts and links with its own set
//! of SDN controllers, and stitches them together with cross-domain links.
//!
//! ## Overview
//!
//! A domain is declared without touching the runtime. Once every domain has
//! been declared, the assembler injects them all into a single runtime,
//! resolves names to live handles, wires the links that span domains, starts
//! everything, and finally hands off to an external static-configuration
//! step. Which controller cluster each domain connects to is decided by a
//! small policy from the controller IP sets given on the command line.
//!
//! ## Architecture
//!
//! - `registry`: declared-name to handle maps with duplicate detection
//! - `runtime`: the [`Runtime`](runtime::Runtime) trait and the in-process
//!   [`EmulatedNetwork`](runtime::EmulatedNetwork)
//! - `domain`: domains, blueprints and the declare / inject / start lifecycle
//! - `controller`: controller IP sets and the assignment policy
//! - `topology`: cross-domain endpoints and wiring plans
//! - `assembler`: drives every domain through the lifecycle in order
//! - `scenario`: the metro-ethernet demo topology
//! - `process`: static-configuration scripts and the interactive shell
//! - `config`, `config_loader`: YAML configuration and CLI overrides
//! - `utils`: entity attributes and command-line validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netdomains::assembler::{AssemblySettings, TopologyAssembler};
//! use netdomains::config::ScenarioConfig;
//! use netdomains::process::StaticConfigurator;
//! use netdomains::runtime::EmulatedNetwork;
//! use netdomains::scenario::{EcordScenario, PRIMARY_DOMAIN};
//! use netdomains::utils::validate_controller_args;
//!
//! struct NoScripts;
//! impl StaticConfigurator for NoScripts {
//!     fn configure(&mut self, _: Option<&str>) -> Result<(), netdomains::process::ProcessError> {
//!         Ok(())
//!     }
//! }
//!
//! let sets = validate_controller_args(&["10.0.0.1"])?;
//! let scenario = EcordScenario::new(&ScenarioConfig::default());
//! let mut assembler = TopologyAssembler::new(scenario.domains(), scenario.wiring(), AssemblySettings::default())?
//!     .with_primary_domain(PRIMARY_DOMAIN)?;
//!
//! let mut net = EmulatedNetwork::new();
//! let report = assembler.run(&mut net, &sets, &mut NoScripts)?;
//! println!("{} domains, {} cross-domain links", report.domains, report.cross_links);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   log_level: info
//!   settle_timeout: 2s
//!   poll_interval: 100ms
//!
//! scenario:
//!   control_plane: true
//!   vlan_hosts: false
//!   debug_xcs: false
//!
//! scripts:
//!   enabled: true
//!   static_script: ./static.sh
//!   netcfg_script: ./netcfgs.sh
//! ```
//!
//! ## Error Handling
//!
//! Library modules return typed `thiserror` errors. The binary and the
//! configuration loader wrap them with `color_eyre` for reporting.

pub mod config;
pub mod config_loader;
pub mod utils;
pub mod registry;
pub mod runtime;
pub mod domain;
pub mod controller;
pub mod topology;
pub mod assembler;
pub mod scenario;
pub mod process;
