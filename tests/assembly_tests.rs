#[cfg(test)]
mod assembly_tests {
    use std::collections::HashMap;
    use std::process::Command;
    use std::time::Duration;

    use netdomains::assembler::{AssemblyError, AssemblySettings, AssemblyState, TopologyAssembler};
    use netdomains::config::ScenarioConfig;
    use netdomains::controller::{ControllerSet, PolicyError};
    use netdomains::domain::{Blueprint, Declarer, Domain, DomainRole};
    use netdomains::process::{ProcessError, StaticConfigurator};
    use netdomains::registry::RegistryError;
    use netdomains::runtime::{EmulatedNetwork, Runtime, RuntimeError, TopologySnapshot};
    use netdomains::scenario::{EcordScenario, PRIMARY_DOMAIN};
    use netdomains::topology::{EndpointRef, WiringPlan};
    use netdomains::utils::options::Attrs;

    /// Runtime that only records the calls it receives
    #[derive(Default)]
    struct RecordingRuntime {
        events: Vec<String>,
        controller_ips: HashMap<String, String>,
    }

    impl RecordingRuntime {
        fn position(&self, event: &str) -> usize {
            self.events
                .iter()
                .position(|e| e == event)
                .unwrap_or_else(|| panic!("no event '{}' in {:?}", event, self.events))
        }

        fn last_position(&self, prefix: &str) -> usize {
            self.events.iter().rposition(|e| e.starts_with(prefix)).unwrap()
        }

        fn first_position(&self, prefix: &str) -> usize {
            self.events.iter().position(|e| e.starts_with(prefix)).unwrap()
        }
    }

    impl Runtime for RecordingRuntime {
        type Node = String;
        type Link = (String, String);
        type Controller = String;

        fn add_switch(&mut self, name: &str, _attrs: &Attrs) -> Result<String, RuntimeError> {
            self.events.push(format!("switch {}", name));
            Ok(name.to_string())
        }

        fn add_host(&mut self, name: &str, _attrs: &Attrs) -> Result<String, RuntimeError> {
            self.events.push(format!("host {}", name));
            Ok(name.to_string())
        }

        fn add_link(&mut self, a: &String, b: &String, _attrs: &Attrs) -> Result<(String, String), RuntimeError> {
            self.events.push(format!("link {}-{}", a, b));
            Ok((a.clone(), b.clone()))
        }

        fn add_controller(&mut self, name: &str, attrs: &Attrs) -> Result<String, RuntimeError> {
            self.events.push(format!("controller {}", name));
            if let Some(ip) = attrs.get_str("ip") {
                self.controller_ips.insert(name.to_string(), ip.to_string());
            }
            Ok(name.to_string())
        }

        fn start_controller(&mut self, controller: &String) -> Result<(), RuntimeError> {
            self.events.push(format!("start-controller {}", controller));
            Ok(())
        }

        fn start_switch(&mut self, switch: &String, controllers: &[String]) -> Result<(), RuntimeError> {
            self.events.push(format!("start-switch {} {}", switch, controllers.join(",")));
            Ok(())
        }

        fn controller_address(&self, controller: &String) -> Option<String> {
            self.controller_ips.get(controller).cloned()
        }

        fn stop(&mut self) -> Result<(), RuntimeError> {
            self.events.push("stop".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Option<String>>,
    }

    impl StaticConfigurator for Recorder {
        fn configure(&mut self, primary_controller: Option<&str>) -> Result<(), ProcessError> {
            self.calls.push(primary_controller.map(str::to_string));
            Ok(())
        }
    }

    /// One switch named after the domain, and a host whose link is declared
    /// before either endpoint
    struct Fabric(&'static str);

    impl Blueprint for Fabric {
        fn name(&self) -> &str {
            self.0
        }

        fn build(&self, domain: &mut dyn Declarer) -> Result<(), RegistryError> {
            let switch = format!("{}{}", self.0, domain.id());
            let host = format!("h{}{}", self.0, domain.id());
            domain.add_link(&switch, &host, Attrs::new())?;
            domain.add_host(&host, Attrs::new())?;
            domain.add_switch(&switch, Attrs::new())?;
            Ok(())
        }
    }

    fn settings() -> AssemblySettings {
        AssemblySettings {
            control_plane: true,
            settle_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Static + 3 sites + 1 metro, with every site wired to the metro
    fn claw<R: Runtime>() -> (Vec<Domain<R>>, WiringPlan) {
        let mut domains = vec![Domain::new(0, DomainRole::Static, Fabric("ovs"))];
        for id in 1..=3 {
            domains.push(Domain::new(id, DomainRole::Site, Fabric("xc")));
        }
        domains.push(Domain::new(4, DomainRole::Metro, Fabric("txp")));

        let mut plan = WiringPlan::new();
        for site in 1..=3usize {
            plan.push(
                EndpointRef::switch(4, "txp4"),
                EndpointRef::switch(site, &format!("xc{}", site)),
                Attrs::new(),
            );
        }
        plan.push(EndpointRef::switch(1, "xc1"), EndpointRef::switch(0, "ovs0"), Attrs::new());
        (domains, plan)
    }

    fn sets(args: &[&str]) -> Vec<ControllerSet> {
        ControllerSet::parse_all(args).unwrap()
    }

    #[test]
    fn test_single_set_reaches_every_site_and_metro() {
        let (domains, plan) = claw();
        let mut assembler = TopologyAssembler::new(domains, plan, settings()).unwrap();
        let mut runtime = RecordingRuntime::default();
        let mut recorder = Recorder::default();

        let report = assembler.run(&mut runtime, &sets(&["10.0.0.1"]), &mut recorder).unwrap();
        assert_eq!(report.domains, 5);
        assert_eq!(report.cross_links, 4);

        for name in ["cf1-0", "cf2-0", "cf3-0", "cm4-0"] {
            assert_eq!(runtime.controller_ips.get(name).map(String::as_str), Some("10.0.0.1"));
        }
        assert_eq!(runtime.controller_ips.get("cs0-0").map(String::as_str), Some("127.0.0.1"));

        // Each switch starts with exactly its own domain's controllers
        runtime.position("start-switch xc2 cf2-0");
        runtime.position("start-switch ovs0 cs0-0");
        assert_eq!(recorder.calls, vec![Some("10.0.0.1".to_string())]);
    }

    #[test]
    fn test_stages_complete_for_every_domain_before_the_next() {
        let (domains, plan) = claw();
        let mut assembler = TopologyAssembler::new(domains, plan, settings()).unwrap();
        let mut runtime = RecordingRuntime::default();
        assembler.run(&mut runtime, &sets(&["10.0.0.1"]), &mut Recorder::default()).unwrap();

        // Inside a domain: switches, hosts, links, controllers
        assert!(runtime.position("switch xc2") < runtime.position("host hxc2"));
        assert!(runtime.position("host hxc2") < runtime.position("link xc2-hxc2"));
        assert!(runtime.position("link xc2-hxc2") < runtime.position("controller cf2-0"));

        // Every domain is injected before the first cross-domain link
        let last_injected = runtime.position("controller cm4-0");
        assert!(last_injected < runtime.position("link txp4-xc1"));

        // Every cross-domain link exists before anything starts
        assert!(runtime.last_position("link ") < runtime.first_position("start-"));

        // Controllers of a domain start before its switches
        assert!(runtime.position("start-controller cm4-0") < runtime.position("start-switch txp4 cm4-0"));
    }

    #[test]
    fn test_two_sets_fail_before_any_domain_is_injected() {
        let (domains, plan) = claw();
        let mut assembler = TopologyAssembler::new(domains, plan, settings()).unwrap();
        let mut runtime = RecordingRuntime::default();
        let mut recorder = Recorder::default();

        let err = assembler
            .run(&mut runtime, &sets(&["10.0.0.1", "10.0.0.2"]), &mut recorder)
            .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Policy(PolicyError::InvalidControllerSetCount { count: 2 })
        ));
        assert!(runtime.events.is_empty());
        assert!(recorder.calls.is_empty());
        assert_eq!(assembler.state(), AssemblyState::New);
    }

    #[test]
    fn test_undeclared_cross_link_endpoint_fails_before_injection() {
        let (domains, mut plan) = claw();
        plan.push(EndpointRef::switch(1, "xc1"), EndpointRef::host(2, "hxc2"), Attrs::new());
        plan.push(EndpointRef::host(1, "hxc9"), EndpointRef::switch(2, "xc2"), Attrs::new());

        let mut assembler = TopologyAssembler::new(domains, plan, settings()).unwrap();
        let mut runtime = RecordingRuntime::default();
        let err = assembler
            .run(&mut runtime, &sets(&["10.0.0.1"]), &mut Recorder::default())
            .unwrap_err();

        assert!(matches!(err, AssemblyError::Wiring(_)));
        assert!(runtime.events.is_empty());
    }

    fn ecord(config: &ScenarioConfig, args: &[&str]) -> (EmulatedNetwork, Option<String>) {
        let scenario = EcordScenario::new(config);
        let settings = AssemblySettings {
            control_plane: config.control_plane,
            ..settings()
        };
        let mut assembler = TopologyAssembler::new(scenario.domains(), scenario.wiring(), settings)
            .unwrap()
            .with_primary_domain(PRIMARY_DOMAIN)
            .unwrap();
        let mut net = EmulatedNetwork::new();
        let mut recorder = Recorder::default();
        let report = assembler.run(&mut net, &sets(args), &mut recorder).unwrap();
        assert!(report.settled);
        (net, recorder.calls.pop().flatten())
    }

    #[test]
    fn test_ecord_default_topology() {
        let (net, primary) = ecord(
            &ScenarioConfig::default(),
            &["10.0.1.1", "10.0.2.1", "10.0.3.1", "10.0.4.1,10.0.4.2"],
        );

        assert_eq!(primary.as_deref(), Some("10.0.4.1"));
        assert_eq!(net.node_count(), 13);
        assert_eq!(net.link_count(), 12);

        assert_eq!(net.links_between("txp1", "xc2"), vec![(2, 2)]);
        assert_eq!(net.links_between("xc1", "ee1"), vec![(1, 2)]);
        assert_eq!(net.links_between("xc1", "ovs1"), vec![(3, 1)]);
        assert_eq!(net.links_between("ee3", "h30"), vec![(1, 0)]);

        assert_eq!(net.switch_controllers("xc2"), vec!["cf2-0".to_string()]);
        assert_eq!(net.switch_controllers("ee1"), vec!["cm1-0".to_string(), "cm1-1".to_string()]);
        assert_eq!(net.switch_controllers("txp1"), vec!["cm4-0".to_string(), "cm4-1".to_string()]);
        assert_eq!(net.switch_controllers("ovs3"), vec!["cs0-0".to_string()]);
    }

    #[test]
    fn test_ecord_without_control_plane() {
        let config = ScenarioConfig {
            control_plane: false,
            ..ScenarioConfig::default()
        };
        let (net, primary) = ecord(&config, &["10.0.0.1"]);
        assert_eq!(primary.as_deref(), Some("10.0.0.1"));

        let snapshot: TopologySnapshot = net.snapshot();
        let site = snapshot.controllers.iter().find(|c| c.name == "cf1-0").unwrap();
        assert_eq!(site.ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(site.port, 6666);
        assert!(site.started);
    }

    #[test]
    fn test_ecord_debug_cross_connects() {
        let config = ScenarioConfig {
            debug_xcs: true,
            ..ScenarioConfig::default()
        };
        let (net, _) = ecord(&config, &["10.0.0.1"]);

        assert_eq!(net.links_between("vh1", "xc1"), vec![(0, 1)]);
        assert_eq!(net.links_between("xc1", "vh2"), vec![(2, 0)]);
        assert_eq!(net.links_between("ovs2", "vh4"), vec![(1, 1)]);
        assert_eq!(net.links_between("xc2", "ovs2"), vec![(1, 2)]);
        assert!(net.links_between("txp1", "xc1").is_empty());
    }

    #[test]
    fn test_binary_rejects_two_controller_sets() {
        let output = Command::new(env!("CARGO_BIN_EXE_netdomains"))
            .args(["10.0.0.1", "10.0.0.2"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("one or four"), "unexpected stderr: {}", stderr);
    }

    #[test]
    fn test_binary_writes_topology() {
        let dir = tempfile::tempdir().unwrap();
        let topology = dir.path().join("topology.json");

        let status = Command::new(env!("CARGO_BIN_EXE_netdomains"))
            .arg("10.0.0.1")
            .arg("--skip-scripts")
            .arg("--output")
            .arg(&topology)
            .status()
            .unwrap();
        assert!(status.success());

        let snapshot: TopologySnapshot =
            serde_json::from_str(&std::fs::read_to_string(&topology).unwrap()).unwrap();
        assert_eq!(snapshot.switches.len(), 10);
        assert_eq!(snapshot.hosts.len(), 3);
        assert_eq!(snapshot.links.len(), 12);
        assert_eq!(snapshot.controllers.len(), 8);
        assert!(snapshot.controllers.iter().all(|c| c.started));
    }
}
