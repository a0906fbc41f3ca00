#![cfg(test)]
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use topomap_common::command::ShowCommand;
use topomap_common::config::{Credentials, DiscoveryConfig, SeedDevice};
use topomap_common::error::{DiscoveryError, ExecError};
use topomap_common::network::subnet::parse_subnets;
use topomap_core::identity::Identity;
use topomap_core::serialize;
use topomap_core::topology::{DeviceRole, DeviceStatus, SkipReason, Termination};
use topomap_core::{DiscoveryEngine, Topology};
use topomap_protocols::IosParser;

use crate::utils::{neighbor, seed, DeviceScript, ScriptedLab};

const SWITCH: &str = "WS-C2960X-48FPD-L";
const ROUTER: &str = "ISR4331/K9";

fn id(addr: &str) -> Identity {
    Identity::Address(addr.parse::<IpAddr>().unwrap())
}

fn engine(lab: ScriptedLab) -> DiscoveryEngine {
    DiscoveryEngine::new(Box::new(lab), Box::new(IosParser::new()))
}

async fn run(lab: ScriptedLab, config: &DiscoveryConfig) -> Topology {
    engine(lab).discover(config).await.expect("discovery failed")
}

fn status(topology: &Topology, addr: &str) -> DeviceStatus {
    topology.device(&id(addr)).expect("device missing").status.clone()
}

fn depth(topology: &Topology, addr: &str) -> u32 {
    topology.device(&id(addr)).expect("device missing").discovery_depth
}

fn assert_graph_invariants(topology: &Topology) {
    let identities: HashSet<&Identity> = topology.devices().map(|d| &d.identity).collect();
    assert_eq!(identities.len(), topology.device_count(), "duplicate identity");

    for edge in topology.edges() {
        assert!(topology.contains(&edge.source), "dangling edge source {}", edge.source);
        assert!(topology.contains(&edge.target), "dangling edge target {}", edge.target);
        assert_ne!(edge.source, edge.target);
    }
}

/// A reports B and C, B reports D in 10.9.0.0/16. Everyone reports back.
fn campus_lab() -> ScriptedLab {
    ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1")
                .cdp(neighbor("dist-sw1", "10.0.0.2", "Gi0/0/1", "Gi1/0/48"))
                .cdp(neighbor("dist-sw2", "10.0.0.3", "Gi0/0/2", "Gi1/0/48")),
        )
        .device(
            "10.0.0.2",
            DeviceScript::new("dist-sw1", SWITCH, "10.0.0.2")
                .cdp(neighbor("core-rtr1", "10.0.0.1", "Gi1/0/48", "Gi0/0/1").with_platform("Cisco ISR4331/K9"))
                .cdp(neighbor("branch-fw1", "10.9.0.4", "Gi1/0/1", "Gi0/0")),
        )
        .device(
            "10.0.0.3",
            DeviceScript::new("dist-sw2", SWITCH, "10.0.0.3")
                .cdp(neighbor("core-rtr1", "10.0.0.1", "Gi1/0/48", "Gi0/0/2").with_platform("Cisco ISR4331/K9")),
        )
}

fn campus_config() -> DiscoveryConfig {
    campus_config_with(vec![seed("10.0.0.1")])
}

fn campus_config_with(seeds: Vec<SeedDevice>) -> DiscoveryConfig {
    DiscoveryConfig::new(seeds).with_ignored_subnets(parse_subnets(["10.9.0.0/16"]).unwrap())
}

#[tokio::test]
async fn ignored_subnet_neighbor_is_kept_as_skipped_stub() {
    let topology = run(campus_lab(), &campus_config()).await;

    assert_eq!(topology.device_count(), 4);
    for addr in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        assert_eq!(status(&topology, addr), DeviceStatus::Reachable, "{addr}");
    }
    assert_eq!(
        status(&topology, "10.9.0.4"),
        DeviceStatus::Skipped {
            reason: SkipReason::IgnoredSubnet
        }
    );

    assert_eq!(topology.edge_count(), 3);
    assert!(topology.has_edge(&id("10.0.0.1"), &id("10.0.0.2")));
    assert!(topology.has_edge(&id("10.0.0.1"), &id("10.0.0.3")));
    assert!(topology.has_edge(&id("10.0.0.2"), &id("10.9.0.4")));

    assert_eq!(depth(&topology, "10.0.0.1"), 0);
    assert_eq!(depth(&topology, "10.0.0.2"), 1);
    assert_eq!(depth(&topology, "10.9.0.4"), 2);
    assert_eq!(topology.run().termination, Termination::Exhausted);
    assert!(topology.is_complete());
    assert_graph_invariants(&topology);
}

#[tokio::test]
async fn ignored_devices_are_never_dialled() {
    let lab = campus_lab();
    let opened = lab.opened();
    run(lab, &campus_config()).await;

    let opened = opened.lock().unwrap();
    assert_eq!(*opened, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
}

#[tokio::test]
async fn visited_devices_carry_parsed_attributes() {
    let topology = run(campus_lab(), &campus_config()).await;

    let core = topology.device(&id("10.0.0.1")).unwrap();
    assert_eq!(core.attributes.hostname.as_deref(), Some("core-rtr1"));
    assert_eq!(core.attributes.platform.as_deref(), Some(ROUTER));
    assert_eq!(core.attributes.software_version.as_deref(), Some("15.2(7)E3"));
    assert_eq!(core.attributes.role, DeviceRole::Router);

    let uplink = core
        .attributes
        .interfaces
        .iter()
        .find(|i| i.name == "GigabitEthernet0/0/1")
        .expect("uplink interface");
    assert_eq!(uplink.neighbor, Some(id("10.0.0.2")));
    assert_eq!(uplink.status.as_deref(), Some("up"));

    let dist = topology.device(&id("10.0.0.2")).unwrap();
    assert_eq!(dist.attributes.role, DeviceRole::Switch);
}

#[tokio::test]
async fn unreachable_seed_completes_without_error() {
    let lab = ScriptedLab::new().failing(
        "10.0.0.1",
        ExecError::Auth {
            address: "10.0.0.1".into(),
            user: "admin".into(),
        },
    );
    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    assert_eq!(topology.device_count(), 1);
    assert_eq!(topology.edge_count(), 0);
    assert!(matches!(
        status(&topology, "10.0.0.1"),
        DeviceStatus::Unreachable { reason } if reason.contains("authentication")
    ));
    assert_eq!(topology.run().termination, Termination::Exhausted);
}

#[tokio::test]
async fn shared_neighbor_appears_once_with_first_depth() {
    let lab = ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1")
                .cdp(neighbor("dist-sw1", "10.0.0.2", "Gi0/0/1", "Gi1/0/48"))
                .cdp(neighbor("dist-sw2", "10.0.0.3", "Gi0/0/2", "Gi1/0/48")),
        )
        .device(
            "10.0.0.2",
            DeviceScript::new("dist-sw1", SWITCH, "10.0.0.2")
                .cdp(neighbor("access-sw1", "10.0.0.4", "Gi1/0/1", "Gi0/1")),
        )
        .device(
            "10.0.0.3",
            DeviceScript::new("dist-sw2", SWITCH, "10.0.0.3")
                .cdp(neighbor("access-sw1", "10.0.0.4", "Gi1/0/1", "Gi0/2")),
        )
        .device("10.0.0.4", DeviceScript::new("access-sw1", SWITCH, "10.0.0.4"));

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    let access: Vec<_> = topology
        .devices()
        .filter(|d| d.identity == id("10.0.0.4"))
        .collect();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].discovery_depth, 2);
    assert!(topology.has_edge(&id("10.0.0.2"), &id("10.0.0.4")));
    assert!(topology.has_edge(&id("10.0.0.3"), &id("10.0.0.4")));
    assert_eq!(topology.visited_count(), 4);
    assert_graph_invariants(&topology);
}

#[tokio::test]
async fn neighbor_cycles_terminate() {
    let lab = ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("sw-a", SWITCH, "10.0.0.1")
                .cdp(neighbor("sw-b", "10.0.0.2", "Gi0/1", "Gi0/2")),
        )
        .device(
            "10.0.0.2",
            DeviceScript::new("sw-b", SWITCH, "10.0.0.2")
                .cdp(neighbor("sw-c", "10.0.0.3", "Gi0/1", "Gi0/2")),
        )
        .device(
            "10.0.0.3",
            DeviceScript::new("sw-c", SWITCH, "10.0.0.3")
                .cdp(neighbor("sw-a", "10.0.0.1", "Gi0/1", "Gi0/2")),
        );
    let opened = lab.opened();

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    assert_eq!(topology.device_count(), 3);
    assert_eq!(topology.edge_count(), 3);
    assert_eq!(opened.lock().unwrap().len(), 3);
    assert_graph_invariants(&topology);
}

#[tokio::test]
async fn identical_runs_are_deterministic() {
    let first = run(campus_lab(), &campus_config()).await;
    let second = run(campus_lab(), &campus_config()).await;

    let depths = |t: &Topology| -> Vec<(Identity, u32)> {
        t.devices()
            .map(|d| (d.identity.clone(), d.discovery_depth))
            .collect()
    };
    assert_eq!(depths(&first), depths(&second));
    assert_eq!(first.edges(), second.edges());
}

#[tokio::test]
async fn parallel_visits_match_sequential_result() {
    let sequential = run(campus_lab(), &campus_config()).await;
    let parallel = run(campus_lab(), &campus_config().with_parallelism(4)).await;

    let summary = |t: &Topology| -> Vec<(Identity, u32, DeviceStatus)> {
        t.devices()
            .map(|d| (d.identity.clone(), d.discovery_depth, d.status.clone()))
            .collect()
    };
    assert_eq!(summary(&sequential), summary(&parallel));
    assert_eq!(sequential.edges(), parallel.edges());
}

fn star_lab(spokes: u8) -> ScriptedLab {
    let mut hub = DeviceScript::new("hub-sw", SWITCH, "10.0.0.1");
    let mut lab = ScriptedLab::new();
    for n in 0..spokes {
        let addr = format!("10.0.1.{}", n + 1);
        let name = format!("spoke-sw{}", n + 1);
        hub = hub.cdp(neighbor(&name, &addr, &format!("Gi0/{}", n + 1), "Gi0/48"));
        lab = lab.device(&addr, DeviceScript::new(&name, SWITCH, &addr));
    }
    lab.device("10.0.0.1", hub)
}

#[tokio::test]
async fn device_cap_bounds_visits() {
    let config = DiscoveryConfig::new(vec![seed("10.0.0.1")]).with_max_devices(3);
    let topology = run(star_lab(5), &config).await;

    assert_eq!(topology.visited_count(), 3);
    assert_eq!(topology.device_count(), 6);
    assert_eq!(topology.count_by_status("skipped"), 3);
    for device in topology.devices().filter(|d| !d.status.is_visited()) {
        assert_eq!(
            device.status,
            DeviceStatus::Skipped {
                reason: SkipReason::DeviceCapReached
            }
        );
    }
    assert_eq!(topology.run().termination, Termination::DeviceCap);
    assert_graph_invariants(&topology);
}

#[tokio::test]
async fn device_cap_holds_with_parallel_visits() {
    let config = DiscoveryConfig::new(vec![seed("10.0.0.1")])
        .with_max_devices(4)
        .with_parallelism(8);
    let topology = run(star_lab(6), &config).await;

    assert_eq!(topology.visited_count(), 4);
    assert_eq!(topology.run().visited, 4);
}

#[tokio::test]
async fn stop_signal_returns_partial_topology() {
    let stop = Arc::new(AtomicBool::new(false));
    let lab = campus_lab().stop_after(1, stop.clone());

    let topology = engine(lab)
        .with_stop_signal(stop)
        .discover(&campus_config())
        .await
        .expect("cancelled runs still return a topology");

    assert_eq!(topology.run().termination, Termination::Cancelled);
    assert_eq!(status(&topology, "10.0.0.1"), DeviceStatus::Reachable);
    assert_eq!(status(&topology, "10.0.0.2"), DeviceStatus::Pending);
    assert_eq!(status(&topology, "10.0.0.3"), DeviceStatus::Pending);
    assert_eq!(topology.edge_count(), 2);
    assert!(!topology.is_complete());
}

#[tokio::test]
async fn run_timeout_returns_untouched_seeds() {
    let config = campus_config().with_run_timeout(Some(Duration::ZERO));
    let topology = run(campus_lab(), &config).await;

    assert_eq!(topology.run().termination, Termination::TimedOut);
    assert_eq!(status(&topology, "10.0.0.1"), DeviceStatus::Pending);
    assert_eq!(topology.visited_count(), 0);
}

#[tokio::test]
async fn parse_failure_keeps_device_reachable() {
    let lab = ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1")
                .cdp(neighbor("dist-sw1", "10.0.0.2", "Gi0/0/1", "Gi1/0/48"))
                .answer(
                    ShowCommand::LldpNeighbors,
                    Ok("% Invalid input detected at '^' marker.\n".into()),
                )
                .answer(
                    ShowCommand::Interfaces,
                    Err(ExecError::Command {
                        command: ShowCommand::Interfaces,
                        reason: "output truncated".into(),
                    }),
                ),
        )
        .device("10.0.0.2", DeviceScript::new("dist-sw1", SWITCH, "10.0.0.2"));

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    let core = topology.device(&id("10.0.0.1")).unwrap();
    assert_eq!(core.status, DeviceStatus::Reachable);
    let failed: Vec<&str> = core.failures.iter().map(|f| f.command.as_str()).collect();
    assert_eq!(failed, vec!["show lldp neighbors detail", "show interfaces"]);
    assert_eq!(status(&topology, "10.0.0.2"), DeviceStatus::Reachable);

    let vlan = core.attributes.interfaces.iter().find(|i| i.name == "Vlan1");
    assert_eq!(vlan.and_then(|i| i.address.as_deref()), Some("10.0.0.1"));
}

#[tokio::test]
async fn unparseable_answers_keep_device_reachable() {
    const REJECTED: &str = "% Invalid input detected at '^' marker.\n";
    let script = ShowCommand::DISCOVERY_SET
        .into_iter()
        .fold(DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1"), |script, command| {
            script.answer(command, Ok(REJECTED.into()))
        });
    let lab = ScriptedLab::new().device("10.0.0.1", script);

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    let core = topology.device(&id("10.0.0.1")).unwrap();
    assert_eq!(core.status, DeviceStatus::Reachable);
    assert_eq!(core.failures.len(), ShowCommand::DISCOVERY_SET.len());
    assert_eq!(core.attributes.hostname, None);
    assert_eq!(topology.device_count(), 1);
    assert_eq!(topology.edge_count(), 0);
}

#[tokio::test]
async fn unresolvable_neighbor_is_kept_but_never_dialled() {
    let lab = ScriptedLab::new().device(
        "10.0.0.1",
        DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1").answer(
            ShowCommand::CdpNeighbors,
            Ok("-------------------------\n\
                Interface: GigabitEthernet0/0/3,  Port ID (outgoing port): GigabitEthernet0/1\n\
                Holdtime : 141 sec\n"
                .into()),
        ),
    );
    let opened = lab.opened();

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    assert_eq!(topology.device_count(), 2);
    let stub = topology
        .devices()
        .find(|device| device.identity.is_unresolved())
        .expect("unresolved neighbor dropped");
    assert_eq!(
        stub.status,
        DeviceStatus::Skipped {
            reason: SkipReason::Unresolved
        }
    );
    assert_eq!(stub.discovery_depth, 1);
    assert_eq!(topology.edge_count(), 1);
    assert!(topology.has_edge(&id("10.0.0.1"), &stub.identity));
    assert_eq!(*opened.lock().unwrap(), vec!["10.0.0.1"]);
    assert_graph_invariants(&topology);
}

#[tokio::test]
async fn lost_session_without_output_marks_device_unreachable() {
    let lab = ScriptedLab::new().device(
        "10.0.0.1",
        DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1").answer(
            ShowCommand::Version,
            Err(ExecError::Timeout {
                address: "10.0.0.1".into(),
                after: Duration::from_secs(30),
            }),
        ),
    );

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    let core = topology.device(&id("10.0.0.1")).unwrap();
    assert!(matches!(core.status, DeviceStatus::Unreachable { .. }));
    assert_eq!(core.failures.len(), 1);
}

#[tokio::test]
async fn cdp_and_lldp_reports_of_one_link_are_merged() {
    let lab = ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1")
                .cdp(neighbor("dist-sw1", "10.0.0.2", "Gi0/0/1", "Gi1/0/48"))
                .lldp(neighbor("dist-sw1", "10.0.0.2", "Gi0/0/1", "Gi1/0/48")),
        )
        .device("10.0.0.2", DeviceScript::new("dist-sw1", SWITCH, "10.0.0.2"));

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    assert_eq!(topology.device_count(), 2);
    assert_eq!(topology.edge_count(), 1);
}

#[tokio::test]
async fn neighbor_without_address_is_dialled_by_name() {
    let lab = ScriptedLab::new()
        .device(
            "10.0.0.1",
            DeviceScript::new("core-rtr1", ROUTER, "10.0.0.1")
                .cdp(neighbor("Lab-SW9", "0.0.0.0", "Gi0/0/3", "Gi0/1").without_address()),
        )
        .device("lab-sw9", DeviceScript::new("lab-sw9", SWITCH, "10.0.0.9"));

    let topology = run(lab, &DiscoveryConfig::new(vec![seed("10.0.0.1")])).await;

    let named = Identity::Hostname("lab-sw9".into());
    assert_eq!(topology.device(&named).unwrap().status, DeviceStatus::Reachable);
    assert!(topology.has_edge(&id("10.0.0.1"), &named));
}

#[tokio::test]
async fn neighbors_inherit_reporting_device_credentials() {
    let lab = campus_lab();
    let logins = lab.logins();
    let netops = SeedDevice::new(
        "10.0.0.1",
        Credentials::new("netops").with_password("hunter2"),
    );

    run(lab, &campus_config_with(vec![netops])).await;

    let logins = logins.lock().unwrap();
    assert_eq!(logins.len(), 3);
    assert!(logins.iter().all(|user| user == "netops"));
}

#[tokio::test]
async fn progress_is_reported_per_visit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(AtomicUsize::new(0));
    let observer = {
        let calls = calls.clone();
        let last = last.clone();
        move |count: usize| {
            calls.fetch_add(1, Ordering::SeqCst);
            last.store(count, Ordering::SeqCst);
        }
    };

    let topology = engine(campus_lab())
        .with_progress(Box::new(observer))
        .discover(&campus_config())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), topology.visited_count());
    assert_eq!(last.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn seeds_must_leave_something_to_visit() {
    let empty = engine(campus_lab())
        .discover(&DiscoveryConfig::new(Vec::<SeedDevice>::new()))
        .await;
    assert!(matches!(empty, Err(DiscoveryError::NoSeeds)));

    let excluded = DiscoveryConfig::new(vec![seed("10.9.0.4")])
        .with_ignored_subnets(parse_subnets(["10.9.0.0/16"]).unwrap());
    let result = engine(campus_lab()).discover(&excluded).await;
    assert!(matches!(
        result,
        Err(DiscoveryError::AllSeedsExcluded { excluded: 1 })
    ));
}

#[tokio::test]
async fn document_lists_every_device_and_link() -> anyhow::Result<()> {
    let topology = engine(campus_lab()).discover(&campus_config()).await?;
    let json: serde_json::Value = serde_json::from_str(&serialize::to_json(&topology)?)?;

    let devices = json["devices"].as_array().expect("devices array");
    assert_eq!(devices.len(), 4);
    let by_identity: HashMap<&str, &serde_json::Value> = devices
        .iter()
        .filter_map(|d| Some((d["identity"].as_str()?, d)))
        .collect();
    assert_eq!(by_identity["10.9.0.4"]["status"]["state"], "skipped");
    assert_eq!(by_identity["10.9.0.4"]["status"]["reason"], "ignored-subnet");
    assert_eq!(by_identity["10.0.0.2"]["discovery_depth"], 1);

    assert_eq!(json["edges"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["run"]["termination"], "exhausted");
    assert_eq!(topology.device_count(), 4);
    Ok(())
}
