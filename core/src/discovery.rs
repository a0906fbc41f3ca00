//! # Recursive Discovery Engine
//!
//! Walks the network breadth-first, level by level, starting from the seed
//! devices.
//!
//! For every frontier entry the engine:
//! 1. visits the device through the [`CommandExecutor`] and [`OutputParser`] ports;
//! 2. records it as reachable or unreachable;
//! 3. resolves each reported neighbor to an [`Identity`], records the edge and,
//!    for neighbors never seen before, inserts a pending stub;
//! 4. runs new stubs through the [`ScopeFilter`]; admitted ones join the next level.
//!
//! Per-device failures never abort the run. The only fatal errors are an empty
//! seed list and a seed list the scope filter rejects entirely.
//!
//! Devices of one level may be visited concurrently (`parallelism > 1`). Visits
//! only produce outcomes; the graph is mutated afterwards in dequeue order, so
//! depth assignment and edge order do not depend on which visit finished first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures::future::join_all;
use tokio::time::Instant;
use topomap_common::command::ShowCommand;
use topomap_common::config::DiscoveryConfig;
use topomap_common::error::DiscoveryError;
use topomap_common::ports::{CommandExecutor, DeviceTarget, OutputParser};
use topomap_common::records::{NeighborRecord, ParsedOutput};
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::identity::{Identity, IdentityResolver};
use crate::scope::{Admission, ScopeFilter};
use crate::topology::{
    CommandFailure, Device, DeviceAttributes, DeviceStatus, Edge, EdgeInsert, RunSummary,
    SkipReason, Termination, Topology, TopologyGraph, classify_role,
};

mod visit;

use visit::{Timeouts, VisitOutcome};

const NO_ANSWER: &str = "session opened but no command returned output";

/// Application service driving one discovery run per call to [`discover`](Self::discover).
pub struct DiscoveryEngine {
    executor: Box<dyn CommandExecutor>,
    parser: Box<dyn OutputParser>,
    resolver: IdentityResolver,
    stop_signal: Arc<AtomicBool>,
    on_visit: Option<Box<dyn Fn(usize) + Send + Sync>>,
}

/// A frontier entry that has been dequeued and counted against the cap.
struct VisitJob {
    identity: Identity,
    target: DeviceTarget,
    depth: u32,
}

/// Mutable state of a run, exclusively owned by `discover`.
struct RunState {
    graph: TopologyGraph,
    scope: ScopeFilter,
    /// How to reach every admitted, not yet visited device.
    targets: HashMap<Identity, DeviceTarget>,
    /// Visits started, checked against the cap.
    visited: usize,
    /// Visits whose outcome has been applied.
    completed: usize,
    cap_hit: bool,
}

impl RunState {
    fn skip(&mut self, identity: &Identity, reason: SkipReason) {
        if reason == SkipReason::DeviceCapReached {
            self.cap_hit = true;
        }
        self.targets.remove(identity);
        self.graph
            .set_status(identity, DeviceStatus::Skipped { reason });
    }
}

impl DiscoveryEngine {
    pub fn new(executor: Box<dyn CommandExecutor>, parser: Box<dyn OutputParser>) -> Self {
        Self {
            executor,
            parser,
            resolver: IdentityResolver::new(),
            stop_signal: Arc::new(AtomicBool::new(false)),
            on_visit: None,
        }
    }

    /// Shares a flag that, once set, ends the run at the next frontier entry.
    pub fn with_stop_signal(mut self, stop_signal: Arc<AtomicBool>) -> Self {
        self.stop_signal = stop_signal;
        self
    }

    /// Called with the number of completed visits after each one.
    pub fn with_progress(mut self, on_visit: Box<dyn Fn(usize) + Send + Sync>) -> Self {
        self.on_visit = Some(on_visit);
        self
    }

    /// Runs a full discovery and returns the accumulated topology.
    ///
    /// Cancellation and the run timeout still return the partial topology.
    pub async fn discover(&self, config: &DiscoveryConfig) -> Result<Topology, DiscoveryError> {
        config
            .validate()
            .map_err(|e| DiscoveryError::InvalidConfig(e.to_string()))?;

        let started_at = Utc::now();
        let deadline = config.run_timeout.map(|limit| Instant::now() + limit);
        let timeouts = Timeouts {
            connect: config.connect_timeout,
            command: config.command_timeout,
        };

        let mut run = RunState {
            graph: TopologyGraph::new(),
            scope: ScopeFilter::from_config(config),
            targets: HashMap::new(),
            visited: 0,
            completed: 0,
            cap_hit: false,
        };

        let mut frontier = self.seed(&mut run, config)?;
        info!(
            seeds = frontier.len(),
            max_devices = config.max_devices,
            parallelism = config.parallelism,
            "starting discovery"
        );

        let mut termination = Termination::Exhausted;
        let mut depth_reached = 0;

        'levels: while !frontier.is_empty() {
            let mut level: VecDeque<Identity> = std::mem::take(&mut frontier).into();
            let mut next: Vec<Identity> = Vec::new();
            if let Some(first) = level.front().and_then(|id| run.graph.device(id)) {
                depth_reached = depth_reached.max(first.discovery_depth);
            }
            debug!(depth = depth_reached, size = level.len(), "entering level");

            loop {
                if let Some(reason) = self.interruption(deadline) {
                    warn!(%reason, "discovery interrupted, keeping partial topology");
                    termination = reason;
                    break 'levels;
                }

                let batch = self.next_batch(&mut run, &mut level, config.parallelism);
                if batch.is_empty() {
                    break;
                }

                let outcomes = join_all(batch.iter().map(|job| {
                    let span = info_span!("visit", device = %job.identity, depth = job.depth);
                    visit::visit(&*self.executor, &*self.parser, &job.target, timeouts)
                        .instrument(span)
                }))
                .await;

                for (job, outcome) in batch.into_iter().zip(outcomes) {
                    self.apply(&mut run, &job, outcome, &mut next);
                }
            }

            frontier = next;
        }

        if termination == Termination::Exhausted && run.cap_hit {
            termination = Termination::DeviceCap;
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            termination,
            visited: run.graph.visited_count(),
            max_devices: config.max_devices,
            depth_reached,
        };
        info!(
            devices = run.graph.device_count(),
            edges = run.graph.edge_count(),
            visited = summary.visited,
            %termination,
            "discovery complete"
        );

        Ok(Topology::new(run.graph, summary))
    }

    /// Inserts every seed as pending and returns the admitted ones, in config order.
    fn seed(
        &self,
        run: &mut RunState,
        config: &DiscoveryConfig,
    ) -> Result<Vec<Identity>, DiscoveryError> {
        if config.seeds.is_empty() {
            return Err(DiscoveryError::NoSeeds);
        }

        let mut frontier = Vec::new();
        let mut excluded = 0;

        for seed in &config.seeds {
            let resolved = self.resolver.resolve_seed(&seed.address);
            let identity = resolved.identity.clone();
            let attributes = DeviceAttributes {
                hostname: resolved.hostname.clone(),
                ..DeviceAttributes::default()
            };
            let stub = Device::pending(identity.clone(), resolved.address, 0).with_attributes(attributes);

            if !run.graph.insert_device(stub) {
                debug!(seed = %identity, "duplicate seed ignored");
                continue;
            }

            match run.scope.admit(&identity, resolved.address, 0) {
                Admission::Admit => {
                    run.targets.insert(
                        identity.clone(),
                        DeviceTarget {
                            address: seed.address.trim().to_string(),
                            credentials: seed.credentials.clone(),
                            device_type: seed.device_type.clone(),
                        },
                    );
                    frontier.push(identity);
                }
                Admission::Skip(reason) => {
                    warn!(seed = %identity, %reason, "seed excluded");
                    excluded += 1;
                    run.skip(&identity, reason);
                }
            }
        }

        if frontier.is_empty() {
            return Err(DiscoveryError::AllSeedsExcluded { excluded });
        }
        Ok(frontier)
    }

    /// Dequeues up to `parallelism` visitable entries, reserving a cap slot for each.
    ///
    /// Once the cap is reached the rest of the level is drained and marked skipped.
    fn next_batch(
        &self,
        run: &mut RunState,
        level: &mut VecDeque<Identity>,
        parallelism: usize,
    ) -> Vec<VisitJob> {
        let mut batch = Vec::new();

        while batch.len() < parallelism {
            let Some(identity) = level.pop_front() else {
                break;
            };

            let Some(depth) = run
                .graph
                .device(&identity)
                .filter(|device| !device.status.is_visited())
                .map(|device| device.discovery_depth)
            else {
                trace!(device = %identity, "already visited");
                continue;
            };

            if run.visited >= run.scope.max_devices() {
                debug!(device = %identity, "device cap reached before visit");
                run.skip(&identity, SkipReason::DeviceCapReached);
                continue;
            }

            let Some(target) = run.targets.remove(&identity) else {
                warn!(device = %identity, "queued without a dial target");
                continue;
            };

            run.visited += 1;
            batch.push(VisitJob {
                identity,
                target,
                depth,
            });
        }

        batch
    }

    /// Folds one visit outcome into the graph and queues admitted neighbors.
    fn apply(&self, run: &mut RunState, job: &VisitJob, outcome: VisitOutcome, next: &mut Vec<Identity>) {
        run.completed += 1;

        match outcome {
            VisitOutcome::Unreachable(err) => {
                warn!(device = %job.identity, %err, "device unreachable");
                run.graph.set_status(
                    &job.identity,
                    DeviceStatus::Unreachable {
                        reason: err.to_string(),
                    },
                );
            }
            VisitOutcome::Visited {
                answered,
                outputs,
                failures,
            } => {
                self.apply_visit(run, job, answered, outputs, failures, next);
            }
        }

        if let Some(on_visit) = &self.on_visit {
            on_visit(run.completed);
        }
    }

    fn apply_visit(
        &self,
        run: &mut RunState,
        job: &VisitJob,
        answered: usize,
        outputs: Vec<(ShowCommand, ParsedOutput)>,
        failures: Vec<CommandFailure>,
        next: &mut Vec<Identity>,
    ) {
        let Some(device) = run.graph.device_mut(&job.identity) else {
            return;
        };
        device.failures = failures;

        if answered == 0 {
            warn!(device = %job.identity, "{NO_ANSWER}");
            device.status = DeviceStatus::Unreachable {
                reason: NO_ANSWER.to_string(),
            };
            return;
        }

        apply_outputs(&mut device.attributes, &outputs);
        device.status = DeviceStatus::Reachable;
        info!(
            device = %job.identity,
            hostname = device.attributes.hostname.as_deref().unwrap_or("-"),
            role = %device.attributes.role,
            "device reachable"
        );

        let neighbors = outputs.into_iter().flat_map(|(_, output)| match output {
            ParsedOutput::Neighbors(records) => records,
            _ => Vec::new(),
        });
        for record in neighbors {
            self.link_neighbor(run, job, &record, next);
        }
    }

    /// Resolves one neighbor record, records the adjacency and queues the
    /// neighbor if it is new and in scope.
    fn link_neighbor(
        &self,
        run: &mut RunState,
        job: &VisitJob,
        record: &NeighborRecord,
        next: &mut Vec<Identity>,
    ) {
        let resolved = self.resolver.resolve(record);
        let identity = resolved.identity.clone();

        if identity == job.identity {
            trace!(device = %identity, "ignoring self advertisement");
            return;
        }

        let is_new = !run.graph.contains(&identity);
        if is_new {
            let attributes = DeviceAttributes {
                hostname: resolved.hostname.clone(),
                platform: record.platform.clone(),
                capabilities: record.capabilities.clone(),
                role: classify_role(
                    record.platform.as_deref(),
                    &record.capabilities,
                    resolved.hostname.as_deref(),
                ),
                ..DeviceAttributes::default()
            };
            let stub = Device::pending(identity.clone(), resolved.address, job.depth + 1)
                .with_attributes(attributes);
            run.graph.insert_device(stub);
        }

        if let Some(local) = &record.local_interface
            && let Some(device) = run.graph.device_mut(&job.identity)
        {
            let interface = device.attributes.interface_mut(local);
            if interface.neighbor.is_none() {
                interface.neighbor = Some(identity.clone());
            }
        }

        let edge = Edge {
            source: job.identity.clone(),
            target: identity.clone(),
            local_interface: record.local_interface.clone(),
            remote_interface: record.remote_interface.clone(),
            protocol: record.protocol,
        };
        match run.graph.add_edge(edge) {
            EdgeInsert::Added => debug!(from = %job.identity, to = %identity, "edge recorded"),
            EdgeInsert::Coalesced => trace!(from = %job.identity, to = %identity, "edge already known"),
            EdgeInsert::Rejected => warn!(from = %job.identity, to = %identity, "edge rejected"),
        }

        if !is_new {
            return;
        }

        if resolved.is_unresolved() {
            debug!(device = %identity, "neighbor advertised no address or name");
            run.skip(&identity, SkipReason::Unresolved);
            return;
        }

        match run.scope.admit(&identity, resolved.address, run.visited) {
            Admission::Admit => {
                let Some(address) = resolved.dial_address() else {
                    run.skip(&identity, SkipReason::Unresolved);
                    return;
                };
                run.targets.insert(
                    identity.clone(),
                    DeviceTarget {
                        address,
                        credentials: job.target.credentials.clone(),
                        device_type: job.target.device_type.clone(),
                    },
                );
                next.push(identity);
            }
            Admission::Skip(reason) => {
                info!(device = %identity, %reason, "neighbor skipped");
                run.skip(&identity, reason);
            }
        }
    }

    fn interruption(&self, deadline: Option<Instant>) -> Option<Termination> {
        if self.stop_signal.load(Ordering::Relaxed) {
            return Some(Termination::Cancelled);
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(Termination::TimedOut);
        }
        None
    }
}

/// Copies version and interface facts into a visited device's attributes.
fn apply_outputs(attributes: &mut DeviceAttributes, outputs: &[(ShowCommand, ParsedOutput)]) {
    for (_, output) in outputs {
        match output {
            ParsedOutput::Version(version) => {
                if version.hostname.is_some() {
                    attributes.hostname = version.hostname.clone();
                }
                if version.hardware.is_some() {
                    attributes.platform = version.hardware.clone();
                }
                attributes.software_version = version.software_version.clone();
                attributes.serial = version.serial.clone();
            }
            ParsedOutput::Interfaces(records) => {
                for record in records {
                    let interface = attributes.interface_mut(&record.name);
                    interface.status = record.status.clone();
                    interface.protocol_status = record.protocol_status.clone();
                    interface.description = record.description.clone();
                    if record.address.is_some() {
                        interface.address = record.address.clone();
                    }
                }
            }
            ParsedOutput::InterfaceAddresses(rows) => {
                for row in rows {
                    let Some(address) = &row.address else {
                        continue;
                    };
                    let interface = attributes.interface_mut(&row.name);
                    if interface.address.is_none() {
                        interface.address = Some(address.clone());
                    }
                    if interface.status.is_none() {
                        interface.status = Some(row.status.clone());
                    }
                }
            }
            ParsedOutput::Neighbors(_) => {}
        }
    }

    attributes.role = classify_role(
        attributes.platform.as_deref(),
        &attributes.capabilities,
        attributes.hostname.as_deref(),
    );
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
