//! # Topology Model
//!
//! The graph built during a run ([`TopologyGraph`]) and the read-only
//! [`Topology`] snapshot handed to renderers and the serializer afterwards.
//!
//! Invariants upheld by the graph:
//! * no two devices share an identity;
//! * every edge endpoint is in the device set;
//! * the device set only grows during a run.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;

mod device;
mod graph;

pub use device::{
    CommandFailure, Device, DeviceAttributes, DeviceRole, DeviceStatus, Interface, SkipReason,
    classify_role,
};
pub use graph::{Edge, EdgeInsert, EdgeKey, TopologyGraph};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The frontier emptied.
    Exhausted,
    /// The device cap left work unvisited.
    DeviceCap,
    Cancelled,
    TimedOut,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::Exhausted => "exhausted",
            Termination::DeviceCap => "device-cap",
            Termination::Cancelled => "cancelled",
            Termination::TimedOut => "timed-out",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub termination: Termination,
    pub visited: usize,
    pub max_devices: usize,
    /// Deepest BFS level that was entered.
    pub depth_reached: u32,
}

/// Immutable result of one discovery run.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: TopologyGraph,
    run: RunSummary,
}

impl Topology {
    pub(crate) fn new(graph: TopologyGraph, run: RunSummary) -> Self {
        Self { graph, run }
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn run(&self) -> &RunSummary {
        &self.run
    }

    /// Whether the run covered everything it found.
    pub fn is_complete(&self) -> bool {
        self.run.termination == Termination::Exhausted
    }
}

impl Deref for Topology {
    type Target = TopologyGraph;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}
