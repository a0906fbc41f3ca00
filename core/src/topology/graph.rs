//! The append-only device/edge store of one discovery run.

use std::collections::HashSet;

use indexmap::IndexMap;
use topomap_common::records::NeighborProtocol;

use super::device::{Device, DeviceStatus};
use crate::identity::Identity;

/// An adjacency observed from `source`'s neighbor table.
///
/// Edges are undirected for topology purposes; the direction records which
/// device reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: Identity,
    pub target: Identity,
    pub local_interface: Option<String>,
    pub remote_interface: Option<String>,
    pub protocol: NeighborProtocol,
}

impl Edge {
    /// Order-independent key of the endpoint pair.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.source, &self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey(Identity, Identity);

impl EdgeKey {
    pub fn new(a: &Identity, b: &Identity) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    /// The pair was already connected, possibly seen from the other side.
    Coalesced,
    /// An endpoint is not in the device set, or both endpoints are the same device.
    Rejected,
}

/// Devices in first-seen order plus the coalesced edge set.
///
/// Mutation is reserved to the discovery engine; everything outside this crate
/// only ever sees a shared reference.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    devices: IndexMap<Identity, Device>,
    edges: Vec<Edge>,
    edge_keys: HashSet<EdgeKey>,
}

impl TopologyGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a device unless its identity is already known. Returns whether it was new.
    pub(crate) fn insert_device(&mut self, device: Device) -> bool {
        if self.devices.contains_key(&device.identity) {
            return false;
        }
        self.devices.insert(device.identity.clone(), device);
        true
    }

    pub(crate) fn device_mut(&mut self, identity: &Identity) -> Option<&mut Device> {
        self.devices.get_mut(identity)
    }

    pub(crate) fn set_status(&mut self, identity: &Identity, status: DeviceStatus) {
        if let Some(device) = self.devices.get_mut(identity) {
            device.status = status;
        }
    }

    /// Records an adjacency. Re-observing an existing pair is a no-op.
    pub(crate) fn add_edge(&mut self, edge: Edge) -> EdgeInsert {
        if edge.source == edge.target
            || !self.devices.contains_key(&edge.source)
            || !self.devices.contains_key(&edge.target)
        {
            return EdgeInsert::Rejected;
        }
        if !self.edge_keys.insert(edge.key()) {
            return EdgeInsert::Coalesced;
        }
        self.edges.push(edge);
        EdgeInsert::Added
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.devices.contains_key(identity)
    }

    pub fn device(&self, identity: &Identity) -> Option<&Device> {
        self.devices.get(identity)
    }

    /// Devices in the order they were first referenced.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Edges in the order they were first recorded.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn has_edge(&self, a: &Identity, b: &Identity) -> bool {
        self.edge_keys.contains(&EdgeKey::new(a, b))
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Devices that were actually visited (reachable or unreachable).
    pub fn visited_count(&self) -> usize {
        self.devices().filter(|d| d.status.is_visited()).count()
    }

    pub fn count_by_status(&self, label: &str) -> usize {
        self.devices().filter(|d| d.status.label() == label).count()
    }

    /// Identities adjacent to `identity`, regardless of which side reported the edge.
    pub fn neighbors_of<'a>(&'a self, identity: &'a Identity) -> impl Iterator<Item = &'a Identity> {
        self.edges.iter().filter_map(move |edge| {
            if &edge.source == identity {
                Some(&edge.target)
            } else if &edge.target == identity {
                Some(&edge.source)
            } else {
                None
            }
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
