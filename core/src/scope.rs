//! # Scope Filter
//!
//! Decides whether a newly discovered device may be visited.
//!
//! Checks run in order:
//! 1. the address lies inside an ignored subnet → skip `ignored-subnet`;
//! 2. the visited count has reached the device cap → skip `device-cap-reached`;
//! 3. otherwise admit.
//!
//! Unknown addresses never match an ignore rule: ambiguous devices are still
//! visited unless the cap is hit.

use std::net::IpAddr;

use pnet::ipnetwork::IpNetwork;
use topomap_common::config::DiscoveryConfig;
use topomap_common::network::subnet;
use tracing::trace;

use crate::identity::Identity;
use crate::topology::SkipReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Skip(SkipReason),
}

#[derive(Debug, Clone)]
pub struct ScopeFilter {
    ignored_subnets: Vec<IpNetwork>,
    max_devices: usize,
}

impl ScopeFilter {
    pub fn new(ignored_subnets: Vec<IpNetwork>, max_devices: usize) -> Self {
        Self {
            ignored_subnets,
            max_devices,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.ignored_subnets.clone(), config.max_devices)
    }

    /// `address` falls back to the identity's own address when not supplied.
    pub fn admit(&self, identity: &Identity, address: Option<IpAddr>, visited: usize) -> Admission {
        let address = address.or_else(|| identity.address());

        if let Some(addr) = address
            && subnet::contains_any(&self.ignored_subnets, addr)
        {
            trace!(%identity, %addr, "address is in an ignored subnet");
            return Admission::Skip(SkipReason::IgnoredSubnet);
        }

        if visited >= self.max_devices {
            trace!(%identity, visited, max = self.max_devices, "device cap reached");
            return Admission::Skip(SkipReason::DeviceCapReached);
        }

        Admission::Admit
    }

    pub fn max_devices(&self) -> usize {
        self.max_devices
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
