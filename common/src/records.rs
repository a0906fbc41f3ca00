//! # Parser Output
//!
//! Structured records produced by an [`OutputParser`](crate::ports::OutputParser).
//! Each variant of [`ParsedOutput`] belongs to one command family. The engine
//! converts these into the fixed Device/Edge schema at the identity-resolution
//! boundary; they never reach the topology as-is.

use serde::Serialize;

/// Link-layer protocol that reported a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborProtocol {
    Cdp,
    Lldp,
}

/// One entry of a CDP or LLDP neighbor table.
///
/// Every field is optional: real neighbor tables routinely omit the management
/// address or the port description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    pub protocol: NeighborProtocol,
    /// `Device ID` (CDP) or `System Name` (LLDP).
    pub device_id: Option<String>,
    /// Management address as printed by the device, not yet validated.
    pub management_address: Option<String>,
    pub platform: Option<String>,
    pub capabilities: Vec<String>,
    pub local_interface: Option<String>,
    pub remote_interface: Option<String>,
}

impl NeighborRecord {
    pub fn new(protocol: NeighborProtocol) -> Self {
        Self {
            protocol,
            device_id: None,
            management_address: None,
            platform: None,
            capabilities: Vec::new(),
            local_interface: None,
            remote_interface: None,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.management_address = Some(address.into());
        self
    }

    pub fn with_interfaces(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.local_interface = Some(local.into());
        self.remote_interface = Some(remote.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// Facts extracted from `show version`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    pub hostname: Option<String>,
    pub software_version: Option<String>,
    pub hardware: Option<String>,
    pub serial: Option<String>,
}

/// One interface from `show interfaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    pub status: Option<String>,
    pub protocol_status: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

/// One row from `show ip interface brief`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub name: String,
    pub address: Option<String>,
    pub status: String,
}

/// Parser output, tagged by command family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    Version(VersionInfo),
    Neighbors(Vec<NeighborRecord>),
    Interfaces(Vec<InterfaceRecord>),
    InterfaceAddresses(Vec<InterfaceAddress>),
}
