//! # Discovery Document
//!
//! The persisted form of a [`Topology`]: every device, stubs included, and
//! every edge with its interface pair. Building the document only reads the
//! topology.

use std::net::IpAddr;

use serde::Serialize;
use thiserror::Error;
use topomap_common::records::NeighborProtocol;

use crate::identity::Identity;
use crate::topology::{
    CommandFailure, Device, DeviceRole, DeviceStatus, Edge, Interface, RunSummary, Topology,
};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode topology as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode topology as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }

    pub fn render(&self, topology: &Topology) -> Result<String, SerializeError> {
        match self {
            OutputFormat::Yaml => to_yaml(topology),
            OutputFormat::Json => to_json(topology),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyDocument<'a> {
    pub run: &'a RunSummary,
    pub devices: Vec<DeviceRecord<'a>>,
    pub edges: Vec<EdgeRecord<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord<'a> {
    pub identity: &'a Identity,
    pub unresolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<&'a str>,
    pub role: DeviceRole,
    #[serde(skip_serializing_if = "is_empty")]
    pub capabilities: &'a [String],
    pub status: &'a DeviceStatus,
    pub discovery_depth: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceEntry<'a>>,
    #[serde(skip_serializing_if = "is_empty")]
    pub failures: &'a [CommandFailure],
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceEntry<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor: Option<&'a Identity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeRecord<'a> {
    pub source: &'a Identity,
    pub target: &'a Identity,
    pub local_interface: Option<&'a str>,
    pub remote_interface: Option<&'a str>,
    pub protocol: NeighborProtocol,
}

impl<'a> From<&'a Topology> for TopologyDocument<'a> {
    fn from(topology: &'a Topology) -> Self {
        Self {
            run: topology.run(),
            devices: topology.devices().map(DeviceRecord::from).collect(),
            edges: topology.edges().iter().map(EdgeRecord::from).collect(),
        }
    }
}

impl<'a> From<&'a Device> for DeviceRecord<'a> {
    fn from(device: &'a Device) -> Self {
        let attributes = &device.attributes;
        Self {
            identity: &device.identity,
            unresolved: device.is_unresolved(),
            address: device.address,
            hostname: attributes.hostname.as_deref(),
            platform: attributes.platform.as_deref(),
            software_version: attributes.software_version.as_deref(),
            serial: attributes.serial.as_deref(),
            role: attributes.role,
            capabilities: &attributes.capabilities,
            status: &device.status,
            discovery_depth: device.discovery_depth,
            interfaces: attributes.interfaces.iter().map(InterfaceEntry::from).collect(),
            failures: &device.failures,
        }
    }
}

impl<'a> From<&'a Interface> for InterfaceEntry<'a> {
    fn from(interface: &'a Interface) -> Self {
        Self {
            name: &interface.name,
            status: interface.status.as_deref(),
            protocol: interface.protocol_status.as_deref(),
            description: interface.description.as_deref(),
            address: interface.address.as_deref(),
            neighbor: interface.neighbor.as_ref(),
        }
    }
}

impl<'a> From<&'a Edge> for EdgeRecord<'a> {
    fn from(edge: &'a Edge) -> Self {
        Self {
            source: &edge.source,
            target: &edge.target,
            local_interface: edge.local_interface.as_deref(),
            remote_interface: edge.remote_interface.as_deref(),
            protocol: edge.protocol,
        }
    }
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

pub fn to_json(topology: &Topology) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(&TopologyDocument::from(topology))?)
}

pub fn to_yaml(topology: &Topology) -> Result<String, SerializeError> {
    Ok(serde_yaml::to_string(&TopologyDocument::from(topology))?)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
