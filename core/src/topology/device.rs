//! Discovered nodes and their lifecycle.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use crate::identity::Identity;

/// Why a device was left out of the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    IgnoredSubnet,
    DeviceCapReached,
    /// Neither an address nor a name was advertised, so there is nothing to dial.
    Unresolved,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::IgnoredSubnet => "ignored-subnet",
            SkipReason::DeviceCapReached => "device-cap-reached",
            SkipReason::Unresolved => "unresolved",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Queued, not yet visited.
    Pending,
    Reachable,
    Unreachable { reason: String },
    Skipped { reason: SkipReason },
}

impl DeviceStatus {
    /// Reachable and unreachable devices have both been visited.
    pub fn is_visited(&self) -> bool {
        matches!(self, DeviceStatus::Reachable | DeviceStatus::Unreachable { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Pending => "pending",
            DeviceStatus::Reachable => "reachable",
            DeviceStatus::Unreachable { .. } => "unreachable",
            DeviceStatus::Skipped { .. } => "skipped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Router,
    Switch,
    Firewall,
    #[default]
    Unknown,
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            DeviceRole::Router => "router",
            DeviceRole::Switch => "switch",
            DeviceRole::Firewall => "firewall",
            DeviceRole::Unknown => "unknown",
        };
        f.write_str(role)
    }
}

const SWITCH_MODELS: &[&str] = &["cat", "ws-c", "2960", "3750", "3850", "9300", "nexus", "n9k"];
const ROUTER_MODELS: &[&str] = &["isr", "asr", "4300", "4400", "1900", "2900", "3900"];
const FIREWALL_MODELS: &[&str] = &["asa", "firepower", "ftd"];

/// Classifies a device from its hardware model, then its advertised
/// capabilities, then naming conventions in its hostname.
pub fn classify_role(
    hardware: Option<&str>,
    capabilities: &[String],
    hostname: Option<&str>,
) -> DeviceRole {
    if let Some(role) = hardware.and_then(role_from_model) {
        return role;
    }
    if let Some(role) = role_from_capabilities(capabilities) {
        return role;
    }
    hostname.and_then(role_from_hostname).unwrap_or_default()
}

fn role_from_model(hardware: &str) -> Option<DeviceRole> {
    let model = hardware.to_ascii_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| model.contains(k));

    if matches_any(SWITCH_MODELS) {
        Some(DeviceRole::Switch)
    } else if matches_any(ROUTER_MODELS) {
        Some(DeviceRole::Router)
    } else if matches_any(FIREWALL_MODELS) {
        Some(DeviceRole::Firewall)
    } else {
        None
    }
}

fn role_from_capabilities(capabilities: &[String]) -> Option<DeviceRole> {
    let has = |cap: &str| capabilities.iter().any(|c| c.eq_ignore_ascii_case(cap));

    // Multilayer switches advertise both.
    if has("Switch") {
        Some(DeviceRole::Switch)
    } else if has("Router") {
        Some(DeviceRole::Router)
    } else {
        None
    }
}

fn role_from_hostname(hostname: &str) -> Option<DeviceRole> {
    let lower = hostname.to_ascii_lowercase();
    let short = lower.split('.').next().unwrap_or(&lower);

    short
        .split(['-', '_'])
        .map(|token| token.trim_end_matches(|c: char| c.is_ascii_digit()))
        .find_map(|token| match token {
            "sw" | "swi" | "switch" => Some(DeviceRole::Switch),
            "rt" | "rtr" | "router" => Some(DeviceRole::Router),
            "fw" | "firewall" => Some(DeviceRole::Firewall),
            _ => None,
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    /// Line protocol state from `show interfaces`.
    pub protocol_status: Option<String>,
    pub address: Option<String>,
    /// The device seen on this interface by CDP or LLDP.
    pub neighbor: Option<Identity>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAttributes {
    pub hostname: Option<String>,
    pub platform: Option<String>,
    pub software_version: Option<String>,
    pub serial: Option<String>,
    pub capabilities: Vec<String>,
    pub role: DeviceRole,
    pub interfaces: Vec<Interface>,
}

impl DeviceAttributes {
    pub fn interface_mut(&mut self, name: &str) -> &mut Interface {
        match self.interfaces.iter().position(|i| i.name == name) {
            Some(idx) => &mut self.interfaces[idx],
            None => {
                self.interfaces.push(Interface::new(name));
                let last = self.interfaces.len() - 1;
                &mut self.interfaces[last]
            }
        }
    }
}

/// A command that failed during a visit, kept for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandFailure {
    pub command: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub identity: Identity,
    pub address: Option<IpAddr>,
    pub attributes: DeviceAttributes,
    pub discovery_depth: u32,
    pub status: DeviceStatus,
    pub failures: Vec<CommandFailure>,
}

impl Device {
    pub fn pending(identity: Identity, address: Option<IpAddr>, depth: u32) -> Self {
        Self {
            identity,
            address,
            attributes: DeviceAttributes::default(),
            discovery_depth: depth,
            status: DeviceStatus::Pending,
            failures: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: DeviceAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_unresolved(&self) -> bool {
        self.identity.is_unresolved()
    }

    /// Best human label: hostname if known, identity otherwise.
    pub fn display_name(&self) -> String {
        self.attributes
            .hostname
            .clone()
            .unwrap_or_else(|| self.identity.to_string())
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
