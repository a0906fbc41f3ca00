//! # Device Identity Resolver
//!
//! Turns a raw neighbor record into the canonical key used for deduplication.
//!
//! Canonicalization order:
//! 1. **Management address**, if present and parseable.
//! 2. **Hostname**, fully qualified if the device advertised one, short otherwise.
//! 3. **Synthetic**: a digest of whatever fields the record carried, flagged as
//!    unresolved so it never masquerades as a real device.
//!
//! Resolution is a pure function of the record: resolving it twice yields the
//! same identity.

use std::fmt;
use std::net::IpAddr;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use topomap_common::records::{NeighborProtocol, NeighborRecord};

/// Hex digits kept from the digest of an unresolved record.
const SYNTHETIC_ID_LEN: usize = 12;

/// Canonical key of a device, unique within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    Address(IpAddr),
    Hostname(String),
    Unresolved(String),
}

impl Identity {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Identity::Unresolved(_))
    }

    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Identity::Address(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Address(addr) => write!(f, "{addr}"),
            Identity::Hostname(name) => f.write_str(name),
            Identity::Unresolved(digest) => write!(f, "unresolved-{digest}"),
        }
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of resolving a record: the identity plus whatever was learned on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    pub identity: Identity,
    pub address: Option<IpAddr>,
    pub hostname: Option<String>,
}

impl ResolvedDevice {
    pub fn is_unresolved(&self) -> bool {
        self.identity.is_unresolved()
    }

    /// What an executor should dial. Unresolved devices have nothing to dial.
    pub fn dial_address(&self) -> Option<String> {
        match (&self.address, &self.hostname) {
            (Some(addr), _) => Some(addr.to_string()),
            (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a neighbor reported by CDP or LLDP. Never fails.
    pub fn resolve(&self, record: &NeighborRecord) -> ResolvedDevice {
        let address = record.management_address.as_deref().and_then(parse_address);
        let hostname = record.device_id.as_deref().and_then(canonical_hostname);

        let identity = match (&address, &hostname) {
            (Some(addr), _) => Identity::Address(*addr),
            (None, Some(name)) => Identity::Hostname(name.clone()),
            (None, None) => Identity::Unresolved(synthetic_digest(record)),
        };

        ResolvedDevice {
            identity,
            address,
            hostname,
        }
    }

    /// Resolves an operator-supplied seed address, which may be an IP or a hostname.
    pub fn resolve_seed(&self, seed: &str) -> ResolvedDevice {
        let address = parse_address(seed);
        let hostname = match address {
            Some(_) => None,
            None => canonical_hostname(seed),
        };

        let identity = match (&address, &hostname) {
            (Some(addr), _) => Identity::Address(*addr),
            (None, Some(name)) => Identity::Hostname(name.clone()),
            (None, None) => Identity::Unresolved(digest_fields(&[seed])),
        };

        ResolvedDevice {
            identity,
            address,
            hostname,
        }
    }
}

/// Parses an advertised management address. Unspecified addresses do not count.
fn parse_address(raw: &str) -> Option<IpAddr> {
    let cleaned = raw.trim().trim_end_matches([',', ';']);
    // IPv6 entries sometimes carry a zone or a scope annotation.
    let cleaned = cleaned.split(['%', ' ']).next().unwrap_or(cleaned);
    cleaned
        .parse::<IpAddr>()
        .ok()
        .filter(|addr| !addr.is_unspecified())
}

/// Lowercases a device name and strips the `(SERIAL)` suffix some platforms append.
fn canonical_hostname(raw: &str) -> Option<String> {
    let name = match raw.find('(') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let name = name.trim().trim_end_matches('.').to_ascii_lowercase();

    let valid = !name.is_empty()
        && !name.chars().any(|c| c.is_whitespace() || c.is_control());
    valid.then_some(name)
}

fn synthetic_digest(record: &NeighborRecord) -> String {
    let protocol = match record.protocol {
        NeighborProtocol::Cdp => "cdp",
        NeighborProtocol::Lldp => "lldp",
    };
    let capabilities = record.capabilities.join(",");
    digest_fields(&[
        protocol,
        record.device_id.as_deref().unwrap_or_default(),
        record.management_address.as_deref().unwrap_or_default(),
        record.platform.as_deref().unwrap_or_default(),
        record.local_interface.as_deref().unwrap_or_default(),
        record.remote_interface.as_deref().unwrap_or_default(),
        &capabilities,
    ])
}

fn digest_fields(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    digest[..SYNTHETIC_ID_LEN].to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
