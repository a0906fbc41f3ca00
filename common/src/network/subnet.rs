//! # Subnet Parsing
//!
//! Parses the ignored-subnet list supplied by the operator.
//!
//! Supported formats:
//! * **CIDR**: "Network/Prefix" (e.g., `10.20.0.0/16`, `2001:db8::/32`).
//! * **Host**: a bare address, treated as a single-address network.

use std::net::IpAddr;

use pnet::ipnetwork::IpNetwork;

use crate::error::ConfigError;

/// Parses one subnet. Host bits are masked off, so `10.1.2.3/8` means `10.0.0.0/8`.
pub fn parse_subnet(s: &str) -> Result<IpNetwork, ConfigError> {
    let trimmed = s.trim();
    let invalid = |reason: String| ConfigError::InvalidSubnet {
        value: trimmed.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("empty value".into()));
    }

    if let Some((ip_str, prefix_str)) = trimmed.split_once('/') {
        let addr = ip_str
            .parse::<IpAddr>()
            .map_err(|e| invalid(format!("invalid address '{ip_str}': {e}")))?;
        let prefix = prefix_str
            .parse::<u8>()
            .map_err(|e| invalid(format!("invalid prefix '{prefix_str}': {e}")))?;
        let net = IpNetwork::new(addr, prefix).map_err(|e| invalid(e.to_string()))?;
        return IpNetwork::new(net.network(), prefix).map_err(|e| invalid(e.to_string()));
    }

    let addr = trimmed
        .parse::<IpAddr>()
        .map_err(|e| invalid(e.to_string()))?;
    let host_prefix: u8 = if addr.is_ipv4() { 32 } else { 128 };
    IpNetwork::new(addr, host_prefix).map_err(|e| invalid(e.to_string()))
}

/// Parses a list of subnets, failing on the first invalid entry.
pub fn parse_subnets<I, S>(values: I) -> Result<Vec<IpNetwork>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| parse_subnet(value.as_ref()))
        .collect()
}

/// Whether `addr` falls inside any of `subnets`. Address families never cross-match.
pub fn contains_any(subnets: &[IpNetwork], addr: IpAddr) -> bool {
    subnets.iter().any(|net| net.contains(addr))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
