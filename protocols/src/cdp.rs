//! `show cdp neighbors detail` parser.
//!
//! Entries are separated by dashed lines. Each entry yields one
//! [`NeighborRecord`]; entries carrying neither an identity nor an interface
//! pair (banners, totals) are dropped.

use std::sync::LazyLock;

use regex::Regex;
use topomap_common::records::{NeighborProtocol, NeighborRecord};

use crate::{capture, ifname, split_blocks};

static DEVICE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Device ID:\s*(\S.*?)\s*$").unwrap());
static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*IP(?:v4|v6)? [Aa]ddress:\s*(\S+)").unwrap());
static PLATFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Platform:\s*([^,\r\n]+)").unwrap());
static CAPABILITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Capabilities:\s*(.*?)\s*$").unwrap());
static LOCAL_INTF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Interface:\s*([^,\r\n]+)").unwrap());
static REMOTE_INTF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Port ID \(outgoing port\):\s*(\S.*?)\s*$").unwrap());

pub fn parse(output: &str) -> Vec<NeighborRecord> {
    split_blocks(output).filter_map(parse_block).collect()
}

fn parse_block(block: &str) -> Option<NeighborRecord> {
    let mut record = NeighborRecord::new(NeighborProtocol::Cdp);
    record.device_id = capture(&DEVICE_ID, block);
    record.management_address = capture(&ADDRESS, block);
    record.platform = capture(&PLATFORM, block);
    record.capabilities = capture(&CAPABILITIES, block)
        .map(|caps| caps.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    record.local_interface = capture(&LOCAL_INTF, block).map(|name| ifname::normalize(&name));
    record.remote_interface = capture(&REMOTE_INTF, block).map(|name| ifname::normalize(&name));

    let has_identity = record.device_id.is_some() || record.management_address.is_some();
    let has_link = record.local_interface.is_some() && record.remote_interface.is_some();
    (has_identity || has_link).then_some(record)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
