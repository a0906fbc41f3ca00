//! `show lldp neighbors detail` parser.

use std::sync::LazyLock;

use regex::Regex;
use topomap_common::records::{NeighborProtocol, NeighborRecord};

use crate::{capture, ifname, split_blocks};

static LOCAL_INTF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Local Int(?:f|erface):\s*(\S.*?)\s*$").unwrap());
static PORT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Port [Ii][Dd]:\s*(\S.*?)\s*$").unwrap());
static SYSTEM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*System Name:\s*(\S.*?)\s*$").unwrap());
static MGMT_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:IP(?:v6)?:|Management Address:)\s*(\S+)").unwrap()
});
static ENABLED_CAPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Enabled Capabilities:\s*(\S+)").unwrap());
static SYSTEM_CAPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*System Capabilities:\s*(\S+)").unwrap());

pub fn parse(output: &str) -> Vec<NeighborRecord> {
    split_blocks(output).filter_map(parse_block).collect()
}

fn parse_block(block: &str) -> Option<NeighborRecord> {
    let mut record = NeighborRecord::new(NeighborProtocol::Lldp);
    record.device_id = capture(&SYSTEM_NAME, block);
    record.management_address = capture(&MGMT_ADDRESS, block);
    record.local_interface = capture(&LOCAL_INTF, block).map(|name| ifname::normalize(&name));
    record.remote_interface = capture(&PORT_ID, block).map(|name| ifname::normalize(&name));
    record.capabilities = capture(&ENABLED_CAPS, block)
        .or_else(|| capture(&SYSTEM_CAPS, block))
        .map(|codes| expand_capabilities(&codes))
        .unwrap_or_default();

    let has_identity = record.device_id.is_some() || record.management_address.is_some();
    let has_link = record.local_interface.is_some() && record.remote_interface.is_some();
    (has_identity || has_link).then_some(record)
}

/// Expands LLDP capability codes (`B,R`) to the words CDP uses.
fn expand_capabilities(codes: &str) -> Vec<String> {
    codes
        .split(',')
        .filter_map(|code| {
            let word = match code.trim() {
                "R" => "Router",
                "B" => "Switch",
                "T" => "Phone",
                "W" => "WLAN",
                "S" => "Station",
                "P" => "Repeater",
                "C" => "DOCSIS",
                "O" => "Other",
                _ => return None,
            };
            Some(word.to_string())
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
