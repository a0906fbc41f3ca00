//! `show interfaces` and `show ip interface brief` parsers.

use std::sync::LazyLock;

use regex::Regex;
use topomap_common::records::{InterfaceAddress, InterfaceRecord};

use crate::ifname;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) is ([\w ]+?),\s*line protocol is (\w+)").unwrap()
});
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Description:\s*(.*?)\s*$").unwrap());
static INTERNET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Internet address is (\S+)").unwrap());

const UNASSIGNED: &str = "unassigned";

/// Parses `show interfaces`. Lines before the first interface header are ignored.
pub fn parse_interfaces(output: &str) -> Vec<InterfaceRecord> {
    let mut interfaces: Vec<InterfaceRecord> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = HEADER.captures(line) {
            interfaces.push(InterfaceRecord {
                name: ifname::normalize(&caps[1]),
                status: Some(caps[2].trim().to_string()),
                protocol_status: Some(caps[3].to_string()),
                description: None,
                address: None,
            });
            continue;
        }

        let Some(current) = interfaces.last_mut() else {
            continue;
        };

        if let Some(caps) = DESCRIPTION.captures(line) {
            let description = caps[1].to_string();
            if !description.is_empty() {
                current.description = Some(description);
            }
        } else if let Some(caps) = INTERNET.captures(line) {
            current.address = Some(caps[1].to_string());
        }
    }

    interfaces
}

/// Parses the `show ip interface brief` table.
pub fn parse_brief(output: &str) -> Vec<InterfaceAddress> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Interface"))
        .filter_map(parse_brief_row)
        .collect()
}

fn parse_brief_row(line: &str) -> Option<InterfaceAddress> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    // Interface, IP-Address, OK?, Method, Status (one or two words), Protocol
    if columns.len() < 6 {
        return None;
    }

    let address = match columns[1] {
        UNASSIGNED => None,
        addr => Some(addr.to_string()),
    };
    let status = columns[4..columns.len() - 1].join(" ");

    Some(InterfaceAddress {
        name: ifname::normalize(columns[0]),
        address,
        status,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_INTERFACES: &str = "\
GigabitEthernet0/1 is up, line protocol is up (connected)
  Hardware is Gigabit Ethernet, address is 0011.2233.4401 (bia 0011.2233.4401)
  Description: uplink to dist-sw1
  Internet address is 10.0.0.1/30
  MTU 1500 bytes, BW 1000000 Kbit/sec, DLY 10 usec,
GigabitEthernet0/2 is administratively down, line protocol is down (disabled)
  Hardware is Gigabit Ethernet, address is 0011.2233.4402 (bia 0011.2233.4402)
  MTU 1500 bytes, BW 1000000 Kbit/sec, DLY 10 usec,
Vlan1 is up, line protocol is up
  Hardware is EtherSVI, address is 0011.2233.4400 (bia 0011.2233.4400)
  Description: 
";

    const BRIEF: &str = "\
Interface              IP-Address      OK? Method Status                Protocol
GigabitEthernet0/1     10.0.0.1        YES NVRAM  up                    up
Gi0/2                  unassigned      YES unset  administratively down down
Vlan1                  192.168.1.2     YES manual up                    up
";

    #[test]
    fn parses_interface_blocks() {
        let interfaces = parse_interfaces(SHOW_INTERFACES);
        assert_eq!(interfaces.len(), 3);

        assert_eq!(interfaces[0].name, "GigabitEthernet0/1");
        assert_eq!(interfaces[0].status.as_deref(), Some("up"));
        assert_eq!(interfaces[0].description.as_deref(), Some("uplink to dist-sw1"));
        assert_eq!(interfaces[0].address.as_deref(), Some("10.0.0.1/30"));

        assert_eq!(interfaces[1].status.as_deref(), Some("administratively down"));
        assert_eq!(interfaces[1].protocol_status.as_deref(), Some("down"));
        assert!(interfaces[1].description.is_none());

        assert_eq!(interfaces[2].name, "Vlan1");
        assert!(interfaces[2].description.is_none());
    }

    #[test]
    fn parses_brief_table() {
        let rows = parse_brief(BRIEF);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].address.as_deref(), Some("10.0.0.1"));
        assert_eq!(rows[1].name, "GigabitEthernet0/2");
        assert!(rows[1].address.is_none());
        assert_eq!(rows[1].status, "administratively down");
        assert_eq!(rows[2].status, "up");
    }

    #[test]
    fn ignores_noise_before_first_header() {
        assert!(parse_interfaces("  Description: orphan\n").is_empty());
        assert!(parse_brief("garbage line\n").is_empty());
    }
}
