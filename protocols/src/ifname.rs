//! Interface name normalisation.
//!
//! CDP prints full names (`GigabitEthernet0/1`), LLDP and `show ip interface brief`
//! often print abbreviations (`Gi0/1`). Everything is expanded to the full form
//! so interface tables and neighbor tables can be joined on the name.

/// Full interface type names, ordered so the first prefix match wins.
const INTERFACE_TYPES: &[&str] = &[
    "GigabitEthernet",
    "FastEthernet",
    "FortyGigabitEthernet",
    "TenGigabitEthernet",
    "TwoGigabitEthernet",
    "TwentyFiveGigE",
    "HundredGigE",
    "Ethernet",
    "Port-channel",
    "Vlan",
    "Loopback",
    "Tunnel",
    "Serial",
];

const MIN_ABBREVIATION: usize = 2;

/// Expands an abbreviated interface name. Unknown names are returned trimmed
/// but otherwise untouched.
pub fn normalize(name: &str) -> String {
    let name = name.trim();
    let split = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let (kind, unit) = name.split_at(split);

    // "Port 1" style names belong to hosts and phones, not to IOS interfaces.
    if kind.len() < MIN_ABBREVIATION || unit.is_empty() || kind.ends_with(char::is_whitespace) {
        return name.to_string();
    }

    let lower = kind.to_ascii_lowercase();
    match INTERFACE_TYPES
        .iter()
        .find(|full| full.to_ascii_lowercase().starts_with(&lower))
    {
        Some(full) => format!("{full}{unit}"),
        None => name.to_string(),
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
