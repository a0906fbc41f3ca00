//! `show version` parser.

use std::sync::LazyLock;

use regex::Regex;
use topomap_common::command::ShowCommand;
use topomap_common::error::ParseError;
use topomap_common::records::VersionInfo;

use crate::capture;

static SOFTWARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Cisco IOS[\w\s-]*Software.*?Version\s+([^,\s]+)").unwrap()
});
static HOSTNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\S+)\s+uptime\s+is").unwrap());
static HARDWARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:cisco|Cisco)\s+(\S+)(?:[ \t]+\S+){0,3}[ \t]+processor").unwrap()
});
static SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Processor board ID\s+(\S+)").unwrap());

pub fn parse(output: &str) -> Result<VersionInfo, ParseError> {
    let info = VersionInfo {
        hostname: capture(&HOSTNAME, output),
        software_version: capture(&SOFTWARE_VERSION, output),
        hardware: capture(&HARDWARE, output),
        serial: capture(&SERIAL, output),
    };

    if info == VersionInfo::default() {
        return Err(ParseError::Malformed {
            command: ShowCommand::Version,
            reason: "no version fields found".into(),
        });
    }

    Ok(info)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
