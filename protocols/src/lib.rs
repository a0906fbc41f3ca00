//! # Topomap Protocols
//!
//! Text parsers for Cisco IOS show commands.
//!
//! Every parser is a pure function of the command text. [`IosParser`] bundles
//! them behind the [`OutputParser`] port so the engine never sees a regex.

use std::sync::LazyLock;

use regex::Regex;
use topomap_common::command::ShowCommand;
use topomap_common::error::ParseError;
use topomap_common::ports::OutputParser;
use topomap_common::records::ParsedOutput;
use tracing::trace;

pub mod cdp;
pub mod ifname;
pub mod interfaces;
pub mod lldp;
pub mod version;

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*-{3,}\s*$").unwrap());

/// Parser for classic IOS and IOS-XE output.
#[derive(Debug, Default, Clone, Copy)]
pub struct IosParser;

impl IosParser {
    pub fn new() -> Self {
        Self
    }
}

impl OutputParser for IosParser {
    fn parse(&self, command: ShowCommand, raw: &str) -> Result<ParsedOutput, ParseError> {
        reject_device_error(command, raw)?;
        trace!(%command, bytes = raw.len(), "parsing output");

        match command {
            ShowCommand::Version => {
                require_output(command, raw)?;
                version::parse(raw).map(ParsedOutput::Version)
            }
            ShowCommand::CdpNeighbors => Ok(ParsedOutput::Neighbors(cdp::parse(raw))),
            ShowCommand::LldpNeighbors => Ok(ParsedOutput::Neighbors(lldp::parse(raw))),
            ShowCommand::Interfaces => {
                require_output(command, raw)?;
                Ok(ParsedOutput::Interfaces(interfaces::parse_interfaces(raw)))
            }
            ShowCommand::IpInterfaceBrief => {
                require_output(command, raw)?;
                Ok(ParsedOutput::InterfaceAddresses(interfaces::parse_brief(raw)))
            }
        }
    }
}

/// IOS reports errors in-band: `% CDP is not enabled`, `% Invalid input ...`.
fn reject_device_error(command: ShowCommand, raw: &str) -> Result<(), ParseError> {
    match raw.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) if line.starts_with('%') => Err(ParseError::Malformed {
            command,
            reason: line.trim_start_matches('%').trim().to_string(),
        }),
        _ => Ok(()),
    }
}

fn require_output(command: ShowCommand, raw: &str) -> Result<(), ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty(command));
    }
    Ok(())
}

/// Splits neighbor-table output on dashed separator lines, dropping blank blocks.
pub(crate) fn split_blocks(output: &str) -> impl Iterator<Item = &str> {
    BLOCK_SEPARATOR
        .split(output)
        .filter(|block| !block.trim().is_empty())
}

/// First capture group of `re` in `text`, trimmed, if non-empty.
pub(crate) fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
