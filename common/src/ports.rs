//! # Outbound Ports
//!
//! Contracts the discovery engine depends on. Concrete adapters live in
//! `topomap-core::network` (transport) and `topomap-protocols` (parsing).
//!
//! ## Rules
//! 1. All items here are traits or plain data passed through them.
//! 2. Implementations must report per-device problems as errors, never panic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::ShowCommand;
use crate::config::Credentials;
use crate::error::{ExecError, ParseError};
use crate::records::ParsedOutput;

/// Everything an executor needs to reach one device.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Management address or resolvable hostname.
    pub address: String,
    pub credentials: Arc<Credentials>,
    pub device_type: String,
}

/// Opens authenticated sessions to devices.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Connects and authenticates. Fails with `Connection`, `Auth` or `Timeout`.
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, ExecError>;
}

/// An open management session to a single device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Runs one show command and returns its raw text.
    async fn execute(&mut self, command: ShowCommand) -> Result<String, ExecError>;

    /// Releases the session. Errors on close are not interesting to the engine.
    async fn close(self: Box<Self>) {}
}

/// Converts raw command text into structured records.
///
/// Must be a pure function of `(command, raw)`.
pub trait OutputParser: Send + Sync {
    fn parse(&self, command: ShowCommand, raw: &str) -> Result<ParsedOutput, ParseError>;
}
