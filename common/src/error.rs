//! # Error Taxonomy
//!
//! Per-device failures ([`ExecError`], [`ParseError`]) are recovered by the engine.
//! Only [`DiscoveryError`] and [`ConfigError`] ever end a run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::command::ShowCommand;

/// Failures raised by a command executor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("authentication failed for {user}@{address}")]
    Auth { address: String, user: String },

    #[error("{address} did not answer within {}s", .after.as_secs_f64())]
    Timeout { address: String, after: Duration },

    #[error("`{command}` failed: {reason}")]
    Command { command: ShowCommand, reason: String },
}

impl ExecError {
    /// Whether the session to the device is unusable after this error.
    ///
    /// A rejected command leaves the session open; a dropped or stalled
    /// transport does not.
    pub fn is_session_fatal(&self) -> bool {
        !matches!(self, ExecError::Command { .. })
    }
}

/// Failures raised by an output parser for a single command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no parser registered for `{0}`")]
    UnsupportedCommand(ShowCommand),

    #[error("`{0}` returned no output")]
    Empty(ShowCommand),

    #[error("`{command}` output is malformed: {reason}")]
    Malformed { command: ShowCommand, reason: String },
}

/// Fatal, run-level failures of the discovery engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("no seed devices configured")]
    NoSeeds,

    #[error("all {excluded} seed devices are excluded by the scope filter")]
    AllSeedsExcluded { excluded: usize },

    #[error("invalid discovery config: {0}")]
    InvalidConfig(String),
}

/// Failures while building a Discovery Config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid subnet '{value}': {reason}")]
    InvalidSubnet { value: String, reason: String },

    #[error("seed #{index} is invalid: {reason}")]
    InvalidSeed { index: usize, reason: String },

    #[error("{0}")]
    Invalid(String),
}
