//! # Discovery Config
//!
//! Run parameters are collected once, validated, and then treated as read-only
//! for the whole run. Seeds usually come from a YAML device file:
//!
//! ```yaml
//! - device_type: cisco_ios
//!   ip: 10.0.0.1
//!   username: admin
//!   password: secret
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pnet::ipnetwork::IpNetwork;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_MAX_DEVICES: usize = 100;
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_DEVICE_TYPE: &str = "cisco_ios";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Login material for a device. Neighbors inherit the credentials of the
/// device that reported them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub key_file: Option<PathBuf>,
    pub port: u16,
}

impl Credentials {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            key_file: None,
            port: DEFAULT_SSH_PORT,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

// Passwords must never reach a log line.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field("port", &self.port)
            .finish()
    }
}

/// A configured starting point for discovery.
#[derive(Debug, Clone)]
pub struct SeedDevice {
    pub address: String,
    pub credentials: Arc<Credentials>,
    pub device_type: String,
}

impl SeedDevice {
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials: Arc::new(credentials),
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
        }
    }
}

/// Immutable input of one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub seeds: Vec<SeedDevice>,
    pub ignored_subnets: Vec<IpNetwork>,
    /// Upper bound on devices actually visited (reachable + unreachable).
    pub max_devices: usize,
    pub verbose: bool,
    /// Devices of the same BFS level visited concurrently. `1` is strictly sequential.
    pub parallelism: usize,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    /// Global deadline; when hit, the partial topology is returned.
    pub run_timeout: Option<Duration>,
}

impl DiscoveryConfig {
    pub fn new(seeds: Vec<SeedDevice>) -> Self {
        Self {
            seeds,
            ignored_subnets: Vec::new(),
            max_devices: DEFAULT_MAX_DEVICES,
            verbose: false,
            parallelism: 1,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            run_timeout: None,
        }
    }

    pub fn with_ignored_subnets(mut self, subnets: Vec<IpNetwork>) -> Self {
        self.ignored_subnets = subnets;
        self
    }

    pub fn with_max_devices(mut self, max_devices: usize) -> Self {
        self.max_devices = max_devices;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, command: Duration) -> Self {
        self.connect_timeout = connect;
        self.command_timeout = command;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the numeric bounds. Seed eligibility is the engine's concern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_devices == 0 {
            return Err(ConfigError::Invalid("max devices must be at least 1".into()));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::Invalid("parallelism must be at least 1".into()));
        }
        if self.connect_timeout.is_zero() || self.command_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        for (index, seed) in self.seeds.iter().enumerate() {
            if seed.address.trim().is_empty() {
                return Err(ConfigError::InvalidSeed {
                    index,
                    reason: "empty address".into(),
                });
            }
            if seed.credentials.username.is_empty() {
                return Err(ConfigError::InvalidSeed {
                    index,
                    reason: "missing username".into(),
                });
            }
        }
        Ok(())
    }
}

/// One entry of the YAML device file. Unknown keys are ignored so that
/// connection-library specific options can stay in the file.
#[derive(Debug, Deserialize)]
struct SeedEntry {
    #[serde(alias = "host")]
    ip: String,
    username: String,
    password: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
    key_file: Option<PathBuf>,
    #[serde(default = "default_device_type")]
    device_type: String,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_device_type() -> String {
    DEFAULT_DEVICE_TYPE.to_string()
}

impl From<SeedEntry> for SeedDevice {
    fn from(entry: SeedEntry) -> Self {
        let credentials = Credentials {
            username: entry.username,
            password: entry.password,
            key_file: entry.key_file,
            port: entry.port,
        };
        Self {
            address: entry.ip.trim().to_string(),
            credentials: Arc::new(credentials),
            device_type: entry.device_type,
        }
    }
}

/// Parses the YAML seed list.
///
/// `fallback_password` fills in seeds that carry neither a password nor a key file.
pub fn parse_seeds(
    yaml: &str,
    path: &Path,
    fallback_password: Option<&str>,
) -> Result<Vec<SeedDevice>, ConfigError> {
    let entries: Vec<SeedEntry> = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let seeds = entries
        .into_iter()
        .map(|mut entry| {
            if entry.password.is_none() && entry.key_file.is_none() {
                entry.password = fallback_password.map(str::to_string);
            }
            SeedDevice::from(entry)
        })
        .collect();

    Ok(seeds)
}

/// Reads and parses the YAML seed file at `path`.
pub fn load_seed_file(
    path: &Path,
    fallback_password: Option<&str>,
) -> Result<Vec<SeedDevice>, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let seeds = parse_seeds(&yaml, path, fallback_password)?;
    debug!(path = %path.display(), seeds = seeds.len(), "loaded seed file");
    Ok(seeds)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
