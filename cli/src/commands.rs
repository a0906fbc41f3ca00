pub mod discover;

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use topomap_common::config::DEFAULT_MAX_DEVICES;
use topomap_core::serialize::OutputFormat;

#[derive(Parser)]
#[command(name = "topomap")]
#[command(version, about = "Discover the topology of a Cisco network over SSH.")]
pub struct CommandLine {
    /// YAML file listing the seed devices
    #[arg(short, long, default_value = "sample_devices.yaml")]
    pub devices: PathBuf,

    /// Directory the discovery document is written to
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Stop visiting once this many devices have been visited
    #[arg(short, long, default_value_t = DEFAULT_MAX_DEVICES)]
    pub max_devices: usize,

    /// Subnet (CIDR) whose devices are never visited, may be repeated
    #[arg(short, long = "ignore-subnets", value_name = "CIDR", num_args = 1..)]
    pub ignore_subnets: Vec<String>,

    /// Devices of the same depth visited at once
    #[arg(short = 'j', long, default_value_t = 1)]
    pub parallelism: usize,

    /// Seconds to wait for a session to open
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// Seconds to wait for a single show command
    #[arg(long, default_value_t = 30)]
    pub command_timeout: u64,

    /// Give up after this many seconds and keep what was found
    #[arg(long)]
    pub run_timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = FormatArg::Yaml)]
    pub format: FormatArg,

    /// Password for seeds that carry neither a password nor a key file
    #[arg(long, env = "TOPOMAP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Also append log lines to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,

    /// Less output, repeat for even less
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
