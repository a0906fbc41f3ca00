//! # Topomap Common
//!
//! Types shared by every layer of topomap.
//!
//! * **[`config`]**: the immutable Discovery Config and the YAML seed file format.
//! * **[`error`]**: the error taxonomy for executors, parsers and the engine.
//! * **[`command`]**: the show-command families issued against each device.
//! * **[`records`]**: structured parser output, tagged by command family.
//! * **[`ports`]**: the traits implemented by transport and parser adapters.
//! * **[`network`]**: subnet helpers.

pub mod command;
pub mod config;
pub mod error;
pub mod network;
pub mod ports;
pub mod records;
