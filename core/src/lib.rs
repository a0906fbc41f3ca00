//! # topomap core
//!
//! Application services and driven adapters of the topology mapper.
//!
//! * [`discovery`] is the use case: the recursive, breadth-first walk from seed devices.
//! * [`topology`], [`identity`] and [`scope`] are the domain it works on.
//! * [`network`] holds the SSH adapter behind the
//!   [`CommandExecutor`](topomap_common::ports::CommandExecutor) port.
//! * [`serialize`] projects a finished topology into the persisted document.

pub mod discovery;
pub mod identity;
pub mod network;
pub mod scope;
pub mod serialize;
pub mod topology;

pub use discovery::DiscoveryEngine;
pub use topology::Topology;
