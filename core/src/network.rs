//! Adapters that reach real devices.

pub mod shell;
pub mod ssh;
pub mod tcp;
