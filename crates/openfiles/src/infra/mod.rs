//! Infrastructure adapters: host boundary, UI dispatch, configuration, and concrete hosts.

pub mod config;
pub mod dispatch;
pub mod host;
pub mod local_host;
pub mod memory_host;
