//! Vortex Core - Foundation types for RDMA cgroup management
//!
//! This crate provides the data model shared by the cgroup backends and the
//! configuration/monitoring layers that drive them.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod resources;
pub mod types;

pub use error::{Error, Result};
pub use resources::{RdmaEntry, RdmaLimit, RdmaPolicy, RdmaStats};
pub use types::ProcessId;
