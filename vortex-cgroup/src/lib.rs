//! RDMA cgroup resource management with pluggable backends
//!
//! This crate translates an [`RdmaPolicy`] into `rdma.max` commands and reads
//! `rdma.current`/`rdma.max` back into [`RdmaStats`], for both the v1 and the
//! unified v2 cgroup hierarchy.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod codec;
pub mod controller;
pub mod hierarchy;
mod limits;
mod stats;

pub use backend::{CgroupFs, HostFs, MockFs, RecordedWrite};
pub use controller::{Controller, RdmaGroup, RdmaV1, RdmaV2, RDMA_CONTROLLER};
pub use hierarchy::{Hierarchy, CGROUP_ROOT};

// Re-export commonly used types
pub use vortex_core::{ProcessId, RdmaEntry, RdmaLimit, RdmaPolicy, RdmaStats};
