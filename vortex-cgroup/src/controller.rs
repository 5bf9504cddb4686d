//! RDMA controller contract and its two hierarchy variants
//!
//! [`RdmaGroup`] is the one engine: it knows the control files, the codec
//! and the reconciler. [`RdmaV1`] and [`RdmaV2`] wrap it and differ only in
//! when the policy write is skipped.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use vortex_core::{ProcessId, RdmaPolicy, RdmaStats, Result};

use crate::backend::CgroupFs;

/// Controller name shared by both hierarchy generations
pub const RDMA_CONTROLLER: &str = "rdma";

/// Per-device configured maximum (read/write)
pub const RDMA_MAX: &str = "rdma.max";

/// Per-device current usage (read-only)
pub const RDMA_CURRENT: &str = "rdma.current";

/// Contract every cgroup controller backend implements
///
/// `path` is the container's cgroup directory, owned by the hierarchy
/// manager. Calls for one path are serialized by the caller.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Name used to route policy and stats to this controller
    fn name(&self) -> &'static str;

    /// Attach a process to the cgroup at `path`
    ///
    /// # Errors
    /// Returns error if the process cannot be attached
    async fn apply(&self, path: &Path, pid: ProcessId) -> Result<()>;

    /// Push `policy` to the kernel
    ///
    /// # Errors
    /// Returns the first write failure; earlier writes are not rolled back
    async fn set(&self, path: &Path, policy: &RdmaPolicy) -> Result<()>;

    /// Read a coherent snapshot
    ///
    /// `Ok(None)` means no data is available right now: the cgroup does not
    /// exist, or the device set changed between the two reads.
    ///
    /// # Errors
    /// Returns error if a control file cannot be read
    async fn stats(&self, path: &Path) -> Result<Option<RdmaStats>>;
}

/// Shared RDMA engine
///
/// Holds the filesystem backend; everything else is stateless.
#[derive(Clone)]
pub struct RdmaGroup {
    pub(crate) fs: Arc<dyn CgroupFs>,
}

impl RdmaGroup {
    /// Create an engine on top of a filesystem backend
    #[must_use]
    pub fn new(fs: Arc<dyn CgroupFs>) -> Self {
        Self { fs }
    }

    /// Move `pid` into the cgroup at `path`
    ///
    /// # Errors
    /// Returns error if the backend cannot attach the process
    pub async fn join(&self, path: &Path, pid: ProcessId) -> Result<()> {
        debug!(pid = pid.as_raw(), path = %path.display(), "Attaching process to rdma cgroup");
        self.fs.join_process(path, pid).await
    }
}

impl std::fmt::Debug for RdmaGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdmaGroup").finish_non_exhaustive()
    }
}

/// RDMA controller for the per-controller (v1) hierarchy
///
/// The runtime only selects this controller when it is mounted, so every
/// call goes straight to the engine.
#[derive(Debug, Clone)]
pub struct RdmaV1 {
    group: RdmaGroup,
}

impl RdmaV1 {
    /// Create a v1 controller
    #[must_use]
    pub fn new(fs: Arc<dyn CgroupFs>) -> Self {
        Self {
            group: RdmaGroup::new(fs),
        }
    }
}

#[async_trait]
impl Controller for RdmaV1 {
    fn name(&self) -> &'static str {
        RDMA_CONTROLLER
    }

    async fn apply(&self, path: &Path, pid: ProcessId) -> Result<()> {
        self.group.join(path, pid).await
    }

    async fn set(&self, path: &Path, policy: &RdmaPolicy) -> Result<()> {
        self.group.set_limits(path, policy).await
    }

    async fn stats(&self, path: &Path) -> Result<Option<RdmaStats>> {
        self.group.read_stats(path).await
    }
}

/// RDMA controller for the unified (v2) hierarchy
///
/// All controllers share one directory here, so an empty policy leaves the
/// rdma files untouched.
#[derive(Debug, Clone)]
pub struct RdmaV2 {
    group: RdmaGroup,
}

impl RdmaV2 {
    /// Create a v2 controller
    #[must_use]
    pub fn new(fs: Arc<dyn CgroupFs>) -> Self {
        Self {
            group: RdmaGroup::new(fs),
        }
    }
}

#[async_trait]
impl Controller for RdmaV2 {
    fn name(&self) -> &'static str {
        RDMA_CONTROLLER
    }

    async fn apply(&self, path: &Path, pid: ProcessId) -> Result<()> {
        self.group.join(path, pid).await
    }

    async fn set(&self, path: &Path, policy: &RdmaPolicy) -> Result<()> {
        if policy.is_empty() {
            debug!(path = %path.display(), "No RDMA policy requested, skipping rdma.max");
            return Ok(());
        }

        self.group.set_limits(path, policy).await
    }

    async fn stats(&self, path: &Path) -> Result<Option<RdmaStats>> {
        self.group.read_stats(path).await
    }
}
