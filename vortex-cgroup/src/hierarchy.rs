//! Cgroup hierarchy generation detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::backend::CgroupFs;
use crate::controller::{Controller, RdmaV1, RdmaV2};

/// Default cgroupfs mount point
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Only present at the root of a unified hierarchy
const UNIFIED_MARKER: &str = "cgroup.controllers";

/// Cgroup hierarchy generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hierarchy {
    /// One hierarchy per controller
    V1,
    /// Single unified hierarchy
    V2,
}

impl Hierarchy {
    /// Detect the generation mounted at `root`
    pub async fn detect(fs: &dyn CgroupFs, root: &Path) -> Self {
        let hierarchy = if fs.path_exists(&root.join(UNIFIED_MARKER)).await {
            Self::V2
        } else {
            Self::V1
        };

        debug!(root = %root.display(), %hierarchy, "Detected cgroup hierarchy");

        hierarchy
    }

    /// Build the RDMA controller for this generation
    #[must_use]
    pub fn controller(self, fs: Arc<dyn CgroupFs>) -> Box<dyn Controller> {
        match self {
            Self::V1 => Box::new(RdmaV1::new(fs)),
            Self::V2 => Box::new(RdmaV2::new(fs)),
        }
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}
