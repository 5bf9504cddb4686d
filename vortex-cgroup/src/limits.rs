//! RDMA limit writing
//!
//! This module pushes an [`RdmaPolicy`] to the kernel by writing one
//! command per device to `rdma.max`.

use std::path::Path;
use tracing::debug;
use vortex_core::{RdmaPolicy, Result};

use crate::codec;
use crate::controller::{RdmaGroup, RDMA_MAX};

impl RdmaGroup {
    /// Write every device limit in `policy` to `rdma.max`
    ///
    /// Each device is a separate write; the kernel keeps per-device state
    /// across writes. Device order follows the policy's iteration order and
    /// is unspecified. An empty policy performs no writes.
    ///
    /// # Errors
    /// Stops at the first failed write and returns it; devices written
    /// before the failure stay applied.
    pub async fn set_limits(&self, path: &Path, policy: &RdmaPolicy) -> Result<()> {
        for (device, limit) in policy.iter() {
            let command = codec::format_command(device, limit);

            debug!(
                device,
                hca_handles = limit.hca_handles,
                hca_objects = limit.hca_objects,
                "Setting RDMA limit"
            );

            self.fs.write_file(path, RDMA_MAX, &command).await?;
        }

        Ok(())
    }
}
