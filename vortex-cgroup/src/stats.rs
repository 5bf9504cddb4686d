//! RDMA statistics reading
//!
//! This module reconciles `rdma.current` and `rdma.max` into one
//! [`RdmaStats`] snapshot.

use std::path::Path;
use tracing::debug;
use vortex_core::{RdmaEntry, RdmaStats, Result};

use crate::codec;
use crate::controller::{RdmaGroup, RDMA_CURRENT, RDMA_MAX};

impl RdmaGroup {
    /// Read a coherent RDMA snapshot for the cgroup at `path`
    ///
    /// Returns `Ok(None)` when the cgroup does not exist, or when the two
    /// files list a different number of devices. The files are read one
    /// after the other, so a device removed in between shows up as a count
    /// mismatch; callers should simply try again later.
    ///
    /// Devices are paired by position, in the order the kernel lists them.
    ///
    /// # Errors
    /// Returns error if either file cannot be read
    pub async fn read_stats(&self, path: &Path) -> Result<Option<RdmaStats>> {
        if !self.fs.path_exists(path).await {
            debug!(path = %path.display(), "Cgroup path absent, no RDMA stats");
            return Ok(None);
        }

        let current = self.read_entries(path, RDMA_CURRENT).await?;
        let limit = self.read_entries(path, RDMA_MAX).await?;

        if current.len() != limit.len() {
            debug!(
                path = %path.display(),
                current = current.len(),
                limit = limit.len(),
                "RDMA device set changed between reads, dropping stats"
            );
            return Ok(None);
        }

        debug!(devices = current.len(), "RDMA stats read");

        Ok(Some(RdmaStats { limit, current }))
    }

    /// Read and decode every device line of one control file
    async fn read_entries(&self, path: &Path, file: &str) -> Result<Vec<RdmaEntry>> {
        let content = self.fs.read_file(path, file).await?;
        Ok(codec::parse_entries(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockFs;
    use std::sync::Arc;

    const PATH: &str = "/sys/fs/cgroup/rdma/box";

    fn entry(device: &str, hca_handles: u32, hca_objects: u32) -> RdmaEntry {
        RdmaEntry {
            device: device.to_string(),
            hca_handles,
            hca_objects,
        }
    }

    #[tokio::test]
    async fn test_stats_absent_path() {
        let fs = MockFs::new();
        let group = RdmaGroup::new(Arc::new(fs.clone()));

        let stats = group.read_stats(Path::new(PATH)).await.unwrap();
        assert!(stats.is_none());
        // Only the existence check ran
        assert_eq!(fs.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let fs = MockFs::new();
        let path = Path::new(PATH);
        fs.add_file(
            path,
            RDMA_CURRENT,
            "mlx5_1 hca_handle=10 hca_object=20\nmlx5_2 hca_handle=0 hca_object=1\n",
        )
        .await;
        fs.add_file(
            path,
            RDMA_MAX,
            "mlx5_1 hca_handle=100 hca_object=300\nmlx5_2 hca_handle=max hca_object=max\n",
        )
        .await;

        let group = RdmaGroup::new(Arc::new(fs));
        let stats = group.read_stats(path).await.unwrap().unwrap();

        assert_eq!(
            stats.limit,
            vec![
                entry("mlx5_1", 100, 300),
                entry("mlx5_2", u32::MAX, u32::MAX)
            ]
        );
        assert_eq!(
            stats.current,
            vec![entry("mlx5_1", 10, 20), entry("mlx5_2", 0, 1)]
        );
    }

    #[tokio::test]
    async fn test_stats_count_mismatch_is_no_data() {
        let fs = MockFs::new();
        let path = Path::new(PATH);
        fs.add_file(
            path,
            RDMA_CURRENT,
            "A hca_handle=1 hca_object=1\nB hca_handle=2 hca_object=2\n",
        )
        .await;
        fs.add_file(path, RDMA_MAX, "A hca_handle=max hca_object=max\n")
            .await;

        let group = RdmaGroup::new(Arc::new(fs));
        assert!(group.read_stats(path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_malformed_lines_skipped_before_count() {
        let fs = MockFs::new();
        let path = Path::new(PATH);
        fs.add_file(
            path,
            RDMA_CURRENT,
            "A hca_handle=1 hca_object=1\nbroken\nB hca_handle=2 hca_object=2\n",
        )
        .await;
        fs.add_file(
            path,
            RDMA_MAX,
            "A hca_handle=5 hca_object=5\nB hca_handle=6 hca_object=6\n",
        )
        .await;

        let group = RdmaGroup::new(Arc::new(fs));
        let stats = group.read_stats(path).await.unwrap().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.current[1].device, "B");
    }

    #[tokio::test]
    async fn test_stats_missing_file_is_error() {
        let fs = MockFs::new();
        let path = Path::new(PATH);
        fs.add_file(path, RDMA_CURRENT, "A hca_handle=1 hca_object=1\n")
            .await;

        let group = RdmaGroup::new(Arc::new(fs));
        assert!(group.read_stats(path).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_no_devices() {
        let fs = MockFs::new();
        let path = Path::new(PATH);
        fs.add_file(path, RDMA_CURRENT, "").await;
        fs.add_file(path, RDMA_MAX, "").await;

        let group = RdmaGroup::new(Arc::new(fs));
        let stats = group.read_stats(path).await.unwrap().unwrap();
        assert!(stats.is_empty());
    }
}
