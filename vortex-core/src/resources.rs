//! RDMA resource value objects
//!
//! The write side ([`RdmaLimit`], [`RdmaPolicy`]) mirrors the
//! `linux.resources.rdma` section of an OCI runtime config. The read side
//! ([`RdmaEntry`], [`RdmaStats`]) is what the kernel reports back through
//! `rdma.current` and `rdma.max`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::{Error, Result};

/// Limit for a single RDMA device
///
/// A field left as `None` leaves that sub-resource unconstrained: it is
/// omitted from the command written to the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdmaLimit {
    /// Maximum number of HCA handles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hca_handles: Option<u32>,

    /// Maximum number of HCA objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hca_objects: Option<u32>,
}

impl RdmaLimit {
    /// Create a limit constraining nothing
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hca_handles: None,
            hca_objects: None,
        }
    }

    /// Constrain the HCA handle count
    #[must_use]
    pub const fn with_handles(mut self, handles: u32) -> Self {
        self.hca_handles = Some(handles);
        self
    }

    /// Constrain the HCA object count
    #[must_use]
    pub const fn with_objects(mut self, objects: u32) -> Self {
        self.hca_objects = Some(objects);
        self
    }

    /// Returns true if neither sub-resource is constrained
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.hca_handles.is_none() && self.hca_objects.is_none()
    }
}

/// Per-device RDMA policy for one container
///
/// Iteration order over devices is unspecified.
///
/// # Example
/// ```
/// use vortex_core::{RdmaLimit, RdmaPolicy};
///
/// let policy = RdmaPolicy::from_json(r#"{"mlx5_1": {"hcaHandles": 100}}"#).unwrap();
/// assert_eq!(policy.get("mlx5_1"), Some(&RdmaLimit::new().with_handles(100)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RdmaPolicy(HashMap<String, RdmaLimit>);

impl RdmaPolicy {
    /// Create an empty policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a policy from its JSON map form
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if the document is not a device map
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            message: format!("Invalid RDMA policy: {e}"),
        })?;

        debug!(devices = policy.len(), "Loaded RDMA policy");

        Ok(policy)
    }

    /// Add or replace the limit for a device
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>, limit: RdmaLimit) -> Self {
        self.insert(device, limit);
        self
    }

    /// Add or replace the limit for a device, returning the previous one
    pub fn insert(&mut self, device: impl Into<String>, limit: RdmaLimit) -> Option<RdmaLimit> {
        self.0.insert(device.into(), limit)
    }

    /// Look up the limit for a device
    #[must_use]
    pub fn get(&self, device: &str) -> Option<&RdmaLimit> {
        self.0.get(device)
    }

    /// Merge another policy into this one; entries in `other` win
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of devices in the policy
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no device is constrained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(device, limit)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RdmaLimit)> {
        self.0.iter().map(|(device, limit)| (device.as_str(), limit))
    }
}

impl FromIterator<(String, RdmaLimit)> for RdmaPolicy {
    fn from_iter<I: IntoIterator<Item = (String, RdmaLimit)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One device's usage or limit as reported by the kernel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdmaEntry {
    /// Kernel-visible device name, e.g. `mlx5_1`
    pub device: String,

    /// HCA handles; [`RdmaEntry::UNBOUNDED`] when the kernel reports `max`
    pub hca_handles: u32,

    /// HCA objects; [`RdmaEntry::UNBOUNDED`] when the kernel reports `max`
    pub hca_objects: u32,
}

impl RdmaEntry {
    /// Value substituted for the kernel's `max` token
    ///
    /// A limit configured as exactly `u32::MAX` reads back as this sentinel
    /// too; the two cannot be told apart.
    pub const UNBOUNDED: u32 = u32::MAX;

    /// Create an entry with both counters at zero
    #[must_use]
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            hca_handles: 0,
            hca_objects: 0,
        }
    }

    /// Returns true if the handle count has no ceiling
    #[must_use]
    pub const fn handles_unbounded(&self) -> bool {
        self.hca_handles == Self::UNBOUNDED
    }

    /// Returns true if the object count has no ceiling
    #[must_use]
    pub const fn objects_unbounded(&self) -> bool {
        self.hca_objects == Self::UNBOUNDED
    }
}

/// Coherent RDMA snapshot for one cgroup
///
/// `limit` and `current` have equal length and line up by index, in the
/// order the kernel listed the devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdmaStats {
    /// Configured maximum per device (`rdma.max`)
    pub limit: Vec<RdmaEntry>,

    /// Current usage per device (`rdma.current`)
    pub current: Vec<RdmaEntry>,
}

impl RdmaStats {
    /// Number of devices in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Returns true if the kernel listed no devices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Iterate over index-aligned `(limit, current)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&RdmaEntry, &RdmaEntry)> {
        self.limit.iter().zip(&self.current)
    }

    /// Find the `(limit, current)` pair for a device by name
    ///
    /// Each side is looked up independently, so this does not depend on the
    /// two files listing devices in the same order.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<(&RdmaEntry, &RdmaEntry)> {
        let limit = self.limit.iter().find(|e| e.device == name)?;
        let current = self.current.iter().find(|e| e.device == name)?;
        Some((limit, current))
    }
}
