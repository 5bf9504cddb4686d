//! Set command implementation

use anyhow::{Context, Result};
use std::path::Path;
use vortex_cgroup::Controller;
use vortex_cgroup::codec::{HCA_HANDLE, HCA_OBJECT, parse_decimal};
use vortex_core::{Error, RdmaLimit, RdmaPolicy};

pub async fn execute(
    controller: &dyn Controller,
    path: &Path,
    policy_file: Option<&Path>,
    limits: &[String],
) -> Result<()> {
    let policy = build_policy(policy_file, limits).await?;

    tracing::info!(
        path = %path.display(),
        devices = policy.len(),
        "Setting RDMA limits"
    );

    controller
        .set(path, &policy)
        .await
        .with_context(|| format!("Failed to set RDMA limits on {}", path.display()))?;

    if policy.is_empty() {
        println!("⚙️  No RDMA limits requested");
    } else {
        println!("✅ RDMA limits set on {}", path.display());
        let mut devices: Vec<_> = policy.iter().collect();
        devices.sort_by_key(|(device, _)| *device);
        for (device, limit) in devices {
            println!(
                "   {device}: handles={} objects={}",
                describe(limit.hca_handles),
                describe(limit.hca_objects)
            );
        }
    }

    Ok(())
}

fn describe(value: Option<u32>) -> String {
    value.map_or_else(|| "unchanged".to_string(), |v| v.to_string())
}

/// Load the policy file, then layer inline limits on top
async fn build_policy(policy_file: Option<&Path>, limits: &[String]) -> Result<RdmaPolicy> {
    let mut policy = match policy_file {
        Some(file) => {
            let json = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read policy file {}", file.display()))?;
            RdmaPolicy::from_json(&json)
                .with_context(|| format!("Invalid policy file {}", file.display()))?
        }
        None => RdmaPolicy::new(),
    };

    for raw in limits {
        let (device, limit) = parse_limit(raw)?;
        policy.insert(device, limit);
    }

    Ok(policy)
}

fn invalid(raw: &str, reason: &str) -> Error {
    Error::InvalidConfig {
        message: format!("Invalid limit {raw:?}: {reason}"),
    }
}

/// Parse `DEVICE[:hca_handle=N][,hca_object=N]`
pub fn parse_limit(raw: &str) -> vortex_core::Result<(String, RdmaLimit)> {
    let (device, fields) = raw.split_once(':').unwrap_or((raw, ""));

    if device.is_empty() || device.contains(char::is_whitespace) {
        return Err(invalid(raw, "device name must be non-empty without spaces"));
    }

    let mut limit = RdmaLimit::new();

    for field in fields.split(',').filter(|f| !f.is_empty()) {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| invalid(raw, "expected key=value"))?;

        let value = parse_decimal(value)
            .ok_or_else(|| invalid(raw, "value must be a plain decimal 32-bit integer"))?;

        match key {
            HCA_HANDLE => limit.hca_handles = Some(value),
            HCA_OBJECT => limit.hca_objects = Some(value),
            _ => return Err(invalid(raw, "key must be hca_handle or hca_object")),
        }
    }

    Ok((device.to_string(), limit))
}
