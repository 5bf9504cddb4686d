//! Apply command implementation

use anyhow::{Context, Result};
use std::path::Path;
use vortex_cgroup::Controller;
use vortex_core::ProcessId;

pub async fn execute(controller: &dyn Controller, path: &Path, pid: Option<ProcessId>) -> Result<()> {
    let pid = pid.unwrap_or_else(ProcessId::current);

    tracing::info!(pid = pid.as_raw(), path = %path.display(), "Attaching process");

    controller
        .apply(path, pid)
        .await
        .with_context(|| format!("Failed to attach process {pid} to {}", path.display()))?;

    println!("✅ Process {pid} attached to {}", path.display());

    Ok(())
}
