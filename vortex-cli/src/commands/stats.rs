//! Stats command implementation

use anyhow::{Context, Result};
use std::path::Path;
use vortex_cgroup::Controller;
use vortex_core::{RdmaEntry, RdmaStats};

pub async fn execute(controller: &dyn Controller, path: &Path, json: bool) -> Result<()> {
    tracing::info!(path = %path.display(), "Getting RDMA stats");

    let stats = controller
        .stats(path)
        .await
        .context("Failed to read RDMA stats")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to encode stats")?
        );
        return Ok(());
    }

    match stats {
        Some(stats) => print_table(path, &stats),
        None => println!("No RDMA stats available for {}", path.display()),
    }

    Ok(())
}

fn print_table(path: &Path, stats: &RdmaStats) {
    println!("\n📊 RDMA Stats for '{}'", path.display());
    println!("{:-<72}", "");
    println!(
        "{:<16} {:>12} {:>12} {:>12} {:>12}",
        "Device", "Handles", "Max Handles", "Objects", "Max Objects"
    );
    println!("{:-<72}", "");

    for (limit, current) in stats.pairs() {
        println!(
            "{:<16} {:>12} {:>12} {:>12} {:>12}",
            current.device,
            format_count(current.hca_handles),
            format_count(limit.hca_handles),
            format_count(current.hca_objects),
            format_count(limit.hca_objects),
        );
    }

    println!("{:-<72}", "");
}

fn format_count(value: u32) -> String {
    if value == RdmaEntry::UNBOUNDED {
        "max".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(12), "12");
        assert_eq!(format_count(u32::MAX), "max");
    }
}
