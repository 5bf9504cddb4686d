//! Basic RDMA cgroup usage example
//!
//! Run as root on a host with an RDMA device and the rdma controller enabled.

use std::path::PathBuf;
use std::sync::Arc;
use vortex_cgroup::{CGROUP_ROOT, Hierarchy, HostFs};
use vortex_core::{ProcessId, RdmaLimit, RdmaPolicy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let fs = Arc::new(HostFs::new());
    let root = PathBuf::from(CGROUP_ROOT);

    // Pick the backend for whatever is mounted
    let hierarchy = Hierarchy::detect(fs.as_ref(), &root).await;
    let path = match hierarchy {
        Hierarchy::V1 => root.join("rdma").join("vortex-example"),
        Hierarchy::V2 => root.join("vortex-example"),
    };
    let controller = hierarchy.controller(fs);

    // Add current process to cgroup
    let current_pid = ProcessId::current();
    controller.apply(&path, current_pid).await?;

    // Limit the first mlx5 device
    let policy = RdmaPolicy::new().with_device(
        "mlx5_0",
        RdmaLimit::new().with_handles(8).with_objects(512),
    );
    controller.set(&path, &policy).await?;

    println!("✅ RDMA cgroup configured ({hierarchy})");
    println!("   Path: {}", path.display());
    println!("   Process added: {current_pid}");

    // Read stats
    match controller.stats(&path).await? {
        Some(stats) => {
            println!("\n📊 Current stats:");
            for (limit, current) in stats.pairs() {
                println!(
                    "   {}: handles {}/{} objects {}/{}",
                    current.device,
                    current.hca_handles,
                    limit.hca_handles,
                    current.hca_objects,
                    limit.hca_objects
                );
            }
        }
        None => println!("\n📊 No RDMA stats available yet"),
    }

    Ok(())
}
