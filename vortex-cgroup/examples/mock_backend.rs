//! Mock backend example for testing

use std::path::Path;
use std::sync::Arc;
use vortex_cgroup::{Hierarchy, MockFs};
use vortex_core::{ProcessId, RdmaLimit, RdmaPolicy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("🧪 Testing with MockFs (no filesystem required)\n");

    let fs = MockFs::new();
    let path = Path::new("/sys/fs/cgroup/demo");

    // Pretend the kernel already reports two devices
    fs.add_file(
        path,
        "rdma.current",
        "mlx5_0 hca_handle=2 hca_object=40\nmlx5_1 hca_handle=0 hca_object=0\n",
    )
    .await;
    fs.add_file(
        path,
        "rdma.max",
        "mlx5_0 hca_handle=max hca_object=max\nmlx5_1 hca_handle=max hca_object=max\n",
    )
    .await;

    let controller = Hierarchy::V2.controller(Arc::new(fs.clone()));

    // Attach a process
    controller.apply(path, ProcessId::from_raw(100)).await?;
    println!("✅ Attached process 100");

    // Empty policy is skipped on the unified hierarchy
    controller.set(path, &RdmaPolicy::new()).await?;
    println!("✅ Empty policy: {} writes", fs.writes().await.len());

    // Constrain one device
    let policy = RdmaPolicy::new().with_device(
        "mlx5_0",
        RdmaLimit::new().with_handles(16).with_objects(1024),
    );
    controller.set(path, &policy).await?;

    for write in fs.writes().await {
        println!("✍️  {} <- {:?}", write.name, write.data);
    }

    // Only mlx5_0 changed; mlx5_1 keeps its unbounded limit
    match controller.stats(path).await? {
        Some(stats) => {
            println!("\n📊 {} devices", stats.len());
            for (limit, current) in stats.pairs() {
                println!(
                    "   {}: handles {}/{} objects {}/{}",
                    limit.device,
                    current.hca_handles,
                    limit.hca_handles,
                    current.hca_objects,
                    limit.hca_objects
                );
            }
        }
        None => println!("\n📊 No RDMA stats available"),
    }

    println!("\n📞 Total backend calls: {}", fs.call_count().await);

    Ok(())
}
