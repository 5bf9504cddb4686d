use crate::cli::{Cli, Commands};
use anyhow::Result;
use std::sync::Arc;
use vortex_cgroup::{CgroupFs, Controller, Hierarchy, HostFs};

pub mod apply;
pub mod set;
pub mod stats;

/// Dispatch command to appropriate handler
pub async fn dispatch(cli: Cli) -> Result<()> {
    let controller = controller(&cli).await;

    match cli.command {
        Commands::Set {
            path,
            policy,
            limits,
        } => set::execute(controller.as_ref(), &path, policy.as_deref(), &limits).await,

        Commands::Stats { path, json } => stats::execute(controller.as_ref(), &path, json).await,

        Commands::Apply { path, pid } => apply::execute(controller.as_ref(), &path, pid).await,
    }
}

/// Build the RDMA controller for the selected or detected hierarchy
async fn controller(cli: &Cli) -> Box<dyn Controller> {
    let fs: Arc<dyn CgroupFs> = Arc::new(HostFs::new());

    let hierarchy = match cli.hierarchy.explicit() {
        Some(hierarchy) => hierarchy,
        None => Hierarchy::detect(&*fs, &cli.cgroup_root).await,
    };

    tracing::debug!(%hierarchy, "Using cgroup hierarchy");

    hierarchy.controller(fs)
}
