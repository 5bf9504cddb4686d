//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vortex_cgroup::{CGROUP_ROOT, Hierarchy};
use vortex_core::ProcessId;

#[derive(Parser)]
#[command(name = "vortex")]
#[command(about = "Vortex RDMA cgroup manager", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Cgroup hierarchy generation
    #[arg(long, global = true, value_enum, default_value_t = HierarchyArg::Auto)]
    pub hierarchy: HierarchyArg,

    /// Cgroupfs mount point, used to detect the hierarchy
    #[arg(long, global = true, default_value = CGROUP_ROOT)]
    pub cgroup_root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Hierarchy selection on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HierarchyArg {
    /// Detect from the cgroupfs mount
    Auto,
    /// Per-controller hierarchy
    V1,
    /// Unified hierarchy
    V2,
}

impl HierarchyArg {
    /// The explicit generation, if one was chosen
    pub const fn explicit(self) -> Option<Hierarchy> {
        match self {
            Self::Auto => None,
            Self::V1 => Some(Hierarchy::V1),
            Self::V2 => Some(Hierarchy::V2),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write RDMA device limits to a cgroup
    Set {
        /// Cgroup directory
        #[arg(short, long)]
        path: PathBuf,

        /// JSON policy file, e.g. {"mlx5_1": {"hcaHandles": 100}}
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Inline device limit: DEVICE[:hca_handle=N][,hca_object=N]
        #[arg(long = "limit", value_name = "LIMIT")]
        limits: Vec<String>,
    },

    /// Show RDMA usage and limits of a cgroup
    Stats {
        /// Cgroup directory
        #[arg(short, long)]
        path: PathBuf,

        /// Print the snapshot as JSON (`null` when no data is available)
        #[arg(long)]
        json: bool,
    },

    /// Attach a process to a cgroup
    Apply {
        /// Cgroup directory
        #[arg(short, long)]
        path: PathBuf,

        /// Process ID (default: current process)
        #[arg(long)]
        pid: Option<ProcessId>,
    },
}
