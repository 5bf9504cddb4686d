//! Filesystem backend trait for pluggable implementations
//!
//! Every kernel interaction of the RDMA controller goes through
//! [`CgroupFs`], so the codec, reconciler and write loop can run against a
//! real cgroupfs ([`HostFs`]) or an in-memory double ([`MockFs`]).

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use vortex_core::{Error, ProcessId, Result};

use crate::codec::{HCA_HANDLE, HCA_OBJECT, MAX_TOKEN};
use crate::controller::RDMA_MAX;

/// File a process PID is written to in order to join a cgroup
pub const CGROUP_PROCS: &str = "cgroup.procs";

/// Trait for cgroup filesystem access
///
/// This allows for different implementations:
/// - [`HostFs`] - Production, reads and writes the mounted cgroupfs
/// - [`MockFs`] - Testing without filesystem
///
/// # Thread Safety
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait CgroupFs: Send + Sync {
    /// Read the full contents of `name` inside the cgroup at `path`
    ///
    /// # Errors
    /// Returns error if the file cannot be read
    async fn read_file(&self, path: &Path, name: &str) -> Result<String>;

    /// Write `data` to `name` inside the cgroup at `path` as a single write
    ///
    /// # Errors
    /// Returns error if the kernel rejects the write
    async fn write_file(&self, path: &Path, name: &str, data: &str) -> Result<()>;

    /// Check whether the cgroup directory exists
    async fn path_exists(&self, path: &Path) -> bool;

    /// Move a process into the cgroup at `path`
    ///
    /// # Errors
    /// Returns error if the process cannot be attached
    async fn join_process(&self, path: &Path, pid: ProcessId) -> Result<()>;
}

/// Map an I/O failure on a control file to the crate error taxonomy
///
/// `action` reads as a verb phrase, e.g. `read` or `write "1" to`.
fn io_error(action: &str, file: &Path, e: &std::io::Error) -> Error {
    if e.kind() == ErrorKind::PermissionDenied {
        Error::PermissionDenied {
            operation: format!("{action} {}: {e}", file.display()),
        }
    } else {
        Error::CGroup {
            message: format!("Failed to {action} {}: {e}", file.display()),
        }
    }
}

/// Reject an empty cgroup path, which would resolve against the working
/// directory
fn require_path(path: &Path, name: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig {
            message: format!("Empty cgroup path for {name}"),
        });
    }

    Ok(())
}

/// Backend for the mounted cgroup filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl HostFs {
    /// Create a new host backend
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CgroupFs for HostFs {
    async fn read_file(&self, path: &Path, name: &str) -> Result<String> {
        require_path(path, name)?;
        let file = path.join(name);

        fs::read_to_string(&file)
            .await
            .map_err(|e| io_error("read", &file, &e))
    }

    async fn write_file(&self, path: &Path, name: &str, data: &str) -> Result<()> {
        require_path(path, name)?;
        let file = path.join(name);

        fs::write(&file, data)
            .await
            .map_err(|e| io_error(&format!("write {data:?} to"), &file, &e))
    }

    async fn path_exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn join_process(&self, path: &Path, pid: ProcessId) -> Result<()> {
        // Nothing to join; the process stays where it is
        if path.as_os_str().is_empty() {
            debug!(pid = pid.as_raw(), "Empty cgroup path, not joining");
            return Ok(());
        }

        if !self.path_exists(path).await {
            debug!(path = %path.display(), "Creating cgroup directory");
            fs::create_dir_all(path)
                .await
                .map_err(|e| Error::CGroup {
                    message: format!("Failed to create cgroup directory {}: {e}", path.display()),
                })?;
        }

        debug!(pid = pid.as_raw(), path = %path.display(), "Joining cgroup");

        self.write_file(path, CGROUP_PROCS, &pid.to_string()).await
    }
}

/// One recorded call to [`CgroupFs::write_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    /// Cgroup directory
    pub path: PathBuf,
    /// Control file name
    pub name: String,
    /// Payload
    pub data: String,
}

/// Mock backend for testing (doesn't touch filesystem)
///
/// Files live in memory keyed by `(path, name)`. Every write is recorded in
/// order. A write to `rdma.max` updates only the device it names, the way
/// the kernel does: keys it omits keep their value, and a device seen for
/// the first time starts at `max`. Any other write replaces the file
/// contents.
///
/// # Example
/// ```
/// use std::path::Path;
/// use vortex_cgroup::{CgroupFs, MockFs};
///
/// # #[tokio::main]
/// # async fn main() {
/// let fs = MockFs::new();
/// let cg = Path::new("/sys/fs/cgroup/rdma/demo");
///
/// fs.add_file(cg, "rdma.current", "mlx5_1 hca_handle=1 hca_object=2\n").await;
/// assert!(fs.path_exists(cg).await);
///
/// fs.write_file(cg, "rdma.max", "mlx5_1 hca_handle=10").await.unwrap();
/// assert_eq!(fs.writes().await.len(), 1);
/// assert_eq!(
///     fs.file(cg, "rdma.max").await.as_deref(),
///     Some("mlx5_1 hca_handle=10 hca_object=max\n")
/// );
/// # }
/// ```
#[derive(Clone)]
pub struct MockFs {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    paths: HashSet<PathBuf>,
    files: HashMap<(PathBuf, String), String>,
    writes: Vec<RecordedWrite>,
    joined: Vec<(PathBuf, ProcessId)>,
    fail_writes_after: Option<usize>,
    call_count: usize,
}

impl MockFs {
    /// Create a new mock backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Mark a cgroup directory as existing
    pub async fn add_path(&self, path: &Path) {
        self.state.lock().await.paths.insert(path.to_path_buf());
    }

    /// Seed a control file (its directory becomes existing too)
    pub async fn add_file(&self, path: &Path, name: &str, contents: &str) {
        let mut state = self.state.lock().await;
        state.paths.insert(path.to_path_buf());
        state
            .files
            .insert((path.to_path_buf(), name.to_string()), contents.to_string());
    }

    /// Current contents of a control file, if any
    pub async fn file(&self, path: &Path, name: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .files
            .get(&(path.to_path_buf(), name.to_string()))
            .cloned()
    }

    /// Let `n` more writes succeed, then fail every write after that
    pub async fn fail_writes_after(&self, n: usize) {
        self.state.lock().await.fail_writes_after = Some(n);
    }

    /// All successful writes, in order
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().await.writes.clone()
    }

    /// All processes joined, in order
    pub async fn joined(&self) -> Vec<(PathBuf, ProcessId)> {
        self.state.lock().await.joined.clone()
    }

    /// Get the number of backend calls made (for testing)
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.call_count
    }
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFs").finish_non_exhaustive()
    }
}

#[async_trait]
impl CgroupFs for MockFs {
    async fn read_file(&self, path: &Path, name: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        state.call_count += 1;

        tracing::trace!(path = %path.display(), name, "Mock: Read file");

        state
            .files
            .get(&(path.to_path_buf(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::CGroup {
                message: format!("Failed to read {}: not found", path.join(name).display()),
            })
    }

    async fn write_file(&self, path: &Path, name: &str, data: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.call_count += 1;

        if let Some(remaining) = state.fail_writes_after.as_mut() {
            if *remaining == 0 {
                return Err(Error::CGroup {
                    message: format!(
                        "Failed to write {data:?} to {}: injected failure",
                        path.join(name).display()
                    ),
                });
            }
            *remaining -= 1;
        }

        state.paths.insert(path.to_path_buf());
        let key = (path.to_path_buf(), name.to_string());
        let contents = if name == RDMA_MAX {
            merge_device_line(state.files.get(&key).map_or("", String::as_str), data)
        } else {
            data.to_string()
        };
        state.files.insert(key, contents);
        state.writes.push(RecordedWrite {
            path: path.to_path_buf(),
            name: name.to_string(),
            data: data.to_string(),
        });

        tracing::debug!(path = %path.display(), name, data, "Mock: Wrote file");

        Ok(())
    }

    async fn path_exists(&self, path: &Path) -> bool {
        let mut state = self.state.lock().await;
        state.call_count += 1;
        state.paths.contains(path)
    }

    async fn join_process(&self, path: &Path, pid: ProcessId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.call_count += 1;

        state.paths.insert(path.to_path_buf());
        state.joined.push((path.to_path_buf(), pid));

        tracing::debug!(pid = pid.as_raw(), path = %path.display(), "Mock: Joined process");

        Ok(())
    }
}

/// Apply one `rdma.max` command to the file contents, per device
fn merge_device_line(contents: &str, command: &str) -> String {
    let mut tokens = command.split_whitespace();
    let Some(device) = tokens.next() else {
        return contents.to_string();
    };

    let mut lines: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    let index = match lines
        .iter()
        .position(|line| line.split_whitespace().next() == Some(device))
    {
        Some(index) => index,
        None => {
            lines.push(format!(
                "{device} {HCA_HANDLE}={MAX_TOKEN} {HCA_OBJECT}={MAX_TOKEN}"
            ));
            lines.len() - 1
        }
    };

    let mut fields: Vec<String> = lines[index].split_whitespace().map(str::to_string).collect();
    for token in tokens {
        let key = token.split_once('=').map_or(token, |(key, _)| key);
        let existing = fields
            .iter()
            .skip(1)
            .position(|field| field.split_once('=').map_or(field.as_str(), |(k, _)| k) == key);
        match existing {
            Some(offset) => fields[offset + 1] = token.to_string(),
            None => fields.push(token.to_string()),
        }
    }
    lines[index] = fields.join(" ");

    let mut merged = lines.join("\n");
    merged.push('\n');
    merged
}
