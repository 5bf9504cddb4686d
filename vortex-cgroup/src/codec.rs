//! RDMA line codec
//!
//! The kernel speaks one device per line:
//!
//! ```text
//! mlx5_1 hca_handle=10 hca_object=max
//! mlx4_0 hca_handle=2 hca_object=5
//! ```
//!
//! Writes use the same grammar, but only name the keys being constrained
//! and never emit `max`.

use std::fmt::Write as _;
use tracing::trace;
use vortex_core::{Error, RdmaEntry, RdmaLimit, Result};

/// Key for the HCA handle counter
pub const HCA_HANDLE: &str = "hca_handle";

/// Key for the HCA object counter
pub const HCA_OBJECT: &str = "hca_object";

/// Token the kernel uses for "no limit"
pub const MAX_TOKEN: &str = "max";

/// Build the command line that sets `limit` on `device`
///
/// Unconstrained fields are left out entirely.
///
/// # Example
/// ```
/// use vortex_cgroup::codec::format_command;
/// use vortex_core::RdmaLimit;
///
/// let limit = RdmaLimit::new().with_handles(100);
/// assert_eq!(format_command("mlx5_1", &limit), "mlx5_1 hca_handle=100");
/// ```
#[must_use]
pub fn format_command(device: &str, limit: &RdmaLimit) -> String {
    let mut command = device.to_string();

    // Writing to a String cannot fail
    if let Some(handles) = limit.hca_handles {
        let _ = write!(command, " {HCA_HANDLE}={handles}");
    }
    if let Some(objects) = limit.hca_objects {
        let _ = write!(command, " {HCA_OBJECT}={objects}");
    }

    command
}

/// Parse a plain decimal count: ASCII digits only, within `u32` range
///
/// Signs, whitespace and the `max` keyword are rejected.
#[must_use]
pub fn parse_decimal(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

fn parse_value(token: &str, value: &str) -> Result<u32> {
    if value == MAX_TOKEN {
        return Ok(RdmaEntry::UNBOUNDED);
    }

    parse_decimal(value)
        .ok_or_else(|| Error::malformed(token, "value is not a decimal number within u32 range"))
}

/// Apply one `key=value` token to `entry`
///
/// Unknown keys are validated but otherwise ignored.
///
/// # Errors
/// Returns [`Error::MalformedEntry`] if the token is not exactly one
/// `key=value` pair or the value is neither a `u32` nor `max`
pub fn parse_kv(token: &str, entry: &mut RdmaEntry) -> Result<()> {
    let mut parts = token.splitn(3, '=');
    let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::malformed(token, "expected a single key=value pair"));
    };

    let value = parse_value(token, value)?;

    match key {
        HCA_HANDLE => entry.hca_handles = value,
        HCA_OBJECT => entry.hca_objects = value,
        _ => trace!(key, "Ignoring unknown RDMA key"),
    }

    Ok(())
}

/// Decode one device line
///
/// # Errors
/// Returns [`Error::MalformedEntry`] unless the line is a device name
/// followed by exactly two valid `key=value` tokens
pub fn parse_line(line: &str) -> Result<RdmaEntry> {
    let tokens: Vec<&str> = line.splitn(4, ' ').collect();
    let [device, first, second] = tokens.as_slice() else {
        return Err(Error::malformed(
            line,
            format!("expected 3 space-separated fields, found {}", tokens.len()),
        ));
    };

    let mut entry = RdmaEntry::new(*device);
    parse_kv(first, &mut entry)?;
    parse_kv(second, &mut entry)?;

    Ok(entry)
}

/// Decode every well-formed device line in a kernel file, in file order
///
/// Malformed lines are skipped so one bad device does not hide the rest.
#[must_use]
pub fn parse_entries(content: &str) -> Vec<RdmaEntry> {
    content
        .lines()
        .filter_map(|line| match parse_line(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                trace!(error = %e, "Skipping RDMA line");
                None
            }
        })
        .collect()
}
