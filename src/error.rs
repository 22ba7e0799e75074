use std::fmt;
use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by transform construction and the hybrid device path.
///
/// Device failures are never retried and never come with a partial result:
/// the caller gets the error and decides whether to abort.
#[derive(Error, Debug)]
pub enum FftError {
    #[error("transform length {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("points per group {points} must be a power of two in 2..={max}")]
    InvalidPointsPerGroup { points: usize, max: usize },
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// The device operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceOp {
    Write,
    Dispatch,
    Barrier,
    Read,
}

impl fmt::Display for DeviceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceOp::Write => "write",
            DeviceOp::Dispatch => "dispatch",
            DeviceOp::Barrier => "barrier",
            DeviceOp::Read => "read",
        };
        f.write_str(name)
    }
}

/// Non-success status reported by an [`Accelerator`](crate::accelerator::Accelerator).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DeviceStatus {
    #[error("buffer was never written")]
    UnknownBuffer,
    #[error("size mismatch: device holds {device} bytes, host expects {host}")]
    SizeMismatch { device: usize, host: usize },
    #[error("invalid work size: global {global}, local {local}")]
    InvalidWorkSize { global: usize, local: usize },
    #[error("kernel parameter {0} is missing")]
    MissingParameter(&'static str),
    #[error("kernel launch failed: {0}")]
    Launch(String),
    #[error("queue synchronisation failed: {0}")]
    Sync(String),
}

/// A failed device operation together with the engine call site that issued it.
#[derive(Error, Debug)]
#[error("device {op} failed at {location}: {status}")]
pub struct DeviceError {
    pub op: DeviceOp,
    pub location: &'static Location<'static>,
    pub status: DeviceStatus,
}

/// Converts a device status into a [`DeviceError`] stamped with the caller's
/// location, logging it on the way out.
#[track_caller]
pub(crate) fn check(op: DeviceOp, result: Result<(), DeviceStatus>) -> Result<(), DeviceError> {
    let location = Location::caller();
    result.map_err(|status| {
        log::error!("device {op} failed at {location}: {status}");
        DeviceError {
            op,
            location,
            status,
        }
    })
}
