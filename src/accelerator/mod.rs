//! The narrow device interface the hybrid engine drives.
//!
//! The engine never creates contexts, compiles kernels or allocates device
//! memory itself. It only writes, reads and releases named buffers,
//! dispatches one of two kernels and waits on the queue. Anything that can do
//! that can run the hybrid transform.

pub mod cube;
pub mod emulated;

pub use cube::CubeAccelerator;
pub use emulated::EmulatedAccelerator;

use crate::error::DeviceStatus;

/// Device-visible buffers the kernels read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceBuffer {
    /// `n` packed `(re, im)` `f32` records, transformed in place.
    Samples,
    /// One `u32`: the block size fused by [`Kernel::GroupStages`].
    PointsPerGroup,
    /// One `i32`: `1` for forward, `-1` for inverse.
    Direction,
    /// One `u32`: the block size `m` of the stage run by [`Kernel::SingleStage`].
    StageSize,
    /// `n` packed `(f32, f32)` records. When written, each work item stores
    /// the last twiddle it applied at its own index.
    Debug,
}

/// Device kernels.
///
/// Both are dispatched with `n / 2` work items, one per butterfly, in work
/// groups of `points_per_group / 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Runs every stage with `m <= points_per_group` inside each work group,
    /// with a work-group barrier between stages.
    GroupStages,
    /// Runs the single stage whose block size is held in
    /// [`DeviceBuffer::StageSize`].
    SingleStage,
}

/// An in-order device command queue.
///
/// `write`, `dispatch` and `release` only enqueue; `barrier` blocks until everything
/// enqueued so far has completed; `read` is blocking. The engine places a
/// barrier between every dispatch and any read or dispatch that depends on it.
pub trait Accelerator {
    fn write(&mut self, buffer: DeviceBuffer, data: &[u8]) -> Result<(), DeviceStatus>;

    fn dispatch(&mut self, kernel: Kernel, global_size: usize, local_size: usize) -> Result<(), DeviceStatus>;

    fn barrier(&mut self) -> Result<(), DeviceStatus>;

    fn read(&mut self, buffer: DeviceBuffer, out: &mut [u8]) -> Result<(), DeviceStatus>;

    /// Drops `buffer` so later dispatches run as if it was never written.
    /// Ordered after everything already enqueued; a no-op for a buffer that
    /// does not exist.
    fn release(&mut self, buffer: DeviceBuffer);

    /// Largest points-per-group the device can fuse into one work group.
    fn max_group_points(&self) -> usize;
}
