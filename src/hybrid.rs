// Hybrid accelerator/host transform.
// Stages with block size m <= points_per_group never cross a work-group
// boundary, so the device runs all of them in one dispatch. The remaining
// stages are finished on the host or with one device dispatch per stage.
use std::time::Instant;

use num_complex::{Complex, Complex32};
use num_traits::{AsPrimitive, Float, FloatConst};

use crate::accelerator::{Accelerator, DeviceBuffer, Kernel};
use crate::bit_reverse::bit_reverse_copy;
use crate::butterfly::run_stages;
use crate::error::{check, DeviceOp};
use crate::normalize::normalize;
use crate::{Fft, FftError};

/// Value the debug mirror is filled with before a capture; records still
/// holding it afterwards were not touched by any work item.
pub const DEBUG_SENTINEL: Complex32 = Complex32::new(-1.0, -1.0);

/// How the stages that cross work-group boundaries are finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FinishStrategy {
    /// Read the buffer back once and run the remaining stages on the host.
    #[default]
    Host,
    /// Keep the data on the device: one single-stage dispatch per remaining
    /// stage, each followed by a barrier.
    DeviceResubmit,
}

/// Tuning for [`Fft::transform_hybrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HybridOptions {
    /// Block size fused into one work group. Power of two, at least 2, at
    /// most the accelerator's [`max_group_points`](Accelerator::max_group_points).
    /// Values above `n` are clamped to `n`.
    pub points_per_group: usize,
    pub finish: FinishStrategy,
    /// Fill the device debug buffer with [`DEBUG_SENTINEL`] before the first
    /// dispatch and read it back afterwards. See [`Fft::debug_records`].
    pub capture_debug: bool,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            points_per_group: 256,
            finish: FinishStrategy::Host,
            capture_debug: false,
        }
    }
}

impl HybridOptions {
    pub fn new(points_per_group: usize) -> Self {
        Self {
            points_per_group,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_finish(mut self, finish: FinishStrategy) -> Self {
        self.finish = finish;
        self
    }

    #[must_use]
    pub fn with_debug_capture(mut self, capture: bool) -> Self {
        self.capture_debug = capture;
        self
    }
}

impl<T> Fft<T>
where
    T: Float + FloatConst + AsPrimitive<f32>,
    f32: AsPrimitive<T>,
{
    /// Transforms `samples` with the early stages on `accel`.
    ///
    /// The bit-reversed input is uploaded together with the points-per-group
    /// and direction parameters, one [`Kernel::GroupStages`] dispatch runs the
    /// first `log2(points_per_group)` stages, and after a barrier the buffer
    /// is read back. If `n > points_per_group` the remaining stages are
    /// finished according to [`HybridOptions::finish`].
    ///
    /// Device arithmetic is `f32`; the result is converted back to `T` and
    /// normalised exactly like [`transform`](Self::transform).
    ///
    /// # Errors
    ///
    /// [`FftError::InvalidPointsPerGroup`] for a bad group size, and
    /// [`FftError::Device`] for the first device operation that fails. There
    /// is no retry and no partial result.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len()` differs from the transform length.
    pub fn transform_hybrid<A: Accelerator>(
        &mut self,
        samples: &[Complex<T>],
        accel: &mut A,
        options: HybridOptions,
    ) -> Result<&[Complex<T>], FftError> {
        assert_eq!(
            samples.len(),
            self.n,
            "transform_hybrid: expected {} samples, got {}",
            self.n,
            samples.len()
        );
        let max = accel.max_group_points();
        let requested = options.points_per_group;
        if requested < 2 || !requested.is_power_of_two() || requested > max {
            return Err(FftError::InvalidPointsPerGroup {
                points: requested,
                max,
            });
        }

        self.debug.clear();
        bit_reverse_copy(samples, &mut self.result, self.stages);
        if self.n < 2 {
            normalize(&mut self.result, self.scale, self.inverse);
            return Ok(&self.result);
        }

        let start = Instant::now();
        let points = requested.min(self.n);
        let fused = points.trailing_zeros() as usize;
        let global = self.n / 2;
        let local = points / 2;
        let direction: i32 = if self.inverse { -1 } else { 1 };
        log::debug!(
            "hybrid transform of {} points: {} stages fused in groups of {}, {} remaining ({:?} finish)",
            self.n,
            fused,
            points,
            self.stages - fused,
            options.finish
        );

        self.mirror.clear();
        self.mirror
            .extend(self.result.iter().map(|c| Complex32::new(c.re.as_(), c.im.as_())));

        check(DeviceOp::Write, accel.write(DeviceBuffer::Samples, bytemuck::cast_slice(&self.mirror)))?;
        check(
            DeviceOp::Write,
            accel.write(DeviceBuffer::PointsPerGroup, bytemuck::bytes_of(&(points as u32))),
        )?;
        check(DeviceOp::Write, accel.write(DeviceBuffer::Direction, bytemuck::bytes_of(&direction)))?;
        if options.capture_debug {
            self.debug.resize(self.n, DEBUG_SENTINEL);
            check(DeviceOp::Write, accel.write(DeviceBuffer::Debug, bytemuck::cast_slice(&self.debug)))?;
        } else {
            // A debug buffer left by an earlier capture, possibly for another n,
            // must not be written by this dispatch.
            accel.release(DeviceBuffer::Debug);
        }

        check(DeviceOp::Dispatch, accel.dispatch(Kernel::GroupStages, global, local))?;
        check(DeviceOp::Barrier, accel.barrier())?;
        check(DeviceOp::Read, accel.read(DeviceBuffer::Samples, bytemuck::cast_slice_mut(&mut self.mirror)))?;

        let remaining = fused..self.stages;
        if !remaining.is_empty() && options.finish == FinishStrategy::DeviceResubmit {
            for s in remaining.clone() {
                let m = 2u32 << s;
                check(DeviceOp::Write, accel.write(DeviceBuffer::StageSize, bytemuck::bytes_of(&m)))?;
                check(DeviceOp::Dispatch, accel.dispatch(Kernel::SingleStage, global, local))?;
                check(DeviceOp::Barrier, accel.barrier())?;
                log::trace!("device stage {s} (m = {m}) complete");
            }
            check(
                DeviceOp::Read,
                accel.read(DeviceBuffer::Samples, bytemuck::cast_slice_mut(&mut self.mirror)),
            )?;
        }

        if options.capture_debug {
            check(DeviceOp::Read, accel.read(DeviceBuffer::Debug, bytemuck::cast_slice_mut(&mut self.debug)))?;
            let touched = self.debug.iter().filter(|&&d| d != DEBUG_SENTINEL).count();
            log::trace!("debug buffer: {touched} of {} records written by the device", self.n);
        }

        for (dst, src) in self.result.iter_mut().zip(&self.mirror) {
            *dst = Complex::new(src.re.as_(), src.im.as_());
        }
        // The host finish works in T with the engine's own twiddle table, so
        // only the fused stages carry f32 rounding.
        if !remaining.is_empty() && options.finish == FinishStrategy::Host {
            run_stages(&mut self.result, &self.twiddles, remaining, self.mode);
        }
        normalize(&mut self.result, self.scale, self.inverse);

        log::debug!("hybrid transform of {} points took {:?}", self.n, start.elapsed());
        Ok(&self.result)
    }

    /// Debug records read back by the last hybrid transform, empty unless it
    /// ran with [`HybridOptions::capture_debug`]. Record `i` holds the last
    /// twiddle work item `i` applied; untouched records hold [`DEBUG_SENTINEL`].
    pub fn debug_records(&self) -> &[Complex32] {
        &self.debug
    }
}
