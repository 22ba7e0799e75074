// Device-side DIT butterfly kernels.
// Samples are `n` interleaved (re, im) f32 records, so record `i` lives at
// scalars `2i` and `2i + 1`. Scalar parameters come from one-element device
// buffers written by the engine before each dispatch. Twiddles are evaluated
// directly from the angle; nothing is accumulated across butterflies.
use cubecl::prelude::*;
use std::f32::consts::PI;

use crate::MAX_GROUP_POINTS;

// ── Intra-group stages ────────────────────────────────────────────────────────

/// Runs every butterfly stage that fits inside one work group.
///
/// Each work group of `points / 2` work items owns the contiguous block of
/// `points` records starting at `(ABSOLUTE_POS / (points / 2)) * points`.
/// The block is staged through shared memory and all stages with block size
/// `m <= points` run in a single launch, separated by `sync_cube()`:
///
/// ```text
/// hs = 1, 2, 4, … points/2
/// k  = local % hs
/// i  = (local / hs) * 2hs + k,   j = i + hs
/// W  = exp(-direction · iπ · k / hs)
/// s[i], s[j] = s[i] + W·s[j], s[i] - W·s[j]
/// ```
///
/// ### Launch parameters
/// ```text
/// CubeCount = n / points
/// CubeDim   = points / 2
/// ```
#[cube(launch)]
pub fn group_stages<F: Float>(
    data: &mut Array<F>,
    points_per_group: &Array<u32>,
    direction: &Array<i32>,
    debug: &mut Array<F>,
    #[comptime] capture_debug: bool,
) {
    let mut s_data = SharedMemory::<F>::new(MAX_GROUP_POINTS * 2);

    let points = usize::cast_from(points_per_group[0]);
    let half = points / 2;
    let sign = F::new(0.0) - F::cast_from(direction[0]);

    let tid = ABSOLUTE_POS;
    let local = tid % half;
    let base = (tid / half) * points;

    // Each work item stages two records: `local` and `local + half`.
    s_data[local * 2] = data[(base + local) * 2];
    s_data[local * 2 + 1] = data[(base + local) * 2 + 1];
    s_data[(local + half) * 2] = data[(base + local + half) * 2];
    s_data[(local + half) * 2 + 1] = data[(base + local + half) * 2 + 1];

    sync_cube();

    let mut hs = 1usize;
    while hs < points {
        let k = local % hs;
        let i = (local / hs) * (hs * 2) + k;
        let j = i + hs;

        let angle = sign * F::new(PI) * F::cast_from(k) / F::cast_from(hs);
        let cos_a = F::cos(angle);
        let sin_a = F::sin(angle);

        let ur = s_data[i * 2];
        let ui = s_data[i * 2 + 1];
        let vr = cos_a * s_data[j * 2] - sin_a * s_data[j * 2 + 1];
        let vi = sin_a * s_data[j * 2] + cos_a * s_data[j * 2 + 1];

        s_data[i * 2] = ur + vr;
        s_data[i * 2 + 1] = ui + vi;
        s_data[j * 2] = ur - vr;
        s_data[j * 2 + 1] = ui - vi;

        if capture_debug {
            debug[tid * 2] = cos_a;
            debug[tid * 2 + 1] = sin_a;
        }

        sync_cube();
        hs *= 2;
    }

    data[(base + local) * 2] = s_data[local * 2];
    data[(base + local) * 2 + 1] = s_data[local * 2 + 1];
    data[(base + local + half) * 2] = s_data[(local + half) * 2];
    data[(base + local + half) * 2 + 1] = s_data[(local + half) * 2 + 1];
}

// ── Cross-group stage ─────────────────────────────────────────────────────────

/// One butterfly stage over global memory, for block sizes larger than a
/// work group.
///
/// `n / 2` work items; item `tid` handles the pair
///
/// ```text
/// hs = m / 2
/// k  = tid % hs
/// i  = (tid / hs) * m + k,   j = i + hs
/// ```
///
/// Consecutive stages read each other's output, so the host must wait for
/// one launch to finish before issuing the next.
#[cube(launch)]
pub fn single_stage<F: Float>(
    data: &mut Array<F>,
    stage_size: &Array<u32>,
    direction: &Array<i32>,
    debug: &mut Array<F>,
    #[comptime] capture_debug: bool,
) {
    let tid = ABSOLUTE_POS;
    let n = data.len() / 2;
    if tid < n / 2 {
        let m = usize::cast_from(stage_size[0]);
        let hs = m / 2;
        let k = tid % hs;
        let i = (tid / hs) * m + k;
        let j = i + hs;

        let sign = F::new(0.0) - F::cast_from(direction[0]);
        let angle = sign * F::new(PI) * F::cast_from(k) / F::cast_from(hs);
        let cos_a = F::cos(angle);
        let sin_a = F::sin(angle);

        let ur = data[i * 2];
        let ui = data[i * 2 + 1];
        let vr = cos_a * data[j * 2] - sin_a * data[j * 2 + 1];
        let vi = sin_a * data[j * 2] + cos_a * data[j * 2 + 1];

        data[i * 2] = ur + vr;
        data[i * 2 + 1] = ui + vi;
        data[j * 2] = ur - vr;
        data[j * 2 + 1] = ui - vi;

        if capture_debug {
            debug[tid * 2] = cos_a;
            debug[tid * 2 + 1] = sin_a;
        }
    }
}
