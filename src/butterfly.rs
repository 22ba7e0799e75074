// Host-side decimation-in-time butterfly stages.
// Shared by the host engine (all stages) and the hybrid engine's host finish
// (the stages that cross device work-group boundaries).
use std::ops::Range;

use num_complex::Complex;
use num_traits::{Float, FloatConst};

use crate::twiddles::{TwiddleMode, TwiddleTable};

/// Runs butterfly stages `stages` in place over a bit-reversed buffer.
///
/// Stage `s` combines pairs `(k + j, k + j + m/2)` of every block of
/// `m = 2^(s+1)` points:
///
/// ```text
/// t = w^j · buf[k + j + m/2]
/// u = buf[k + j]
/// buf[k + j]       = u + t
/// buf[k + j + m/2] = u - t
/// ```
///
/// `stages` must lie inside `0..twiddles.len()` and `buf.len()` must be
/// `2^twiddles.len()`.
pub fn run_stages<T: Float + FloatConst>(
    buf: &mut [Complex<T>],
    twiddles: &TwiddleTable<T>,
    stages: Range<usize>,
    mode: TwiddleMode,
) {
    debug_assert_eq!(buf.len(), 1 << twiddles.len());
    for s in stages {
        let half = 1usize << s;
        let m = half << 1;
        for block in buf.chunks_exact_mut(m) {
            let (lo, hi) = block.split_at_mut(half);
            match mode {
                TwiddleMode::Incremental => butterflies_incremental(lo, hi, twiddles.root(s)),
                TwiddleMode::Direct => butterflies_direct(lo, hi, twiddles.angle(s)),
            }
        }
    }
}

#[inline]
fn butterflies_incremental<T: Float>(lo: &mut [Complex<T>], hi: &mut [Complex<T>], root: Complex<T>) {
    let mut w = Complex::new(T::one(), T::zero());
    for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
        let t = w * *b;
        let u = *a;
        *a = u + t;
        *b = u - t;
        w = w * root;
    }
}

#[inline]
fn butterflies_direct<T: Float>(lo: &mut [Complex<T>], hi: &mut [Complex<T>], angle: T) {
    let mut j = T::zero();
    for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
        let t = Complex::cis(angle * j) * *b;
        let u = *a;
        *a = u + t;
        *b = u - t;
        j = j + T::one();
    }
}
