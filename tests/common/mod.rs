//! Shared test helpers compiled into every integration-test binary.
//! Items may not all be used in every binary, so dead_code is suppressed.
#![allow(dead_code)]

use hybrid_fft::accelerator::{Accelerator, DeviceBuffer, Kernel};
use hybrid_fft::DeviceStatus;
use num_complex::Complex64;
use rand::distributions::Uniform;
use rand::prelude::*;

/// Tolerance for host `f64` results.
pub const EPSILON: f64 = 1e-9;

/// Tolerance for results that went through the `f32` device mirror.
pub const DEVICE_EPSILON: f64 = 1e-5;

pub fn assert_slice_approx(actual: &[Complex64], expected: &[Complex64], epsilon: f64, label: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch ({} vs {})",
        label,
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).norm() <= epsilon,
            "{}[{}]: got {:.9}, expected {:.9}  (diff {:.2e})",
            label,
            i,
            a,
            e,
            (a - e).norm(),
        );
    }
}

/// Component-wise relative error check, `|a - e| <= epsilon * max(1, |e|)`.
pub fn assert_slice_relative(actual: &[Complex64], expected: &[Complex64], epsilon: f64, label: &str) {
    assert_eq!(actual.len(), expected.len(), "{label}: length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        for (part, x, y) in [("re", a.re, e.re), ("im", a.im, e.im)] {
            let bound = epsilon * y.abs().max(1.0);
            assert!(
                (x - y).abs() <= bound,
                "{label}[{i}].{part}: got {x:.9}, expected {y:.9}  (bound {bound:.2e})"
            );
        }
    }
}

/// Uniform random complex signal with components in `[-1, 1)`.
pub fn random_signal(n: usize, seed: u64) -> Vec<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1.0, 1.0);
    (0..n)
        .map(|_| Complex64::new(dist.sample(&mut rng), dist.sample(&mut rng)))
        .collect()
}

/// O(n²) DFT with the same sign and `1/n` conventions as the forward engine.
pub fn reference_dft(x: &[Complex64]) -> Vec<Complex64> {
    let n = x.len();
    // roots[r] = exp(-2πi r / n); k·t is reduced mod n so every angle is exact.
    let roots: Vec<_> = (0..n)
        .map(|r| Complex64::cis(-std::f64::consts::TAU * r as f64 / n as f64))
        .collect();
    (0..n)
        .map(|k| {
            let sum = x
                .iter()
                .enumerate()
                .fold(Complex64::new(0.0, 0.0), |acc, (t, &v)| acc + v * roots[(k * t) % n]);
            sum / n as f64
        })
        .collect()
}

/// Forwards to an inner accelerator, failing the `fail_at`-th call (0-based)
/// of the selected operation with `status`.
pub struct Faulty<A> {
    pub inner: A,
    pub op: hybrid_fft::DeviceOp,
    pub fail_at: usize,
    pub status: DeviceStatus,
    seen: usize,
}

impl<A> Faulty<A> {
    pub fn new(inner: A, op: hybrid_fft::DeviceOp, fail_at: usize, status: DeviceStatus) -> Self {
        Self {
            inner,
            op,
            fail_at,
            status,
            seen: 0,
        }
    }

    fn trip(&mut self, op: hybrid_fft::DeviceOp) -> Result<(), DeviceStatus> {
        if op != self.op {
            return Ok(());
        }
        let call = self.seen;
        self.seen += 1;
        if call == self.fail_at {
            Err(self.status.clone())
        } else {
            Ok(())
        }
    }
}

impl<A: Accelerator> Accelerator for Faulty<A> {
    fn write(&mut self, buffer: DeviceBuffer, data: &[u8]) -> Result<(), DeviceStatus> {
        self.trip(hybrid_fft::DeviceOp::Write)?;
        self.inner.write(buffer, data)
    }

    fn dispatch(&mut self, kernel: Kernel, global_size: usize, local_size: usize) -> Result<(), DeviceStatus> {
        self.trip(hybrid_fft::DeviceOp::Dispatch)?;
        self.inner.dispatch(kernel, global_size, local_size)
    }

    fn barrier(&mut self) -> Result<(), DeviceStatus> {
        self.trip(hybrid_fft::DeviceOp::Barrier)?;
        self.inner.barrier()
    }

    fn read(&mut self, buffer: DeviceBuffer, out: &mut [u8]) -> Result<(), DeviceStatus> {
        self.trip(hybrid_fft::DeviceOp::Read)?;
        self.inner.read(buffer, out)
    }

    fn release(&mut self, buffer: DeviceBuffer) {
        self.inner.release(buffer)
    }

    fn max_group_points(&self) -> usize {
        self.inner.max_group_points()
    }
}
