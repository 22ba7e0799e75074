pub mod accelerator;
pub mod bit_reverse;
pub mod butterfly;
pub mod error;
pub mod fft;
pub mod hybrid;
pub(crate) mod kernels;
pub mod normalize;
pub mod spectrum;
pub mod twiddles;

pub use error::{DeviceError, DeviceOp, DeviceStatus, FftError};
pub use fft::Fft;
pub use hybrid::{FinishStrategy, HybridOptions};
pub use twiddles::TwiddleMode;

use num_complex::Complex64;

// The general advice for WebGPU is to choose a workgroup size of 64
// Common sizes are 32, 64, 128, 256, or 512 threads per workgroup.
// Apple Metal supports a maximum workgroup size of 1024 threads.
pub(crate) const WORKGROUP_SIZE: u32 = 1024;

/// Largest points-per-group a CubeCL device fuses into one work group: one
/// work item per butterfly, and `2 * MAX_GROUP_POINTS` f32 scalars (16 KiB)
/// of shared memory per group.
pub const MAX_GROUP_POINTS: usize = 2 * WORKGROUP_SIZE as usize;

#[cfg(feature = "wgpu")]
type Runtime = cubecl::wgpu::WgpuRuntime;

#[cfg(all(feature = "cuda", not(feature = "wgpu")))]
type Runtime = cubecl::cuda::CudaRuntime;

/// Forward transform of `samples` on the host, scaled by `1/n`.
///
/// # Panics
///
/// Panics if `samples.len()` is not a power of two.
///
/// # Example
///
/// ```
/// use hybrid_fft::fft;
/// use num_complex::Complex64;
/// let spectrum = fft(&[Complex64::new(1.0, 0.0); 4]);
/// assert_eq!(spectrum[0], Complex64::new(1.0, 0.0));
/// ```
#[must_use]
pub fn fft(samples: &[Complex64]) -> Vec<Complex64> {
    Fft::new(samples.len(), false).transform(samples).to_vec()
}

/// Inverse transform of `spectrum` on the host, unscaled.
///
/// `ifft(&fft(x))` reproduces `x`.
///
/// # Panics
///
/// Panics if `spectrum.len()` is not a power of two.
#[must_use]
pub fn ifft(spectrum: &[Complex64]) -> Vec<Complex64> {
    Fft::new(spectrum.len(), true).transform(spectrum).to_vec()
}

/// Forward transform of `samples` on the default GPU runtime (wgpu, or CUDA
/// when only the `cuda` feature is enabled).
///
/// # Errors
///
/// See [`Fft::transform_hybrid`].
///
/// # Example
///
/// ```no_run
/// use hybrid_fft::{hybrid_fft, HybridOptions};
/// use num_complex::Complex32;
/// let samples = vec![Complex32::new(1.0, 0.0); 4096];
/// let spectrum = hybrid_fft(&samples, HybridOptions::new(512))?;
/// # Ok::<(), hybrid_fft::FftError>(())
/// ```
#[cfg(any(feature = "wgpu", feature = "cuda"))]
pub fn hybrid_fft(
    samples: &[num_complex::Complex32],
    options: HybridOptions,
) -> Result<Vec<num_complex::Complex32>, FftError> {
    let mut device = accelerator::CubeAccelerator::<Runtime>::new(Default::default());
    let mut fft = Fft::<f32>::try_new(samples.len(), false)?;
    Ok(fft.transform_hybrid(samples, &mut device, options)?.to_vec())
}
