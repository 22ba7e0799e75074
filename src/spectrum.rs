//! Post-processing of a transformed frame into quantities used for sound
//! analysis: per-bin intensity and phase, power, bin frequencies and peaks.

use num_complex::Complex;
use num_traits::{Float, FloatConst, NumCast};

/// Magnitude `sqrt(re² + im²)` of a spectrum bin.
///
/// ```
/// # use hybrid_fft::spectrum::intensity;
/// # use num_complex::Complex64;
/// assert_eq!(intensity(Complex64::new(3.0, 4.0)), 5.0);
/// ```
#[inline]
pub fn intensity<T: Float>(c: Complex<T>) -> T {
    c.norm()
}

/// Angle `atan2(im, re)` of a spectrum bin, in `(-π, π]`.
///
/// The origin (including signed zeros) has phase `0`.
///
/// ```
/// # use hybrid_fft::spectrum::phase;
/// # use num_complex::Complex64;
/// assert_eq!(phase(Complex64::new(0.0, 0.0)), 0.0);
/// assert_eq!(phase(Complex64::new(-0.0, -0.0)), 0.0);
/// ```
#[inline]
pub fn phase<T: Float>(c: Complex<T>) -> T {
    if c.re == T::zero() && c.im == T::zero() {
        return T::zero();
    }
    c.im.atan2(c.re)
}

/// [`intensity`] of every bin.
pub fn intensities<T: Float>(spectrum: &[Complex<T>]) -> Vec<T> {
    spectrum.iter().map(|&c| intensity(c)).collect()
}

/// [`phase`] of every bin.
pub fn phases<T: Float>(spectrum: &[Complex<T>]) -> Vec<T> {
    spectrum.iter().map(|&c| phase(c)).collect()
}

/// Power `|X[k]|²` of every bin.
///
/// The forward transform already carries the `1/n` factor, so no further
/// normalisation is applied here.
pub fn power_spectrum<T: Float>(spectrum: &[Complex<T>]) -> Vec<T> {
    spectrum.iter().map(|c| c.norm_sqr()).collect()
}

/// Frequency in Hz of `bin` in an `n`-point spectrum sampled at
/// `sample_rate`. Bins past `n / 2` wrap to negative frequencies, so
/// `bin_frequency(n - 1, n, fs)` is `-fs / n`.
///
/// ```
/// # use hybrid_fft::spectrum::bin_frequency;
/// assert_eq!(bin_frequency(64, 1024, 16_000.0f32), 1_000.0);
/// assert_eq!(bin_frequency(1023, 1024, 1024.0f64), -1.0);
/// ```
#[inline]
pub fn bin_frequency<T: Float>(bin: usize, n: usize, sample_rate: T) -> T {
    let resolution = sample_rate / as_float::<T>(n);
    if bin <= n / 2 {
        as_float::<T>(bin) * resolution
    } else {
        -(as_float::<T>(n - bin) * resolution)
    }
}

/// [`bin_frequency`] of every bin of an `n`-point spectrum, in transform
/// order: DC, the positive frequencies up to Nyquist, then the negative ones.
#[must_use]
pub fn bin_frequencies<T: Float>(n: usize, sample_rate: T) -> Vec<T> {
    (0..n).map(|k| bin_frequency(k, n, sample_rate)).collect()
}

/// A local maximum of the power spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak<T> {
    pub bin: usize,
    pub frequency: T,
    /// `|X[bin]|²`.
    pub power: T,
}

/// Peaks in the non-negative half of `spectrum` whose power exceeds
/// `threshold`, in ascending frequency.
///
/// A bin is a peak when its power is strictly greater than both neighbours.
/// DC and Nyquist have only one neighbour in that half and are never
/// reported. Intended for spectra of real frames, whose negative half
/// mirrors the positive one.
///
/// ```
/// # use hybrid_fft::spectrum::{generate_sine_wave, spectral_peaks};
/// # use hybrid_fft::Fft;
/// let frame = generate_sine_wave(1_000.0f32, 16_000.0, 256);
/// let spectrum = Fft::<f32>::new(256, false).transform(&frame).to_vec();
/// let peaks = spectral_peaks(&spectrum, 16_000.0, 0.01);
/// assert_eq!(peaks.len(), 1);
/// assert_eq!(peaks[0].bin, 16);
/// ```
#[must_use]
pub fn spectral_peaks<T: Float>(spectrum: &[Complex<T>], sample_rate: T, threshold: T) -> Vec<Peak<T>> {
    let n = spectrum.len();
    let half = &spectrum[..(n / 2 + 1).min(n)];
    half.windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let (before, power, after) = (w[0].norm_sqr(), w[1].norm_sqr(), w[2].norm_sqr());
            (power > before && power > after && power > threshold).then(|| Peak {
                bin: i + 1,
                frequency: bin_frequency(i + 1, n, sample_rate),
                power,
            })
        })
        .collect()
}

// Primitive floats represent every usize, rounding where needed.
#[inline]
fn as_float<T: Float>(v: usize) -> T {
    <T as NumCast>::from(v).unwrap_or_else(T::infinity)
}

/// `n` samples of a unit sine at `frequency` Hz sampled at `sample_rate`,
/// as complex values with zero imaginary part.
#[must_use]
pub fn generate_sine_wave<T: Float + FloatConst>(frequency: T, sample_rate: T, n: usize) -> Vec<Complex<T>> {
    let step = T::TAU() * frequency / sample_rate;
    let mut t = T::zero();
    let mut samples = Vec::with_capacity(n);
    for _ in 0..n {
        samples.push(Complex::new((step * t).sin(), T::zero()));
        t = t + T::one();
    }
    samples
}
