use std::time::Instant;

use num_complex::{Complex, Complex32};
use num_traits::{Float, FloatConst};

use crate::bit_reverse::bit_reverse_copy;
use crate::butterfly::run_stages;
use crate::normalize::normalize;
use crate::twiddles::{stage_count, TwiddleMode, TwiddleTable};
use crate::FftError;

/// A radix-2 decimation-in-time transform of one fixed length and direction.
///
/// Construction computes the stage count and the twiddle table once; every
/// call to [`transform`](Self::transform) or
/// [`transform_hybrid`](Self::transform_hybrid) then reuses the engine's own
/// work buffer, overwriting the previous result.
///
/// The forward transform is scaled by `1/n`; the inverse is not.
///
/// # Example
///
/// ```
/// use hybrid_fft::Fft;
/// use num_complex::Complex64;
///
/// let mut fft = Fft::<f64>::new(4, false);
/// let impulse = [
///     Complex64::new(1.0, 0.0),
///     Complex64::new(0.0, 0.0),
///     Complex64::new(0.0, 0.0),
///     Complex64::new(0.0, 0.0),
/// ];
/// let spectrum = fft.transform(&impulse);
/// assert!(spectrum.iter().all(|c| (c - Complex64::new(0.25, 0.0)).norm() < 1e-12));
/// ```
#[derive(Clone, Debug)]
pub struct Fft<T = f64> {
    pub(crate) n: usize,
    pub(crate) stages: usize,
    pub(crate) inverse: bool,
    pub(crate) scale: T,
    pub(crate) twiddles: TwiddleTable<T>,
    pub(crate) mode: TwiddleMode,
    pub(crate) result: Vec<Complex<T>>,
    // Host-visible mirrors of the device buffers, only used by the hybrid path.
    pub(crate) mirror: Vec<Complex32>,
    pub(crate) debug: Vec<Complex32>,
}

impl<T: Float + FloatConst> Fft<T> {
    /// Builds a transform of length `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two. Use [`try_new`](Self::try_new) to
    /// get the error instead.
    pub fn new(n: usize, inverse: bool) -> Self {
        match Self::try_new(n, inverse) {
            Ok(fft) => fft,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(n: usize, inverse: bool) -> Result<Self, FftError> {
        let stages = stage_count(n)?;

        let two = T::one() + T::one();
        let scale = (0..stages).fold(T::one(), |acc, _| acc * two);

        Ok(Self {
            n,
            stages,
            inverse,
            scale,
            twiddles: TwiddleTable::new(stages, inverse),
            mode: TwiddleMode::default(),
            result: vec![Complex::new(T::zero(), T::zero()); n],
            mirror: Vec::new(),
            debug: Vec::new(),
        })
    }

    /// Selects how host-side butterflies obtain their twiddle powers.
    #[must_use]
    pub fn with_twiddle_mode(mut self, mode: TwiddleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Transform length `n`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Number of butterfly stages, `log2(n)`.
    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn twiddle_mode(&self) -> TwiddleMode {
        self.mode
    }

    pub fn twiddles(&self) -> &TwiddleTable<T> {
        &self.twiddles
    }

    /// Transforms `samples` entirely on the host.
    ///
    /// The returned slice borrows the engine's work buffer and is overwritten
    /// by the next call.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len()` differs from the transform length.
    pub fn transform(&mut self, samples: &[Complex<T>]) -> &[Complex<T>] {
        assert_eq!(
            samples.len(),
            self.n,
            "transform: expected {} samples, got {}",
            self.n,
            samples.len()
        );

        let start = Instant::now();
        bit_reverse_copy(samples, &mut self.result, self.stages);
        run_stages(&mut self.result, &self.twiddles, 0..self.stages, self.mode);
        normalize(&mut self.result, self.scale, self.inverse);

        log::debug!(
            "host {} transform of {} points ({} stages, {:?} twiddles) took {:?}",
            if self.inverse { "inverse" } else { "forward" },
            self.n,
            self.stages,
            self.mode,
            start.elapsed()
        );
        &self.result
    }
}
