use num_complex::Complex;
use num_traits::{Float, FloatConst};

use crate::FftError;

/// How the butterfly loop obtains `w^j` for the `j`-th butterfly of a group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TwiddleMode {
    /// Running product `w <- w * root`, reset to `1` at each group start.
    /// Rounding error compounds over the `m/2` multiplications of a group.
    #[default]
    Incremental,
    /// `w = exp(i * angle * j)` evaluated per butterfly. Bounded error, one
    /// `sin_cos` per butterfly.
    Direct,
}

/// Number of radix-2 stages for a transform of length `n`.
///
/// Shifts `n` right until it reaches one, rejecting any odd intermediate
/// value, so a non-power-of-two never truncates to a shorter transform.
///
/// ```
/// # use hybrid_fft::twiddles::stage_count;
/// assert_eq!(stage_count(1024).unwrap(), 10);
/// assert!(stage_count(100).is_err());
/// ```
pub fn stage_count(n: usize) -> Result<usize, FftError> {
    if n == 0 {
        return Err(FftError::NotPowerOfTwo(n));
    }
    let mut stages = 0;
    let mut i = n;
    while i > 1 {
        if i & 1 != 0 {
            return Err(FftError::NotPowerOfTwo(n));
        }
        i >>= 1;
        stages += 1;
    }
    Ok(stages)
}

/// One primitive root of unity per butterfly stage.
///
/// Stage `s` works on blocks of `m = 2^(s+1)` points and rotates the lower
/// half of each block by powers of `exp(∓ 2πi / m)`: negative angle for the
/// forward transform, positive for the inverse.
#[derive(Clone, Debug)]
pub struct TwiddleTable<T> {
    angles: Vec<T>,
    roots: Vec<Complex<T>>,
}

impl<T: Float + FloatConst> TwiddleTable<T> {
    pub fn new(stages: usize, inverse: bool) -> Self {
        let two = T::one() + T::one();
        let sign = if inverse { T::one() } else { -T::one() };

        let mut angles = Vec::with_capacity(stages);
        let mut m = T::one();
        for _ in 0..stages {
            m = m * two;
            angles.push(sign * T::TAU() / m);
        }
        let roots = angles.iter().map(|&a| Complex::cis(a)).collect();

        Self { angles, roots }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Root of unity for stage `s`.
    #[inline]
    pub fn root(&self, s: usize) -> Complex<T> {
        self.roots[s]
    }

    /// Rotation angle of [`root`](Self::root) for stage `s`, in radians.
    #[inline]
    pub fn angle(&self, s: usize) -> T {
        self.angles[s]
    }
}
