use num_complex::Complex;
use num_traits::Float;

/// Applies the `1/n` scaling, which this crate places on the **forward** leg.
///
/// A forward transform divides every bin by `n`; an inverse transform leaves
/// the values as the butterflies produced them. A forward→inverse round trip
/// therefore reproduces the input, while a bare forward transform of a unit
/// impulse yields `1/n` in every bin.
pub fn normalize<T: Float>(buf: &mut [Complex<T>], n: T, inverse: bool) {
    if inverse {
        return;
    }
    for v in buf.iter_mut() {
        *v = *v / n;
    }
}
