/// Reverses the lowest `bits` bits of `x`.
///
/// Bits above `bits` are discarded, so the result is always below `1 << bits`.
#[inline]
pub fn reverse_bits(mut x: usize, bits: usize) -> usize {
    let mut r = 0usize;
    for _ in 0..bits {
        r = (r << 1) | (x & 1);
        x >>= 1;
    }
    r
}

/// Scatters `src` into `dest` in bit-reversed order: `dest[reverse_bits(i)] = src[i]`.
///
/// This puts the input in the order the decimation-in-time stages expect, so
/// every later stage only touches indices inside its own block.
///
/// # Panics
///
/// Panics if the slices differ in length or the length is not `1 << bits`.
pub fn bit_reverse_copy<T: Copy>(src: &[T], dest: &mut [T], bits: usize) {
    assert_eq!(src.len(), dest.len(), "bit_reverse_copy: length mismatch");
    assert_eq!(src.len(), 1 << bits, "bit_reverse_copy: length must be 2^bits");
    for (i, &v) in src.iter().enumerate() {
        dest[reverse_bits(i, bits)] = v;
    }
}
