//! Mantissa-reduction quantizer for `f32` arrays.
//!
//! A float is kept as sign, 8-bit exponent and the top `bits` mantissa bits of
//! its IEEE-754 magnitude, rounded half up. The packed word is
//! `sign << (8 + bits) | magnitude >> (23 - bits)`, so it fits in `9 + bits`
//! bits and orders the same way the floats do within each sign.
//!
//! The mantissa width for a whole array is the smallest one that brings every
//! element within the tolerance. At 23 bits the mapping is the identity.

pub const MAX_MANTISSA_BITS: u8 = 23;

const MAGNITUDE_MASK: u32 = 0x7fff_ffff;
const EXPONENT_MASK: u32 = 0x7f80_0000;

/// Round a non-negative IEEE-754 magnitude to `bits` mantissa bits.
fn round_magnitude(magnitude: u32, bits: u8) -> u32 {
    let drop = u32::from(MAX_MANTISSA_BITS - bits);
    if drop == 0 {
        return magnitude;
    }
    let low = (1u32 << drop) - 1;
    if magnitude >= EXPONENT_MASK {
        // inf / NaN: no carry into the exponent
        return magnitude & !low;
    }
    let rounded = (magnitude + (1 << (drop - 1))) & !low;
    if rounded >= EXPONENT_MASK {
        // Carry would overflow to infinity; stay finite.
        magnitude & !low
    } else {
        rounded
    }
}

/// Pack `value` into a `9 + bits` wide word. `bits` must be at most 23.
pub fn quantize(value: f32, bits: u8) -> u32 {
    let raw = value.to_bits();
    let sign = raw >> 31;
    let magnitude = round_magnitude(raw & MAGNITUDE_MASK, bits);
    (sign << (8 + u32::from(bits))) | (magnitude >> (MAX_MANTISSA_BITS - bits))
}

/// Inverse of [`quantize`] for the same `bits`.
pub fn dequantize(word: u32, bits: u8) -> f32 {
    let width = 8 + u32::from(bits);
    let sign = (word >> width) & 1;
    let magnitude = (word & ((1u32 << width) - 1)) << (MAX_MANTISSA_BITS - bits);
    f32::from_bits((sign << 31) | magnitude)
}

/// `true` if `value` survives a `bits`-wide round trip within `tolerance`.
/// Non-finite values must come back bit-exact.
pub fn round_trips(value: f32, bits: u8, tolerance: f32) -> bool {
    let decoded = dequantize(quantize(value, bits), bits);
    if decoded.to_bits() == value.to_bits() {
        return true;
    }
    value.is_finite()
        && decoded.is_finite()
        && (f64::from(decoded) - f64::from(value)).abs() <= f64::from(tolerance)
}

/// Smallest mantissa width that keeps every element of `values` within `tolerance`.
pub fn mantissa_bits_for(values: &[f32], tolerance: f32) -> u8 {
    let mut bits = 0u8;
    for &v in values {
        while bits < MAX_MANTISSA_BITS && !round_trips(v, bits, tolerance) {
            bits += 1;
        }
    }
    // An element accepted at a narrower width is not guaranteed to stay within
    // tolerance at a wider one, so confirm the final width for all of them.
    while bits < MAX_MANTISSA_BITS && !values.iter().all(|&v| round_trips(v, bits, tolerance)) {
        bits += 1;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_width_is_identity() {
        for v in [0.0f32, -0.0, 1.5, -3.25e-30, f32::MAX, f32::MIN_POSITIVE, f32::INFINITY] {
            let word = quantize(v, MAX_MANTISSA_BITS);
            assert_eq!(dequantize(word, MAX_MANTISSA_BITS).to_bits(), v.to_bits());
        }
        let nan = f32::from_bits(0x7fc0_0001);
        assert_eq!(
            dequantize(quantize(nan, MAX_MANTISSA_BITS), MAX_MANTISSA_BITS).to_bits(),
            nan.to_bits()
        );
    }

    #[test]
    fn word_width() {
        // 1.0 with 4 mantissa bits: exponent 127, mantissa 0 -> 127 << 4
        assert_eq!(quantize(1.0, 4), 127 << 4);
        assert_eq!(quantize(-1.0, 4), (1 << 12) | (127 << 4));
        assert_eq!(dequantize(quantize(-1.0, 4), 4), -1.0);
    }

    #[test]
    fn rounds_half_up_with_carry() {
        // 1.96875 = 1.11111b; at 2 mantissa bits it rounds up to 2.0
        assert_eq!(dequantize(quantize(1.968_75, 2), 2), 2.0);
        // 1.125 = 1.001b sits exactly halfway and rounds up to 1.25
        assert_eq!(dequantize(quantize(1.125, 2), 2), 1.25);
        // 1.0625 = 1.0001b is below halfway and rounds down to 1.0
        assert_eq!(dequantize(quantize(1.0625, 2), 2), 1.0);
    }

    #[test]
    fn no_overflow_to_infinity() {
        let q = dequantize(quantize(f32::MAX, 0), 0);
        assert!(q.is_finite());
    }

    #[test]
    fn monotonic_within_sign() {
        let mut values: Vec<f32> = (0..2000).map(|i| (i as f32 - 1000.0) * 0.37).collect();
        values.sort_by(f32::total_cmp);
        for bits in [0u8, 5, 12, 23] {
            let decoded: Vec<f32> = values.iter().map(|&v| dequantize(quantize(v, bits), bits)).collect();
            for w in decoded.windows(2) {
                assert!(w[0] <= w[1], "bits {bits}: {} > {}", w[0], w[1]);
            }
        }
    }

    #[test]
    fn width_selection() {
        assert_eq!(mantissa_bits_for(&[], 0.0), 0);
        assert_eq!(mantissa_bits_for(&[1.0, 2.0, 4.0], 0.0), 0);
        assert_eq!(mantissa_bits_for(&[1.0 + f32::EPSILON], 0.0), MAX_MANTISSA_BITS);
        let bits = mantissa_bits_for(&[0.1, 0.2, 0.3], 1e-3);
        assert!(bits < MAX_MANTISSA_BITS);
        for v in [0.1f32, 0.2, 0.3] {
            assert!(round_trips(v, bits, 1e-3));
        }
    }
}
