//! Quantized Float Codec
//!
//! Fixed-point encoding of `f32` values into 16-bit unsigned samples.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  code = round((value / range) * 32767 + 32767)              │
//! │  value = ((code - 32767) / 32767) * range                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │   -range  ──────────────  0  ──────────────  +range         │
//! │     0                   32767                65534          │
//! │                                                             │
//! │  Precision: range / 32767 per code step                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values outside `[-range, range]` saturate at `0` / `65535` rather than
//! wrapping through the unsigned cast. NaN encodes as the zero code.

use super::vec2::Vec2;

/// Half-span of the code space (signed short max).
pub const CODE_HALF: f32 = 32767.0;

/// Code representing exactly `0.0`.
pub const CODE_ZERO: u16 = 32767;

/// Range used for every ball position coordinate (metres).
pub const POSITION_RANGE: f32 = 2.5;

/// Range used for cue velocity and cue angular velocity components.
pub const VELOCITY_RANGE: f32 = 50.0;

/// Encode a scalar in `[-range, range]` into a 16-bit code.
#[inline]
pub fn encode(value: f32, range: f32) -> u16 {
    if value.is_nan() {
        return CODE_ZERO;
    }
    let scaled = ((value / range) * CODE_HALF + CODE_HALF).round();
    // `as` saturates for floats, which is the documented behaviour.
    scaled as u16
}

/// Decode a 16-bit code back into `[-range, range]`.
#[inline]
pub fn decode(code: u16, range: f32) -> f32 {
    ((code as f32 - CODE_HALF) / CODE_HALF) * range
}

/// Encode both components of a vector.
#[inline]
pub fn encode_vec2(value: Vec2, range: f32) -> [u16; 2] {
    [encode(value.x, range), encode(value.y, range)]
}

/// Decode two codes into a vector.
#[inline]
pub fn decode_vec2(codes: [u16; 2], range: f32) -> Vec2 {
    Vec2::new(decode(codes[0], range), decode(codes[1], range))
}

/// Worst-case absolute error of one encode/decode pass for in-range values.
#[inline]
pub fn precision(range: f32) -> f32 {
    range / CODE_HALF
}

/// Snap a value onto the code grid (what a receiver will see).
#[inline]
pub fn quantize(value: f32, range: f32) -> f32 {
    decode(encode(value, range), range)
}

/// Snap a vector onto the code grid.
#[inline]
pub fn quantize_vec2(value: Vec2, range: f32) -> Vec2 {
    decode_vec2(encode_vec2(value, range), range)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_and_extremes() {
        assert_eq!(encode(0.0, POSITION_RANGE), CODE_ZERO);
        assert_eq!(decode(CODE_ZERO, POSITION_RANGE), 0.0);

        assert_eq!(encode(POSITION_RANGE, POSITION_RANGE), 65534);
        assert_eq!(encode(-POSITION_RANGE, POSITION_RANGE), 0);
        assert_eq!(decode(0, POSITION_RANGE), -POSITION_RANGE);
        assert_eq!(decode(65534, POSITION_RANGE), POSITION_RANGE);
    }

    #[test]
    fn test_out_of_range_saturates() {
        assert_eq!(encode(1000.0, VELOCITY_RANGE), u16::MAX);
        assert_eq!(encode(-1000.0, VELOCITY_RANGE), 0);
        assert_eq!(encode(f32::INFINITY, VELOCITY_RANGE), u16::MAX);
        assert_eq!(encode(f32::NEG_INFINITY, VELOCITY_RANGE), 0);
        assert_eq!(encode(f32::NAN, VELOCITY_RANGE), CODE_ZERO);
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let v = Vec2::new(0.123_456, -0.456_789);
        let once = quantize_vec2(v, POSITION_RANGE);
        let twice = quantize_vec2(once, POSITION_RANGE);
        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_precision(v in -POSITION_RANGE..=POSITION_RANGE) {
            let back = decode(encode(v, POSITION_RANGE), POSITION_RANGE);
            prop_assert!((back - v).abs() <= precision(POSITION_RANGE));
        }

        #[test]
        fn prop_velocity_round_trip(x in -VELOCITY_RANGE..=VELOCITY_RANGE, y in -VELOCITY_RANGE..=VELOCITY_RANGE) {
            let back = decode_vec2(encode_vec2(Vec2::new(x, y), VELOCITY_RANGE), VELOCITY_RANGE);
            prop_assert!((back.x - x).abs() <= precision(VELOCITY_RANGE));
            prop_assert!((back.y - y).abs() <= precision(VELOCITY_RANGE));
        }

        #[test]
        fn prop_encode_is_monotonic(a in -60.0f32..60.0, b in -60.0f32..60.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(encode(lo, VELOCITY_RANGE) <= encode(hi, VELOCITY_RANGE));
        }
    }
}
