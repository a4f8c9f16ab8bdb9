//! State Digest for Replica Verification
//!
//! Hashes the synchronised game state plus the exact bit patterns of every
//! ball position and velocity. Two peers that decoded the same packets and
//! ran the same steps must produce the same digest.

use sha2::{Sha256, Digest};
use super::vec2::Vec2;

/// Digest output type (256 bits / 32 bytes)
pub type StateDigest = [u8; 32];

/// Deterministic hasher for table state.
///
/// Wraps SHA-256. Order of updates is part of the digest.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for table state.
    pub fn for_table_state() -> Self {
        Self::new(b"EIGHTBALL_TABLE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u16 value (little-endian).
    #[inline]
    pub fn update_u16(&mut self, value: u16) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with the raw bit pattern of an f32.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f32(value.x);
        self.update_f32(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> StateDigest {
        self.hasher.finalize().into()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let make = || {
            let mut h = StateHasher::for_table_state();
            h.update_u16(42);
            h.update_vec2(Vec2::new(0.25, -0.5));
            h.update_bool(true);
            h.finalize()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_hash_order_matters() {
        let a = {
            let mut h = StateHasher::new(b"test");
            h.update_u16(1);
            h.update_u16(2);
            h.finalize()
        };
        let b = {
            let mut h = StateHasher::new(b"test");
            h.update_u16(2);
            h.update_u16(1);
            h.finalize()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_bit_pattern_sensitivity() {
        // 0.0 and -0.0 compare equal but must not hash equal
        let pos = {
            let mut h = StateHasher::for_table_state();
            h.update_f32(0.0);
            h.finalize()
        };
        let neg = {
            let mut h = StateHasher::for_table_state();
            h.update_f32(-0.0);
            h.finalize()
        };
        assert_ne!(pos, neg);
    }
}
