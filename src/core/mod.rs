//! Core primitives.
//!
//! Float vector math, the quantized wire codec, and state digests.
//! Nothing in here knows about pool rules.

pub mod vec2;
pub mod quant;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use quant::{POSITION_RANGE, VELOCITY_RANGE};
pub use hash::{StateDigest, StateHasher};
