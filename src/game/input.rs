//! Shot Input and Cue Placement
//!
//! Local-only input. A `ShotInput` seeds the cue ball once per shot and is
//! never serialised; the packet carries the resulting cue velocity instead.

use serde::{Serialize, Deserialize};

use crate::core::quant::VELOCITY_RANGE;
use crate::core::vec2::Vec2;
use crate::game::table::{BALL_RADIUS, KITCHEN_MAX_X, MAX_SHOT_SPEED, TABLE_HEIGHT, TABLE_WIDTH};

// =============================================================================
// SHOT INPUT
// =============================================================================

/// A single strike of the cue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotInput {
    /// Unit aim direction on the table plane.
    pub aim: Vec2,
    /// Cue ball linear velocity after the strike.
    pub velocity: Vec2,
    /// Cue ball angular velocity after the strike.
    pub spin: Vec2,
}

impl ShotInput {
    /// Build a shot from an aim direction, a strike power in `[0, 1]` and the
    /// vertical contact offset on the cue ball (metres above centre;
    /// positive = top spin, negative = draw).
    pub fn strike(aim: Vec2, power: f32, contact_offset: f32) -> Self {
        let aim = aim.normalize_or(Vec2::RIGHT);
        let power = if power.is_finite() { power.clamp(0.0, 1.0) } else { 0.0 };
        let offset = if contact_offset.is_finite() {
            contact_offset.clamp(-BALL_RADIUS, BALL_RADIUS)
        } else {
            0.0
        };

        let velocity = aim * (power * MAX_SHOT_SPEED);
        let spin = velocity * (offset / BALL_RADIUS);

        Self { aim, velocity, spin }
    }

    /// Shot with explicit velocities (scripted input, tests).
    pub fn raw(velocity: Vec2, spin: Vec2) -> Self {
        Self {
            aim: velocity.normalize_or(Vec2::RIGHT),
            velocity,
            spin,
        }
    }

    /// Finite and representable on the wire without saturating.
    pub fn is_valid(&self) -> bool {
        let within = |v: Vec2| v.is_finite() && v.x.abs() <= VELOCITY_RANGE && v.y.abs() <= VELOCITY_RANGE;
        within(self.velocity) && within(self.spin)
    }
}

// =============================================================================
// REPOSITIONING
// =============================================================================

/// Cue ball placement grant (ball in hand).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reposition {
    /// Largest X the cue ball may be placed at.
    pub max_x: f32,
}

impl Reposition {
    /// Anywhere on the table (after a foul).
    pub const fn anywhere() -> Self {
        Self { max_x: TABLE_WIDTH }
    }

    /// Behind the kitchen line (the break).
    pub const fn kitchen() -> Self {
        Self { max_x: KITCHEN_MAX_X }
    }

    /// Clamp a requested placement into the allowed area.
    pub fn clamp(&self, requested: Vec2) -> Vec2 {
        let requested = if requested.is_finite() { requested } else { Vec2::ZERO };
        Vec2::new(
            requested.x.clamp(-TABLE_WIDTH, self.max_x),
            requested.y.clamp(-TABLE_HEIGHT, TABLE_HEIGHT),
        )
    }

    /// Restricted to the kitchen?
    pub fn is_kitchen(&self) -> bool {
        self.max_x < TABLE_WIDTH
    }
}

// =============================================================================
// TESTS
// =============================================================================
