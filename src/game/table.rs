//! Table Geometry and Rack
//!
//! Physical constants of the table (metres, seconds) and the break layout.
//! The table is centred on the origin; `TABLE_WIDTH` and `TABLE_HEIGHT` are
//! the extents of the ball-centre range from the centre line to each rail.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::state::{BallId, BALL_COUNT};

// =============================================================================
// SIMULATION CONSTANTS
// =============================================================================

/// Seconds advanced by one physics step.
pub const FIXED_STEP: f32 = 0.0125;

/// Largest frame delta consumed per frame (8 steps).
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Ball-centre range along X: `[-TABLE_WIDTH, TABLE_WIDTH]`.
pub const TABLE_WIDTH: f32 = 1.0668;

/// Ball-centre range along Y: `[-TABLE_HEIGHT, TABLE_HEIGHT]`.
pub const TABLE_HEIGHT: f32 = 0.6096;

/// Ball diameter.
pub const BALL_DIAMETER: f32 = 0.06;

/// Ball radius.
pub const BALL_RADIUS: f32 = 0.03;

/// Ball diameter squared (contact test).
pub const BALL_DIAMETER_SQ: f32 = 0.0036;

/// Pocket mouth size, excluding the ball radius.
pub const POCKET_RADIUS: f32 = 0.09;

/// How far past the pocket line a ball travels before it drops.
pub const POCKET_DEPTH: f32 = 0.04;

/// 1/sqrt(2): normalises a (±1, ±1) line normal (corner pockets).
pub const K_1OR2: f32 = 0.707_106_77;

/// 1/sqrt(5): normalises a (±2, ±1) line normal (middle pockets).
pub const K_1OR5: f32 = 0.447_213_6;

/// Squared speed at or below which a ball is considered stopped.
pub const MIN_VELOCITY_SQ: f32 = 0.000_056_25;

/// Velocity multiplier applied every step.
pub const FRICTION: f32 = 0.99;

/// Cue angular velocity multiplier applied every step.
pub const SPIN_DECAY: f32 = 0.96;

/// Fastest shot a full-power strike produces (m/s).
pub const MAX_SHOT_SPEED: f32 = 14.0;

/// Right edge of the kitchen (break repositioning area).
pub const KITCHEN_MAX_X: f32 = -TABLE_WIDTH * 0.5;

// =============================================================================
// RACK
// =============================================================================

/// Triangle order, apex first, row by row. Eight ball sits in the middle of
/// the third row; the back corners hold one ball from each group.
const RACK_ORDER: [BallId; 15] = [
    2,
    9, 3,
    10, 1, 4,
    11, 5, 12, 6,
    8, 13, 7, 14, 15,
];

/// Break positions for all sixteen balls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    /// Position of each ball id at the break.
    pub positions: [Vec2; BALL_COUNT],
}

impl Rack {
    /// Standard triangle: cue ball on the kitchen line, apex on the foot spot.
    pub fn standard() -> Self {
        let mut positions = [Vec2::ZERO; BALL_COUNT];
        positions[0] = Vec2::new(KITCHEN_MAX_X, 0.0);

        let apex = Vec2::new(TABLE_WIDTH * 0.5, 0.0);
        let row_step = BALL_DIAMETER * 0.8661;

        let mut slot = 0;
        for row in 0..5 {
            for k in 0..=row {
                let id = RACK_ORDER[slot] as usize;
                positions[id] = Vec2::new(
                    apex.x + row as f32 * row_step,
                    (k as f32 - row as f32 * 0.5) * BALL_DIAMETER,
                );
                slot += 1;
            }
        }

        Self { positions }
    }

    /// Break position of one ball.
    #[inline]
    pub fn position(&self, id: BallId) -> Vec2 {
        self.positions[id as usize]
    }

    /// True when every position lies on the playing surface.
    pub fn is_on_table(&self) -> bool {
        self.positions.iter().all(|p| {
            p.is_finite() && p.x.abs() <= TABLE_WIDTH && p.y.abs() <= TABLE_HEIGHT
        })
    }
}

impl Default for Rack {
    fn default() -> Self {
        Self::standard()
    }
}

/// Off-table slot for the `count`-th pocketed ball.
#[inline]
pub fn pocket_slot(count: u32) -> Vec2 {
    Vec2::new(
        -TABLE_WIDTH + count as f32 * BALL_DIAMETER,
        TABLE_HEIGHT + BALL_DIAMETER * 2.0,
    )
}

// =============================================================================
// TESTS
// =============================================================================
