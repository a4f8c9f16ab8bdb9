//! Collision Detection
//!
//! Ball-ball impulse exchange, rail reflection and pocket triggers.
//! Pure functions over positions and velocities; the engine owns the state.
//!
//! ## Rail regions
//!
//! ```text
//!   quadrants (zx, zy)        pocket zone sub-regions
//!   o----o----o                 zz = 1 (corner)   zz = -2 (middle)
//!   | -+ | ++ |                 \_________/         \_________/
//!   |----+----|                  |       /              /  /
//!   | -- | +- |                  |  zw  |             /  zw |
//!   o----o----o                  |      |            /      |
//! ```
//!
//! Inside a pocket zone the cushion is the straight line
//! `y = d * x + k`, reflected about its unit normal; everywhere else the
//! rails are axis aligned.

use crate::core::vec2::Vec2;
use crate::game::table::{
    BALL_DIAMETER_SQ, K_1OR2, K_1OR5, POCKET_DEPTH, POCKET_RADIUS,
    TABLE_HEIGHT, TABLE_WIDTH,
};

/// Check if two balls overlap.
#[inline]
pub fn balls_overlap(a: Vec2, b: Vec2) -> bool {
    a.distance_squared(b) < BALL_DIAMETER_SQ
}

/// Velocity exchanged between two touching balls.
///
/// Returns `Some(reflection)` when the balls overlap and are approaching;
/// the caller subtracts it from `vel_a` and adds it to `vel_b`, which keeps
/// total momentum unchanged (unit masses). Coincident centres fall back to
/// a +X contact normal instead of dividing by zero.
pub fn ball_impulse(pos_a: Vec2, vel_a: Vec2, pos_b: Vec2, vel_b: Vec2) -> Option<Vec2> {
    let delta = pos_b - pos_a;
    if delta.length_squared() >= BALL_DIAMETER_SQ {
        return None;
    }

    let normal = delta.normalize_or(Vec2::RIGHT);
    let dot = (vel_a - vel_b).dot(normal);

    if dot > 0.0 {
        Some(normal * dot)
    } else {
        None
    }
}

/// Result of a rail contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RailContact {
    /// Corrected position on the cushion line.
    pub position: Vec2,
    /// Reflected velocity.
    pub velocity: Vec2,
}

/// Keep `velocity` from pointing into the surface with unit normal `normal`.
#[inline]
pub fn clamp_off_surface(velocity: Vec2, normal: Vec2) -> Vec2 {
    if velocity.dot(normal) < 0.0 {
        normal * velocity.length()
    } else {
        velocity
    }
}

#[inline]
fn sign(value: f32) -> f32 {
    if value > 0.0 { 1.0 } else { -1.0 }
}

/// Resolve a ball against the cushions.
///
/// Returns `None` when the ball is clear of every cushion.
pub fn resolve_rails(position: Vec2, velocity: Vec2) -> Option<RailContact> {
    let a = position;

    // Major regions
    let zx = sign(a.x);
    let zy = sign(a.y);

    let in_pocket_zone = a.y * zy > TABLE_HEIGHT - POCKET_RADIUS
        && (a.x * zx > TABLE_WIDTH - POCKET_RADIUS || a.x * zx < POCKET_RADIUS);

    if in_pocket_zone {
        // Which side of the pocket diagonal
        let zw = if a.y * zy > a.x * zx - TABLE_WIDTH + TABLE_HEIGHT { 1.0 } else { -1.0 };

        // Line coefficients depend on corner vs middle pocket
        let (zz, r) = if a.x * zx > TABLE_WIDTH * 0.5 {
            (1.0, K_1OR2)
        } else {
            (-2.0, K_1OR5)
        };

        let d = zx * zy * zz;
        let k = (-(TABLE_WIDTH * f32::max(zz, 0.0)) + POCKET_RADIUS * zw * zz.abs() + TABLE_HEIGHT) * zy;

        let l = zw * zy;
        if a.y * l > (a.x * d + k) * l {
            let normal = Vec2::new(zx * zz, -zy) * (zw * r);

            // Project onto the cushion line
            let i = (a.x * d + a.y - k) / (2.0 * d);
            let j = i * d + k;

            let reflected = velocity.reflect(normal);
            return Some(RailContact {
                position: Vec2::new(i, j),
                velocity: clamp_off_surface(reflected, normal),
            });
        }

        return None;
    }

    let mut contact: Option<RailContact> = None;
    let mut pos = position;
    let mut vel = velocity;

    if a.x * zx > TABLE_WIDTH {
        let normal = Vec2::LEFT * zx;
        pos.x = TABLE_WIDTH * zx;
        vel = clamp_off_surface(vel.reflect(normal), normal);
        contact = Some(RailContact { position: pos, velocity: vel });
    }

    if a.y * zy > TABLE_HEIGHT {
        let normal = Vec2::DOWN * zy;
        pos.y = TABLE_HEIGHT * zy;
        vel = clamp_off_surface(vel.reflect(normal), normal);
        contact = Some(RailContact { position: pos, velocity: vel });
    }

    contact
}

/// Has the ball passed far enough into a pocket to drop?
pub fn in_pocket(position: Vec2) -> bool {
    let zx = sign(position.x);
    let zy = sign(position.y);

    position.y * zy > TABLE_HEIGHT + POCKET_DEPTH
        || position.y * zy > position.x * -zx + TABLE_WIDTH + TABLE_HEIGHT + POCKET_DEPTH
}

// =============================================================================
// TESTS
// =============================================================================
