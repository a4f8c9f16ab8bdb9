//! Fixed-Step Physics Engine
//!
//! Advances every ball by one `FIXED_STEP` at a time.
//!
//! ## Step order
//!
//! 1. Cue spin feeds the cue ball velocity (if the cue ball is in play)
//! 2. Per ball, ascending id: friction, integrate, collide with higher ids
//! 3. Nothing moving → settled (no rail or pocket checks this step)
//! 4. Rails for every ball, then pocket triggers for every ball
//!
//! Replicas stay converged only if every peer runs these operations in this
//! order on the same decoded inputs.

use crate::core::hash::StateHasher;
use crate::core::quant::{quantize_vec2, POSITION_RANGE, VELOCITY_RANGE};
use crate::core::vec2::Vec2;
use crate::game::collision::{ball_impulse, balls_overlap, in_pocket, resolve_rails};
use crate::game::events::TableEvent;
use crate::game::state::{BallId, GameState, PocketMask, BALL_COUNT, CUE_BALL};
use crate::game::table::{
    pocket_slot, Rack, FIXED_STEP, FRICTION, MIN_VELOCITY_SQ, SPIN_DECAY,
};

/// Outcome of one physics step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// At least one ball is still moving.
    Moving,
    /// Every ball is at rest.
    Settled,
}

/// Ball positions, velocities and per-shot bookkeeping.
#[derive(Clone, Debug)]
pub struct PhysicsEngine {
    positions: [Vec2; BALL_COUNT],
    velocities: [Vec2; BALL_COUNT],
    cue_spin: Vec2,
    first_hit: Option<BallId>,
    rack: Rack,
    steps: u32,
}

impl PhysicsEngine {
    /// Create an engine with every ball on its break position.
    pub fn new(rack: Rack) -> Self {
        Self {
            positions: rack.positions,
            velocities: [Vec2::ZERO; BALL_COUNT],
            cue_spin: Vec2::ZERO,
            first_hit: None,
            rack,
            steps: 0,
        }
    }

    /// Restore the break layout and stop everything.
    pub fn rack(&mut self) {
        self.positions = self.rack.positions;
        self.velocities = [Vec2::ZERO; BALL_COUNT];
        self.cue_spin = Vec2::ZERO;
        self.first_hit = None;
        self.steps = 0;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Position of a ball.
    #[inline]
    pub fn position(&self, id: BallId) -> Vec2 {
        self.positions[id as usize]
    }

    /// Velocity of a ball.
    #[inline]
    pub fn velocity(&self, id: BallId) -> Vec2 {
        self.velocities[id as usize]
    }

    /// All positions, indexed by ball id.
    #[inline]
    pub fn positions(&self) -> &[Vec2; BALL_COUNT] {
        &self.positions
    }

    /// Cue ball angular velocity.
    #[inline]
    pub fn cue_spin(&self) -> Vec2 {
        self.cue_spin
    }

    /// First ball the cue ball struck since the turn was armed.
    #[inline]
    pub fn first_hit(&self) -> Option<BallId> {
        self.first_hit
    }

    /// Steps run since the last shot was loaded.
    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    // =========================================================================
    // Mutation from the rules / session
    // =========================================================================

    /// Forget the first-hit latch (new permitted turn).
    pub fn reset_first_hit(&mut self) {
        self.first_hit = None;
    }

    /// Seed the cue ball for a shot.
    pub fn load_shot(&mut self, velocity: Vec2, spin: Vec2) {
        self.velocities[CUE_BALL as usize] = velocity;
        self.cue_spin = spin;
        self.steps = 0;
    }

    /// Place the cue ball (repositioning).
    pub fn place_cue_ball(&mut self, position: Vec2) {
        self.positions[CUE_BALL as usize] = position;
        self.velocities[CUE_BALL as usize] = Vec2::ZERO;
    }

    /// Put the cue ball back on its break spot.
    pub fn respot_cue_ball(&mut self) {
        let spot = self.rack.position(CUE_BALL);
        self.place_cue_ball(spot);
    }

    /// Adopt a decoded snapshot: positions, cue velocity and spin; every
    /// other velocity is zero.
    pub fn load_snapshot(&mut self, positions: &[Vec2; BALL_COUNT], cue_velocity: Vec2, cue_spin: Vec2) {
        self.positions = *positions;
        self.velocities = [Vec2::ZERO; BALL_COUNT];
        self.velocities[CUE_BALL as usize] = cue_velocity;
        self.cue_spin = cue_spin;
        self.steps = 0;
    }

    /// Make local state equal to what a receiver decodes: positions, cue
    /// velocity and spin on the codec grid, every other velocity zero.
    pub fn snap_to_wire(&mut self) {
        for v in self.velocities.iter_mut().skip(1) {
            *v = Vec2::ZERO;
        }
        for p in self.positions.iter_mut() {
            *p = quantize_vec2(*p, POSITION_RANGE);
        }
        self.velocities[CUE_BALL as usize] = quantize_vec2(self.velocities[CUE_BALL as usize], VELOCITY_RANGE);
        self.cue_spin = quantize_vec2(self.cue_spin, VELOCITY_RANGE);
    }

    /// Is the cue ball touching any other ball on the table?
    pub fn cue_contacting(&self, pocketed: PocketMask) -> bool {
        let cue = self.positions[CUE_BALL as usize];
        (1..BALL_COUNT as BallId)
            .filter(|&id| pocketed.in_play(id))
            .any(|id| balls_overlap(cue, self.positions[id as usize]))
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance one fixed step.
    ///
    /// Pocketing toggles bits in `state.pocketed` and pushes events; nothing
    /// else in `state` is touched.
    pub fn step(&mut self, state: &mut GameState, events: &mut Vec<TableEvent>) -> StepOutcome {
        self.steps = self.steps.wrapping_add(1);

        if state.pocketed.in_play(CUE_BALL) {
            self.cue_spin *= SPIN_DECAY;
            self.velocities[CUE_BALL as usize] += self.cue_spin * FIXED_STEP;
        }

        let mut moving = false;
        for id in 0..BALL_COUNT as BallId {
            moving |= self.advance_ball(id, state.pocketed, events);
        }

        if !moving {
            return StepOutcome::Settled;
        }

        for id in 0..BALL_COUNT as BallId {
            if state.pocketed.in_play(id) {
                self.resolve_edges(id);
            }
        }

        for id in 0..BALL_COUNT as BallId {
            if state.pocketed.in_play(id) && in_pocket(self.positions[id as usize]) {
                self.pocket_ball(id, state, events);
            }
        }

        StepOutcome::Moving
    }

    /// Friction, integration and ball-ball contacts for one ball.
    /// Returns whether the ball is still moving.
    fn advance_ball(&mut self, id: BallId, pocketed: PocketMask, events: &mut Vec<TableEvent>) -> bool {
        if pocketed.contains(id) {
            return false;
        }
        let a = id as usize;

        self.velocities[a] *= FRICTION;
        self.positions[a] += self.velocities[a] * FIXED_STEP;

        for b in (a + 1)..BALL_COUNT {
            if pocketed.contains(b as BallId) {
                continue;
            }

            let reflection = ball_impulse(
                self.positions[a],
                self.velocities[a],
                self.positions[b],
                self.velocities[b],
            );

            if let Some(r) = reflection {
                self.velocities[a] -= r;
                self.velocities[b] += r;

                events.push(TableEvent::BallsCollided {
                    a: id,
                    b: b as BallId,
                    impulse: r.length(),
                });

                if id == CUE_BALL && self.first_hit.is_none() {
                    self.first_hit = Some(b as BallId);
                }
            }
        }

        if self.velocities[a].length_squared() > MIN_VELOCITY_SQ {
            true
        } else {
            self.velocities[a] = Vec2::ZERO;
            false
        }
    }

    fn resolve_edges(&mut self, id: BallId) {
        let i = id as usize;
        if let Some(contact) = resolve_rails(self.positions[i], self.velocities[i]) {
            self.positions[i] = contact.position;
            self.velocities[i] = contact.velocity;
        }
    }

    /// Park a ball off the table and flip its pocketed bit.
    fn pocket_ball(&mut self, id: BallId, state: &mut GameState, events: &mut Vec<TableEvent>) {
        let slot = pocket_slot(state.pocketed.count());
        self.positions[id as usize] = slot;
        self.velocities[id as usize] = Vec2::ZERO;
        if id == CUE_BALL {
            self.cue_spin = Vec2::ZERO;
        }

        state.pocketed.toggle(id);

        let good = state.objective_mask(state.turn) & PocketMask::bit(id) != 0;
        events.push(TableEvent::BallPocketed { ball: id, good });
    }

    /// Hash positions, velocities and spin by bit pattern.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for p in &self.positions {
            hasher.update_vec2(*p);
        }
        for v in &self.velocities {
            hasher.update_vec2(*v);
        }
        hasher.update_vec2(self.cue_spin);
    }
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(Rack::standard())
    }
}

// =============================================================================
// TESTS
// =============================================================================
