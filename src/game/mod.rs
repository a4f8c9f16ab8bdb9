//! Game Logic Module
//!
//! Table simulation and pool rules. Deterministic: the same inputs produce
//! bit-identical state on every peer.
//!
//! ## Module Structure
//!
//! - `table`: Table geometry, physics constants and the break rack
//! - `state`: Synchronised game state and pocketed bitmask
//! - `collision`: Ball-ball, rail and pocket collision primitives
//! - `physics`: Fixed-step physics engine
//! - `input`: Shot input and cue ball placement
//! - `rules`: Turn rules evaluated on settlement
//! - `events`: Observable events for presentation

pub mod table;
pub mod state;
pub mod collision;
pub mod physics;
pub mod input;
pub mod rules;
pub mod events;

// Re-export key types
pub use table::Rack;
pub use state::{BallId, GameState, Group, PocketMask, Seat, TableTint};
pub use physics::{PhysicsEngine, StepOutcome};
pub use input::{Reposition, ShotInput};
pub use rules::{Outcome, Ruling, ShotRecord};
pub use events::{FoulKind, LossKind, TableEvent};
