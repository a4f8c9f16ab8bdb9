//! # Eightball Sync
//!
//! Deterministic two-player 8-ball simulation with peer-to-peer state sync.
//! Every peer runs the same physics; one compact packet keeps them converged.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EIGHTBALL SYNC                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - f32 2D vector                             │
//! │  ├── quant.rs    - 16-bit quantized float codec              │
//! │  └── hash.rs     - State digest for replica checks           │
//! │                                                              │
//! │  game/           - Table simulation (deterministic)          │
//! │  ├── table.rs    - Geometry, constants, break rack           │
//! │  ├── state.rs    - Synchronised game state                   │
//! │  ├── collision.rs- Ball, rail and pocket collision           │
//! │  ├── physics.rs  - Fixed-step engine                         │
//! │  ├── input.rs    - Shot input, cue placement                 │
//! │  ├── rules.rs    - Fouls, groups, win/loss, turn hand-over   │
//! │  └── events.rs   - Observable events                         │
//! │                                                              │
//! │  network/        - Sync (logging, transport)                 │
//! │  ├── packet.rs   - 80-byte wire packet                       │
//! │  ├── transport.rs- Transport trait, loopback relay           │
//! │  ├── authority.rs- Authority policy                          │
//! │  └── session.rs  - Per-peer frame driver                     │
//! │                                                              │
//! │  config.rs       - Table configuration                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Peers converge as long as they:
//! - Step at a fixed 0.0125 s, never with the frame delta
//! - Iterate balls in ascending id order
//! - Start every shot from decoded packet values (the shooter reads its
//!   own packet back before simulating)
//!
//! `TableSession::digest` hashes the exact bit patterns of the replica so
//! two peers can prove they agree.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::hash::StateDigest;
pub use game::input::ShotInput;
pub use game::state::{GameState, Seat};
pub use game::events::TableEvent;
pub use network::session::{SessionError, TableSession};
pub use network::transport::Transport;
pub use config::{ConfigError, TableConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
