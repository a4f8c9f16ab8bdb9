//! Table Events
//!
//! Observable events for presentation collaborators (rendering, audio, UI).
//! Nothing downstream of these feeds back into the simulation.

use serde::{Serialize, Deserialize};

use crate::game::state::{BallId, Group, Seat, TableTint};

/// Why a turn was ruled a foul.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoulKind {
    /// Cue ball pocketed.
    Scratch,
    /// Cue ball struck nothing.
    NoContact,
    /// First ball struck was not an objective ball.
    WrongBallFirst,
}

/// Why a shooter lost outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossKind {
    /// Cue ball and eight ball both pocketed before the group was cleared.
    ScratchOnEight,
    /// Eight ball pocketed before the group was cleared.
    EarlyEight,
}

/// An observable table event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TableEvent {
    /// A ball dropped. `good` is true for objective balls.
    BallPocketed {
        /// Ball that dropped.
        ball: BallId,
        /// Objective ball for the shooter.
        good: bool,
    },

    /// Two balls exchanged momentum this step.
    BallsCollided {
        /// Lower id.
        a: BallId,
        /// Higher id.
        b: BallId,
        /// Magnitude of the exchanged velocity component.
        impulse: f32,
    },

    /// The turn moved to another seat.
    TurnChanged {
        /// Seat now shooting.
        turn: Seat,
    },

    /// The authority holder ruled a foul.
    Foul {
        /// Offending seat.
        seat: Seat,
        /// What went wrong.
        kind: FoulKind,
    },

    /// The open table closed.
    GroupsAssigned {
        /// Seat that claimed a group.
        shooter: Seat,
        /// Group it claimed.
        shooter_group: Group,
    },

    /// The table colour target changed.
    TintChanged {
        /// New colour target.
        tint: TableTint,
    },

    /// The game finished.
    GameOver {
        /// Winning seat.
        winner: Seat,
        /// How the loser lost, when ruled locally.
        loss: Option<LossKind>,
    },

    /// A new game started.
    NewGame {
        /// Id of the new game.
        game_id: u16,
    },
}

impl TableEvent {
    /// Stable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            TableEvent::BallPocketed { good: true, .. } => "pocket_good",
            TableEvent::BallPocketed { good: false, .. } => "pocket_bad",
            TableEvent::BallsCollided { .. } => "collision",
            TableEvent::TurnChanged { .. } => "turn_changed",
            TableEvent::Foul { .. } => "foul",
            TableEvent::GroupsAssigned { .. } => "groups_assigned",
            TableEvent::TintChanged { .. } => "tint_changed",
            TableEvent::GameOver { .. } => "game_over",
            TableEvent::NewGame { .. } => "new_game",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
