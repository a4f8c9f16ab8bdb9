//! Turn Rules
//!
//! Evaluated once per settlement, and only by the authority holder.
//!
//! ```text
//!   settled ──► scratch? ──► early eight? ──► contact? ──► wrong ball first?
//!                                                              │
//!                     ┌────────────── no foul ◄────────────────┘
//!                     ▼
//!          open table: assign groups / transfer
//!          closed:     win / continue / transfer
//! ```
//!
//! `judge` is pure; `Ruling::apply` folds the verdict into the state. The
//! turn itself is never flipped here: the session publishes the next turn
//! and reads it back like any remote packet.

use serde::{Serialize, Deserialize};

use crate::game::events::{FoulKind, LossKind, TableEvent};
use crate::game::input::Reposition;
use crate::game::state::{BallId, GameState, Group, PocketMask, Seat, CUE_BALL, EIGHT_BALL};

/// What happened during one shot, beyond the state itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Pocketed mask when the shot was taken.
    pub pocketed_before: PocketMask,
    /// First ball the cue ball struck.
    pub first_hit: Option<BallId>,
}

/// How the turn resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Shooter keeps the table.
    Continue,
    /// Turn passes to the opponent.
    Transfer,
    /// The game is decided.
    GameOver {
        /// Winning seat.
        winner: Seat,
    },
}

/// Verdict on a settled shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruling {
    /// Seat that took the shot.
    pub shooter: Seat,
    /// Continue, transfer or game over.
    pub outcome: Outcome,
    /// Foul committed, if any.
    pub foul: Option<FoulKind>,
    /// Why the shooter lost, if they did.
    pub loss: Option<LossKind>,
    /// Group the shooter took when the open table closed.
    pub assigned: Option<Group>,
}

/// Judge a settled shot.
pub fn judge(state: &GameState, shot: &ShotRecord) -> Ruling {
    let shooter = state.turn;
    let group = state.group_mask(shooter);
    let cleared = state.group_cleared(shooter);
    let eight = state.pocketed.contains(EIGHT_BALL);

    let mut ruling = Ruling {
        shooter,
        outcome: Outcome::Transfer,
        foul: None,
        loss: None,
        assigned: None,
    };

    if state.pocketed.contains(CUE_BALL) {
        ruling.foul = Some(FoulKind::Scratch);
        if eight && !cleared {
            ruling.loss = Some(LossKind::ScratchOnEight);
            ruling.outcome = Outcome::GameOver { winner: shooter.other() };
        }
        return ruling;
    }

    if eight && !cleared {
        ruling.loss = Some(LossKind::EarlyEight);
        ruling.outcome = Outcome::GameOver { winner: shooter.other() };
        return ruling;
    }

    let first_hit = match shot.first_hit {
        Some(ball) => ball,
        None => {
            ruling.foul = Some(FoulKind::NoContact);
            return ruling;
        }
    };

    if !state.open {
        let legal = if cleared { group | PocketMask::EIGHT } else { group };
        if legal & PocketMask::bit(first_hit) == 0 {
            ruling.foul = Some(FoulKind::WrongBallFirst);
            return ruling;
        }
    }

    if state.open {
        let before = shot.pocketed_before.count_in(PocketMask::MAIN_SET);
        if state.pocketed.count_in(PocketMask::MAIN_SET) > before {
            let low = state.pocketed.count_in(PocketMask::LOW_GROUP);
            let high = state.pocketed.count_in(PocketMask::HIGH_GROUP);
            ruling.assigned = Some(if low > high { Group::Low } else { Group::High });
            ruling.outcome = Outcome::Continue;
        }
        return ruling;
    }

    if cleared && eight {
        ruling.outcome = Outcome::GameOver { winner: shooter };
    } else if state.pocketed.count_in(group) > shot.pocketed_before.count_in(group) {
        ruling.outcome = Outcome::Continue;
    }

    ruling
}

impl Ruling {
    /// Fold the verdict into the state (foul flag, groups, game over).
    pub fn apply(&self, state: &mut GameState) {
        state.foul = self.foul.is_some();

        if let Some(group) = self.assigned {
            state.open = false;
            state.low_group_owner = match group {
                Group::Low => self.shooter,
                Group::High => self.shooter.other(),
            };
        }

        if let Outcome::GameOver { winner } = self.outcome {
            state.game_over = true;
            state.winner = winner;
        }
    }

    /// Turn to publish once the verdict is applied.
    pub fn next_turn(&self) -> Seat {
        match self.outcome {
            Outcome::Transfer => self.shooter.other(),
            Outcome::Continue | Outcome::GameOver { .. } => self.shooter,
        }
    }

    /// The shooter keeps the table and must be re-armed locally.
    pub fn rearms_shooter(&self) -> bool {
        self.outcome == Outcome::Continue
    }

    /// Events describing the verdict.
    pub fn events(&self) -> Vec<TableEvent> {
        let mut events = Vec::new();
        if let Some(kind) = self.foul {
            events.push(TableEvent::Foul { seat: self.shooter, kind });
        }
        if let Some(group) = self.assigned {
            events.push(TableEvent::GroupsAssigned { shooter: self.shooter, shooter_group: group });
        }
        if let Outcome::GameOver { winner } = self.outcome {
            events.push(TableEvent::GameOver { winner, loss: self.loss });
        }
        events
    }
}

// =============================================================================
// TURN ARMING
// =============================================================================

/// Fixups made when a turn is armed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnSetup {
    /// Cue placement granted to the shooter.
    pub reposition: Option<Reposition>,
    /// The cue ball must go back to its break spot.
    pub respot_cue: bool,
}

/// Arm the current shooter: foul fixup, permit set, foul cleared.
pub fn arm_turn(state: &mut GameState) -> TurnSetup {
    let mut setup = TurnSetup { reposition: None, respot_cue: false };

    if state.foul {
        setup.reposition = Some(Reposition::anywhere());
        if state.pocketed.contains(CUE_BALL) {
            state.pocketed.clear(CUE_BALL);
            setup.respot_cue = true;
        }
    }

    state.permit = true;
    state.foul = false;
    setup
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn live_game() -> GameState {
        let mut state = GameState::new();
        state.reset_for_break();
        state
    }

    fn closed_game(shooter: Seat, low_owner: Seat) -> GameState {
        let mut state = live_game();
        state.open = false;
        state.turn = shooter;
        state.low_group_owner = low_owner;
        state
    }

    fn shot(before: PocketMask, first_hit: Option<BallId>) -> ShotRecord {
        ShotRecord { pocketed_before: before, first_hit }
    }

    #[test]
    fn test_open_break_assigns_low_group() {
        let mut state = live_game();
        state.turn = Seat::Second;
        // Balls 3 and 6 (low) down on the break
        state.pocketed = PocketMask(0b0100_1000);

        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(2)));
        assert_eq!(ruling.outcome, Outcome::Continue);
        assert_eq!(ruling.assigned, Some(Group::Low));
        assert_eq!(ruling.foul, None);

        ruling.apply(&mut state);
        assert!(!state.open);
        assert_eq!(state.low_group_owner, Seat::Second);
        assert_eq!(state.group_of(Seat::First), Group::High);
        assert_eq!(ruling.next_turn(), Seat::Second);
        assert!(ruling.rearms_shooter());
        assert!(ruling.events().contains(&TableEvent::GroupsAssigned {
            shooter: Seat::Second,
            shooter_group: Group::Low,
        }));
    }

    #[test]
    fn test_open_table_tie_gives_high_group() {
        let mut state = live_game();
        state.pocketed = PocketMask(PocketMask::bit(4) | PocketMask::bit(12));
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(4)));
        assert_eq!(ruling.assigned, Some(Group::High));

        ruling.apply(&mut state);
        assert_eq!(state.low_group_owner, Seat::Second);
    }

    #[test]
    fn test_open_table_nothing_down_transfers() {
        let state = live_game();
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(2)));
        assert_eq!(ruling.outcome, Outcome::Transfer);
        assert_eq!(ruling.foul, None);
        assert_eq!(ruling.next_turn(), Seat::Second);
    }

    #[test]
    fn test_scratch_with_eight_loses() {
        let mut state = closed_game(Seat::First, Seat::First);
        state.pocketed = PocketMask(PocketMask::CUE | PocketMask::EIGHT | PocketMask::bit(2));

        let ruling = judge(&state, &shot(PocketMask(PocketMask::bit(2)), Some(1)));
        assert_eq!(ruling.outcome, Outcome::GameOver { winner: Seat::Second });
        assert_eq!(ruling.foul, Some(FoulKind::Scratch));
        assert_eq!(ruling.loss, Some(LossKind::ScratchOnEight));

        ruling.apply(&mut state);
        assert!(state.game_over);
        assert_eq!(state.winner, Seat::Second);
        assert!(state.foul);
    }

    #[test]
    fn test_plain_scratch_transfers() {
        let state = {
            let mut s = live_game();
            s.pocketed = PocketMask(PocketMask::CUE);
            s
        };
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(2)));
        assert_eq!(ruling.outcome, Outcome::Transfer);
        assert_eq!(ruling.foul, Some(FoulKind::Scratch));
        assert_eq!(ruling.loss, None);
    }

    #[test]
    fn test_early_eight_loses() {
        let mut state = closed_game(Seat::Second, Seat::First);
        state.pocketed = PocketMask(PocketMask::EIGHT);
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(9)));
        assert_eq!(ruling.outcome, Outcome::GameOver { winner: Seat::First });
        assert_eq!(ruling.loss, Some(LossKind::EarlyEight));
        assert_eq!(ruling.foul, None);
    }

    #[test]
    fn test_no_contact_fouls_and_grants_ball_in_hand() {
        let mut state = live_game();
        let ruling = judge(&state, &shot(PocketMask::EMPTY, None));
        assert_eq!(ruling.foul, Some(FoulKind::NoContact));
        assert_eq!(ruling.outcome, Outcome::Transfer);

        ruling.apply(&mut state);
        state.turn = ruling.next_turn();
        let setup = arm_turn(&mut state);
        assert_eq!(setup.reposition, Some(Reposition::anywhere()));
        assert!(!setup.respot_cue);
        assert!(state.permit);
        assert!(!state.foul);
    }

    #[test]
    fn test_wrong_ball_first_only_when_closed() {
        // Seat 0 owns low; hits ball 10 first and pockets it
        let mut state = closed_game(Seat::First, Seat::First);
        state.pocketed = PocketMask(PocketMask::bit(10));
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(10)));
        assert_eq!(ruling.foul, Some(FoulKind::WrongBallFirst));
        assert_eq!(ruling.outcome, Outcome::Transfer);

        state.open = true;
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(10)));
        assert_eq!(ruling.foul, None);
        assert_eq!(ruling.outcome, Outcome::Continue);
    }

    #[test]
    fn test_opponent_ball_only_transfers_without_foul() {
        // Legal first hit, but only an opponent ball dropped
        let mut state = closed_game(Seat::First, Seat::First);
        state.pocketed = PocketMask(PocketMask::bit(10));
        let ruling = judge(&state, &shot(PocketMask::EMPTY, Some(3)));
        assert_eq!(ruling.foul, None);
        assert_eq!(ruling.outcome, Outcome::Transfer);
    }

    #[test]
    fn test_own_ball_continues() {
        let mut state = closed_game(Seat::Second, Seat::First);
        let before = PocketMask(PocketMask::bit(9));
        state.pocketed = PocketMask(PocketMask::bit(9) | PocketMask::bit(14));
        let ruling = judge(&state, &shot(before, Some(14)));
        assert_eq!(ruling.outcome, Outcome::Continue);
        assert_eq!(ruling.next_turn(), Seat::Second);
    }

    #[test]
    fn test_eight_first_is_legal_once_cleared() {
        let mut state = closed_game(Seat::First, Seat::First);
        state.pocketed = PocketMask(PocketMask::LOW_GROUP);
        let ruling = judge(&state, &shot(state.pocketed, Some(EIGHT_BALL)));
        assert_eq!(ruling.foul, None);
        assert_eq!(ruling.outcome, Outcome::Transfer);

        state.pocketed = PocketMask(PocketMask::LOW_GROUP & !PocketMask::bit(8));
        let ruling = judge(&state, &shot(state.pocketed, Some(EIGHT_BALL)));
        assert_eq!(ruling.foul, Some(FoulKind::WrongBallFirst));
    }

    #[test]
    fn test_clearing_then_eight_wins() {
        let mut state = closed_game(Seat::Second, Seat::First);
        let before = PocketMask(PocketMask::HIGH_GROUP & !PocketMask::bit(15));
        state.pocketed = PocketMask(PocketMask::HIGH_GROUP | PocketMask::EIGHT);
        let ruling = judge(&state, &shot(before, Some(15)));
        assert_eq!(ruling.outcome, Outcome::GameOver { winner: Seat::Second });
        assert_eq!(ruling.loss, None);

        let events = ruling.events();
        assert_eq!(events, vec![TableEvent::GameOver { winner: Seat::Second, loss: None }]);
    }

    #[test]
    fn test_arm_turn_after_scratch_respots_cue() {
        let mut state = live_game();
        state.pocketed = PocketMask(PocketMask::CUE | PocketMask::bit(5));
        state.foul = true;

        let setup = arm_turn(&mut state);
        assert!(setup.respot_cue);
        assert_eq!(setup.reposition, Some(Reposition::anywhere()));
        assert_eq!(state.pocketed, PocketMask(PocketMask::bit(5)));
        assert!(state.permit);
        assert!(!state.foul);
    }

    #[test]
    fn test_arm_turn_without_foul() {
        let mut state = live_game();
        let setup = arm_turn(&mut state);
        assert_eq!(setup, TurnSetup { reposition: None, respot_cue: false });
        assert!(state.permit);
    }
}
