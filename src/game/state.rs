//! Game State Definitions
//!
//! The synchronised game snapshot and the bitmask vocabulary the rules and
//! the packet codec share.
//!
//! ## Ball bitmask layout
//!
//! ```text
//! bit  | 15 14 13 12 11 10  9 |  8  7  6  5  4  3  2 |  1  |  0  |
//! ball | ---- high group ---- | ---- low group ----- |  8  | cue |
//! ```

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;

/// Ball identifier (0 = cue, 1 = eight ball, 2-8 low group, 9-15 high group).
pub type BallId = u8;

/// Number of balls on the table.
pub const BALL_COUNT: usize = 16;

/// The cue ball.
pub const CUE_BALL: BallId = 0;

/// The eight ball.
pub const EIGHT_BALL: BallId = 1;

// =============================================================================
// SEAT
// =============================================================================

/// One of the two player slots (the two totems).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    /// Player holding the first totem; starts every game.
    #[default]
    First = 0,
    /// Player holding the second totem.
    Second = 1,
}

impl Seat {
    /// The opposing seat.
    #[inline]
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Seat from its wire bit.
    #[inline]
    pub fn from_bit(bit: bool) -> Seat {
        if bit { Seat::Second } else { Seat::First }
    }

    /// Wire bit of this seat.
    #[inline]
    pub fn bit(self) -> bool {
        self == Seat::Second
    }

    /// Index (0 or 1).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// GROUPS
// =============================================================================

/// Object-ball group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Balls 2-8.
    Low,
    /// Balls 9-15.
    High,
}

impl Group {
    /// Bitmask of the seven balls in this group.
    #[inline]
    pub fn mask(self) -> u16 {
        match self {
            Group::Low => PocketMask::LOW_GROUP,
            Group::High => PocketMask::HIGH_GROUP,
        }
    }
}

// =============================================================================
// POCKET MASK
// =============================================================================

/// One bit per ball; set = pocketed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PocketMask(pub u16);

impl PocketMask {
    /// Cue ball bit.
    pub const CUE: u16 = 0x0001;
    /// Eight ball bit.
    pub const EIGHT: u16 = 0x0002;
    /// Every object ball except the eight.
    pub const MAIN_SET: u16 = 0xFFFC;
    /// Balls 2-8.
    pub const LOW_GROUP: u16 = 0x01FC;
    /// Balls 9-15.
    pub const HIGH_GROUP: u16 = 0xFE00;

    /// Nothing pocketed.
    pub const EMPTY: Self = Self(0);

    /// Bit for a single ball.
    #[inline]
    pub fn bit(id: BallId) -> u16 {
        1u16 << id
    }

    /// Is the ball pocketed?
    #[inline]
    pub fn contains(self, id: BallId) -> bool {
        self.0 & Self::bit(id) != 0
    }

    /// Is the ball still on the table?
    #[inline]
    pub fn in_play(self, id: BallId) -> bool {
        !self.contains(id)
    }

    /// Flip exactly one ball's bit.
    #[inline]
    pub fn toggle(&mut self, id: BallId) {
        self.0 ^= Self::bit(id);
    }

    /// Clear one ball's bit.
    #[inline]
    pub fn clear(&mut self, id: BallId) {
        self.0 &= !Self::bit(id);
    }

    /// Number of pocketed balls.
    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Number of pocketed balls under `mask`.
    #[inline]
    pub fn count_in(self, mask: u16) -> u32 {
        (self.0 & mask).count_ones()
    }

    /// Every ball under `mask` is pocketed.
    #[inline]
    pub fn covers(self, mask: u16) -> bool {
        self.0 & mask == mask
    }
}

// =============================================================================
// TABLE TINT
// =============================================================================

/// Table colour target the presentation layer should fade towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableTint {
    /// Groups not assigned yet.
    Open,
    /// Colour of the given group.
    Group(Group),
}

// =============================================================================
// GAME STATE
// =============================================================================

/// The authoritative, synchronised snapshot.
///
/// Everything here travels in the packet. Only the authority holder mutates
/// it directly; everyone else rebuilds it from decoded packets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Pocketed balls.
    pub pocketed: PocketMask,
    /// Balls are rolling.
    pub simulating: bool,
    /// Whose turn it is.
    pub turn: Seat,
    /// The turn that just ended was a foul.
    pub foul: bool,
    /// Groups not assigned yet.
    pub open: bool,
    /// Seat that owns the low group once the table closes.
    pub low_group_owner: Seat,
    /// Game finished.
    pub game_over: bool,
    /// Winner, meaningful when `game_over` is set.
    pub winner: Seat,
    /// The current shooter may take a shot.
    pub permit: bool,
    /// Monotonic packet counter.
    pub sequence: u16,
    /// Monotonic game counter.
    pub game_id: u16,
}

impl GameState {
    /// State of a table nobody has started a game on.
    pub fn new() -> Self {
        Self {
            pocketed: PocketMask::EMPTY,
            simulating: false,
            turn: Seat::First,
            foul: false,
            open: true,
            low_group_owner: Seat::First,
            game_over: true,
            winner: Seat::First,
            permit: false,
            sequence: 0,
            game_id: 0,
        }
    }

    /// Reset per-game fields for a fresh break. Counters and turn survive.
    pub fn reset_for_break(&mut self) {
        self.pocketed = PocketMask::EMPTY;
        self.simulating = false;
        self.foul = false;
        self.open = true;
        self.game_over = false;
        self.low_group_owner = Seat::First;
        self.winner = Seat::First;
    }

    /// Group assigned to a seat (meaningless while the table is open).
    #[inline]
    pub fn group_of(&self, seat: Seat) -> Group {
        if seat == self.low_group_owner { Group::Low } else { Group::High }
    }

    /// Object-ball mask of a seat.
    #[inline]
    pub fn group_mask(&self, seat: Seat) -> u16 {
        self.group_of(seat).mask()
    }

    /// Every ball of the seat's group is down.
    #[inline]
    pub fn group_cleared(&self, seat: Seat) -> bool {
        self.pocketed.covers(self.group_mask(seat))
    }

    /// Balls the shooter may legally pocket right now.
    pub fn objective_mask(&self, seat: Seat) -> u16 {
        let group = self.group_mask(seat);
        let mut mask = group;
        if self.open {
            mask |= PocketMask::MAIN_SET;
        }
        if self.pocketed.covers(group) {
            mask |= PocketMask::EIGHT;
        }
        mask
    }

    /// Tint for the table from the point of view of `seat`.
    pub fn tint_for(&self, seat: Seat) -> TableTint {
        if self.open {
            TableTint::Open
        } else {
            TableTint::Group(self.group_of(seat))
        }
    }

    /// Balls each seat has pocketed from its own group; the winner also
    /// gets the eight ball once the game is over.
    pub fn score_card(&self) -> [u32; 2] {
        let mut card = [
            self.pocketed.count_in(self.group_mask(Seat::First)),
            self.pocketed.count_in(self.group_mask(Seat::Second)),
        ];
        if self.game_over && self.pocketed.contains(EIGHT_BALL) {
            card[self.winner.index()] += 1;
        }
        card
    }

    /// Advance the packet counter for a new outgoing packet.
    #[inline]
    pub fn next_sequence(&mut self) -> u16 {
        self.sequence = self.sequence.saturating_add(1);
        self.sequence
    }

    /// Hash every synchronised field.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u16(self.pocketed.0);
        hasher.update_bool(self.simulating);
        hasher.update_u8(self.turn as u8);
        hasher.update_bool(self.foul);
        hasher.update_bool(self.open);
        hasher.update_u8(self.low_group_owner as u8);
        hasher.update_bool(self.game_over);
        hasher.update_u8(self.winner as u8);
        hasher.update_bool(self.permit);
        hasher.update_u16(self.sequence);
        hasher.update_u16(self.game_id);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_other() {
        assert_eq!(Seat::First.other(), Seat::Second);
        assert_eq!(Seat::Second.other(), Seat::First);
        assert_eq!(Seat::from_bit(Seat::Second.bit()), Seat::Second);
    }

    #[test]
    fn test_group_masks_partition_main_set() {
        assert_eq!(PocketMask::LOW_GROUP | PocketMask::HIGH_GROUP, PocketMask::MAIN_SET);
        assert_eq!(PocketMask::LOW_GROUP & PocketMask::HIGH_GROUP, 0);
        assert_eq!(PocketMask::LOW_GROUP << 7, PocketMask::HIGH_GROUP);
    }

    #[test]
    fn test_group_assignment_follows_low_owner() {
        let mut state = GameState::new();
        state.low_group_owner = Seat::Second;
        assert_eq!(state.group_of(Seat::Second), Group::Low);
        assert_eq!(state.group_of(Seat::First), Group::High);
        assert_eq!(state.group_mask(Seat::First), 0xFE00);
    }

    #[test]
    fn test_toggle_flips_one_bit() {
        let mut mask = PocketMask(0b1010);
        mask.toggle(4);
        assert_eq!(mask.0, 0b1_1010);
        assert_eq!(mask.count(), 3);
        mask.clear(1);
        assert_eq!(mask.0, 0b1_1000);
    }

    #[test]
    fn test_objective_mask() {
        let mut state = GameState::new();
        state.open = true;
        assert_eq!(state.objective_mask(Seat::First), PocketMask::MAIN_SET);

        state.open = false;
        assert_eq!(state.objective_mask(Seat::First), PocketMask::LOW_GROUP);

        state.pocketed = PocketMask(PocketMask::LOW_GROUP);
        assert_eq!(
            state.objective_mask(Seat::First),
            PocketMask::LOW_GROUP | PocketMask::EIGHT
        );
    }

    #[test]
    fn test_score_card() {
        let mut state = GameState::new();
        state.open = false;
        state.low_group_owner = Seat::Second;
        // Two low (seat 1), one high (seat 0), plus the eight
        state.pocketed = PocketMask(0b0000_0010_0000_1100 | PocketMask::EIGHT);
        state.game_over = true;
        state.winner = Seat::First;
        assert_eq!(state.score_card(), [2, 2]);
    }

    #[test]
    fn test_sequence_saturates() {
        let mut state = GameState::new();
        state.sequence = u16::MAX - 1;
        assert_eq!(state.next_sequence(), u16::MAX);
        assert_eq!(state.next_sequence(), u16::MAX);
    }
}
