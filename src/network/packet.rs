//! Table Packet
//!
//! The whole synchronised table in one fixed-size blob of 16-bit code units,
//! little-endian on the byte wire.
//!
//! ## Layout
//!
//! ```text
//! unit  0x00..0x1F   ball positions, (x, y) per ball   codec ±2.5
//!       0x20..0x21   cue velocity                      codec ±50
//!       0x22..0x23   cue angular velocity              codec ±50
//!       0x24         pocketed bitmask                  raw
//!       0x25         flags                             bitfield
//!       0x26         sequence number                   raw
//!       0x27         game id                           raw
//! ```
//!
//! ## Flags
//!
//! ```text
//! bit  7       6       5          4          3     2     1     0
//!      permit  winner  game_over  low_owner  open  foul  turn  simulating
//! ```

use crate::core::quant::{decode_vec2, encode_vec2, POSITION_RANGE, VELOCITY_RANGE};
use crate::core::vec2::Vec2;
use crate::game::physics::PhysicsEngine;
use crate::game::state::{GameState, PocketMask, Seat, BALL_COUNT, CUE_BALL};

/// Code units per packet.
pub const PACKET_UNITS: usize = 40;

/// Bytes per packet on the wire.
pub const PACKET_BYTES: usize = PACKET_UNITS * 2;

/// First position unit.
pub const OFFSET_POSITIONS: usize = 0x00;
/// Cue velocity units.
pub const OFFSET_CUE_VELOCITY: usize = 0x20;
/// Cue angular velocity units.
pub const OFFSET_CUE_SPIN: usize = 0x22;
/// Pocketed bitmask unit.
pub const OFFSET_POCKETED: usize = 0x24;
/// Flags unit.
pub const OFFSET_FLAGS: usize = 0x25;
/// Sequence number unit.
pub const OFFSET_SEQUENCE: usize = 0x26;
/// Game id unit.
pub const OFFSET_GAME_ID: usize = 0x27;

/// Balls are rolling.
pub const FLAG_SIMULATING: u16 = 1 << 0;
/// Turn belongs to seat 1.
pub const FLAG_TURN: u16 = 1 << 1;
/// Last turn fouled.
pub const FLAG_FOUL: u16 = 1 << 2;
/// Open table.
pub const FLAG_OPEN: u16 = 1 << 3;
/// Seat 1 owns the low group.
pub const FLAG_LOW_OWNER: u16 = 1 << 4;
/// Game over.
pub const FLAG_GAME_OVER: u16 = 1 << 5;
/// Seat 1 won.
pub const FLAG_WINNER: u16 = 1 << 6;
/// Shooter may shoot.
pub const FLAG_PERMIT: u16 = 1 << 7;

/// Packet rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    /// Wrong byte length.
    #[error("Malformed packet: {len} bytes (expected {PACKET_BYTES})")]
    Malformed {
        /// Received length.
        len: usize,
    },

    /// Sequence number went backwards.
    #[error("Stale packet: sequence {incoming} < {current}")]
    Stale {
        /// Sequence number in the packet.
        incoming: u16,
        /// Sequence number held locally.
        current: u16,
    },
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Typed view of one packet.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Ball positions by id.
    pub positions: [Vec2; BALL_COUNT],
    /// Cue ball velocity.
    pub cue_velocity: Vec2,
    /// Cue ball angular velocity.
    pub cue_spin: Vec2,
    /// Pocketed balls.
    pub pocketed: PocketMask,
    /// Balls are rolling.
    pub simulating: bool,
    /// Whose turn it is.
    pub turn: Seat,
    /// Last turn fouled.
    pub foul: bool,
    /// Open table.
    pub open: bool,
    /// Seat owning the low group.
    pub low_group_owner: Seat,
    /// Game over.
    pub game_over: bool,
    /// Winner.
    pub winner: Seat,
    /// Shooter may shoot.
    pub permit: bool,
    /// Packet counter.
    pub sequence: u16,
    /// Game counter.
    pub game_id: u16,
}

impl Snapshot {
    /// Capture the table, publishing `turn` as the current turn.
    pub fn capture(state: &GameState, engine: &PhysicsEngine, turn: Seat) -> Self {
        Self {
            positions: *engine.positions(),
            cue_velocity: engine.velocity(CUE_BALL),
            cue_spin: engine.cue_spin(),
            pocketed: state.pocketed,
            simulating: state.simulating,
            turn,
            foul: state.foul,
            open: state.open,
            low_group_owner: state.low_group_owner,
            game_over: state.game_over,
            winner: state.winner,
            permit: state.permit,
            sequence: state.sequence,
            game_id: state.game_id,
        }
    }

    /// Reject a snapshot older than the held sequence number.
    pub fn check_sequence(&self, current: u16) -> Result<(), PacketError> {
        if self.sequence < current {
            return Err(PacketError::Stale { incoming: self.sequence, current });
        }
        Ok(())
    }

    /// Copy every non-physics field into `state`.
    pub fn adopt_flags(&self, state: &mut GameState) {
        state.pocketed = self.pocketed;
        state.simulating = self.simulating;
        state.turn = self.turn;
        state.foul = self.foul;
        state.open = self.open;
        state.low_group_owner = self.low_group_owner;
        state.game_over = self.game_over;
        state.winner = self.winner;
        state.permit = self.permit;
        state.sequence = self.sequence;
        state.game_id = self.game_id;
    }

    fn flags(&self) -> u16 {
        let mut flags = 0;
        let mut set = |bit: u16, on: bool| {
            if on {
                flags |= bit;
            }
        };
        set(FLAG_SIMULATING, self.simulating);
        set(FLAG_TURN, self.turn.bit());
        set(FLAG_FOUL, self.foul);
        set(FLAG_OPEN, self.open);
        set(FLAG_LOW_OWNER, self.low_group_owner.bit());
        set(FLAG_GAME_OVER, self.game_over);
        set(FLAG_WINNER, self.winner.bit());
        set(FLAG_PERMIT, self.permit);
        flags
    }

    /// Encode into code units.
    pub fn encode(&self) -> Packet {
        let mut units = [0u16; PACKET_UNITS];

        for (i, p) in self.positions.iter().enumerate() {
            let [x, y] = encode_vec2(*p, POSITION_RANGE);
            units[OFFSET_POSITIONS + i * 2] = x;
            units[OFFSET_POSITIONS + i * 2 + 1] = y;
        }

        let [vx, vy] = encode_vec2(self.cue_velocity, VELOCITY_RANGE);
        units[OFFSET_CUE_VELOCITY] = vx;
        units[OFFSET_CUE_VELOCITY + 1] = vy;

        let [sx, sy] = encode_vec2(self.cue_spin, VELOCITY_RANGE);
        units[OFFSET_CUE_SPIN] = sx;
        units[OFFSET_CUE_SPIN + 1] = sy;

        units[OFFSET_POCKETED] = self.pocketed.0;
        units[OFFSET_FLAGS] = self.flags();
        units[OFFSET_SEQUENCE] = self.sequence;
        units[OFFSET_GAME_ID] = self.game_id;

        Packet(units)
    }
}

// =============================================================================
// PACKET
// =============================================================================

/// Encoded table state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Packet(pub [u16; PACKET_UNITS]);

impl Packet {
    /// Decode into a typed snapshot.
    pub fn decode(&self) -> Snapshot {
        let units = &self.0;

        let mut positions = [Vec2::ZERO; BALL_COUNT];
        for (i, p) in positions.iter_mut().enumerate() {
            let at = OFFSET_POSITIONS + i * 2;
            *p = decode_vec2([units[at], units[at + 1]], POSITION_RANGE);
        }

        let flags = units[OFFSET_FLAGS];
        let has = |bit: u16| flags & bit != 0;

        Snapshot {
            positions,
            cue_velocity: decode_vec2(
                [units[OFFSET_CUE_VELOCITY], units[OFFSET_CUE_VELOCITY + 1]],
                VELOCITY_RANGE,
            ),
            cue_spin: decode_vec2([units[OFFSET_CUE_SPIN], units[OFFSET_CUE_SPIN + 1]], VELOCITY_RANGE),
            pocketed: PocketMask(units[OFFSET_POCKETED]),
            simulating: has(FLAG_SIMULATING),
            turn: Seat::from_bit(has(FLAG_TURN)),
            foul: has(FLAG_FOUL),
            open: has(FLAG_OPEN),
            low_group_owner: Seat::from_bit(has(FLAG_LOW_OWNER)),
            game_over: has(FLAG_GAME_OVER),
            winner: Seat::from_bit(has(FLAG_WINNER)),
            permit: has(FLAG_PERMIT),
            sequence: units[OFFSET_SEQUENCE],
            game_id: units[OFFSET_GAME_ID],
        }
    }

    /// Sequence number without a full decode.
    #[inline]
    pub fn sequence(&self) -> u16 {
        self.0[OFFSET_SEQUENCE]
    }

    /// Little-endian wire bytes.
    pub fn to_bytes(&self) -> [u8; PACKET_BYTES] {
        let mut bytes = [0u8; PACKET_BYTES];
        for (chunk, unit) in bytes.chunks_exact_mut(2).zip(self.0.iter()) {
            chunk.copy_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    /// Parse wire bytes. Anything but exactly `PACKET_BYTES` is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() != PACKET_BYTES {
            return Err(PacketError::Malformed { len: bytes.len() });
        }

        let mut units = [0u16; PACKET_UNITS];
        for (unit, chunk) in units.iter_mut().zip(bytes.chunks_exact(2)) {
            *unit = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(Packet(units))
    }

    /// Hex dump for diagnostics.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quant::precision;
    use crate::game::table::MAX_SHOT_SPEED;

    fn sample() -> Snapshot {
        let mut state = GameState::new();
        state.reset_for_break();
        state.pocketed = PocketMask(0b1000_0100_0010_0100);
        state.simulating = true;
        state.foul = true;
        state.open = false;
        state.low_group_owner = Seat::Second;
        state.permit = false;
        state.sequence = 513;
        state.game_id = 7;

        let mut engine = PhysicsEngine::default();
        engine.load_shot(Vec2::new(MAX_SHOT_SPEED, -3.25), Vec2::new(0.5, -1.5));
        Snapshot::capture(&state, &engine, Seat::Second)
    }

    #[test]
    fn test_round_trip_exact_fields() {
        let snap = sample();
        let back = Packet::from_bytes(&snap.encode().to_bytes()).unwrap().decode();

        assert_eq!(back.pocketed, snap.pocketed);
        assert_eq!(back.simulating, snap.simulating);
        assert_eq!(back.turn, Seat::Second);
        assert_eq!(back.foul, snap.foul);
        assert_eq!(back.open, snap.open);
        assert_eq!(back.low_group_owner, snap.low_group_owner);
        assert_eq!(back.game_over, snap.game_over);
        assert_eq!(back.winner, snap.winner);
        assert_eq!(back.permit, snap.permit);
        assert_eq!(back.sequence, 513);
        assert_eq!(back.game_id, 7);
    }

    #[test]
    fn test_round_trip_floats_within_precision() {
        let snap = sample();
        let back = snap.encode().decode();

        let pos_eps = precision(POSITION_RANGE);
        for (a, b) in snap.positions.iter().zip(back.positions.iter()) {
            assert!((a.x - b.x).abs() <= pos_eps);
            assert!((a.y - b.y).abs() <= pos_eps);
        }

        let vel_eps = precision(VELOCITY_RANGE);
        assert!((snap.cue_velocity.x - back.cue_velocity.x).abs() <= vel_eps);
        assert!((snap.cue_velocity.y - back.cue_velocity.y).abs() <= vel_eps);
        assert!((snap.cue_spin.y - back.cue_spin.y).abs() <= vel_eps);
    }

    #[test]
    fn test_decoded_packet_reencodes_identically() {
        let packet = sample().encode();
        assert_eq!(packet.decode().encode(), packet);
    }

    #[test]
    fn test_flag_bits() {
        let packet = sample().encode();
        let flags = packet.0[OFFSET_FLAGS];
        // simulating, turn, foul, low owner
        assert_eq!(flags, FLAG_SIMULATING | FLAG_TURN | FLAG_FOUL | FLAG_LOW_OWNER);
    }

    #[test]
    fn test_wire_layout_is_little_endian() {
        let bytes = sample().encode().to_bytes();
        assert_eq!(bytes.len(), 80);
        // Sequence 513 = 0x0201 at unit 0x26
        assert_eq!(bytes[OFFSET_SEQUENCE * 2], 0x01);
        assert_eq!(bytes[OFFSET_SEQUENCE * 2 + 1], 0x02);
        assert_eq!(bytes[OFFSET_GAME_ID * 2], 7);
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        assert_eq!(Packet::from_bytes(&[0u8; 78]), Err(PacketError::Malformed { len: 78 }));
        assert_eq!(Packet::from_bytes(&[]), Err(PacketError::Malformed { len: 0 }));
        assert!(Packet::from_bytes(&[0u8; 81]).is_err());
    }

    #[test]
    fn test_stale_sequence_rejected() {
        let snap = sample();
        assert_eq!(
            snap.check_sequence(514),
            Err(PacketError::Stale { incoming: 513, current: 514 })
        );
        assert!(snap.check_sequence(513).is_ok());
        assert!(snap.check_sequence(0).is_ok());
    }

    #[test]
    fn test_adopt_flags() {
        let snap = sample();
        let mut state = GameState::new();
        snap.adopt_flags(&mut state);
        assert_eq!(state.turn, Seat::Second);
        assert_eq!(state.sequence, 513);
        assert!(!state.open);
        assert!(state.simulating);
    }

    #[test]
    fn test_hex_dump() {
        let hex = sample().encode().to_hex();
        assert_eq!(hex.len(), PACKET_BYTES * 2);
    }
}
