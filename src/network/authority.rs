//! Authority Coordinator
//!
//! Decides when this peer may mutate the shared table.
//!
//! ```text
//!   holder ── continue ──► keeps authority
//!   holder ── transfer / game over ──► broadcast ──► receiver decodes turn
//!                                                        │
//!                         receiver holds that totem? ◄───┘
//!                           yes, not simulating ──► request authority
//!                           yes, simulating     ──► AuthorityDeadlock
//! ```

use crate::game::state::Seat;
use crate::network::packet::Packet;
use crate::network::transport::Transport;

/// Unrecoverable synchronisation faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Turn moved to us while the table is still rolling.
    #[error("Authority deadlock: turn passed to {turn:?} while simulating")]
    AuthorityDeadlock {
        /// Turn that could not be claimed.
        turn: Seat,
    },
}

/// Result of a turn hand-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnClaim {
    /// We hold the totem and now hold authority.
    Claimed,
    /// The turn belongs to someone else.
    NotMine,
}

/// Wraps the transport with the authority policy.
#[derive(Debug)]
pub struct AuthorityCoordinator<T: Transport> {
    transport: T,
}

impl<T: Transport> AuthorityCoordinator<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Do we currently hold write authority?
    #[inline]
    pub fn has_authority(&self) -> bool {
        self.transport.is_local_authority()
    }

    /// Ask the transport for authority.
    pub fn request_authority(&mut self) {
        self.transport.request_authority();
    }

    /// Do we own the totem for `seat`?
    #[inline]
    pub fn holds_totem(&self, seat: Seat) -> bool {
        self.transport.holds_totem(seat)
    }

    /// Handle a decoded turn that differs from the one we held.
    pub fn claim_turn(&mut self, turn: Seat, simulating: bool) -> Result<TurnClaim, SyncError> {
        if !self.holds_totem(turn) {
            return Ok(TurnClaim::NotMine);
        }
        if simulating {
            return Err(SyncError::AuthorityDeadlock { turn });
        }
        self.transport.request_authority();
        Ok(TurnClaim::Claimed)
    }

    /// Only the first-seat owner starts games.
    pub fn may_start_new_game(&self) -> bool {
        self.holds_totem(Seat::First)
    }

    /// Either seat owner may end a game.
    pub fn may_force_end(&self) -> bool {
        self.holds_totem(Seat::First) || self.holds_totem(Seat::Second)
    }

    /// Broadcast a packet.
    pub fn push(&mut self, packet: &Packet) {
        self.transport.push(&packet.to_bytes());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::transport::LoopbackHub;

    #[test]
    fn test_claim_turn_for_own_seat() {
        let hub = LoopbackHub::new();
        let t = hub.join();
        hub.assign_totem(Seat::Second, t.id());
        let mut coord = AuthorityCoordinator::new(t);

        assert!(!coord.has_authority());
        assert_eq!(coord.claim_turn(Seat::Second, false), Ok(TurnClaim::Claimed));
        assert!(coord.has_authority());
    }

    #[test]
    fn test_claim_turn_for_other_seat() {
        let hub = LoopbackHub::new();
        let t = hub.join();
        hub.assign_totem(Seat::Second, t.id());
        let mut coord = AuthorityCoordinator::new(t);

        assert_eq!(coord.claim_turn(Seat::First, false), Ok(TurnClaim::NotMine));
        assert!(!coord.has_authority());
    }

    #[test]
    fn test_claim_while_simulating_deadlocks() {
        let hub = LoopbackHub::new();
        let t = hub.join();
        hub.assign_totem(Seat::First, t.id());
        let mut coord = AuthorityCoordinator::new(t);

        assert_eq!(
            coord.claim_turn(Seat::First, true),
            Err(SyncError::AuthorityDeadlock { turn: Seat::First })
        );
        assert!(!coord.has_authority());
    }

    #[test]
    fn test_game_control_permissions() {
        let hub = LoopbackHub::new();
        let first = hub.join();
        let second = hub.join();
        let watcher = hub.join();
        hub.assign_totem(Seat::First, first.id());
        hub.assign_totem(Seat::Second, second.id());

        let first = AuthorityCoordinator::new(first);
        let second = AuthorityCoordinator::new(second);
        let watcher = AuthorityCoordinator::new(watcher);

        assert!(first.may_start_new_game());
        assert!(!second.may_start_new_game());
        assert!(second.may_force_end());
        assert!(!watcher.may_force_end());
    }

    #[test]
    fn test_push_goes_through_transport() {
        let hub = LoopbackHub::new();
        let mut coord = AuthorityCoordinator::new(hub.join());
        let other = hub.join();

        coord.push(&Packet([0; crate::network::packet::PACKET_UNITS]));
        let inbox = hub.drain(other.id());
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].len(), crate::network::packet::PACKET_BYTES);
    }
}
