//! Transport Capability
//!
//! The session never talks to a network directly. It pushes finished packets
//! through a `Transport` and asks it who holds write authority and which
//! participant owns each totem. Delivery runs the other way: whoever owns
//! the real channel calls `TableSession::on_remote_packet`.
//!
//! `LoopbackHub` is an in-process double: authority moves on request, and
//! every push is queued for every other peer until pumped.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::state::Seat;

/// What the session needs from the networked-property layer.
pub trait Transport {
    /// Hand a packet to the network for distribution.
    fn push(&mut self, bytes: &[u8]);

    /// Does this process currently hold write authority?
    fn is_local_authority(&self) -> bool;

    /// Ask for write authority. May be granted later.
    fn request_authority(&mut self);

    /// Does this process hold the totem for `seat`?
    fn holds_totem(&self, seat: Seat) -> bool;
}

// =============================================================================
// PEER IDENTITY
// =============================================================================

/// Unique participant identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

// =============================================================================
// LOOPBACK
// =============================================================================

#[derive(Debug, Default)]
struct HubInner {
    authority: Option<PeerId>,
    totems: [Option<PeerId>; 2],
    inboxes: BTreeMap<PeerId, VecDeque<Vec<u8>>>,
    pushed: u64,
}

/// Shared in-process relay.
#[derive(Clone, Debug, Default)]
pub struct LoopbackHub {
    inner: Rc<RefCell<HubInner>>,
}

impl LoopbackHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new participant.
    pub fn join(&self) -> LoopbackTransport {
        let id = PeerId::generate();
        self.inner.borrow_mut().inboxes.insert(id, VecDeque::new());
        LoopbackTransport { id, hub: self.clone() }
    }

    /// Hand a totem to a participant.
    pub fn assign_totem(&self, seat: Seat, peer: PeerId) {
        self.inner.borrow_mut().totems[seat.index()] = Some(peer);
    }

    /// Current authority holder.
    pub fn authority(&self) -> Option<PeerId> {
        self.inner.borrow().authority
    }

    /// Take every packet waiting for `peer`, oldest first.
    pub fn drain(&self, peer: PeerId) -> Vec<Vec<u8>> {
        self.inner
            .borrow_mut()
            .inboxes
            .get_mut(&peer)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Packets waiting across all inboxes.
    pub fn pending(&self) -> usize {
        self.inner.borrow().inboxes.values().map(VecDeque::len).sum()
    }

    /// Total packets ever pushed.
    pub fn pushed(&self) -> u64 {
        self.inner.borrow().pushed
    }
}

/// One participant's handle on a `LoopbackHub`.
#[derive(Clone, Debug)]
pub struct LoopbackTransport {
    id: PeerId,
    hub: LoopbackHub,
}

impl LoopbackTransport {
    /// This participant's id.
    pub fn id(&self) -> PeerId {
        self.id
    }
}

impl Transport for LoopbackTransport {
    fn push(&mut self, bytes: &[u8]) {
        let mut inner = self.hub.inner.borrow_mut();
        inner.pushed += 1;
        for (peer, inbox) in inner.inboxes.iter_mut() {
            if *peer != self.id {
                inbox.push_back(bytes.to_vec());
            }
        }
    }

    fn is_local_authority(&self) -> bool {
        self.hub.inner.borrow().authority == Some(self.id)
    }

    fn request_authority(&mut self) {
        self.hub.inner.borrow_mut().authority = Some(self.id);
    }

    fn holds_totem(&self, seat: Seat) -> bool {
        self.hub.inner.borrow().totems[seat.index()] == Some(self.id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_reaches_everyone_else() {
        let hub = LoopbackHub::new();
        let mut a = hub.join();
        let b = hub.join();
        let c = hub.join();

        a.push(&[1, 2, 3]);

        assert!(hub.drain(a.id()).is_empty());
        assert_eq!(hub.drain(b.id()), vec![vec![1, 2, 3]]);
        assert_eq!(hub.drain(c.id()), vec![vec![1, 2, 3]]);
        assert_eq!(hub.pending(), 0);
        assert_eq!(hub.pushed(), 1);
    }

    #[test]
    fn test_authority_moves_on_request() {
        let hub = LoopbackHub::new();
        let mut a = hub.join();
        let mut b = hub.join();

        assert!(!a.is_local_authority());
        a.request_authority();
        assert!(a.is_local_authority());

        b.request_authority();
        assert!(!a.is_local_authority());
        assert!(b.is_local_authority());
        assert_eq!(hub.authority(), Some(b.id()));
    }

    #[test]
    fn test_totems() {
        let hub = LoopbackHub::new();
        let a = hub.join();
        let b = hub.join();
        hub.assign_totem(Seat::First, a.id());
        hub.assign_totem(Seat::Second, b.id());

        assert!(a.holds_totem(Seat::First));
        assert!(!a.holds_totem(Seat::Second));
        assert!(b.holds_totem(Seat::Second));
    }

    #[test]
    fn test_peer_id_display() {
        let id = PeerId::generate();
        assert_eq!(id.to_string().len(), 8);
    }
}
