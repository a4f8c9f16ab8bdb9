//! Network Layer
//!
//! Packet codec, transport capability, authority policy and the per-peer
//! table session. Logging lives here; `game/` stays silent.

pub mod packet;
pub mod transport;
pub mod authority;
pub mod session;

pub use packet::{Packet, PacketError, Snapshot, PACKET_BYTES, PACKET_UNITS};
pub use transport::{LoopbackHub, LoopbackTransport, PeerId, Transport};
pub use authority::{AuthorityCoordinator, SyncError, TurnClaim};
pub use session::{Delivery, SessionError, TableSession};
