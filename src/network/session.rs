//! Table Session
//!
//! Drives one peer's replica of the table: steps physics, judges settled
//! shots when holding authority, publishes packets, and adopts packets from
//! the other side.
//!
//! ## Frame flow
//!
//! ```text
//!   update(dt) ──► accumulate ──► step × n ──► settled?
//!                                               │
//!                     authority ◄───────────────┤
//!                     judge → publish → read back → (re-arm)
//!                                               │
//!                     observer  ◄───────────────┘
//!                     apply deferred packet
//! ```
//!
//! Every publish is also applied locally ("read back"), so the authority
//! runs on exactly the decoded values its peers see.

use tracing::{debug, error, info, warn};

use crate::config::TableConfig;
use crate::core::hash::{StateDigest, StateHasher};
use crate::core::vec2::Vec2;
use crate::game::events::TableEvent;
use crate::game::input::{Reposition, ShotInput};
use crate::game::physics::{PhysicsEngine, StepOutcome};
use crate::game::rules::{self, Outcome, ShotRecord};
use crate::game::state::{GameState, PocketMask, Seat, TableTint, CUE_BALL};
use crate::game::table::FIXED_STEP;
use crate::network::authority::{AuthorityCoordinator, SyncError, TurnClaim};
use crate::network::packet::{Packet, PacketError, Snapshot};
use crate::network::transport::Transport;

/// Local command rejections and sync faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Shooter has no permit.
    #[error("Shot not permitted")]
    NotPermitted,

    /// This peer does not hold write authority.
    #[error("Not the authority holder")]
    NoAuthority,

    /// Cue ball overlaps another ball.
    #[error("Cue ball is touching another ball")]
    CueObstructed,

    /// No cue placement was granted.
    #[error("Cue ball placement not granted")]
    NotRepositioning,

    /// Shot velocity is non-finite or out of wire range.
    #[error("Invalid shot")]
    InvalidShot,

    /// A game is still running.
    #[error("Game in progress")]
    GameInProgress,

    /// Missing the totem this command requires.
    #[error("Not holding the required totem")]
    NotTotemHolder,

    /// Incoming packet rejected.
    #[error("Packet rejected: {0}")]
    Packet(#[from] PacketError),

    /// Replicas cannot agree on authority.
    #[error("Sync fault: {0}")]
    Sync(#[from] SyncError),
}

/// What happened to a remote packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Decoded and adopted.
    Applied,
    /// Held until the local simulation settles.
    Deferred,
    /// Identical to the previous packet.
    Duplicate,
}

/// One peer's view of the table.
pub struct TableSession<T: Transport> {
    config: TableConfig,
    state: GameState,
    engine: PhysicsEngine,
    authority: AuthorityCoordinator<T>,
    events: Vec<TableEvent>,
    accumulator: f32,
    pocketed_at_shot: PocketMask,
    reposition: Option<Reposition>,
    last_received: Option<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

impl<T: Transport> TableSession<T> {
    /// Create an idle table (game over, nobody's turn armed).
    pub fn new(transport: T, config: TableConfig) -> Self {
        let engine = PhysicsEngine::new(config.rack.clone());
        Self {
            config,
            state: GameState::new(),
            engine,
            authority: AuthorityCoordinator::new(transport),
            events: Vec::new(),
            accumulator: 0.0,
            pocketed_at_shot: PocketMask::EMPTY,
            reposition: None,
            last_received: None,
            pending: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Synchronised state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Physics replica.
    pub fn engine(&self) -> &PhysicsEngine {
        &self.engine
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        self.authority.transport()
    }

    /// Do we hold write authority?
    pub fn has_authority(&self) -> bool {
        self.authority.has_authority()
    }

    /// Current cue placement grant.
    pub fn reposition(&self) -> Option<Reposition> {
        self.reposition
    }

    /// A remote packet is waiting for local settlement.
    pub fn has_pending_update(&self) -> bool {
        self.pending.is_some()
    }

    /// Per-seat score card.
    pub fn score_card(&self) -> [u32; 2] {
        self.state.score_card()
    }

    /// Table tint for the seat whose turn it is.
    pub fn tint(&self) -> TableTint {
        self.state.tint_for(self.state.turn)
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Digest of the synchronised state and the physics replica.
    pub fn digest(&self) -> StateDigest {
        let mut hasher = StateHasher::for_table_state();
        self.state.hash_into(&mut hasher);
        self.engine.hash_into(&mut hasher);
        hasher.finalize()
    }

    // =========================================================================
    // Frame driver
    // =========================================================================

    /// Advance by a frame delta (seconds).
    pub fn update(&mut self, dt: f32) -> Result<(), SessionError> {
        if !self.state.simulating {
            return Ok(());
        }

        let dt = if dt.is_finite() { dt.clamp(0.0, self.config.max_frame_delta) } else { 0.0 };
        self.accumulator += dt;

        while self.accumulator >= FIXED_STEP && self.state.simulating {
            self.accumulator -= FIXED_STEP;

            if self.engine.step(&mut self.state, &mut self.events) == StepOutcome::Settled {
                self.on_settled()?;
            }
        }

        Ok(())
    }

    fn on_settled(&mut self) -> Result<(), SessionError> {
        self.state.simulating = false;
        self.accumulator = 0.0;

        #[cfg(feature = "debug-tracing")]
        tracing::trace!("Settled after {} steps", self.engine.steps());

        if self.authority.has_authority() {
            return self.resolve_turn();
        }

        if let Some(bytes) = self.pending.take() {
            debug!("Applying update deferred during simulation");
            self.apply_bytes(&bytes)?;
        }
        Ok(())
    }

    /// Judge the shot that just settled and publish the verdict.
    fn resolve_turn(&mut self) -> Result<(), SessionError> {
        let shot = ShotRecord {
            pocketed_before: self.pocketed_at_shot,
            first_hit: self.engine.first_hit(),
        };
        let ruling = rules::judge(&self.state, &shot);
        info!(
            "Shot by {:?} ruled {:?} (foul: {:?}, loss: {:?})",
            ruling.shooter, ruling.outcome, ruling.foul, ruling.loss
        );

        ruling.apply(&mut self.state);
        self.events.extend(ruling.events());
        if ruling.assigned.is_some() {
            self.push_tint(ruling.shooter);
        }
        if let Outcome::GameOver { winner } = ruling.outcome {
            self.push_tint(winner);
        }

        let packet = self.publish(ruling.next_turn());
        self.apply(&packet)?;

        if ruling.rearms_shooter() {
            self.new_turn();
        }
        Ok(())
    }

    /// Arm the shooter's turn and publish it.
    fn new_turn(&mut self) {
        let setup = rules::arm_turn(&mut self.state);
        if let Some(grant) = setup.reposition {
            self.reposition = Some(grant);
        }
        if setup.respot_cue {
            self.engine.respot_cue_ball();
        }
        self.engine.reset_first_hit();

        debug!("Turn armed for {:?}", self.state.turn);
        self.publish(self.state.turn);
    }

    // =========================================================================
    // Local commands
    // =========================================================================

    /// Strike the cue ball.
    pub fn take_shot(&mut self, shot: ShotInput) -> Result<(), SessionError> {
        if !self.state.permit {
            return Err(SessionError::NotPermitted);
        }
        if !self.authority.has_authority() {
            return Err(SessionError::NoAuthority);
        }
        if !shot.is_valid() {
            return Err(SessionError::InvalidShot);
        }
        if self.reposition.is_some() && self.engine.cue_contacting(self.state.pocketed) {
            return Err(SessionError::CueObstructed);
        }

        self.engine.load_shot(shot.velocity, shot.spin);
        self.state.permit = false;
        self.state.simulating = true;
        self.pocketed_at_shot = self.state.pocketed;
        self.reposition = None;

        info!("{:?} shoots at {}", self.state.turn, shot.velocity);
        let packet = self.publish(self.state.turn);
        self.apply(&packet)
    }

    /// Move the cue ball while placement is granted. Returns whether it now
    /// touches another ball.
    pub fn move_cue_ball(&mut self, requested: Vec2) -> Result<bool, SessionError> {
        let grant = self.reposition.ok_or(SessionError::NotRepositioning)?;
        if !self.authority.has_authority() {
            return Err(SessionError::NoAuthority);
        }

        self.engine.place_cue_ball(grant.clamp(requested));
        Ok(self.engine.cue_contacting(self.state.pocketed))
    }

    /// Commit the cue placement and publish it.
    pub fn finalize_reposition(&mut self) -> Result<(), SessionError> {
        if self.reposition.is_none() {
            return Err(SessionError::NotRepositioning);
        }
        if !self.authority.has_authority() {
            return Err(SessionError::NoAuthority);
        }
        if self.engine.cue_contacting(self.state.pocketed) {
            return Err(SessionError::CueObstructed);
        }

        self.reposition = None;
        debug!("Cue ball placed at {}", self.engine.position(CUE_BALL));
        self.publish(self.state.turn);
        Ok(())
    }

    /// Rack a fresh game. First-seat owner only, and only once the previous
    /// game is over.
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        if !self.authority.may_start_new_game() {
            return Err(SessionError::NotTotemHolder);
        }
        if !self.state.game_over {
            warn!("New game refused: game in progress");
            return Err(SessionError::GameInProgress);
        }

        self.authority.request_authority();
        self.state.game_id = self.state.game_id.saturating_add(1);
        self.state.reset_for_break();
        self.engine.rack();
        self.pocketed_at_shot = PocketMask::EMPTY;
        info!("Starting game {}", self.state.game_id);

        self.events.push(TableEvent::NewGame { game_id: self.state.game_id });
        self.events.push(TableEvent::TintChanged { tint: TableTint::Open });
        if self.state.turn != Seat::First {
            self.state.turn = Seat::First;
            self.events.push(TableEvent::TurnChanged { turn: Seat::First });
        }

        self.reposition = Some(Reposition::kitchen());
        self.new_turn();
        Ok(())
    }

    /// End the running game. Either seat owner.
    pub fn force_end_game(&mut self) -> Result<(), SessionError> {
        if !self.authority.may_force_end() {
            return Err(SessionError::NotTotemHolder);
        }

        warn!("Ending game {} early", self.state.game_id);
        self.authority.request_authority();

        self.state.game_over = true;
        self.state.simulating = false;
        self.state.permit = false;
        self.state.sequence = self.state.sequence.saturating_add(2);
        self.reposition = None;
        self.accumulator = 0.0;

        self.events.push(TableEvent::GameOver { winner: self.state.winner, loss: None });
        self.push_tint(self.state.winner);

        self.publish(self.state.turn);
        Ok(())
    }

    // =========================================================================
    // Packets
    // =========================================================================

    /// Encode the table with `turn` as the turn and broadcast it.
    fn publish(&mut self, turn: Seat) -> Packet {
        self.state.next_sequence();
        self.engine.snap_to_wire();

        let packet = Snapshot::capture(&self.state, &self.engine, turn).encode();
        if self.config.dump_packets {
            debug!("Publish #{}: {}", packet.sequence(), packet.to_hex());
        }
        self.authority.push(&packet);
        packet
    }

    /// Entry point for bytes delivered by the transport.
    pub fn on_remote_packet(&mut self, bytes: &[u8]) -> Result<Delivery, SessionError> {
        if self.last_received.as_deref() == Some(bytes) {
            return Ok(Delivery::Duplicate);
        }
        self.last_received = Some(bytes.to_vec());

        if self.state.simulating {
            debug!("Simulation running, deferring update");
            self.pending = Some(bytes.to_vec());
            return Ok(Delivery::Deferred);
        }

        self.apply_bytes(bytes)?;
        Ok(Delivery::Applied)
    }

    fn apply_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let packet = Packet::from_bytes(bytes).map_err(|e| {
            warn!("{}; dropping update", e);
            e
        })?;
        self.apply(&packet)
    }

    /// Adopt a packet: every field first, then side effects.
    fn apply(&mut self, packet: &Packet) -> Result<(), SessionError> {
        let snapshot = packet.decode();
        if let Err(e) = snapshot.check_sequence(self.state.sequence) {
            warn!("{}; dropping update", e);
            return Err(e.into());
        }
        if self.config.dump_packets {
            debug!("Apply #{}: {}", snapshot.sequence, packet.to_hex());
        }

        let prev = self.state.clone();
        snapshot.adopt_flags(&mut self.state);
        self.engine
            .load_snapshot(&snapshot.positions, snapshot.cue_velocity, snapshot.cue_spin);

        if self.state.game_id > prev.game_id {
            info!("Game {} started remotely", self.state.game_id);
            self.events.push(TableEvent::NewGame { game_id: self.state.game_id });
            self.events.push(TableEvent::TintChanged { tint: TableTint::Open });
        }

        if !self.state.permit {
            self.reposition = None;
        }

        let mut fault = None;
        if self.state.turn != prev.turn {
            let turn = self.state.turn;
            self.events.push(TableEvent::TurnChanged { turn });
            self.push_tint(turn);

            match self.authority.claim_turn(turn, self.state.simulating) {
                Ok(TurnClaim::Claimed) => {
                    info!("Turn passed to local {:?}", turn);
                    self.new_turn();
                }
                Ok(TurnClaim::NotMine) => debug!("Turn passed to remote {:?}", turn),
                Err(e) => {
                    error!("{}; no recovery attempted", e);
                    fault = Some(e);
                }
            }
        }

        if prev.open && !self.state.open {
            let shooter = self.state.turn;
            self.events.push(TableEvent::GroupsAssigned {
                shooter,
                shooter_group: self.state.group_of(shooter),
            });
            self.push_tint(shooter);
        }

        if !prev.game_over && self.state.game_over {
            info!("Game over, {:?} wins", self.state.winner);
            self.events.push(TableEvent::GameOver { winner: self.state.winner, loss: None });
            self.push_tint(self.state.winner);
        }

        match fault {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn push_tint(&mut self, seat: Seat) {
        self.events.push(TableEvent::TintChanged { tint: self.state.tint_for(seat) });
    }
}

// =============================================================================
// TESTS
// =============================================================================
