//! Eightball Sync Demo
//!
//! Two peers on an in-process relay play scripted shots and prove after
//! every exchange that their replicas are bit-identical.
//!
//! Usage: `eightball-demo [config.json]`. Log level comes from `RUST_LOG`.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use eightball::{
    ShotInput, TableConfig, TableEvent, TableSession, Vec2, VERSION,
    network::transport::{LoopbackHub, LoopbackTransport},
    game::state::{Seat, CUE_BALL},
    game::table::{TABLE_HEIGHT, TABLE_WIDTH},
};

type Peer = TableSession<LoopbackTransport>;

/// Scripted aims, cycled shot by shot.
const AIMS: [(f32, f32, f32); 6] = [
    (1.0, 0.01, 1.0),
    (1.0, 0.35, 0.6),
    (-0.4, 1.0, 0.5),
    (0.8, -0.6, 0.8),
    (-1.0, -0.2, 0.7),
    (0.3, 0.9, 0.9),
];

const MAX_SHOTS: usize = 40;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = match std::env::args().nth(1) {
        Some(path) => TableConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => TableConfig::default(),
    };

    info!("Eightball Sync v{}", VERSION);
    demo_game(config)
}

/// Deliver queued packets until the relay is empty.
fn pump(hub: &LoopbackHub, peers: &mut [&mut Peer; 2]) -> Result<()> {
    while hub.pending() > 0 {
        for peer in peers.iter_mut() {
            for bytes in hub.drain(peer.transport().id()) {
                peer.on_remote_packet(&bytes)?;
            }
        }
    }
    Ok(())
}

fn log_events(name: &str, peer: &mut Peer) {
    for event in peer.take_events() {
        match event {
            TableEvent::BallsCollided { .. } => {}
            TableEvent::BallPocketed { ball, good } => {
                info!("[{}] ball {} pocketed ({})", name, ball, if good { "good" } else { "bad" });
            }
            other => info!("[{}] {}: {:?}", name, other.label(), other),
        }
    }
}

/// Keep the current spot if clear, otherwise walk a coarse grid.
fn place_cue_ball(peer: &mut Peer) -> Result<()> {
    let start = peer.engine().position(CUE_BALL);
    if !peer.move_cue_ball(start)? {
        return peer.finalize_reposition().map_err(Into::into);
    }

    for i in 0..96 {
        let spot = Vec2::new(
            -TABLE_WIDTH * 0.9 + (i / 8) as f32 * 0.16,
            -TABLE_HEIGHT * 0.9 + (i % 8) as f32 * 0.155,
        );
        if !peer.move_cue_ball(spot)? {
            return peer.finalize_reposition().map_err(Into::into);
        }
    }
    bail!("no free spot for the cue ball")
}

fn demo_game(config: TableConfig) -> Result<()> {
    let hub = LoopbackHub::new();
    let (ta, tb) = (hub.join(), hub.join());
    hub.assign_totem(Seat::First, ta.id());
    hub.assign_totem(Seat::Second, tb.id());
    info!("Peer A {} holds seat 0, peer B {} holds seat 1", ta.id(), tb.id());

    let mut a = TableSession::new(ta, config.clone());
    let mut b = TableSession::new(tb, config);

    a.new_game()?;
    pump(&hub, &mut [&mut a, &mut b])?;

    for (shot_no, &(x, y, power)) in AIMS.iter().cycle().take(MAX_SHOTS).enumerate() {
        if a.state().game_over {
            break;
        }

        let shooter = if a.has_authority() { &mut a } else { &mut b };
        if shooter.reposition().is_some() {
            place_cue_ball(shooter)?;
        }

        info!("Shot {} by {:?}", shot_no + 1, shooter.state().turn);
        shooter.take_shot(ShotInput::strike(Vec2::new(x, y), power, 0.0))?;
        pump(&hub, &mut [&mut a, &mut b])?;

        // Peers render at different frame rates
        let mut frames = 0u32;
        while a.state().simulating || b.state().simulating || hub.pending() > 0 {
            a.update(1.0 / 60.0)?;
            b.update(1.0 / 45.0)?;
            pump(&hub, &mut [&mut a, &mut b])?;
            frames += 1;
            if frames > 100_000 {
                bail!("table never settled");
            }
        }

        log_events("A", &mut a);
        log_events("B", &mut b);

        if a.digest() != b.digest() {
            bail!("replicas diverged after shot {}", shot_no + 1);
        }
        info!("Replicas agree: {}", &hex::encode(a.digest())[..16]);
    }

    let card = a.score_card();
    info!("=== Result ===");
    if a.state().game_over {
        info!("Winner: {:?}", a.state().winner);
    } else {
        info!("No winner after {} shots", MAX_SHOTS);
    }
    info!("Score: seat 0 = {}, seat 1 = {}", card[0], card[1]);
    info!("Final digest: {}", hex::encode(a.digest()));

    Ok(())
}
