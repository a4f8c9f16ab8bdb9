use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eightball::game::physics::{PhysicsEngine, StepOutcome};
use eightball::game::state::GameState;
use eightball::network::packet::{Packet, Snapshot};
use eightball::{Seat, Vec2};

fn bench_break_shot(c: &mut Criterion) {
    c.bench_function("break_shot_until_settled", |b| {
        let mut events = Vec::with_capacity(256);
        b.iter(|| {
            let mut engine = PhysicsEngine::default();
            let mut state = GameState::new();
            state.game_over = false;
            events.clear();

            engine.load_shot(black_box(Vec2::new(14.0, 0.15)), Vec2::ZERO);
            while engine.step(&mut state, &mut events) == StepOutcome::Moving {}
            black_box(state.pocketed)
        });
    });
}

fn bench_packet_round_trip(c: &mut Criterion) {
    let engine = PhysicsEngine::default();
    let state = GameState::new();
    let bytes = Snapshot::capture(&state, &engine, Seat::First).encode().to_bytes();

    c.bench_function("packet_decode", |b| {
        b.iter(|| {
            let packet = Packet::from_bytes(black_box(&bytes)).unwrap();
            black_box(packet.decode())
        });
    });
}

criterion_group!(benches, bench_break_shot, bench_packet_round_trip);
criterion_main!(benches);
