//! Benchmarks for the per-tick driver.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use particle_player_core::{
    config::{LoopSetting, ParticleCount, PlayerConfig},
    engine::ParticlePlayer,
    stored_animation::ParticleAnimation,
    visual::RetainedFactory,
};

/// `frames` frames of `particles` particles, each alive in every frame.
fn synthetic(frames: usize, particles: usize) -> ParticleAnimation {
    let frames_json: Vec<String> = (0..frames)
        .map(|f| {
            let entries: Vec<String> = (0..particles)
                .map(|p| format!("[{},{},{}]", p, f * 10, p + f))
                .collect();
            format!("[{}]", entries.join(","))
        })
        .collect();
    let json = format!(
        r#"{{"frames":[{}],"precision":100}}"#,
        frames_json.join(",")
    );
    serde_json::from_str(&json).expect("synthetic animation")
}

fn bench_full_pool_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pool_tick");

    for particles in [64usize, 256, 1024] {
        let cfg = PlayerConfig {
            cache: 5,
            count: ParticleCount::Percent(50),
            duration_ms: 500,
            interpolate: true,
            loop_setting: LoopSetting::Forever,
            on: "manual".into(),
            ..Default::default()
        };
        let mut player =
            ParticlePlayer::with_seed(RetainedFactory::default(), cfg, synthetic(60, particles), 7)
                .expect("player");
        for _ in 0..5 {
            player.activate(None);
            player.update(37.0);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(particles),
            &particles,
            |b, _| {
                b.iter(|| {
                    black_box(player.update(black_box(16.0)).events.len());
                });
            },
        );
    }

    group.finish();
}

fn bench_fixture_tick(c: &mut Criterion) {
    let anim: ParticleAnimation =
        particle_test_fixtures::animations::load("staggered-burst").expect("fixture");
    let cfg = PlayerConfig {
        loop_setting: LoopSetting::Forever,
        ..Default::default()
    };
    let mut player =
        ParticlePlayer::with_seed(RetainedFactory::default(), cfg, anim, 7).expect("player");

    c.bench_function("staggered_burst_tick", |b| {
        b.iter(|| {
            black_box(player.update(black_box(16.0)).events.len());
        });
    });
}

criterion_group!(benches, bench_full_pool_tick, bench_fixture_tick);
criterion_main!(benches);
