// Benchmarks for the simulation hot path: generating a star system and
// advancing it at 60 Hz, with and without the autopilot flying.
//
// Run with `cargo bench -p space_sim`.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use space_namer::CatalogNamer;
use space_sim::{Universe, UniverseConfig};

const FRAME_NANOS: i64 = 16_666_667;
const INITIAL_NANOS: i64 = 1_000_000;

fn primed(seed: i64, autopilot: bool) -> Universe {
    let mut universe = Universe::generate(Box::new(CatalogNamer::default()), seed, UniverseConfig::default());
    universe.set_autopilot(autopilot);
    universe.step(INITIAL_NANOS);
    universe
}

fn run_frames(universe: &mut Universe, frames: i64) {
    let mut t = INITIAL_NANOS;
    for _ in 0..frames {
        t += FRAME_NANOS;
        universe.step(t);
    }
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_system", |b| {
        let mut seed = 0;
        b.iter(|| {
            seed += 1;
            black_box(Universe::generate(
                Box::new(CatalogNamer::default()),
                seed,
                UniverseConfig::default(),
            ))
        })
    });
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_one_second");
    for (label, autopilot) in [("manual", false), ("autopilot", true)] {
        group.bench_function(label, |b| {
            b.iter_batched(
                || primed(42, autopilot),
                |mut universe| {
                    run_frames(&mut universe, 60);
                    black_box(universe.ship().body.pos)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_step);
criterion_main!(benches);
