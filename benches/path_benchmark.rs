//! Performance benchmarks for path compilation and scenario playback
//!
//! - **compile**: fold `compile_step` over paths of increasing length on
//!   mixed terrain
//! - **collapse**: compile, collapse lateral triples and recompile
//! - **scenario**: play the bundled skirmish from the lounge to its last round

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hexbattle_rs::{
    board::{HexBoard, HexTerrain, TerrainKind},
    core::{EntityId, Facing, HexCoord, MovementStats, PlayerId, Unit, UnitCategory},
    game::{OutputMode, Scenario},
    movement::{
        LateralDirection, MoveContext, MovePath, MoveState, MoveStepType, MovementConfig,
        MovementRules,
    },
};
use std::path::Path;
use MoveStepType::*;

fn mixed_board() -> HexBoard {
    let mut board = HexBoard::with_radius(30);
    for q in -30..=30 {
        for r in -30..=30 {
            let kind = match (q * 7 + r * 13).rem_euclid(5) {
                0 => TerrainKind::LightWoods,
                1 => TerrainKind::Rough,
                2 => TerrainKind::Pavement,
                _ => TerrainKind::Clear,
            };
            board.set(HexCoord::new(q, r), HexTerrain::new(kind, (q + r).rem_euclid(2)));
        }
    }
    board
}

fn quad_config() -> MovementConfig {
    let unit = Unit::new(
        EntityId::new(1),
        PlayerId::new(1),
        "Goliath",
        UnitCategory::QuadMech,
        MovementStats::walking(200),
    );
    MovementConfig::from_profile(&unit, &MovementRules::default())
}

fn zigzag(len: usize) -> Vec<MoveStepType> {
    [Forwards, TurnLeft, Forwards, TurnRight, Forwards, TurnRight, Forwards, TurnLeft]
        .into_iter()
        .cycle()
        .take(len)
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let board = mixed_board();
    let config = quad_config();
    let ctx = MoveContext::new(&config, &board);
    let start = MoveState::start(HexCoord::ORIGIN, Facing::NORTH, 0, false);

    let mut group = c.benchmark_group("compile");
    for len in [8, 32, 128] {
        let steps = zigzag(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &steps, |b, steps| {
            b.iter(|| {
                let path = MovePath::compiled(EntityId::new(1), steps, start.clone(), &ctx);
                black_box(path.mp_used())
            })
        });
    }
    group.finish();
}

fn bench_collapse(c: &mut Criterion) {
    let board = mixed_board();
    let config = quad_config();
    let ctx = MoveContext::new(&config, &board);
    let start = MoveState::start(HexCoord::ORIGIN, Facing::NORTH, 0, false);
    let steps = zigzag(64);

    c.bench_function("collapse/64", |b| {
        b.iter(|| {
            let mut path = MovePath::compiled(EntityId::new(1), &steps, start.clone(), &ctx);
            path.collapse_to_lateral_shifts(LateralDirection::Forward);
            path.recompile(&ctx);
            black_box(path.len())
        })
    });
}

fn bench_scenario(c: &mut Criterion) {
    let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/skirmish.json");
    let scenario = Scenario::load(file).expect("Failed to load skirmish scenario");

    c.bench_function("scenario/skirmish", |b| {
        b.iter(|| {
            let mut game = scenario.build().expect("Failed to build scenario");
            game.reports_mut().set_output_mode(OutputMode::Memory);
            let outcome = scenario.play(&mut game).expect("Scenario failed");
            black_box(outcome.hash)
        })
    });
}

criterion_group!(benches, bench_compile, bench_collapse, bench_scenario);
criterion_main!(benches);
