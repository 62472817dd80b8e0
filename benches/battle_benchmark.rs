//! Benchmarks for the battle hot paths: match finding, cascades and spells.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use gemrail::GameRng;
use gemrail::battle::{Battle, LevelConfig, LevelOptions, MatchGrid, Pos, SwapOutcome, WordDeck};
use gemrail::spell::SpellRegistry;

fn battle(seed: u64) -> Battle {
    let config = LevelConfig::for_level(3);
    Battle::from_config(
        &config,
        &LevelOptions::default(),
        &SpellRegistry::with_defaults(),
        WordDeck::new(Vec::new()),
        seed,
    )
    .expect("level 3 builds")
}

fn bench_find_matches(c: &mut Criterion) {
    let mut rng = GameRng::new(7);
    let grid = MatchGrid::random(8, 8, 6, &mut rng);
    c.bench_function("find_matches_8x8", |b| {
        b.iter(|| black_box(black_box(&grid).find_matches()));
    });
}

fn bench_suggest_swap(c: &mut Criterion) {
    let b8 = battle(42);
    c.bench_function("suggest_swap_8x8", |b| {
        b.iter(|| black_box(black_box(&b8).suggest_swap()));
    });
}

fn bench_full_battle(c: &mut Criterion) {
    // Greedy play until the level is decided
    c.bench_function("greedy_battle_level3", |b| {
        b.iter(|| {
            let mut game = battle(black_box(42));
            for _ in 0..200 {
                let (a, bb) = game.suggest_swap().unwrap_or((Pos::new(0, 0), Pos::new(0, 1)));
                if let SwapOutcome::Rejected { .. } = game.play_swap(a, bb) {
                    break;
                }
            }
            black_box(game.outcome())
        });
    });
}

criterion_group!(benches, bench_find_matches, bench_suggest_swap, bench_full_battle);
criterion_main!(benches);
