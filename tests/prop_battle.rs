//! Property-based tests for the battle engine.
//!
//! Run with: cargo test --release prop_battle

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use gemrail::GameRng;
use gemrail::battle::{
    ADVANTAGE, BattleMode, BattleState, DISADVANTAGE, Element, Enemy, EnemyTarget, GravityMove, MatchGrid, Pos,
    base_score, calculate_match_score, damage_modifier, modified_damage,
};

fn grid_rows(max_side: usize, gem_types: u8) -> impl Strategy<Value = Vec<Vec<Option<u8>>>> {
    (3..=max_side, 3..=max_side).prop_flat_map(move |(rows, cols)| {
        prop::collection::vec(prop::collection::vec(prop::option::weighted(0.9, 0..gem_types), cols), rows)
    })
}

fn full_rows(max_side: usize) -> impl Strategy<Value = Vec<Vec<Option<u8>>>> {
    (3..=max_side, 3..=max_side).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec((0u8..6).prop_map(Some), cols), rows)
    })
}

fn element() -> impl Strategy<Value = Element> {
    prop::sample::select(vec![
        Element::Forge,
        Element::Tide,
        Element::Life,
        Element::Sol,
        Element::Stone,
        Element::Root,
        Element::None,
    ])
}

fn enemy(hp: u32, is_boss: bool) -> Enemy {
    Enemy {
        name: "e".to_string(),
        hp,
        max_hp: hp.max(1),
        attack: 10,
        element: Element::None,
        turn: 3,
        max_turn: 3,
        is_boss,
        defense: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Every matched cell holds a gem, and a match is never smaller than a run.
    #[test]
    fn prop_matches_are_filled_cells(rows in grid_rows(8, 4)) {
        let grid = MatchGrid::from_rows(&rows, 4);
        let matched = grid.find_matches();
        prop_assert!(matched.is_empty() || matched.len() >= 3);
        for pos in &matched {
            prop_assert!(grid.gem(*pos).is_some());
        }
        let mut sorted = matched.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted, matched);
    }

    /// Gravity refills exactly what was cleared and leaves no hole.
    #[test]
    fn prop_gravity_conserves_gems(
        rows in full_rows(8),
        picks in prop::collection::vec((0usize..8, 0usize..8), 0..20),
        seed in any::<u64>(),
    ) {
        let mut grid = MatchGrid::from_rows(&rows, 6);
        let cells: Vec<Pos> = picks
            .into_iter()
            .map(|(r, c)| Pos::new(r, c))
            .filter(|p| grid.in_bounds(*p))
            .collect();
        let cleared = grid.clear(&cells);
        let mut rng = GameRng::new(seed);
        let moves = grid.apply_gravity(&mut rng);

        let spawns = moves.iter().filter(|m| matches!(m, GravityMove::Spawn { .. })).count();
        prop_assert_eq!(spawns, cleared.len());
        prop_assert!(grid.positions().all(|p| grid.gem(p).is_some()));

        let before: usize = rows.iter().flatten().count();
        let after = grid.count_by_type().iter().sum::<usize>();
        prop_assert_eq!(before, after);
    }

    /// Advantage one way is disadvantage the other way.
    #[test]
    fn prop_modifier_antisymmetric(a in element(), b in element(), amount in 0u32..100_000) {
        let ab = damage_modifier(a, b);
        let ba = damage_modifier(b, a);
        if ab > 1.0 {
            prop_assert!((ab - ADVANTAGE).abs() < 1e-9);
            prop_assert!((ba - DISADVANTAGE).abs() < 1e-9);
        } else if ab < 1.0 {
            prop_assert!((ba - ADVANTAGE).abs() < 1e-9);
        } else {
            prop_assert!((ba - 1.0).abs() < 1e-9);
        }
        let dealt = modified_damage(amount, a, b);
        prop_assert!(dealt <= amount + amount / 5);
    }

    /// Scores follow the table and the multipliers.
    #[test]
    fn prop_score_floor(gems in 0usize..12, terrain in 0usize..10, combo in 0u32..10) {
        let s = calculate_match_score(gems, terrain, combo);
        prop_assert_eq!(s.base, base_score(gems));
        prop_assert!(s.terrain_bonus >= 1.0 && s.combo_multiplier >= 1.0);
        prop_assert!(s.total >= s.base);
        if gems >= 3 {
            prop_assert!(s.total >= 100);
        }
    }

    /// Deciding a battle is idempotent.
    #[test]
    fn prop_win_check_idempotent(
        hps in prop::collection::vec(0u32..500, 1..4),
        player_hp in 0u32..100,
        moves in 0u32..3,
    ) {
        let mut state = BattleState::new(1, BattleMode::Moves);
        state.player_hp = player_hp;
        state.moves_left = moves;
        state.enemies = hps.iter().map(|&hp| enemy(hp, false)).collect();
        let first = state.check_win_condition();
        let outcome = state.outcome();
        prop_assert_eq!(state.check_win_condition(), first);
        prop_assert_eq!(state.outcome(), outcome);
        prop_assert_eq!(first, outcome.is_some());
    }

    /// Single-target damage lands on the living boss whatever index is asked for.
    #[test]
    fn prop_boss_absorbs_single_target(
        hps in prop::collection::vec(1u32..1000, 2..5),
        boss in 0usize..5,
        asked in 0usize..8,
        amount in 1u32..200,
    ) {
        let boss = boss % hps.len();
        let mut state = BattleState::new(1, BattleMode::Moves);
        state.moves_left = 10;
        state.enemies = hps.iter().enumerate().map(|(i, &hp)| enemy(hp, i == boss)).collect();
        let hits = state.damage_enemy(amount, Element::None, EnemyTarget::Index(asked));
        prop_assert_eq!(hits.len(), 1);
        prop_assert_eq!(hits[0].index, boss);
        for (i, e) in state.enemies.iter().enumerate() {
            if i != boss {
                prop_assert_eq!(e.hp, hps[i]);
            }
        }
    }
}

#[test]
fn test_score_reference_points() {
    assert_eq!(calculate_match_score(3, 0, 1).total, 100);
    assert_eq!(calculate_match_score(4, 2, 2).total, 324);
}
