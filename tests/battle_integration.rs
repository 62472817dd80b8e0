//! Integration tests for whole battles driven through the public API.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::io::Write;

use gemrail::battle::{
    Battle, BattleEvent, EventLog, LevelConfig, LevelOptions, Outcome, Pos, SwapOutcome, SwapRejection, WordBook,
    WordDeck,
};
use gemrail::spell::{CastResult, SpellRegistry, SpellTarget};
use gemrail::ConfigError;

const WORDS: &str = "## Level 1\n火:fire\n水:water\n山:mountain\n";

/// 4x4 board with three gem types and no match anywhere, before or after
/// swapping the top-left pair.
const STALE_GRID: &str = "[[0,2,1,0],[1,0,2,1],[2,1,0,2],[0,2,1,0]]";

fn small_options() -> LevelOptions {
    LevelOptions {
        rows: 4,
        cols: 4,
        gem_types: 3,
        ..LevelOptions::default()
    }
}

fn deck() -> WordDeck {
    WordDeck::from_book(&WordBook::parse(WORDS), 1)
}

fn start(json: &str, options: &LevelOptions, seed: u64) -> (Battle, EventLog) {
    let config = LevelConfig::from_json(json).unwrap();
    let mut battle = Battle::from_config(&config, options, &SpellRegistry::with_defaults(), deck(), seed).unwrap();
    let log = EventLog::new();
    battle.set_events(Box::new(log.clone()));
    (battle, log)
}

#[test]
fn test_generated_level_one_line_up() {
    for seed in 0..20 {
        let (battle, _) = start("{}", &LevelOptions::default(), seed);
        let hp: Vec<u32> = battle.state().enemies.iter().map(|e| e.hp).collect();
        assert_eq!(hp, vec![600, 200, 200]);
        assert_eq!(hp.iter().sum::<u32>(), 1000);
        assert_eq!(battle.state().player_hp, 1000);
        assert_eq!(battle.state().primary_target(), Some(0));
    }
}

#[test]
fn test_stale_board_runs_out_of_moves() {
    let json = format!(
        r#"{{
            "level": 1,
            "player": {{"hp": 1000}},
            "config": {{"mode": "moves", "moves": 5}},
            "enemies": [{{"name": "Golem", "hp": 1000, "attack": 100, "element": 0, "turn": 3}}],
            "grid": {STALE_GRID}
        }}"#
    );
    let (mut battle, log) = start(&json, &small_options(), 9);
    let before = battle.grid().to_rows();

    for played in 1..=5 {
        let SwapOutcome::Played(report) = battle.play_swap(Pos::new(0, 0), Pos::new(0, 1)) else {
            panic!("swap {played} was rejected");
        };
        assert!(!report.matched());
        assert_eq!(battle.state().moves_left, 5 - played);
    }

    assert_eq!(battle.grid().to_rows(), before);
    assert_eq!(battle.outcome(), Some(Outcome::OutOfMoves));
    // One attack landed, on the third move.
    assert_eq!(battle.state().player_hp, 900);
    assert_eq!(log.count(&BattleEvent::GameOver), 1);
    assert_eq!(log.count(&BattleEvent::LevelComplete), 0);

    let after = battle.play_swap(Pos::new(0, 0), Pos::new(0, 1));
    assert!(matches!(
        after,
        SwapOutcome::Rejected {
            reason: SwapRejection::BattleOver
        }
    ));
}

#[test]
fn test_generated_level_one_on_a_stale_board() {
    let json = format!(
        r#"{{
            "level": 1,
            "player": {{"hp": 1000}},
            "config": {{"mode": "moves", "moves": 5}},
            "grid": {STALE_GRID}
        }}"#
    );
    let (mut battle, log) = start(&json, &small_options(), 21);

    let enemies = &battle.state().enemies;
    let hp: Vec<u32> = enemies.iter().map(|e| e.hp).collect();
    assert_eq!(hp, vec![600, 200, 200]);
    assert_eq!(hp.iter().sum::<u32>(), 1000);
    assert!(enemies[0].is_boss);
    assert!(!enemies[1].is_boss && !enemies[2].is_boss);

    for played in 1..=5 {
        let SwapOutcome::Played(report) = battle.play_swap(Pos::new(0, 0), Pos::new(0, 1)) else {
            panic!("swap {played} was rejected");
        };
        assert!(!report.matched());
        assert_eq!(battle.state().moves_left, 5 - played);
    }

    assert_eq!(battle.outcome(), Some(Outcome::OutOfMoves));
    // Boss on move 3, then each minion once on moves 4 and 5.
    assert_eq!(battle.state().player_hp, 1000 - 120 - 60 - 60);
    assert_eq!(battle.state().enemies.iter().map(|e| e.hp).sum::<u32>(), 1000);
    assert_eq!(log.count(&BattleEvent::GameOver), 1);
    assert_eq!(log.count(&BattleEvent::LevelComplete), 0);

    assert!(matches!(
        battle.play_swap(Pos::new(1, 0), Pos::new(1, 1)),
        SwapOutcome::Rejected {
            reason: SwapRejection::BattleOver
        }
    ));
    assert_eq!(log.count(&BattleEvent::GameOver), 1);
}

#[test]
fn test_spell_finishes_the_battle() {
    let json = format!(
        r#"{{
            "config": {{"moves": 5}},
            "enemies": [{{"hp": 100, "element": 0}}],
            "spirits": [{{"type": 0, "mana": 300, "spell": "fireball"}}],
            "grid": {STALE_GRID}
        }}"#
    );
    let (mut battle, log) = start(&json, &small_options(), 3);
    let outcome = battle.cast_spell(0, None);
    assert!(outcome.result.success());
    assert_eq!(battle.outcome(), Some(Outcome::Victory));
    assert_eq!(battle.state().moves_left, 5);
    assert_eq!(battle.state().spirits()[0].mana, 0);
    assert_eq!(log.count(&BattleEvent::LevelComplete), 1);
    assert_eq!(log.count(&BattleEvent::GameOver), 0);
}

#[test]
fn test_selection_spell_round_trip() {
    let json = format!(
        r#"{{
            "enemies": [{{"hp": 5000, "element": 3}}, {{"hp": 5000, "element": 3}}],
            "spirits": [{{"type": 3, "mana": 300, "spell": "lightning_strike"}}],
            "grid": {STALE_GRID}
        }}"#
    );
    let (mut battle, _) = start(&json, &small_options(), 4);

    let first = battle.cast_spell(0, None);
    assert!(matches!(first.result, CastResult::NeedsSelection { spirit: 0, .. }));
    assert_eq!(battle.pending_spell(), Some(0));
    assert_eq!(battle.state().spirits()[0].mana, 300);

    assert_eq!(battle.cancel_pending(), Some(0));
    assert_eq!(battle.pending_spell(), None);

    battle.cast_spell(0, None);
    let done = battle.complete_pending(SpellTarget::Enemy(1));
    assert!(done.result.success());
    assert_eq!(battle.pending_spell(), None);
    assert_eq!(battle.state().spirits()[0].mana, 0);
    assert!(battle.state().enemies[1].hp < 5000);
    assert_eq!(battle.state().enemies[0].hp, 5000);
}

#[test]
fn test_config_loaded_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"level": 3, "name": "Harbor", "config": {{"mode": "time", "time": 90}}}}"#).unwrap();

    let config = LevelConfig::load(file.path()).unwrap();
    assert_eq!(config.level_number(), 3);
    let battle =
        Battle::from_config(&config, &LevelOptions::default(), &SpellRegistry::with_defaults(), deck(), 1).unwrap();
    assert_eq!(battle.state().time_left, 90);
    assert_eq!(battle.state().level, 3);
}

#[test]
fn test_bad_config_is_an_error() {
    let missing = LevelConfig::load(std::path::Path::new("/nonexistent/level.json"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));

    let json = r#"{"spirits": [{"type": 0, "spell": "meteor"}]}"#;
    let config = LevelConfig::from_json(json).unwrap();
    let built = Battle::from_config(&config, &LevelOptions::default(), &SpellRegistry::with_defaults(), deck(), 1);
    assert!(matches!(built, Err(ConfigError::UnknownSpell(id)) if id == "meteor"));

    let wrong_shape = format!(r#"{{"grid": {STALE_GRID}}}"#);
    let config = LevelConfig::from_json(&wrong_shape).unwrap();
    let built = Battle::from_config(&config, &LevelOptions::default(), &SpellRegistry::with_defaults(), deck(), 1);
    assert!(matches!(built, Err(ConfigError::GridShape { .. })));
}

#[test]
fn test_time_mode_runs_out() {
    let json = format!(
        r#"{{"config": {{"mode": "time", "time": 10}}, "enemies": [{{"hp": 1000, "turn": 50}}], "grid": {STALE_GRID}}}"#
    );
    let (mut battle, log) = start(&json, &small_options(), 2);
    assert_eq!(battle.tick(4), None);
    assert_eq!(battle.tick(4), None);
    assert_eq!(battle.tick(4), Some(Outcome::OutOfTime));
    assert_eq!(battle.tick(4), Some(Outcome::OutOfTime));
    assert_eq!(log.count(&BattleEvent::GameOver), 1);
}
