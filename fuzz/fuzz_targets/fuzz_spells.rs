#![no_main]

use arbitrary::Arbitrary;
use gemrail::battle::{Battle, LevelConfig, LevelOptions, Pos, WordDeck};
use gemrail::spell::{SpellRegistry, SpellTarget};
use libfuzzer_sys::fuzz_target;

/// One action against a live battle.
#[derive(Arbitrary, Debug)]
enum Action {
    /// Swap a cell with its right or lower neighbour.
    Swap { cell: u8, down: bool },
    /// Cast a spirit's spell with a raw target.
    Cast { spirit: u8, target: Option<(u8, u8, u8)> },
    /// Resolve or drop a pending spell.
    Pending { target: (u8, u8, u8), cancel: bool },
    /// Let the clock run.
    Tick { seconds: u8 },
}

/// Structured input for spell fuzzing.
#[derive(Arbitrary, Debug)]
struct SpellInput {
    /// Level number, folded into 1..=20.
    level: u8,
    /// Equip random spells.
    random_spells: bool,
    /// Battle seed.
    seed: u64,
    /// Actions to play.
    actions: Vec<Action>,
}

fn target((kind, a, b): (u8, u8, u8)) -> SpellTarget {
    match kind % 4 {
        0 => SpellTarget::Enemy(usize::from(a % 5)),
        1 => SpellTarget::Row(usize::from(a % 10)),
        2 => SpellTarget::Column(usize::from(a % 10)),
        _ => SpellTarget::Cell(Pos::new(usize::from(a % 10), usize::from(b % 10))),
    }
}

fuzz_target!(|input: SpellInput| {
    let level = u32::from(input.level % 20) + 1;
    let config = LevelConfig::for_level(level);
    let options = LevelOptions {
        random_spells: input.random_spells,
        ..LevelOptions::default()
    };
    let Ok(mut battle) =
        Battle::from_config(&config, &options, &SpellRegistry::with_defaults(), WordDeck::new(Vec::new()), input.seed)
    else {
        return;
    };

    let mut decided = None;
    for action in input.actions.iter().take(64) {
        match *action {
            Action::Swap { cell, down } => {
                let r = usize::from(cell / 8 % 8);
                let c = usize::from(cell % 8);
                let b = if down { Pos::new(r + 1, c) } else { Pos::new(r, c + 1) };
                battle.play_swap(Pos::new(r, c), b);
            }
            Action::Cast { spirit, target: t } => {
                battle.cast_spell(usize::from(spirit % 6), t.map(target));
            }
            Action::Pending { target: t, cancel } => {
                if cancel {
                    battle.cancel_pending();
                } else {
                    battle.complete_pending(target(t));
                }
            }
            Action::Tick { seconds } => {
                battle.tick(u32::from(seconds));
            }
        }
        let state = battle.state();
        assert!(state.player_hp <= state.player_max_hp);
        assert!(state.enemies.iter().all(|e| e.hp <= e.max_hp));
        assert!(state.spirits().iter().all(|s| s.mana <= s.max_mana));
        // The outcome never changes once decided
        if let Some(o) = decided {
            assert_eq!(battle.outcome(), Some(o));
        }
        decided = battle.outcome();
    }
});
