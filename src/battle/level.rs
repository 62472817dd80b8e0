//! Level configuration and auto-generation.
//!
//! A [`LevelConfig`] mirrors the host's JSON level object. Every omitted
//! field is derived from the level number and a [`Difficulty`]. Building a
//! level is the one place in a battle where errors are returned: a config
//! that would produce an invalid board fails here, before play starts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use super::element::Element;
use super::grid::MatchGrid;
use super::state::{BattleMode, BattleState, Enemy, MAX_SPIRITS_IN_BATTLE, Spirit};
use super::terrain::TerrainGrid;
use crate::error::ConfigError;
use crate::rng::GameRng;
use crate::spell::SpellRegistry;

const BOSS_NAMES: [&str; 10] = [
    "暗影领主",
    "毁灭者",
    "深渊之王",
    "噩梦统治者",
    "混沌之主",
    "虚空行者",
    "黑暗君王",
    "末日使者",
    "幽冥霸主",
    "魔焰之王",
];

const MINION_NAMES: [&str; 10] = [
    "暗影仆从",
    "骷髅兵",
    "幽灵战士",
    "小恶魔",
    "暗影侍卫",
    "虚空爬虫",
    "地狱犬",
    "亡灵士兵",
    "噩梦魔物",
    "堕落精灵",
];

/// Chance that a level above 1 fields a lone boss.
const BOSS_ONLY_CHANCE: f64 = 0.3;

/// Difficulty preset for auto-generated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Weaker enemies, bigger budget.
    Easy,
    /// Baseline.
    #[default]
    Normal,
    /// Tougher enemies, smaller budget.
    Hard,
}

impl Difficulty {
    /// Enemy HP multiplier.
    #[must_use]
    pub const fn hp_multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    /// Default move budget.
    #[must_use]
    pub const fn moves(self) -> u32 {
        match self {
            Difficulty::Easy => 40,
            Difficulty::Normal => 30,
            Difficulty::Hard => 20,
        }
    }

    /// Default time budget in seconds.
    #[must_use]
    pub const fn time(self) -> u32 {
        match self {
            Difficulty::Easy => 120,
            Difficulty::Normal => 90,
            Difficulty::Hard => 60,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Session-wide settings that are not part of a level config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOptions {
    /// Preset for generated values.
    pub difficulty: Difficulty,
    /// Board rows.
    pub rows: usize,
    /// Board columns.
    pub cols: usize,
    /// Gem types in play, 3 to 6.
    pub gem_types: u8,
    /// Budget mode when the config does not name one.
    pub mode: BattleMode,
    /// Equip random spells instead of each element's signature spell.
    pub random_spells: bool,
}

impl Default for LevelOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            rows: 8,
            cols: 8,
            gem_types: 6,
            mode: BattleMode::Moves,
            random_spells: false,
        }
    }
}

impl LevelOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < 3 || self.cols < 3 || !(3..=6).contains(&self.gem_types) {
            return Err(ConfigError::Dimensions {
                rows: self.rows,
                cols: self.cols,
                gem_types: self.gem_types,
            });
        }
        Ok(())
    }
}

/// Player overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    /// Starting HP (default 1000).
    pub hp: Option<u32>,
    /// HP cap (default `hp`).
    pub max_hp: Option<u32>,
    /// Defense rating.
    pub defense: Option<u32>,
}

/// One configured enemy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnemyConfig {
    /// Display name.
    pub name: Option<String>,
    /// Starting HP (default 1000).
    pub hp: Option<u32>,
    /// HP cap (default `hp`).
    pub max_hp: Option<u32>,
    /// Attack (default 100).
    pub attack: Option<u32>,
    /// Element id 0 to 5 (default random).
    pub element: Option<i64>,
    /// Ticks to first attack (default 3).
    pub turn: Option<u32>,
    /// Attack interval (default `turn`).
    pub max_turn: Option<u32>,
    /// Boss flag (default: first enemy only).
    pub is_boss: Option<bool>,
    /// Defense rating.
    pub defense: Option<u32>,
}

/// One configured spirit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpiritConfig {
    /// Element id 0 to 5 (default: the spirit's index).
    #[serde(rename = "type")]
    pub element: Option<i64>,
    /// Display name.
    pub name: Option<String>,
    /// Starting mana.
    pub mana: Option<u32>,
    /// Mana cap (default 300).
    pub max_mana: Option<u32>,
    /// Damage rating (default 150).
    pub damage: Option<u32>,
    /// Defense rating.
    pub defense: Option<u32>,
    /// Spell id from the registry.
    pub spell: Option<String>,
}

/// Budget overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeConfig {
    /// Budget mode.
    pub mode: Option<BattleMode>,
    /// Move budget.
    pub moves: Option<u32>,
    /// Time budget in seconds.
    pub time: Option<u32>,
}

/// A level as supplied by the host. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelConfig {
    /// Level number (default 1).
    pub level: Option<u32>,
    /// Display name.
    pub name: Option<String>,
    /// Player overrides.
    pub player: PlayerConfig,
    /// Enemies; generated when empty.
    pub enemies: Vec<EnemyConfig>,
    /// Spirits; generated when empty.
    pub spirits: Vec<SpiritConfig>,
    /// Budget overrides.
    pub config: ModeConfig,
    /// Terrain element ids; a random pattern when absent.
    pub terrain_grid: Option<Vec<Vec<u8>>>,
    /// Starting gems; a random board when absent.
    pub grid: Option<Vec<Vec<Option<u8>>>>,
}

/// Everything needed to start play.
#[derive(Debug)]
pub struct LevelSetup {
    /// Enemies, spirits and budget.
    pub state: BattleState,
    /// Starting board, without words.
    pub grid: MatchGrid,
    /// Terrain under the board.
    pub terrain: TerrainGrid,
}

// Host configs treat 0 as "not set".
fn given(v: Option<u32>) -> Option<u32> {
    v.filter(|&n| n > 0)
}

impl LevelConfig {
    /// Parse a level from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid level.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a level from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// A config for a level number with everything else generated.
    #[must_use]
    pub fn for_level(level: u32) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }

    /// Level number, defaulting to 1.
    #[must_use]
    pub fn level_number(&self) -> u32 {
        given(self.level).unwrap_or(1)
    }

    /// Build the battle.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for bad board dimensions, a supplied grid of
    /// the wrong shape or with out-of-range values, unknown element or spell
    /// ids, and invalid spirit rosters.
    pub fn build(
        &self,
        options: &LevelOptions,
        registry: &SpellRegistry,
        rng: &mut GameRng,
    ) -> Result<LevelSetup, ConfigError> {
        options.validate()?;
        let level = self.level_number();
        let difficulty = options.difficulty;
        let mode = self.config.mode.unwrap_or(options.mode);

        let mut state = BattleState::new(level, mode);
        state.player_hp = given(self.player.hp).unwrap_or(1000);
        state.player_max_hp = given(self.player.max_hp).unwrap_or(state.player_hp);
        state.player_defense = self.player.defense.unwrap_or(0);
        match mode {
            BattleMode::Moves => state.moves_left = given(self.config.moves).unwrap_or(difficulty.moves()),
            BattleMode::Time => state.time_left = given(self.config.time).unwrap_or(difficulty.time()),
        }

        state.enemies = if self.enemies.is_empty() {
            generate_enemies(level, difficulty.hp_multiplier(), rng)
        } else {
            self.configured_enemies(rng)?
        };

        let mut spirits = if self.spirits.is_empty() {
            generate_spirits(level, rng)
        } else {
            self.configured_spirits(registry)?
        };
        if options.random_spells {
            registry.equip_random(&mut spirits, rng);
        } else {
            registry.equip_defaults(&mut spirits);
        }
        state.set_spirits(spirits)?;

        let terrain = match self.terrain_grid.as_deref() {
            Some(rows) if !rows.is_empty() => {
                check_shape("terrain", rows.iter().map(Vec::len), options)?;
                if let Some(&bad) = rows.iter().flatten().find(|&&t| t >= 6) {
                    return Err(ConfigError::UnknownElement(i64::from(bad)));
                }
                TerrainGrid::from_rows(rows)
            }
            _ => TerrainGrid::random(options.rows, options.cols, rng),
        };

        let grid = match self.grid.as_deref() {
            Some(rows) if !rows.is_empty() => {
                check_shape("gem", rows.iter().map(Vec::len), options)?;
                for (r, row) in rows.iter().enumerate() {
                    for (c, cell) in row.iter().enumerate() {
                        if let Some(value) = *cell
                            && value >= options.gem_types
                        {
                            return Err(ConfigError::GemOutOfRange {
                                row: r,
                                col: c,
                                value,
                                gem_types: options.gem_types,
                            });
                        }
                    }
                }
                MatchGrid::from_rows(rows, options.gem_types)
            }
            _ => MatchGrid::random(options.rows, options.cols, options.gem_types, rng),
        };

        let name = self.name.clone().unwrap_or_else(|| format!("Level {level}"));
        info!(
            "{name} initialized: {} enemies, {} spirits, {mode:?} mode, {difficulty}",
            state.enemies.len(),
            state.spirits().len()
        );
        Ok(LevelSetup { state, grid, terrain })
    }

    fn configured_enemies(&self, rng: &mut GameRng) -> Result<Vec<Enemy>, ConfigError> {
        let mut enemies = Vec::with_capacity(self.enemies.len());
        for (i, e) in self.enemies.iter().enumerate() {
            let element = match e.element {
                Some(id) => Element::from_id(id).ok_or(ConfigError::UnknownElement(id))?,
                None => Element::ALL[rng.index(Element::ALL.len())],
            };
            if element == Element::None {
                return Err(ConfigError::UnknownElement(-1));
            }
            let hp = given(e.hp).unwrap_or(1000);
            let turn = given(e.turn).unwrap_or(3);
            let max_turn = given(e.max_turn).unwrap_or(turn);
            enemies.push(Enemy {
                name: e.name.clone().unwrap_or_else(|| format!("Enemy {}", i + 1)),
                hp,
                max_hp: given(e.max_hp).unwrap_or(hp),
                attack: given(e.attack).unwrap_or(100),
                element,
                turn: i32::try_from(turn).unwrap_or(i32::MAX),
                max_turn: i32::try_from(max_turn).unwrap_or(i32::MAX),
                is_boss: e.is_boss.unwrap_or(i == 0),
                defense: e.defense.unwrap_or(0),
            });
        }
        Ok(enemies)
    }

    fn configured_spirits(&self, registry: &SpellRegistry) -> Result<Vec<Spirit>, ConfigError> {
        if self.spirits.len() > MAX_SPIRITS_IN_BATTLE {
            return Err(ConfigError::TooManySpirits {
                count: self.spirits.len(),
                max: MAX_SPIRITS_IN_BATTLE,
            });
        }
        let mut spirits = Vec::with_capacity(self.spirits.len());
        for (i, s) in self.spirits.iter().enumerate() {
            let id = s.element.unwrap_or(i64::try_from(i).unwrap_or(i64::MAX));
            let element = Element::from_id(id)
                .filter(|e| *e != Element::None)
                .ok_or(ConfigError::UnknownElement(id))?;
            let mut spirit = Spirit::new(element, given(s.max_mana).unwrap_or(300), given(s.damage).unwrap_or(150));
            if let Some(name) = &s.name {
                spirit.name.clone_from(name);
            }
            spirit.mana = s.mana.unwrap_or(0);
            spirit.defense = s.defense.unwrap_or(0);
            if let Some(spell) = &s.spell {
                spirit.spell = Some(
                    registry
                        .create(spell, element)
                        .ok_or_else(|| ConfigError::UnknownSpell(spell.clone()))?,
                );
            }
            spirits.push(spirit);
        }
        Ok(spirits)
    }
}

fn check_shape(
    which: &'static str,
    widths: impl Iterator<Item = usize>,
    options: &LevelOptions,
) -> Result<(), ConfigError> {
    let mut got_rows = 0;
    let mut bad_width = None;
    for w in widths {
        got_rows += 1;
        if w != options.cols && bad_width.is_none() {
            bad_width = Some(w);
        }
    }
    if got_rows != options.rows || bad_width.is_some() {
        return Err(ConfigError::GridShape {
            which,
            rows: options.rows,
            cols: options.cols,
            got_rows,
            got_cols: bad_width.unwrap_or(options.cols),
        });
    }
    Ok(())
}

/// Generate the enemy line-up for a level.
///
/// Total HP is `floor((800 + 200 * level) * hp_mult)`. Above level 1 there
/// is a 30% chance of a lone boss holding all of it; otherwise a boss holds
/// 60% and two minions 20% each.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_enemies(level: u32, hp_mult: f64, rng: &mut GameRng) -> Vec<Enemy> {
    let total = ((800.0 + 200.0 * f64::from(level)) * hp_mult).floor() as u32;
    let boss_attack = 100 + 20 * level;
    let boss_name = BOSS_NAMES[rng.index(BOSS_NAMES.len())].to_string();

    if level > 1 && rng.chance(BOSS_ONLY_CHANCE) {
        return vec![enemy(boss_name, total, boss_attack, 3, true, rng)];
    }

    let boss_hp = (f64::from(total) * 0.6).floor() as u32;
    let minion_hp = (f64::from(total) * 0.2).floor() as u32;
    let mut enemies = vec![enemy(boss_name, boss_hp, boss_attack, 3, true, rng)];
    let mut names = MINION_NAMES;
    rng.shuffle(&mut names);
    for (i, name) in names.iter().take(2).enumerate() {
        let turn = 4 + u32::try_from(i).unwrap_or(0);
        enemies.push(enemy((*name).to_string(), minion_hp, 50 + 10 * level, turn, false, rng));
    }
    enemies
}

fn enemy(name: String, hp: u32, attack: u32, turn: u32, is_boss: bool, rng: &mut GameRng) -> Enemy {
    let turn = i32::try_from(turn).unwrap_or(i32::MAX);
    Enemy {
        name,
        hp,
        max_hp: hp,
        attack,
        element: Element::ALL[rng.index(Element::ALL.len())],
        turn,
        max_turn: turn,
        is_boss,
        defense: 0,
    }
}

/// Generate a full roster: five distinct random elements.
pub fn generate_spirits(level: u32, rng: &mut GameRng) -> Vec<Spirit> {
    let mut elements = Element::ALL;
    rng.shuffle(&mut elements);
    elements
        .into_iter()
        .take(MAX_SPIRITS_IN_BATTLE)
        .map(|e| Spirit::new(e, 300, 150 + 50 * level))
        .collect()
}
