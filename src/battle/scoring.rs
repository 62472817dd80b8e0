//! Match scoring tables.

use serde::Serialize;

/// Base score for a match of `gem_count` gems.
///
/// Runs shorter than three score nothing through this table.
#[must_use]
pub const fn base_score(gem_count: usize) -> u32 {
    match gem_count {
        0..=2 => 0,
        3 => 100,
        4 => 180,
        5 => 300,
        _ => 450,
    }
}

/// Multiplier for matched gems sitting on terrain of their own element.
#[must_use]
pub const fn terrain_bonus(matching_terrain: usize) -> f64 {
    match matching_terrain {
        0 => 1.0,
        1 => 1.25,
        2 => 1.5,
        3 => 2.0,
        4 => 3.5,
        5 => 5.0,
        _ => 8.0,
    }
}

/// Multiplier for the 1-based cascade index. Index 0 is treated as 1.
#[must_use]
pub const fn combo_multiplier(combo: u32) -> f64 {
    match combo {
        0 | 1 => 1.0,
        2 => 1.2,
        3 => 1.5,
        4 => 2.0,
        5 => 3.0,
        _ => 4.0,
    }
}

/// Breakdown of a scored match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    /// Final floored score.
    pub total: u32,
    /// Base score from the gem count.
    pub base: u32,
    /// Terrain multiplier applied.
    pub terrain_bonus: f64,
    /// Combo multiplier applied.
    pub combo_multiplier: f64,
}

/// Score a match: `floor(base × terrain × combo)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_match_score(gem_count: usize, matching_terrain: usize, combo: u32) -> MatchScore {
    let base = base_score(gem_count);
    let terrain = terrain_bonus(matching_terrain);
    let combo_mult = combo_multiplier(combo);
    let total = (f64::from(base) * terrain * combo_mult).floor() as u32;
    MatchScore {
        total,
        base,
        terrain_bonus: terrain,
        combo_multiplier: combo_mult,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_score() {
        assert_eq!(calculate_match_score(3, 0, 1).total, 100);
    }

    #[test]
    fn test_combined_multipliers() {
        assert_eq!(calculate_match_score(4, 2, 2).total, 324);
    }

    #[test]
    fn test_large_values_clamp_to_top_tier() {
        assert_eq!(base_score(12), 450);
        assert!((terrain_bonus(40) - 8.0).abs() < f64::EPSILON);
        assert!((combo_multiplier(17) - 4.0).abs() < f64::EPSILON);
        assert_eq!(calculate_match_score(9, 9, 9).total, 450 * 8 * 4);
    }

    #[test]
    fn test_short_runs_score_zero() {
        assert_eq!(calculate_match_score(2, 0, 1).total, 0);
    }
}
