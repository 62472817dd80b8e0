//! The gem grid and its word overlay.

// Gem values are drawn below `gem_types`, which is a u8
#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::words::{WordDeck, WordPair};
use crate::rng::GameRng;

/// Target number of English words on the board, decoys included.
pub const MAX_EN_WORDS: usize = 4;

/// Attempts to place decoy words per repair pass.
const DECOY_ATTEMPTS: usize = 20;

/// Cells absorbed around a 2x2 block, relative to its top-left corner.
const BLOCK_RING: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (2, 0),
    (2, 1),
    (0, -1),
    (1, -1),
    (0, 2),
    (1, 2),
];

/// A cell position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    /// Row, 0 at the top.
    pub r: usize,
    /// Column, 0 at the left.
    pub c: usize,
}

impl Pos {
    /// Create a new position.
    #[must_use]
    pub const fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }

    /// True if the two positions share an edge.
    #[must_use]
    pub const fn is_adjacent(self, other: Pos) -> bool {
        self.r.abs_diff(other.r) + self.c.abs_diff(other.c) == 1
    }

    /// Chebyshev (king move) distance.
    #[must_use]
    pub const fn chebyshev(self, other: Pos) -> usize {
        let dr = self.r.abs_diff(other.r);
        let dc = self.c.abs_diff(other.c);
        if dr > dc { dr } else { dc }
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Pos> {
        Some(Pos::new(
            self.r.checked_add_signed(dr)?,
            self.c.checked_add_signed(dc)?,
        ))
    }
}

/// Language of an overlay word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Chinese prompt word.
    Cn,
    /// English answer or decoy.
    En,
}

/// A word printed on top of a gem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordCell {
    /// The word text.
    pub word: String,
    /// Its language.
    pub lang: Language,
}

impl WordCell {
    /// A Chinese word cell.
    #[must_use]
    pub fn cn(word: impl Into<String>) -> Self {
        Self { word: word.into(), lang: Language::Cn }
    }

    /// An English word cell.
    #[must_use]
    pub fn en(word: impl Into<String>) -> Self {
        Self { word: word.into(), lang: Language::En }
    }
}

/// One step of a gravity pass, for animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GravityMove {
    /// An existing gem fell from one cell to another.
    Fall {
        /// Where it was.
        from: Pos,
        /// Where it landed.
        to: Pos,
    },
    /// A fresh gem appeared.
    Spawn {
        /// Where it appeared.
        to: Pos,
        /// Its gem type.
        gem: u8,
    },
}

/// A cell removed from the board, with what it held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearedCell {
    /// The cell.
    pub pos: Pos,
    /// The gem that was there.
    pub gem: u8,
    /// The word that was there, if any.
    pub word: Option<WordCell>,
}

/// The authoritative gem and word grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGrid {
    rows: usize,
    cols: usize,
    gem_types: u8,
    gems: Vec<Option<u8>>,
    words: Vec<Option<WordCell>>,
}

impl MatchGrid {
    /// An empty grid: every cell is awaiting refill.
    #[must_use]
    pub fn empty(rows: usize, cols: usize, gem_types: u8) -> Self {
        Self {
            rows,
            cols,
            gem_types,
            gems: vec![None; rows * cols],
            words: vec![None; rows * cols],
        }
    }

    /// A random grid with no initial horizontal or vertical run of three.
    pub fn random(rows: usize, cols: usize, gem_types: u8, rng: &mut GameRng) -> Self {
        let mut grid = Self::empty(rows, cols, gem_types);
        for r in 0..rows {
            for c in 0..cols {
                let mut blocked = Vec::with_capacity(2);
                if c >= 2 {
                    let left = grid.gem(Pos::new(r, c - 1));
                    if left.is_some() && left == grid.gem(Pos::new(r, c - 2)) {
                        blocked.extend(left);
                    }
                }
                if r >= 2 {
                    let up = grid.gem(Pos::new(r - 1, c));
                    if up.is_some() && up == grid.gem(Pos::new(r - 2, c)) {
                        blocked.extend(up);
                    }
                }
                let allowed: Vec<u8> = (0..gem_types).filter(|g| !blocked.contains(g)).collect();
                let gem = match rng.choose(&allowed) {
                    Some(&g) => g,
                    None => rng.below(u32::from(gem_types)) as u8,
                };
                grid.set_gem(Pos::new(r, c), Some(gem));
            }
        }
        grid
    }

    /// Build from explicit rows. Caller validates the shape and values.
    #[must_use]
    pub fn from_rows(rows: &[Vec<Option<u8>>], gem_types: u8) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let gems: Vec<Option<u8>> = rows.iter().flatten().copied().collect();
        Self {
            rows: rows.len(),
            cols,
            gem_types,
            words: vec![None; gems.len()],
            gems,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of gem types in play.
    #[must_use]
    pub const fn gem_types(&self) -> u8 {
        self.gem_types
    }

    /// True if the position lies on the board.
    #[must_use]
    pub const fn in_bounds(&self, pos: Pos) -> bool {
        pos.r < self.rows && pos.c < self.cols
    }

    fn idx(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.r * self.cols + pos.c)
    }

    /// Gem at a cell. `None` for empty or out-of-bounds cells.
    #[must_use]
    pub fn gem(&self, pos: Pos) -> Option<u8> {
        self.idx(pos).and_then(|i| self.gems[i])
    }

    /// Set the gem at a cell. Out-of-bounds writes are ignored.
    pub fn set_gem(&mut self, pos: Pos, gem: Option<u8>) {
        if let Some(i) = self.idx(pos) {
            self.gems[i] = gem;
        }
    }

    /// Word overlay at a cell.
    #[must_use]
    pub fn word(&self, pos: Pos) -> Option<&WordCell> {
        self.idx(pos).and_then(|i| self.words[i].as_ref())
    }

    /// Set the word overlay at a cell. Out-of-bounds writes are ignored.
    pub fn set_word(&mut self, pos: Pos, word: Option<WordCell>) {
        if let Some(i) = self.idx(pos) {
            self.words[i] = word;
        }
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Pos::new(r, c)))
    }

    /// Gem rows, for renderers and reports.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Option<u8>>> {
        self.gems.chunks(self.cols.max(1)).map(<[Option<u8>]>::to_vec).collect()
    }

    /// Count of each gem type on the board, indexed by type.
    #[must_use]
    pub fn count_by_type(&self) -> Vec<usize> {
        let mut counts = vec![0; usize::from(self.gem_types)];
        for gem in self.gems.iter().flatten() {
            if let Some(slot) = counts.get_mut(usize::from(*gem)) {
                *slot += 1;
            }
        }
        counts
    }

    /// Find every matched cell.
    ///
    /// Matches are horizontal and vertical runs of three or more and 2x2
    /// blocks. A block also absorbs same-type cells in the ring of eight
    /// cells bordering it. The result is deduplicated and row-major sorted.
    #[must_use]
    pub fn find_matches(&self) -> Vec<Pos> {
        let mut found = BTreeSet::new();

        for r in 0..self.rows {
            for c in 0..self.cols.saturating_sub(2) {
                let a = Pos::new(r, c);
                if let Some(t) = self.gem(a)
                    && self.gem(Pos::new(r, c + 1)) == Some(t)
                    && self.gem(Pos::new(r, c + 2)) == Some(t)
                {
                    found.extend([a, Pos::new(r, c + 1), Pos::new(r, c + 2)]);
                }
            }
        }

        for c in 0..self.cols {
            for r in 0..self.rows.saturating_sub(2) {
                let a = Pos::new(r, c);
                if let Some(t) = self.gem(a)
                    && self.gem(Pos::new(r + 1, c)) == Some(t)
                    && self.gem(Pos::new(r + 2, c)) == Some(t)
                {
                    found.extend([a, Pos::new(r + 1, c), Pos::new(r + 2, c)]);
                }
            }
        }

        for r in 0..self.rows.saturating_sub(1) {
            for c in 0..self.cols.saturating_sub(1) {
                let corner = Pos::new(r, c);
                let Some(t) = self.gem(corner) else { continue };
                let block = [corner, Pos::new(r, c + 1), Pos::new(r + 1, c), Pos::new(r + 1, c + 1)];
                if block.iter().all(|&p| self.gem(p) == Some(t)) {
                    found.extend(block);
                    for (dr, dc) in BLOCK_RING {
                        if let Some(p) = corner.offset(dr, dc)
                            && self.gem(p) == Some(t)
                        {
                            found.insert(p);
                        }
                    }
                }
            }
        }

        found.into_iter().collect()
    }

    /// Exchange gems and words between two cells. No adjacency check.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        if let (Some(i), Some(j)) = (self.idx(a), self.idx(b)) {
            self.gems.swap(i, j);
            self.words.swap(i, j);
        }
    }

    /// Empty the given cells, returning what they held.
    ///
    /// Already-empty and out-of-bounds cells are skipped.
    pub fn clear(&mut self, cells: &[Pos]) -> Vec<ClearedCell> {
        let mut cleared = Vec::with_capacity(cells.len());
        for &pos in cells {
            let Some(i) = self.idx(pos) else { continue };
            if let Some(gem) = self.gems[i].take() {
                cleared.push(ClearedCell {
                    pos,
                    gem,
                    word: self.words[i].take(),
                });
            }
        }
        cleared
    }

    /// Compact each column downward and refill the top with random gems.
    ///
    /// Words fall with their gems; spawned gems carry no word. The returned
    /// log lists falls then spawns per column, bottom-up.
    pub fn apply_gravity(&mut self, rng: &mut GameRng) -> Vec<GravityMove> {
        let mut moves = Vec::new();
        for c in 0..self.cols {
            let mut empty_row = self.rows;
            for r in (0..self.rows).rev() {
                let from = Pos::new(r, c);
                if self.gem(from).is_some() {
                    empty_row -= 1;
                    if empty_row != r {
                        let to = Pos::new(empty_row, c);
                        self.swap(from, to);
                        moves.push(GravityMove::Fall { from, to });
                    }
                }
            }
            for r in (0..empty_row).rev() {
                let to = Pos::new(r, c);
                let gem = rng.below(u32::from(self.gem_types)) as u8;
                self.set_gem(to, Some(gem));
                self.set_word(to, None);
                moves.push(GravityMove::Spawn { to, gem });
            }
        }
        moves
    }

    fn word_cells(&self) -> Vec<(Pos, &WordCell)> {
        self.positions().filter_map(|p| self.word(p).map(|w| (p, w))).collect()
    }

    /// Pick a cell for a new word, or `None` if every filled cell has one.
    ///
    /// Prefers inner columns at least two cells (Chebyshev) from every
    /// existing word, falling back to any filled cell without a word.
    pub fn valid_spot(&self, rng: &mut GameRng) -> Option<Pos> {
        let existing: Vec<Pos> = self.word_cells().into_iter().map(|(p, _)| p).collect();
        let free: Vec<Pos> = self
            .positions()
            .filter(|&p| self.gem(p).is_some() && self.word(p).is_none())
            .collect();

        let strict: Vec<Pos> = free
            .iter()
            .copied()
            .filter(|p| p.c != 0 && p.c + 1 != self.cols)
            .filter(|p| existing.iter().all(|w| w.chebyshev(*p) >= 2))
            .collect();

        if let Some(&spot) = rng.choose(&strict) {
            return Some(spot);
        }
        rng.choose(&free).copied()
    }

    /// Repair the word overlay.
    ///
    /// Ensures the deck has a current pair, that its Chinese word is on the
    /// board when no Chinese word is, that its English word is on the board,
    /// and tops English decoys up to [`MAX_EN_WORDS`]. Placement that finds
    /// no spot is skipped. Returns the cells that received a word.
    pub fn ensure_words(&mut self, deck: &mut WordDeck, rng: &mut GameRng) -> Vec<Pos> {
        let mut changed = Vec::new();
        let mut on_board: BTreeSet<String> = BTreeSet::new();
        let mut cn_count = 0;
        let mut en_count = 0;
        let mut first_cn: Option<String> = None;
        let mut en_words: Vec<String> = Vec::new();
        for (_, w) in self.word_cells() {
            on_board.insert(w.word.clone());
            match w.lang {
                Language::Cn => {
                    cn_count += 1;
                    if first_cn.is_none() {
                        first_cn = Some(w.word.clone());
                    }
                }
                Language::En => {
                    en_count += 1;
                    en_words.push(w.word.clone());
                }
            }
        }

        if deck.current().is_none() {
            let adopted = if let Some(cn) = first_cn {
                deck.live_pair_by_cn(&cn)
            } else if !en_words.is_empty() && rng.chance(0.7) {
                rng.choose(&en_words).and_then(|en| deck.live_pair_by_en(en))
            } else {
                None
            };
            match adopted {
                Some(pair) => deck.set_current(pair),
                None => deck.draw_current(rng),
            }
        }
        let pair = deck.current().cloned().unwrap_or_else(WordPair::placeholder);

        if cn_count == 0 {
            if let Some(spot) = self.valid_spot(rng) {
                self.set_word(spot, Some(WordCell::cn(pair.cn.clone())));
                on_board.insert(pair.cn.clone());
                changed.push(spot);
            } else {
                warn!("no free cell for word '{}'", pair.cn);
            }
        }

        let has_target_en = self.word_cells().iter().any(|(_, w)| w.word == pair.en);
        if !has_target_en {
            if let Some(spot) = self.valid_spot(rng) {
                self.set_word(spot, Some(WordCell::en(pair.en.clone())));
                on_board.insert(pair.en.clone());
                en_count += 1;
                changed.push(spot);
            } else {
                warn!("no free cell for word '{}'", pair.en);
            }
        }

        let mut attempts = 0;
        while en_count < MAX_EN_WORDS && attempts < DECOY_ATTEMPTS {
            let Some(spot) = self.valid_spot(rng) else { break };
            let decoys: Vec<&WordPair> = deck
                .available()
                .iter()
                .filter(|p| p.en != pair.en && !on_board.contains(&p.en))
                .collect();
            let Some(decoy) = rng.choose(&decoys) else { break };
            let en = decoy.en.clone();
            self.set_word(spot, Some(WordCell::en(en.clone())));
            on_board.insert(en);
            en_count += 1;
            attempts += 1;
            changed.push(spot);
        }

        debug!("word repair placed {} words", changed.len());
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[u8]]) -> MatchGrid {
        let rows: Vec<Vec<Option<u8>>> = rows.iter().map(|r| r.iter().map(|&g| Some(g)).collect()).collect();
        MatchGrid::from_rows(&rows, 6)
    }

    fn deck() -> WordDeck {
        WordDeck::new(vec![
            WordPair::new("火", "fire"),
            WordPair::new("水", "water"),
            WordPair::new("木", "wood"),
            WordPair::new("金", "gold"),
            WordPair::new("土", "earth"),
            WordPair::new("日", "sun"),
        ])
    }

    #[test]
    fn test_horizontal_match() {
        let g = grid(&[&[1, 1, 1, 2], &[3, 4, 5, 0], &[2, 3, 4, 5]]);
        assert_eq!(g.find_matches(), vec![Pos::new(0, 0), Pos::new(0, 1), Pos::new(0, 2)]);
    }

    #[test]
    fn test_vertical_match() {
        let g = grid(&[&[1, 2, 3], &[1, 3, 4], &[1, 4, 5], &[0, 5, 0]]);
        assert_eq!(g.find_matches(), vec![Pos::new(0, 0), Pos::new(1, 0), Pos::new(2, 0)]);
    }

    #[test]
    fn test_cross_match_is_deduplicated() {
        let g = grid(&[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]]);
        let m = g.find_matches();
        assert_eq!(m.len(), 5);
        assert!(m.contains(&Pos::new(1, 1)));
    }

    #[test]
    fn test_block_absorbs_ring() {
        let g = grid(&[&[5, 2, 2, 5], &[3, 2, 2, 2], &[4, 2, 2, 3], &[0, 1, 4, 0]]);
        let m = g.find_matches();
        // 2x2 blocks at rows 0-1 and 1-2; ring picks up (1,3), vertical runs in cols 1 and 2
        assert!(m.contains(&Pos::new(1, 3)));
        assert!(m.contains(&Pos::new(0, 1)));
        assert!(m.contains(&Pos::new(2, 2)));
        assert!(!m.contains(&Pos::new(0, 0)));
        assert_eq!(m.len(), 7);
    }

    #[test]
    fn test_block_ring_is_not_recursive() {
        // Block at top-left; (0,2) joins through the ring but (0,3) does not.
        let g = grid(&[&[1, 1, 1, 1], &[1, 1, 0, 2], &[3, 4, 5, 0]]);
        let m = g.find_matches();
        // The horizontal run covers the whole top row, so (0,3) is matched by the run.
        assert!(m.contains(&Pos::new(0, 3)));
        let g = grid(&[&[1, 1, 2, 1], &[1, 1, 1, 0], &[3, 4, 5, 0]]);
        let m = g.find_matches();
        assert!(m.contains(&Pos::new(1, 2)));
        assert!(!m.contains(&Pos::new(0, 3)));
    }

    #[test]
    fn test_matches_skip_empty_cells() {
        let g = MatchGrid::from_rows(&[vec![None, None, None], vec![None, None, None]], 6);
        assert!(g.find_matches().is_empty());
    }

    #[test]
    fn test_swap_moves_words() {
        let mut g = grid(&[&[1, 2]]);
        g.set_word(Pos::new(0, 0), Some(WordCell::cn("火")));
        g.swap(Pos::new(0, 0), Pos::new(0, 1));
        assert_eq!(g.gem(Pos::new(0, 0)), Some(2));
        assert_eq!(g.word(Pos::new(0, 1)).unwrap().word, "火");
        assert!(g.word(Pos::new(0, 0)).is_none());
    }

    #[test]
    fn test_gravity_compacts_and_refills() {
        let mut g = MatchGrid::from_rows(
            &[vec![Some(1), Some(2)], vec![None, Some(3)], vec![Some(4), None]],
            6,
        );
        g.set_word(Pos::new(0, 0), Some(WordCell::en("fire")));
        let mut rng = GameRng::new(1);
        let moves = g.apply_gravity(&mut rng);
        assert_eq!(g.gem(Pos::new(2, 0)), Some(4));
        assert_eq!(g.gem(Pos::new(1, 0)), Some(1));
        assert_eq!(g.word(Pos::new(1, 0)).unwrap().word, "fire");
        assert_eq!(g.gem(Pos::new(2, 1)), Some(3));
        assert_eq!(g.gem(Pos::new(1, 1)), Some(2));
        assert!(g.positions().all(|p| g.gem(p).is_some()));
        let spawns = moves.iter().filter(|m| matches!(m, GravityMove::Spawn { .. })).count();
        assert_eq!(spawns, 2);
        assert!(moves.contains(&GravityMove::Fall { from: Pos::new(0, 0), to: Pos::new(1, 0) }));
    }

    #[test]
    fn test_random_grid_has_no_runs() {
        let mut rng = GameRng::new(42);
        for _ in 0..20 {
            let g = MatchGrid::random(8, 8, 6, &mut rng);
            let m = g.find_matches();
            // 2x2 blocks are allowed at start; runs of three are not.
            for p in &m {
                let t = g.gem(*p);
                let row_run = p.c >= 2 && g.gem(Pos::new(p.r, p.c - 1)) == t && g.gem(Pos::new(p.r, p.c - 2)) == t;
                let col_run = p.r >= 2 && g.gem(Pos::new(p.r - 1, p.c)) == t && g.gem(Pos::new(p.r - 2, p.c)) == t;
                assert!(!row_run && !col_run);
            }
        }
    }

    #[test]
    fn test_clear_returns_contents() {
        let mut g = grid(&[&[1, 2, 3]]);
        g.set_word(Pos::new(0, 1), Some(WordCell::en("water")));
        let cleared = g.clear(&[Pos::new(0, 1), Pos::new(0, 1), Pos::new(5, 5)]);
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].gem, 2);
        assert!(g.gem(Pos::new(0, 1)).is_none());
        assert!(g.word(Pos::new(0, 1)).is_none());
    }

    #[test]
    fn test_valid_spot_prefers_inner_spaced_cells() {
        let mut rng = GameRng::new(9);
        let mut g = MatchGrid::random(8, 8, 6, &mut rng);
        g.set_word(Pos::new(3, 3), Some(WordCell::cn("火")));
        for _ in 0..50 {
            let spot = g.valid_spot(&mut rng).unwrap();
            assert!(spot.c != 0 && spot.c != 7);
            assert!(spot.chebyshev(Pos::new(3, 3)) >= 2);
        }
    }

    #[test]
    fn test_valid_spot_falls_back_then_gives_up() {
        let mut g = grid(&[&[1, 2]]);
        let mut rng = GameRng::new(2);
        assert!(g.valid_spot(&mut rng).is_some());
        g.set_word(Pos::new(0, 0), Some(WordCell::en("a")));
        g.set_word(Pos::new(0, 1), Some(WordCell::en("b")));
        assert!(g.valid_spot(&mut rng).is_none());
    }

    #[test]
    fn test_ensure_words_places_pair_and_decoys() {
        let mut rng = GameRng::new(4);
        let mut g = MatchGrid::random(8, 8, 6, &mut rng);
        let mut d = deck();
        g.ensure_words(&mut d, &mut rng);
        let pair = d.current().unwrap().clone();
        let cells: Vec<&WordCell> = g.positions().filter_map(|p| g.word(p)).collect();
        assert_eq!(cells.iter().filter(|w| w.lang == Language::Cn).count(), 1);
        assert!(cells.iter().any(|w| w.word == pair.cn));
        assert!(cells.iter().any(|w| w.word == pair.en));
        assert_eq!(cells.iter().filter(|w| w.lang == Language::En).count(), MAX_EN_WORDS);
    }

    #[test]
    fn test_ensure_words_is_idempotent() {
        let mut rng = GameRng::new(8);
        let mut g = MatchGrid::random(8, 8, 6, &mut rng);
        let mut d = deck();
        g.ensure_words(&mut d, &mut rng);
        let before = g.clone();
        let changed = g.ensure_words(&mut d, &mut rng);
        assert!(changed.is_empty());
        assert_eq!(g, before);
    }

    #[test]
    fn test_ensure_words_adopts_board_cn() {
        let mut rng = GameRng::new(8);
        let mut g = MatchGrid::random(8, 8, 6, &mut rng);
        g.set_word(Pos::new(4, 4), Some(WordCell::cn("木")));
        let mut d = deck();
        g.ensure_words(&mut d, &mut rng);
        assert_eq!(d.current().unwrap().en, "wood");
    }

    #[test]
    fn test_ensure_words_full_board_is_noop() {
        let mut g = grid(&[&[1]]);
        g.set_word(Pos::new(0, 0), Some(WordCell::en("gold")));
        let mut d = deck();
        let mut rng = GameRng::new(3);
        let changed = g.ensure_words(&mut d, &mut rng);
        assert!(changed.is_empty());
        assert!(d.current().is_some());
    }
}
