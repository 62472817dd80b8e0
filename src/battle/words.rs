//! Vocabulary pairs and the per-level word deck.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rng::GameRng;

/// A Chinese word and its English translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordPair {
    /// Chinese word.
    pub cn: String,
    /// English translation.
    pub en: String,
}

impl WordPair {
    /// Create a pair.
    #[must_use]
    pub fn new(cn: impl Into<String>, en: impl Into<String>) -> Self {
        Self { cn: cn.into(), en: en.into() }
    }

    /// Stand-in pair used when a level has no vocabulary.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new("空", "Empty")
    }
}

/// Word lists keyed by level.
///
/// Parsed from text where `## Level N` starts a level and each
/// `中文:english` line adds a pair to it. Lines before the first header,
/// blank lines and lines without both halves are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBook {
    levels: BTreeMap<u32, Vec<WordPair>>,
}

impl WordBook {
    /// Parse word list text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut levels: BTreeMap<u32, Vec<WordPair>> = BTreeMap::new();
        let mut current: Option<u32> = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let lower = line.to_lowercase();
            if let Some(rest) = lower.strip_prefix("## level") {
                current = rest.trim().parse().ok().filter(|&n| n > 0);
                if let Some(n) = current {
                    levels.entry(n).or_default();
                }
                continue;
            }
            let Some((cn, en)) = line.split_once(':') else { continue };
            let (cn, en) = (cn.trim(), en.trim());
            if let Some(level) = current
                && !cn.is_empty()
                && !en.is_empty()
            {
                levels.entry(level).or_default().push(WordPair::new(cn, en));
            }
        }
        Self { levels }
    }

    /// Read and parse a word list file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Pairs for a level, falling back to level 1 when the level is empty.
    #[must_use]
    pub fn pairs_for(&self, level: u32) -> Vec<WordPair> {
        self.levels
            .get(&level)
            .filter(|p| !p.is_empty())
            .or_else(|| self.levels.get(&1))
            .cloned()
            .unwrap_or_default()
    }

    /// Levels present in the book.
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }
}

/// The active level's vocabulary with crushed/available tracking.
///
/// Every pair is in exactly one of the two pools. When the available pool
/// runs dry it is refilled from the full list and the crushed pool cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDeck {
    pairs: Vec<WordPair>,
    available: Vec<WordPair>,
    crushed: BTreeSet<WordPair>,
    current: Option<WordPair>,
    next: Option<WordPair>,
}

impl WordDeck {
    /// A deck over the given pairs. An empty list becomes the placeholder pair.
    #[must_use]
    pub fn new(pairs: Vec<WordPair>) -> Self {
        let pairs = if pairs.is_empty() { vec![WordPair::placeholder()] } else { pairs };
        Self {
            available: pairs.clone(),
            pairs,
            crushed: BTreeSet::new(),
            current: None,
            next: None,
        }
    }

    /// A deck for one level of a word book.
    #[must_use]
    pub fn from_book(book: &WordBook, level: u32) -> Self {
        Self::new(book.pairs_for(level))
    }

    /// Every pair in the level.
    #[must_use]
    pub fn pairs(&self) -> &[WordPair] {
        &self.pairs
    }

    /// Pairs not yet crushed this cycle.
    #[must_use]
    pub fn available(&self) -> &[WordPair] {
        &self.available
    }

    /// Pairs crushed this cycle.
    #[must_use]
    pub const fn crushed(&self) -> &BTreeSet<WordPair> {
        &self.crushed
    }

    /// The pair currently being asked.
    #[must_use]
    pub const fn current(&self) -> Option<&WordPair> {
        self.current.as_ref()
    }

    /// Make a pair current.
    pub fn set_current(&mut self, pair: WordPair) {
        self.current = Some(pair);
    }

    /// True if the pair was crushed this cycle.
    #[must_use]
    pub fn is_crushed(&self, pair: &WordPair) -> bool {
        self.crushed.contains(pair)
    }

    fn reset(&mut self) {
        self.crushed.clear();
        self.available = self.pairs.clone();
    }

    /// Move a pair to the crushed pool, refilling if the pool empties.
    pub fn mark_crushed(&mut self, pair: &WordPair) {
        if !self.pairs.contains(pair) {
            return;
        }
        self.crushed.insert(pair.clone());
        self.available.retain(|p| p != pair);
        if self.available.is_empty() {
            self.reset();
        }
    }

    /// A random pair from the available pool.
    pub fn draw(&mut self, rng: &mut GameRng) -> WordPair {
        if self.available.is_empty() {
            self.reset();
        }
        rng.choose(&self.available)
            .cloned()
            .unwrap_or_else(WordPair::placeholder)
    }

    /// Set the current pair to the queued next pair, or draw one.
    pub fn draw_current(&mut self, rng: &mut GameRng) {
        let pair = match self.next.take() {
            Some(pair) => pair,
            None => self.draw(rng),
        };
        self.current = Some(pair);
    }

    /// Crush the current pair and queue the next one.
    ///
    /// Returns the crushed pair.
    pub fn advance(&mut self, rng: &mut GameRng) -> Option<WordPair> {
        let done = self.current.take()?;
        self.mark_crushed(&done);
        self.next = Some(self.draw(rng));
        Some(done)
    }

    /// The uncrushed pair whose Chinese word is `cn`.
    #[must_use]
    pub fn live_pair_by_cn(&self, cn: &str) -> Option<WordPair> {
        self.pairs
            .iter()
            .find(|p| p.cn == cn)
            .filter(|p| !self.is_crushed(p))
            .cloned()
    }

    /// The uncrushed pair whose English word is `en`.
    #[must_use]
    pub fn live_pair_by_en(&self, en: &str) -> Option<WordPair> {
        self.pairs
            .iter()
            .find(|p| p.en == en)
            .filter(|p| !self.is_crushed(p))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
intro text: ignored
## Level 1
火:fire
水 : water
bad line
## level 2
木:wood
:missing
## Level 3
";

    fn covers_all(deck: &WordDeck) -> bool {
        let mut all: BTreeSet<WordPair> = deck.available().iter().cloned().collect();
        all.extend(deck.crushed().iter().cloned());
        let expected: BTreeSet<WordPair> = deck.pairs().iter().cloned().collect();
        all == expected && deck.available().iter().all(|p| !deck.is_crushed(p))
    }

    #[test]
    fn test_parse_levels() {
        let book = WordBook::parse(SAMPLE);
        assert_eq!(book.pairs_for(1), vec![WordPair::new("火", "fire"), WordPair::new("水", "water")]);
        assert_eq!(book.pairs_for(2), vec![WordPair::new("木", "wood")]);
        // Empty level falls back to level 1
        assert_eq!(book.pairs_for(3).len(), 2);
        assert_eq!(book.levels().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_deck_uses_placeholder() {
        let deck = WordDeck::new(Vec::new());
        assert_eq!(deck.pairs(), &[WordPair::placeholder()]);
    }

    #[test]
    fn test_pools_partition_pairs() {
        let mut deck = WordDeck::from_book(&WordBook::parse(SAMPLE), 1);
        let mut rng = GameRng::new(1);
        assert!(covers_all(&deck));
        deck.draw_current(&mut rng);
        let crushed = deck.advance(&mut rng).unwrap();
        assert!(deck.is_crushed(&crushed));
        assert!(covers_all(&deck));
    }

    #[test]
    fn test_pool_resets_when_exhausted() {
        let mut deck = WordDeck::new(vec![WordPair::new("a", "A"), WordPair::new("b", "B")]);
        deck.mark_crushed(&WordPair::new("a", "A"));
        assert_eq!(deck.available().len(), 1);
        deck.mark_crushed(&WordPair::new("b", "B"));
        assert_eq!(deck.available().len(), 2);
        assert!(deck.crushed().is_empty());
    }

    #[test]
    fn test_advance_queues_next() {
        let mut deck = WordDeck::new(vec![WordPair::new("a", "A"), WordPair::new("b", "B"), WordPair::new("c", "C")]);
        let mut rng = GameRng::new(5);
        deck.draw_current(&mut rng);
        let first = deck.advance(&mut rng).unwrap();
        assert!(deck.current().is_none());
        deck.draw_current(&mut rng);
        assert_ne!(deck.current().unwrap(), &first);
    }

    #[test]
    fn test_live_lookup_skips_crushed() {
        let mut deck = WordDeck::new(vec![WordPair::new("a", "A"), WordPair::new("b", "B")]);
        deck.mark_crushed(&WordPair::new("a", "A"));
        assert!(deck.live_pair_by_cn("a").is_none());
        assert_eq!(deck.live_pair_by_en("B").unwrap().cn, "b");
    }
}
