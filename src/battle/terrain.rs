//! Battlefield terrain under the gem grid.

// Pattern arithmetic works on small grid indices
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use serde::Serialize;

use super::element::Element;
use super::grid::{MatchGrid, Pos};
use crate::rng::GameRng;

/// Procedural terrain layouts used when a level supplies no terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerrainPattern {
    /// Element cycles by row.
    HorizontalStripes,
    /// Element cycles by column.
    VerticalStripes,
    /// Element cycles per 2x2 block.
    Checker,
    /// Four quadrants of elements 0 to 3.
    Quadrants,
    /// Interference pattern of two waves.
    Waves,
}

impl TerrainPattern {
    /// All patterns.
    pub const ALL: [TerrainPattern; 5] = [
        TerrainPattern::HorizontalStripes,
        TerrainPattern::VerticalStripes,
        TerrainPattern::Checker,
        TerrainPattern::Quadrants,
        TerrainPattern::Waves,
    ];

    /// Terrain element id for cell `(r, c)` on a `rows` x `cols` board.
    #[must_use]
    pub fn cell(self, r: usize, c: usize, rows: usize, cols: usize) -> u8 {
        match self {
            TerrainPattern::HorizontalStripes => (r % 6) as u8,
            TerrainPattern::VerticalStripes => (c % 6) as u8,
            TerrainPattern::Checker => ((r / 2 + c / 2) % 6) as u8,
            TerrainPattern::Quadrants => {
                let top = 2 * r < rows;
                let left = 2 * c < cols;
                match (top, left) {
                    (true, true) => 0,
                    (true, false) => 1,
                    (false, true) => 2,
                    (false, false) => 3,
                }
            }
            TerrainPattern::Waves => {
                let (rf, cf) = (r as f64, c as f64);
                let v = ((rf * 0.5 + cf * 0.3).sin() * (rf * 0.3 - cf * 0.5).cos() * 10.0).floor();
                (v.abs() as u64 % 6) as u8
            }
        }
    }
}

/// Terrain element ids laid out under the gem grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

/// How many matched gems sit on their own terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerrainReport {
    /// Matched gems whose type equals the terrain beneath them.
    pub matching: usize,
    /// Element with the most matching gems, if any matched.
    pub dominant: Option<Element>,
}

impl TerrainGrid {
    /// Build from explicit rows. Caller validates the shape.
    #[must_use]
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        Self {
            rows: rows.len(),
            cols,
            cells: rows.iter().flatten().copied().collect(),
        }
    }

    /// Fill a board with a pattern.
    #[must_use]
    pub fn from_pattern(pattern: TerrainPattern, rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(pattern.cell(r, c, rows, cols));
            }
        }
        Self { rows, cols, cells }
    }

    /// Fill a board with a randomly chosen pattern.
    pub fn random(rows: usize, cols: usize, rng: &mut GameRng) -> Self {
        let pattern = TerrainPattern::ALL[rng.index(TerrainPattern::ALL.len())];
        Self::from_pattern(pattern, rows, cols)
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

    /// Terrain element id at a cell. Out-of-range lookups read as 0.
    #[must_use]
    pub fn at(&self, pos: Pos) -> u8 {
        if pos.r >= self.rows || pos.c >= self.cols {
            return 0;
        }
        self.cells[pos.r * self.cols + pos.c]
    }

    /// Count matched gems on their own terrain and find the dominant element.
    ///
    /// Ties for dominance go to the element seen first in `cells`.
    #[must_use]
    pub fn bonus_for(&self, grid: &MatchGrid, cells: &[Pos]) -> TerrainReport {
        let mut counts = [0usize; 6];
        let mut first_seen: Vec<u8> = Vec::new();
        let mut matching = 0;
        for &pos in cells {
            let Some(gem) = grid.gem(pos) else { continue };
            let terrain = self.at(pos);
            if gem == terrain {
                matching += 1;
                let slot = usize::from(terrain % 6);
                if counts[slot] == 0 {
                    first_seen.push(terrain % 6);
                }
                counts[slot] += 1;
            }
        }
        let mut dominant: Option<u8> = None;
        for id in first_seen {
            match dominant {
                Some(best) if counts[usize::from(best)] >= counts[usize::from(id)] => {}
                _ => dominant = Some(id),
            }
        }
        TerrainReport {
            matching,
            dominant: dominant.map(Element::from_gem),
        }
    }

    /// Terrain rows, for renderers.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.cols.max(1)).map(<[u8]>::to_vec).collect()
    }
}
