//! Terrain sampling and the generation cell map.

use std::collections::BTreeMap;

use noise::{NoiseFn, Perlin};
use serde::Serialize;

use super::coord::GridPos;

/// Height of water cells, which never become tiles.
pub const WATER: i8 = -1;

const BASE_FREQUENCY: f64 = 0.03;
const DETAIL_FREQUENCY: f64 = 0.1;

/// Deterministic height classification from two octaves of Perlin noise.
#[derive(Debug, Clone, Copy)]
pub struct TerrainSampler {
    base: Perlin,
    detail: Perlin,
}

impl TerrainSampler {
    /// A sampler for a world seed.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            base: Perlin::new(seed),
            detail: Perlin::new(seed.wrapping_add(1)),
        }
    }

    /// Height class of a cell: [`WATER`], 1 (flat), 2 (hills) or 3 (high).
    #[must_use]
    pub fn height(&self, pos: GridPos) -> i8 {
        let (x, z) = (f64::from(pos.x), f64::from(pos.z));
        let n = self.base.get([x * BASE_FREQUENCY, z * BASE_FREQUENCY]);
        let n2 = self.detail.get([x * DETAIL_FREQUENCY, z * DETAIL_FREQUENCY]);
        let mut h = WATER;
        if n > -0.2 {
            h = 1;
        }
        if n > 0.5 {
            h = 3;
        }
        if h == 1 && n2 > 0.4 {
            h = 2;
        }
        h
    }
}

/// What occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Bare terrain.
    Empty,
    /// Built road.
    Road,
    /// A city node.
    City,
    /// A station node.
    Station,
}

impl Feature {
    /// True for city and station nodes.
    #[must_use]
    pub const fn is_node(self) -> bool {
        matches!(self, Feature::City | Feature::Station)
    }
}

/// One generated cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Height class.
    pub height: i8,
    /// Occupant.
    pub feature: Feature,
}

impl Cell {
    /// Bare terrain of a given height.
    #[must_use]
    pub const fn terrain(height: i8) -> Self {
        Self {
            height,
            feature: Feature::Empty,
        }
    }
}

/// Every cell generation has touched.
#[derive(Debug, Clone, Default)]
pub struct CellMap {
    cells: BTreeMap<GridPos, Cell>,
}

impl CellMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell at a position, if generated.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<Cell> {
        self.cells.get(&pos).copied()
    }

    /// Overwrite a cell.
    pub fn set(&mut self, pos: GridPos, cell: Cell) {
        self.cells.insert(pos, cell);
    }

    /// Number of generated cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if nothing has been generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in position order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, Cell)> + '_ {
        self.cells.iter().map(|(&p, &c)| (p, c))
    }

    /// Sample terrain for every ungenerated cell within `radius` of `center`.
    pub fn seed_around(&mut self, center: GridPos, radius: i32, sampler: &TerrainSampler) {
        for pos in center.square(radius) {
            self.cells
                .entry(pos)
                .or_insert_with(|| Cell::terrain(sampler.height(pos)));
        }
    }

    /// Turn a cell into road and give it walkable shoulders.
    ///
    /// Missing cells become flat road; bare cells become road at least one
    /// high; nodes are left alone. Ungenerated neighbors are sampled with
    /// their height raised to at least 1.
    pub fn ensure_road(&mut self, pos: GridPos, sampler: &TerrainSampler) {
        match self.cells.get_mut(&pos) {
            None => {
                self.cells.insert(
                    pos,
                    Cell {
                        height: 1,
                        feature: Feature::Road,
                    },
                );
            }
            Some(cell) if cell.feature == Feature::Empty => {
                cell.feature = Feature::Road;
                cell.height = cell.height.max(1);
            }
            Some(_) => {}
        }
        for n in pos.neighbors8() {
            self.cells
                .entry(n)
                .or_insert_with(|| Cell::terrain(sampler.height(n).max(1)));
        }
    }
}
