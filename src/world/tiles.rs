//! Board tiles assembled from the generated cell map.

use std::collections::BTreeMap;

use serde::Serialize;

use super::coord::GridPos;
use super::network::Node;
use super::terrain::{CellMap, Feature, WATER};
use crate::rng::GameRng;

/// Share of flat decor drawn as culture rather than nature.
const FLAT_CULTURE_CHANCE: f64 = 0.3;

/// What a tile is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Plain road.
    Road,
    /// A station or city.
    Station,
    /// The station players begin on.
    Start,
    /// Blue event tile.
    Blue,
    /// Red event tile.
    Red,
    /// Yellow event tile.
    Yellow,
    /// Scenery: trees and fields.
    DecorNature,
    /// Scenery: buildings and monuments.
    DecorCulture,
}

impl TileKind {
    /// The three special event kinds.
    pub const SPECIALS: [TileKind; 3] = [TileKind::Blue, TileKind::Red, TileKind::Yellow];

    /// True for tiles players can stand on.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, TileKind::DecorNature | TileKind::DecorCulture)
    }

    /// True for tiles that count as a step when measuring travel.
    #[must_use]
    pub const fn is_colored(self) -> bool {
        matches!(
            self,
            TileKind::Station | TileKind::Start | TileKind::Blue | TileKind::Red | TileKind::Yellow
        )
    }

    /// True for stations, including the start.
    #[must_use]
    pub const fn is_station(self) -> bool {
        matches!(self, TileKind::Station | TileKind::Start)
    }
}

/// One board tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    /// Index into the graph.
    pub id: usize,
    /// Grid cell.
    pub pos: GridPos,
    /// Kind.
    pub kind: TileKind,
    /// Station name.
    pub name: Option<String>,
    /// Station population, 0 elsewhere.
    pub population: u64,
    /// Terrain height class.
    pub height: i8,
    /// Walkable edge neighbors, by tile id. Empty for decor.
    pub neighbors: Vec<usize>,
}

/// The navigable board.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TileGraph {
    tiles: Vec<Tile>,
    #[serde(skip)]
    by_pos: BTreeMap<GridPos, usize>,
    start: Option<usize>,
}

impl TileGraph {
    /// Convert generated cells into tiles.
    ///
    /// Water cells are skipped. Node cells become stations. Road cells
    /// become special tiles with probability `special_chance`, otherwise
    /// plain road. Everything else is decor chosen by height. Walkable tiles
    /// are linked to their walkable edge neighbors, and the most populous
    /// station becomes the start.
    #[must_use]
    pub fn assemble(cells: &CellMap, nodes: &[Node], special_chance: f64, rng: &mut GameRng) -> Self {
        let node_at: BTreeMap<GridPos, &Node> = nodes.iter().map(|n| (n.pos, n)).collect();
        let mut graph = TileGraph::default();

        for (pos, cell) in cells.iter() {
            if cell.height == WATER {
                continue;
            }
            let (kind, name, population) = match cell.feature {
                Feature::City | Feature::Station => {
                    let node = node_at.get(&pos);
                    (
                        TileKind::Station,
                        node.map(|n| n.name.clone()),
                        node.map_or(0, |n| n.population),
                    )
                }
                Feature::Road => {
                    let kind = if rng.chance(special_chance) {
                        TileKind::SPECIALS[rng.index(TileKind::SPECIALS.len())]
                    } else {
                        TileKind::Road
                    };
                    (kind, None, 0)
                }
                Feature::Empty => (decor_for(cell.height, rng), None, 0),
            };
            let id = graph.tiles.len();
            graph.by_pos.insert(pos, id);
            graph.tiles.push(Tile {
                id,
                pos,
                kind,
                name,
                population,
                height: cell.height,
                neighbors: Vec::new(),
            });
        }

        graph.link();
        graph.pick_start();
        log::debug!(
            "assembled {} tiles ({} walkable)",
            graph.tiles.len(),
            graph.walkable().count()
        );
        graph
    }

    fn link(&mut self) {
        for i in 0..self.tiles.len() {
            if !self.tiles[i].kind.is_walkable() {
                continue;
            }
            let neighbors: Vec<usize> = self.tiles[i]
                .pos
                .neighbors4()
                .into_iter()
                .filter_map(|p| self.by_pos.get(&p).copied())
                .filter(|&j| self.tiles[j].kind.is_walkable())
                .collect();
            self.tiles[i].neighbors = neighbors;
        }
    }

    fn pick_start(&mut self) {
        let best = self
            .tiles
            .iter()
            .filter(|t| t.kind == TileKind::Station)
            .fold(None::<&Tile>, |best, t| match best {
                Some(b) if b.population >= t.population => Some(b),
                _ => Some(t),
            })
            .map(|t| t.id);
        self.start = best.or_else(|| self.walkable().next().map(|t| t.id));
        if let Some(id) = self.start
            && self.tiles[id].kind == TileKind::Station
        {
            self.tiles[id].kind = TileKind::Start;
        }
    }

    /// All tiles in id order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile by id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Tile at a grid cell.
    #[must_use]
    pub fn at(&self, pos: GridPos) -> Option<&Tile> {
        self.by_pos.get(&pos).map(|&id| &self.tiles[id])
    }

    /// Id of the start tile. `None` only for a board with no walkable tile.
    #[must_use]
    pub const fn start(&self) -> Option<usize> {
        self.start
    }

    /// Walkable neighbors of a tile.
    #[must_use]
    pub fn neighbors(&self, id: usize) -> &[usize] {
        self.tiles.get(id).map_or(&[], |t| t.neighbors.as_slice())
    }

    /// Tiles players can stand on.
    pub fn walkable(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.kind.is_walkable())
    }

    /// Number of tiles of a kind.
    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind == kind).count()
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True for a board without tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

fn decor_for(height: i8, rng: &mut GameRng) -> TileKind {
    match height {
        ..=1 => {
            if rng.chance(FLAT_CULTURE_CHANCE) {
                TileKind::DecorCulture
            } else {
                TileKind::DecorNature
            }
        }
        2 => TileKind::DecorNature,
        _ => TileKind::DecorCulture,
    }
}
