//! One-shot world generation from a station list.

use serde::{Deserialize, Serialize};

use super::coord::GridPos;
use super::network::{LinkKind, Node, NodeKind, RoadNetwork, ShortcutRule, build_network};
use super::snap::{GridSnapper, Projection, Station};
use super::terrain::{Cell, CellMap, Feature, TerrainSampler};
use super::tiles::{Tile, TileGraph};
use crate::error::MapGenError;
use crate::rng::GameRng;

/// Settings for [`generate_world`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for terrain noise and special tile draws.
    pub seed: u64,
    /// Grid units per degree of latitude or longitude.
    pub scale: f64,
    /// Terrain is generated in a square of this radius around each station.
    pub render_radius: i32,
    /// Probability that a road tile becomes a special event tile.
    pub special_chance: f64,
    /// Rejected pairs at least this far apart never get shortcuts.
    pub shortcut_max_distance: u32,
    /// Minimum detour overshoot, exclusive, for a shortcut.
    pub shortcut_min_saving: u32,
    /// Whether to add shortcut roads at all.
    pub shortcuts: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let rule = ShortcutRule::default();
        Self {
            seed: 0,
            scale: 96.0,
            render_radius: 6,
            special_chance: 0.3,
            shortcut_max_distance: rule.max_distance,
            shortcut_min_saving: rule.min_saving,
            shortcuts: true,
        }
    }
}

impl WorldConfig {
    /// Check settings.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-finite or non-positive scale, a
    /// non-positive render radius, or a special chance outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), MapGenError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(MapGenError::Scale(self.scale));
        }
        if self.render_radius <= 0 {
            return Err(MapGenError::RenderRadius(self.render_radius));
        }
        if !(0.0..=1.0).contains(&self.special_chance) {
            return Err(MapGenError::SpecialChance(self.special_chance));
        }
        Ok(())
    }

    fn shortcut_rule(&self) -> Option<ShortcutRule> {
        self.shortcuts.then_some(ShortcutRule {
            max_distance: self.shortcut_max_distance,
            min_saving: self.shortcut_min_saving,
        })
    }
}

/// Parse a JSON array of stations.
///
/// # Errors
///
/// Returns an error if the text is not a valid station array.
pub fn load_stations(json: &str) -> Result<Vec<Station>, MapGenError> {
    Ok(serde_json::from_str(json)?)
}

/// A generated board with the data the renderer needs.
#[derive(Debug, Clone)]
pub struct World {
    projection: Projection,
    nodes: Vec<Node>,
    network: RoadNetwork,
    cells: CellMap,
    sampler: TerrainSampler,
    tiles: TileGraph,
}

impl World {
    /// The tile graph.
    #[must_use]
    pub const fn tiles(&self) -> &TileGraph {
        &self.tiles
    }

    /// The start tile, if the board has any walkable tile.
    #[must_use]
    pub fn start(&self) -> Option<&Tile> {
        self.tiles.start().and_then(|id| self.tiles.get(id))
    }

    /// Placed stations, most populous first.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Roads and station links.
    #[must_use]
    pub const fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Geographic projection used for placement.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Generated cells, water included.
    #[must_use]
    pub const fn cells(&self) -> &CellMap {
        &self.cells
    }

    /// Height class at any cell; ungenerated cells are sampled.
    #[must_use]
    pub fn terrain_height(&self, pos: GridPos) -> i8 {
        self.cells.get(pos).map_or_else(|| self.sampler.height(pos), |c| c.height)
    }
}

/// Build the board for a station list.
///
/// Stations claim even grid cells in descending population; a station with
/// no free cell within the search radius is dropped. Terrain is seeded
/// around every station, the road network joins them, and the cell map is
/// converted to tiles. An empty list yields an empty board.
///
/// # Errors
///
/// Returns an error if `config` fails [`WorldConfig::validate`].
pub fn generate_world(stations: &[Station], config: &WorldConfig) -> Result<World, MapGenError> {
    config.validate()?;
    let mut rng = GameRng::new(config.seed);
    let sampler = TerrainSampler::new(rng.derive_u32());
    let projection = Projection::fit(stations, config.scale);

    let mut ordered: Vec<&Station> = stations.iter().collect();
    ordered.sort_by(|a, b| b.population.cmp(&a.population));

    let mut snapper = GridSnapper::new();
    let mut cells = CellMap::new();
    let mut nodes = Vec::with_capacity(ordered.len());
    for station in ordered {
        let (x, z) = projection.project(station.lat, station.lng);
        let Some(pos) = snapper.place(x, z) else {
            log::warn!("dropping station {}: no free cell near ({x:.1}, {z:.1})", station.name);
            continue;
        };
        let kind = NodeKind::from_level(station.level);
        cells.set(
            pos,
            Cell {
                height: 1,
                feature: match kind {
                    NodeKind::Station => Feature::Station,
                    NodeKind::City => Feature::City,
                },
            },
        );
        nodes.push(Node {
            id: nodes.len(),
            pos,
            name: station.name.clone(),
            population: station.population,
            level: station.level,
            kind,
        });
    }
    for node in &nodes {
        cells.seed_around(node.pos, config.render_radius, &sampler);
    }

    let network = build_network(&nodes, config.shortcut_rule());
    for &pos in &network.roads {
        if cells.get(pos).is_some_and(|c| c.feature.is_node()) {
            continue;
        }
        cells.ensure_road(pos, &sampler);
    }

    let tiles = TileGraph::assemble(&cells, &nodes, config.special_chance, &mut rng);
    log::info!(
        "generated world: {} stations, {} road cells, {} spanning and {} shortcut links, {} tiles",
        nodes.len(),
        network.roads.len(),
        network.links_of(LinkKind::Spanning).count(),
        network.links_of(LinkKind::Shortcut).count(),
        tiles.len()
    );

    Ok(World {
        projection,
        nodes,
        network,
        cells,
        sampler,
        tiles,
    })
}
