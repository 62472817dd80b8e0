//! Procedural road network and board tiles.
//!
//! Stations are projected onto an integer grid, snapped to free even cells,
//! joined by a spanning road network with optional shortcuts, and turned
//! into a navigable tile graph surrounded by noise-generated scenery.

mod astar;
mod coord;
mod mapgen;
mod network;
mod snap;
mod terrain;
mod tiles;

pub use astar::{GROUND_COST, ROAD_COST, Route, direct_road, find_path, step_cost};
pub use coord::GridPos;
pub use mapgen::{World, WorldConfig, generate_world, load_stations};
pub use network::{
    Edge, Link, LinkKind, Node, NodeKind, RoadNetwork, ShortcutRule, UnionFind, build_network, candidate_edges,
};
pub use snap::{GridSnapper, Projection, SEARCH_RADIUS, Station, snap_even};
pub use terrain::{Cell, CellMap, Feature, TerrainSampler, WATER};
pub use tiles::{Tile, TileGraph, TileKind};
