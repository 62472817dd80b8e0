//! Road network construction: a Kruskal-style spanning pass over all station
//! pairs, followed by shortcut roads where the spanning tree detours badly.

use std::collections::BTreeSet;

use serde::Serialize;

use super::astar::{direct_road, find_path};
use super::coord::GridPos;

/// Size class of a node; both become station tiles on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Level 1 or 2 station.
    Station,
    /// Anything larger.
    City,
}

impl NodeKind {
    /// Classify a station level.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        if level <= 2 { NodeKind::Station } else { NodeKind::City }
    }
}

/// A station placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Index in placement order.
    pub id: usize,
    /// Claimed cell.
    pub pos: GridPos,
    /// Display name.
    pub name: String,
    /// Population.
    pub population: u64,
    /// Size class level as loaded.
    pub level: u8,
    /// Derived kind.
    pub kind: NodeKind,
}

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// `n` singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Representative of `x`'s set.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge two sets. Returns false if they were already one.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }

    /// True if `a` and `b` share a set.
    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

/// Candidate pair of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// First node id.
    pub a: usize,
    /// Second node id.
    pub b: usize,
    /// Manhattan distance between them.
    pub distance: u32,
}

/// Every node pair, shortest first. Equal distances keep pair order.
#[must_use]
pub fn candidate_edges(nodes: &[Node]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1) / 2);
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            edges.push(Edge {
                a: a.id,
                b: b.id,
                distance: a.pos.manhattan(b.pos),
            });
        }
    }
    edges.sort_by_key(|e| e.distance);
    edges
}

/// Why two nodes are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Part of the spanning tree.
    Spanning,
    /// Direct road added after the spanning pass.
    Shortcut,
}

/// A road connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    /// First node id.
    pub a: usize,
    /// Second node id.
    pub b: usize,
    /// Spanning or shortcut.
    pub kind: LinkKind,
}

/// When a rejected pair earns a direct road.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutRule {
    /// Pairs must be closer than this.
    pub max_distance: u32,
    /// Routing cost must exceed the distance by more than this.
    pub min_saving: u32,
}

impl Default for ShortcutRule {
    fn default() -> Self {
        Self {
            max_distance: 15,
            min_saving: 8,
        }
    }
}

/// The built roads and the links they realize.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoadNetwork {
    /// Every road cell, node endpoints included.
    pub roads: BTreeSet<GridPos>,
    /// Links in build order.
    pub links: Vec<Link>,
}

impl RoadNetwork {
    /// Links of one kind.
    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.kind == kind)
    }
}

/// Connect `nodes` with roads.
///
/// Node ids must equal their index. Fewer than two nodes build nothing.
/// Every spanning pair is joined: if the router finds no route, the pair
/// gets a [`direct_road`] instead.
#[must_use]
pub fn build_network(nodes: &[Node], shortcuts: Option<ShortcutRule>) -> RoadNetwork {
    let mut net = RoadNetwork::default();
    if nodes.len() < 2 {
        return net;
    }
    let mut sets = UnionFind::new(nodes.len());
    let mut rejected = Vec::new();

    for edge in candidate_edges(nodes) {
        if sets.connected(edge.a, edge.b) {
            rejected.push(edge);
            continue;
        }
        let (from, to) = (nodes[edge.a].pos, nodes[edge.b].pos);
        let path = match find_path(from, to, &net.roads) {
            Some(route) => route.path,
            None => {
                log::warn!("no route between {} and {}", nodes[edge.a].name, nodes[edge.b].name);
                direct_road(from, to)
            }
        };
        sets.union(edge.a, edge.b);
        net.roads.extend(path);
        net.links.push(Link {
            a: edge.a,
            b: edge.b,
            kind: LinkKind::Spanning,
        });
    }

    if let Some(rule) = shortcuts {
        add_shortcuts(nodes, &rejected, rule, &mut net);
    }
    net
}

/// Build direct roads for rejected pairs whose routed cost overshoots their
/// distance by more than the rule allows. Shortcuts are not gated by
/// connectivity and may close cycles.
fn add_shortcuts(nodes: &[Node], rejected: &[Edge], rule: ShortcutRule, net: &mut RoadNetwork) {
    for edge in rejected.iter().filter(|e| e.distance < rule.max_distance) {
        let (from, to) = (nodes[edge.a].pos, nodes[edge.b].pos);
        let Some(route) = find_path(from, to, &net.roads) else {
            continue;
        };
        if route.cost.saturating_sub(edge.distance) > rule.min_saving {
            log::debug!(
                "shortcut {} - {}: cost {} over distance {}",
                nodes[edge.a].name,
                nodes[edge.b].name,
                route.cost,
                edge.distance
            );
            net.roads.extend(direct_road(from, to));
            net.links.push(Link {
                a: edge.a,
                b: edge.b,
                kind: LinkKind::Shortcut,
            });
        }
    }
}
