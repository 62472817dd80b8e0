//! Board distance measured in colored tiles.

use std::collections::VecDeque;

use crate::world::TileGraph;

/// Number of colored tiles entered on the cheapest walk from `from` to `to`.
///
/// Plain road is free; stations and event tiles cost one step each. Runs a
/// 0-1 BFS: free edges go to the front of the deque, paid edges to the back.
/// Returns `None` if `to` is unreachable or either id is unknown.
#[must_use]
pub fn colored_distance(graph: &TileGraph, from: usize, to: usize) -> Option<u32> {
    if graph.get(from).is_none() || graph.get(to).is_none() {
        return None;
    }
    if from == to {
        return Some(0);
    }
    let mut dist = vec![u32::MAX; graph.len()];
    let mut deque = VecDeque::new();
    dist[from] = 0;
    deque.push_back((from, 0u32));

    while let Some((tile, d)) = deque.pop_front() {
        if d > dist[tile] {
            continue;
        }
        for &next in graph.neighbors(tile) {
            let colored = graph.get(next).is_some_and(|t| t.kind.is_colored());
            let nd = d + u32::from(colored);
            if nd < dist[next] {
                dist[next] = nd;
                if colored {
                    deque.push_back((next, nd));
                } else {
                    deque.push_front((next, nd));
                }
            }
        }
    }
    (dist[to] != u32::MAX).then_some(dist[to])
}

/// Index of the player farthest from `to`, who receives the misfortune when
/// someone arrives. Unreachable players count as farthest; ties keep the
/// earlier player.
#[must_use]
pub fn farthest_from(graph: &TileGraph, positions: &[usize], to: usize) -> Option<usize> {
    positions
        .iter()
        .map(|&p| colored_distance(graph, p, to).unwrap_or(u32::MAX))
        .enumerate()
        .fold(None, |best: Option<(usize, u32)>, (i, d)| match best {
            Some((_, bd)) if bd >= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::GameRng;
    use crate::world::{Cell, CellMap, Feature, GridPos, Node, NodeKind};

    /// Station at x = 0 and x = 6 joined by road, special chance 0.
    fn strip() -> TileGraph {
        let mut cells = CellMap::new();
        let nodes: Vec<Node> = [0, 6]
            .iter()
            .enumerate()
            .map(|(id, &x)| Node {
                id,
                pos: GridPos::new(x, 0),
                name: format!("s{id}"),
                population: 10 + id as u64,
                level: 1,
                kind: NodeKind::Station,
            })
            .collect();
        for x in 0..=6 {
            let feature = if x == 0 || x == 6 { Feature::Station } else { Feature::Road };
            cells.set(GridPos::new(x, 0), Cell { height: 1, feature });
        }
        TileGraph::assemble(&cells, &nodes, 0.0, &mut GameRng::new(0))
    }

    fn id(graph: &TileGraph, x: i32) -> usize {
        graph.at(GridPos::new(x, 0)).unwrap().id
    }

    #[test]
    fn test_roads_are_free() {
        let g = strip();
        assert_eq!(colored_distance(&g, id(&g, 0), id(&g, 6)), Some(1));
        assert_eq!(colored_distance(&g, id(&g, 6), id(&g, 0)), Some(1));
        assert_eq!(colored_distance(&g, id(&g, 2), id(&g, 4)), Some(0));
        assert_eq!(colored_distance(&g, id(&g, 3), id(&g, 3)), Some(0));
    }

    #[test]
    fn test_unknown_tile() {
        let g = strip();
        assert_eq!(colored_distance(&g, 0, 99), None);
    }

    #[test]
    fn test_farthest_player() {
        let g = strip();
        // Distances to the west station: 0, 1, 1. Ties keep the earlier player.
        let positions = [id(&g, 0), id(&g, 5), id(&g, 1)];
        assert_eq!(farthest_from(&g, &positions, id(&g, 0)), Some(1));
        assert_eq!(farthest_from(&g, &[], id(&g, 6)), None);
    }
}
