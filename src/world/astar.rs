//! A* routing on the 4-connected grid with road reuse discount.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use serde::Serialize;

use super::coord::GridPos;

/// Cost of stepping onto an existing road cell.
pub const ROAD_COST: u32 = 1;
/// Cost of stepping onto open ground.
pub const GROUND_COST: u32 = 10;

/// A found path. `path` excludes the start and ends at the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Cells walked, in order.
    pub path: Vec<GridPos>,
    /// Sum of step costs.
    pub cost: u32,
}

/// Cost of entering a cell.
#[must_use]
pub fn step_cost(pos: GridPos, roads: &BTreeSet<GridPos>) -> u32 {
    if roads.contains(&pos) { ROAD_COST } else { GROUND_COST }
}

/// Search window: the endpoints' bounding box grown by a margin that always
/// leaves room for a detour.
#[derive(Debug, Clone, Copy)]
struct Window {
    min: GridPos,
    max: GridPos,
}

impl Window {
    fn around(a: GridPos, b: GridPos) -> Self {
        let margin = i32::try_from(a.manhattan(b)).unwrap_or(i32::MAX / 8).saturating_mul(5).saturating_add(2);
        Self {
            min: GridPos::new(a.x.min(b.x).saturating_sub(margin), a.z.min(b.z).saturating_sub(margin)),
            max: GridPos::new(a.x.max(b.x).saturating_add(margin), a.z.max(b.z).saturating_add(margin)),
        }
    }

    const fn contains(&self, p: GridPos) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }
}

/// Cheapest path from `start` to `end` given the current road set.
///
/// Ties in the open set pop in insertion order, and neighbors are expanded
/// east, west, south, north, so results are reproducible. A start equal to
/// the goal yields an empty path of cost 0. Returns `None` only if the goal
/// is unreachable inside the search window.
#[must_use]
pub fn find_path(start: GridPos, end: GridPos, roads: &BTreeSet<GridPos>) -> Option<Route> {
    if start == end {
        return Some(Route {
            path: Vec::new(),
            cost: 0,
        });
    }
    let window = Window::around(start, end);
    let mut open: BinaryHeap<Reverse<(u32, u64, GridPos)>> = BinaryHeap::new();
    let mut g: BTreeMap<GridPos, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<GridPos, GridPos> = BTreeMap::new();
    let mut closed: BTreeSet<GridPos> = BTreeSet::new();
    let mut seq = 0u64;

    g.insert(start, 0);
    open.push(Reverse((start.manhattan(end), seq, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == end {
            let cost = g.get(&end).copied().unwrap_or(0);
            return Some(Route {
                path: reconstruct(&came_from, start, end),
                cost,
            });
        }
        if !closed.insert(current) {
            continue;
        }
        let current_g = g.get(&current).copied().unwrap_or(u32::MAX);
        for next in current.neighbors4() {
            if !window.contains(next) || closed.contains(&next) {
                continue;
            }
            let tentative = current_g.saturating_add(step_cost(next, roads));
            if g.get(&next).is_none_or(|&known| tentative < known) {
                g.insert(next, tentative);
                came_from.insert(next, current);
                seq += 1;
                open.push(Reverse((tentative.saturating_add(next.manhattan(end)), seq, next)));
            }
        }
    }
    log::debug!("no route from {start} to {end}");
    None
}

fn reconstruct(came_from: &BTreeMap<GridPos, GridPos>, start: GridPos, end: GridPos) -> Vec<GridPos> {
    let mut path = vec![end];
    let mut cur = end;
    while let Some(&prev) = came_from.get(&cur) {
        if prev == start {
            break;
        }
        path.push(prev);
        cur = prev;
    }
    path.reverse();
    path
}

/// L-shaped road from `start` to `end`: along x first, then z.
/// Both endpoints are included.
#[must_use]
pub fn direct_road(start: GridPos, end: GridPos) -> Vec<GridPos> {
    let mut cells = vec![start];
    let mut cur = start;
    while cur.x != end.x {
        cur.x += (end.x - cur.x).signum();
        cells.push(cur);
    }
    while cur.z != end.z {
        cur.z += (end.z - cur.z).signum();
        cells.push(cur);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_free() {
        let route = find_path(GridPos::new(3, 3), GridPos::new(3, 3), &BTreeSet::new()).unwrap();
        assert_eq!(route.cost, 0);
        assert!(route.path.is_empty());
    }

    #[test]
    fn test_open_ground_costs_ten_per_step() {
        let start = GridPos::new(0, 0);
        let end = GridPos::new(4, -3);
        let route = find_path(start, end, &BTreeSet::new()).unwrap();
        assert_eq!(route.path.len(), 7);
        assert_eq!(route.cost, 70);
        assert_eq!(route.path.last(), Some(&end));
        assert!(!route.path.contains(&start));
        let mut prev = start;
        for p in &route.path {
            assert_eq!(prev.manhattan(*p), 1);
            prev = *p;
        }
    }

    #[test]
    fn test_prefers_existing_roads() {
        // A road detour two cells south is cheaper than four ground steps.
        let mut roads = BTreeSet::new();
        for x in 0..=6 {
            roads.insert(GridPos::new(x, 2));
        }
        roads.insert(GridPos::new(0, 1));
        roads.insert(GridPos::new(6, 1));
        roads.insert(GridPos::new(6, 0));
        let route = find_path(GridPos::new(0, 0), GridPos::new(6, 0), &roads).unwrap();
        assert_eq!(route.cost, 10);
        assert!(route.path.contains(&GridPos::new(3, 2)));
    }

    #[test]
    fn test_cost_matches_path() {
        let mut roads = BTreeSet::new();
        roads.insert(GridPos::new(1, 0));
        roads.insert(GridPos::new(2, 0));
        let route = find_path(GridPos::new(0, 0), GridPos::new(5, 1), &roads).unwrap();
        let sum: u32 = route.path.iter().map(|p| step_cost(*p, &roads)).sum();
        assert_eq!(sum, route.cost);
    }

    #[test]
    fn test_direct_road_is_l_shaped() {
        let cells = direct_road(GridPos::new(0, 0), GridPos::new(2, -2));
        assert_eq!(
            cells,
            vec![
                GridPos::new(0, 0),
                GridPos::new(1, 0),
                GridPos::new(2, 0),
                GridPos::new(2, -1),
                GridPos::new(2, -2),
            ]
        );
    }
}
