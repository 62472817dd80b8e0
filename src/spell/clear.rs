//! Scoring for cells removed by spells.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::battle::{ClearedCell, Pos, base_score};

/// Points for each cell in a component too small to count as a match.
pub const LOOSE_GEM_SCORE: u32 = 20;

/// Score cleared cells by connected components.
///
/// Cells are grouped by gem type and split into 4-connected components.
/// Components of three or more score like a match of that size; smaller
/// components score [`LOOSE_GEM_SCORE`] per cell.
#[must_use]
pub fn component_score(cells: &[ClearedCell]) -> u32 {
    let mut by_type: BTreeMap<u8, BTreeSet<Pos>> = BTreeMap::new();
    for cell in cells {
        by_type.entry(cell.gem).or_default().insert(cell.pos);
    }

    let mut total = 0u32;
    for mut remaining in by_type.into_values() {
        while let Some(start) = remaining.pop_first() {
            let mut size = 1usize;
            let mut queue = VecDeque::from([start]);
            while let Some(p) = queue.pop_front() {
                for n in neighbors(p) {
                    if remaining.remove(&n) {
                        size += 1;
                        queue.push_back(n);
                    }
                }
            }
            let score = if size < 3 {
                LOOSE_GEM_SCORE.saturating_mul(u32::try_from(size).unwrap_or(u32::MAX))
            } else {
                base_score(size)
            };
            total = total.saturating_add(score);
        }
    }
    total
}

fn neighbors(p: Pos) -> impl Iterator<Item = Pos> {
    let up = p.r.checked_sub(1).map(|r| Pos::new(r, p.c));
    let left = p.c.checked_sub(1).map(|c| Pos::new(p.r, c));
    let down = Some(Pos::new(p.r + 1, p.c));
    let right = Some(Pos::new(p.r, p.c + 1));
    [up, down, left, right].into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(r: usize, c: usize, gem: u8) -> ClearedCell {
        ClearedCell { pos: Pos::new(r, c), gem, word: None }
    }

    #[test]
    fn test_row_of_mixed_gems() {
        // 0 0 0 1 2 2 1 3 -> [000]=100, [1]=20, [22]=40, [1]=20, [3]=20
        let gems = [0, 0, 0, 1, 2, 2, 1, 3];
        let cells: Vec<ClearedCell> = gems.iter().enumerate().map(|(c, &g)| cell(0, c, g)).collect();
        assert_eq!(component_score(&cells), 200);
    }

    #[test]
    fn test_l_shaped_component() {
        let cells = vec![cell(0, 0, 4), cell(1, 0, 4), cell(1, 1, 4), cell(1, 2, 4)];
        assert_eq!(component_score(&cells), 180);
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        let cells = vec![cell(0, 0, 1), cell(1, 1, 1), cell(2, 2, 1)];
        assert_eq!(component_score(&cells), 60);
    }

    #[test]
    fn test_empty() {
        assert_eq!(component_score(&[]), 0);
    }
}
