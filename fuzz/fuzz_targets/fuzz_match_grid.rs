#![no_main]

use arbitrary::Arbitrary;
use gemrail::GameRng;
use gemrail::battle::{MatchGrid, Pos};
use libfuzzer_sys::fuzz_target;

/// Structured input for grid fuzzing.
#[derive(Arbitrary, Debug)]
struct GridInput {
    /// Rows, folded into 3..=10.
    rows: u8,
    /// Columns, folded into 3..=10.
    cols: u8,
    /// Gem types, folded into 3..=6.
    gem_types: u8,
    /// Raw cells; 255 is an empty cell.
    cells: Vec<u8>,
    /// Swaps to try, as cell indices.
    swaps: Vec<(u8, u8)>,
    /// RNG seed for refills.
    seed: u64,
}

fuzz_target!(|input: GridInput| {
    let rows = usize::from(input.rows % 8) + 3;
    let cols = usize::from(input.cols % 8) + 3;
    let gem_types = input.gem_types % 4 + 3;
    let cell = |i: usize| match input.cells.get(i) {
        Some(255) | None => None,
        Some(v) => Some(v % gem_types),
    };
    let raw: Vec<Vec<Option<u8>>> = (0..rows).map(|r| (0..cols).map(|c| cell(r * cols + c)).collect()).collect();
    let mut grid = MatchGrid::from_rows(&raw, gem_types);
    let mut rng = GameRng::new(input.seed);

    for (a, b) in input.swaps.iter().take(32) {
        let a = usize::from(*a) % (rows * cols);
        let pa = Pos::new(a / cols, a % cols);
        let pb = if b % 2 == 0 { Pos::new(pa.r, pa.c + 1) } else { Pos::new(pa.r + 1, pa.c) };
        if !grid.in_bounds(pb) {
            continue;
        }
        grid.swap(pa, pb);
        let matched = grid.find_matches();
        assert!(matched.is_empty() || matched.len() >= 3);
        let cleared = grid.clear(&matched);
        assert_eq!(cleared.len(), matched.len());
        grid.apply_gravity(&mut rng);
        assert!(grid.positions().all(|p| grid.gem(p).is_some_and(|g| g < gem_types)));
    }
});
