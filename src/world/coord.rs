//! Integer grid coordinates.

use serde::{Deserialize, Serialize};

/// A cell on the unbounded world grid.
///
/// Ordered by `x`, then `z`, which fixes iteration order of the ordered
/// collections generation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// East-west coordinate.
    pub x: i32,
    /// North-south coordinate, growing southward.
    pub z: i32,
}

impl GridPos {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Manhattan distance.
    #[must_use]
    pub const fn manhattan(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// The four edge neighbors: east, west, south, north.
    #[must_use]
    #[inline]
    pub const fn neighbors4(self) -> [GridPos; 4] {
        let Self { x, z } = self;
        [
            GridPos::new(x + 1, z),
            GridPos::new(x - 1, z),
            GridPos::new(x, z + 1),
            GridPos::new(x, z - 1),
        ]
    }

    /// The eight surrounding cells.
    #[must_use]
    pub fn neighbors8(self) -> impl Iterator<Item = GridPos> {
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dz| (dx, dz)))
            .filter(|&(dx, dz)| dx != 0 || dz != 0)
            .map(move |(dx, dz)| GridPos::new(self.x + dx, self.z + dz))
    }

    /// Every cell within Chebyshev distance `radius`, row by row.
    pub fn square(self, radius: i32) -> impl Iterator<Item = GridPos> {
        (-radius..=radius)
            .flat_map(move |dx| (-radius..=radius).map(move |dz| GridPos::new(self.x + dx, self.z + dz)))
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
