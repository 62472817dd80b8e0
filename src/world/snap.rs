//! Station records, geographic projection and grid snapping.

// Projected coordinates are rounded onto the i32 grid
#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::coord::GridPos;

/// Ring radius at which the free-cell search gives up.
pub const SEARCH_RADIUS: i32 = 100;

const fn default_population() -> u64 {
    100_000
}

const fn default_level() -> u8 {
    3
}

/// A station as loaded from the host's station list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Population; larger stations claim grid cells first.
    #[serde(default = "default_population")]
    pub population: u64,
    /// Size class; 1 and 2 are stations, larger values are cities.
    #[serde(default = "default_level")]
    pub level: u8,
}

impl Station {
    /// A station with default population and level.
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            population: default_population(),
            level: default_level(),
        }
    }

    /// Set the population.
    #[must_use]
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }

    /// Set the size class.
    #[must_use]
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }
}

/// Equirectangular projection centred on a station set's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Latitude of the centre.
    pub center_lat: f64,
    /// Longitude of the centre.
    pub center_lng: f64,
    /// Grid units per degree.
    pub scale: f64,
}

impl Projection {
    /// Centre on the midpoint of the stations' bounding box.
    ///
    /// An empty list centres on (0, 0).
    #[must_use]
    pub fn fit(stations: &[Station], scale: f64) -> Self {
        if stations.is_empty() {
            return Self {
                center_lat: 0.0,
                center_lng: 0.0,
                scale,
            };
        }
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
        for s in stations {
            min_lat = min_lat.min(s.lat);
            max_lat = max_lat.max(s.lat);
            min_lng = min_lng.min(s.lng);
            max_lng = max_lng.max(s.lng);
        }
        Self {
            center_lat: (min_lat + max_lat) / 2.0,
            center_lng: (min_lng + max_lng) / 2.0,
            scale,
        }
    }

    /// World-space `(x, z)` of a point. North is negative `z`.
    #[must_use]
    pub fn project(&self, lat: f64, lng: f64) -> (f64, f64) {
        ((lng - self.center_lng) * self.scale, -(lat - self.center_lat) * self.scale)
    }

    /// Latitude and longitude of a grid cell.
    #[must_use]
    pub fn unproject(&self, pos: GridPos) -> (f64, f64) {
        (
            self.center_lat - f64::from(pos.z) / self.scale,
            self.center_lng + f64::from(pos.x) / self.scale,
        )
    }
}

/// Round half up, the way the host rounds.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Nearest even integer, with odd values rounding up.
#[must_use]
pub const fn snap_even(v: i32) -> i32 {
    v.saturating_add(v & 1)
}

/// Claims even grid cells for stations, keeping them one cell apart.
#[derive(Debug, Clone, Default)]
pub struct GridSnapper {
    occupied: BTreeSet<GridPos>,
}

impl GridSnapper {
    /// A snapper with nothing placed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Even cell nearest to a world-space point.
    #[must_use]
    pub fn snap(x: f64, z: f64) -> GridPos {
        GridPos::new(snap_even(round_half_up(x)), snap_even(round_half_up(z)))
    }

    /// True if a station already holds the cell.
    #[must_use]
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.occupied.contains(&pos)
    }

    /// Claimed cells.
    #[must_use]
    pub const fn occupied(&self) -> &BTreeSet<GridPos> {
        &self.occupied
    }

    /// Find the free even cell nearest to `pos`.
    ///
    /// `pos` is snapped first. If taken, square rings of growing radius
    /// (step 2) are scanned along their perimeter, column by column.
    /// Returns `None` if nothing is free within [`SEARCH_RADIUS`].
    #[must_use]
    pub fn find_nearest_free(&self, pos: GridPos) -> Option<GridPos> {
        let start = GridPos::new(snap_even(pos.x), snap_even(pos.z));
        if !self.is_occupied(start) {
            return Some(start);
        }
        (2..SEARCH_RADIUS).step_by(2).find_map(|radius| {
            (-radius..=radius).step_by(2).find_map(|dx| {
                (-radius..=radius)
                    .step_by(2)
                    .filter(|&dz| dx.abs() == radius || dz.abs() == radius)
                    .map(|dz| GridPos::new(start.x + dx, start.z + dz))
                    .find(|p| !self.is_occupied(*p))
            })
        })
    }

    /// Snap a world-space point, claim the nearest free cell and return it.
    pub fn place(&mut self, x: f64, z: f64) -> Option<GridPos> {
        let pos = self.find_nearest_free(Self::snap(x, z))?;
        self.occupied.insert(pos);
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_even() {
        assert_eq!(snap_even(4), 4);
        assert_eq!(snap_even(3), 4);
        assert_eq!(snap_even(-3), -2);
        assert_eq!(snap_even(0), 0);
        assert_eq!(GridSnapper::snap(2.4, -0.6), GridPos::new(2, 0));
        assert_eq!(GridSnapper::snap(2.6, -1.6), GridPos::new(4, -2));
    }

    #[test]
    fn test_collision_moves_to_first_ring() {
        let mut snapper = GridSnapper::new();
        assert_eq!(snapper.place(0.0, 0.0), Some(GridPos::new(0, 0)));
        let second = snapper.place(0.2, 0.1).unwrap();
        assert_eq!(second, GridPos::new(-2, -2));
        assert_eq!(second.x.abs().max(second.z.abs()), 2);
        let third = snapper.place(0.0, 0.0).unwrap();
        assert_eq!(third, GridPos::new(-2, 0));
    }

    #[test]
    fn test_never_returns_occupied() {
        let mut snapper = GridSnapper::new();
        for _ in 0..30 {
            let p = snapper.find_nearest_free(GridPos::new(1, 1)).unwrap();
            assert!(!snapper.is_occupied(p));
            assert_eq!(p.x % 2, 0);
            assert_eq!(p.z % 2, 0);
            snapper.occupied.insert(p);
        }
        assert_eq!(snapper.occupied().len(), 30);
    }

    #[test]
    fn test_projection_centres_bounding_box() {
        let stations = vec![
            Station::new("a", 30.0, 120.0),
            Station::new("b", 32.0, 121.0),
            Station::new("c", 31.5, 119.0),
        ];
        let proj = Projection::fit(&stations, 96.0);
        assert!((proj.center_lat - 31.0).abs() < 1e-9);
        assert!((proj.center_lng - 120.0).abs() < 1e-9);
        let (x, z) = proj.project(32.0, 121.0);
        assert!((x - 96.0).abs() < 1e-9);
        assert!((z + 96.0).abs() < 1e-9);
        let (lat, lng) = proj.unproject(GridPos::new(96, -96));
        assert!((lat - 32.0).abs() < 1e-9 && (lng - 121.0).abs() < 1e-9);
    }

    #[test]
    fn test_station_json_defaults() {
        let s: Station = serde_json::from_str(r#"{"name": "x", "lat": 1.0, "lng": 2.0}"#).unwrap();
        assert_eq!(s.population, 100_000);
        assert_eq!(s.level, 3);
    }
}
