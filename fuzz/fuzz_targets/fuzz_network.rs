#![no_main]

use std::collections::{BTreeSet, VecDeque};

use arbitrary::Arbitrary;
use gemrail::world::{LinkKind, Station, WorldConfig, generate_world};
use libfuzzer_sys::fuzz_target;

/// Structured input for board generation fuzzing.
#[derive(Arbitrary, Debug)]
struct NetworkInput {
    /// Stations as (lat offset, lng offset, population, level).
    stations: Vec<(u8, u8, u32, u8)>,
    /// World seed.
    seed: u64,
    /// Special tile chance in percent.
    special: u8,
    /// Add shortcuts.
    shortcuts: bool,
}

fuzz_target!(|input: NetworkInput| {
    let stations: Vec<Station> = input
        .stations
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, &(lat, lng, pop, level))| {
            Station::new(format!("s{i}"), 30.0 + f64::from(lat) / 128.0, 120.0 + f64::from(lng) / 128.0)
                .with_population(u64::from(pop))
                .with_level(level % 6)
        })
        .collect();
    let config = WorldConfig {
        seed: input.seed,
        scale: 24.0,
        render_radius: 3,
        special_chance: f64::from(input.special % 101) / 100.0,
        shortcuts: input.shortcuts,
        ..WorldConfig::default()
    };
    let Ok(world) = generate_world(&stations, &config) else {
        return;
    };

    let graph = world.tiles();
    let spanning = world.network().links_of(LinkKind::Spanning).count();
    assert_eq!(spanning, world.nodes().len().saturating_sub(1));

    let Some(start) = graph.start() else {
        assert!(world.nodes().is_empty());
        return;
    };
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(t) = queue.pop_front() {
        for &n in graph.neighbors(t) {
            assert!(graph.neighbors(n).contains(&t));
            if seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    for node in world.nodes() {
        let tile = graph.at(node.pos).expect("station has a tile");
        assert!(seen.contains(&tile.id));
    }
});
