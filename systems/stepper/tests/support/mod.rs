#![allow(dead_code)]

use std::sync::Arc;

use tile_tanks_core::{
    MapDefinition, MapDefinitions, Population, SessionDefinition, TileDefinition,
    TileDefinitions, WormSpec,
};
use tile_tanks_system_stepper::SessionAssets;

pub fn tiles() -> Arc<TileDefinitions> {
    Arc::new(TileDefinitions::new(vec![
        TileDefinition::new("Grass", false, false),
        TileDefinition::new("BrickWall", true, false),
        TileDefinition::new("Water", false, true),
        TileDefinition::new("BunkerWall", true, false),
        TileDefinition::new("BunkerFloor", false, false),
        TileDefinition::new("MapEntry", false, false),
        TileDefinition::new("MapExit", false, false),
    ]))
}

pub fn map(name: &str, population: Population) -> MapDefinition {
    MapDefinition {
        name: name.to_owned(),
        width: 15,
        height: 15,
        worms: vec![WormSpec {
            tile: "Water".to_owned(),
            count: 2,
            max_length: 6,
        }],
        population,
        ..MapDefinition::default()
    }
}

pub fn assets(maps: Vec<MapDefinition>) -> SessionAssets {
    SessionAssets {
        tiles: tiles(),
        maps: MapDefinitions::new(maps),
        ..SessionAssets::default()
    }
}

pub fn session(names: &[&str], seed: u64) -> SessionDefinition {
    SessionDefinition {
        maps: names.iter().map(|name| (*name).to_owned()).collect(),
        seed,
    }
}
