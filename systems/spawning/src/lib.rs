#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Places the initial enemy population of a freshly generated map.

use rand::Rng;
use tile_tanks_core::{Command, EntityId, EntityKind, Event, MapDefinition, TileCoord};
use tile_tanks_system_behavior::Archetypes;
use tile_tanks_system_pathing as pathing;
use tile_tanks_world::{apply, query, TileGrid, World};
use tracing::{debug, warn};

/// Spawning system that fills a map with its configured population.
#[derive(Debug, Default)]
pub struct Spawning {
    pool: Vec<TileCoord>,
}

impl Spawning {
    /// Creates a spawning system with an empty tile pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns every enemy listed in the map definition.
    ///
    /// Each enemy takes a random spawnable tile without replacement and
    /// starts at its centre. Gemini pairs are only placed when both twins
    /// fit. Once the pool is exhausted the remaining enemies are skipped.
    /// Afterwards the distance-to-player fields are reseeded at the start
    /// tile around the placed turrets and a roaming entity is tracked.
    /// Returns the number of entities placed.
    pub fn populate<R>(
        &mut self,
        world: &mut World,
        definition: &MapDefinition,
        archetypes: &Archetypes,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        self.pool = spawnable_tiles(world.grid(), definition);
        let roster = roster(definition);
        let requested = roster.iter().map(|group| group.len()).sum::<usize>();

        let mut placed = 0;
        for group in &roster {
            if self.pool.len() < group.len() {
                warn!(
                    map = %definition.name,
                    placed,
                    requested,
                    "spawn tiles exhausted, skipping the remaining population"
                );
                break;
            }

            let mut members = Vec::with_capacity(group.len());
            for &kind in group {
                let coord = self.pool.remove(rng.gen_range(0..self.pool.len()));
                let orientation = if kind == EntityKind::Scorpio || kind.is_twin() {
                    rng.gen_range(0.0..360.0)
                } else {
                    0.0
                };
                let Some(id) = spawn(world, archetypes, kind, coord, orientation, out_events) else {
                    continue;
                };
                initialise(world, id, rng);
                members.push(id);
                placed += 1;
            }
            if let [brother, sister] = members.as_slice() {
                link_twins(world, *brother, *sister);
            }
        }

        let start = query::start(world);
        apply(world, Command::RecomputePlayerFields { coord: start }, out_events);
        apply(world, Command::RetrackDebugEntity, out_events);
        debug!(map = %definition.name, placed, requested, "populated map");
        placed
    }
}

/// Tiles an enemy may start on.
///
/// Solid tiles, water, bunker floors and the entry and exit markers are
/// excluded.
#[must_use]
pub fn spawnable_tiles(grid: &TileGrid, definition: &MapDefinition) -> Vec<TileCoord> {
    let reserved = [
        definition.start_bunker_floor.as_str(),
        definition.end_bunker_floor_name(),
        definition.entry_tile.as_str(),
        definition.exit_tile.as_str(),
    ];
    grid.coords()
        .filter(|coord| !grid.is_solid(*coord, true))
        .filter(|coord| {
            grid.tile_at(*coord)
                .and_then(|tile| grid.definitions().get(tile))
                .is_some_and(|tile| !reserved.contains(&tile.name.as_str()))
        })
        .collect()
}

fn roster(definition: &MapDefinition) -> Vec<Vec<EntityKind>> {
    let population = &definition.population;
    let singles = [
        (EntityKind::Scorpio, population.scorpio),
        (EntityKind::Leo, population.leo),
        (EntityKind::Aries, population.aries),
        (EntityKind::Capricorn, population.capricorn),
        (EntityKind::Aquarius, population.aquarius),
    ];

    let mut roster: Vec<Vec<EntityKind>> = singles
        .into_iter()
        .flat_map(|(kind, count)| (0..count).map(move |_| vec![kind]))
        .collect();
    roster.extend(
        (0..population.gemini_pairs)
            .map(|_| vec![EntityKind::GeminiBrother, EntityKind::GeminiSister]),
    );
    roster
}

fn spawn(
    world: &mut World,
    archetypes: &Archetypes,
    kind: EntityKind,
    coord: TileCoord,
    orientation: f32,
    out_events: &mut Vec<Event>,
) -> Option<EntityId> {
    let first = out_events.len();
    apply(
        world,
        Command::SpawnEntity {
            template: archetypes.template(kind),
            position: coord.center(),
            orientation,
        },
        out_events,
    );
    out_events[first..].iter().find_map(|event| match event {
        Event::EntitySpawned { entity, .. } => Some(*entity),
        _ => None,
    })
}

fn initialise<R>(world: &mut World, id: EntityId, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let excluded = world.entities().stationary_tiles();
    let (entities, grid) = world.entities_and_grid();
    let Some(entity) = entities.get_mut(id) else {
        return;
    };
    if entity.navigation.is_some() && !pathing::init_navigation(entity, grid, &excluded, rng) {
        debug!(kind = ?entity.kind, "spawned entity has nowhere to roam");
    }
}

fn link_twins(world: &mut World, brother: EntityId, sister: EntityId) {
    if let Some((first, second)) = world.entities_mut().pair_mut(brother, sister) {
        first.twin = Some(sister);
        second.twin = Some(brother);
    }
}
