//! Ordered sequence of generated maps sharing one player.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tile_tanks_core::{
    Command, ConfigError, EntityKind, Event, InputIntents, MapDefinitions, MapImage,
    SessionDefinition, TileDefinitions, Tunables, Vec2,
};
use tile_tanks_system_behavior::Archetypes;
use tile_tanks_system_map_generation::MapGenerator;
use tile_tanks_system_spawning::Spawning;
use tile_tanks_world::{apply, query, Entity, World};
use tracing::{debug, info, warn};

use crate::SimStepper;

/// Externally authored data a session is built from.
#[derive(Clone, Debug, Default)]
pub struct SessionAssets {
    /// Tile types shared by every map.
    pub tiles: Arc<TileDefinitions>,
    /// Map definitions addressable by name.
    pub maps: MapDefinitions,
    /// Decoded layout images keyed by map definition name.
    pub images: BTreeMap<String, MapImage>,
    /// Numeric tunables for the archetypes.
    pub tunables: Tunables,
}

/// Every map of a playthrough, generated up front, and the active index.
#[derive(Debug)]
pub struct Session {
    worlds: Vec<World>,
    current: usize,
    stepper: SimStepper,
    rng: ChaCha8Rng,
    frames: u64,
    won: bool,
}

impl Session {
    /// Generates and populates every listed map, then places the player on
    /// the first one.
    ///
    /// Maps are generated in session order from a single random stream
    /// seeded by the definition, so the same seed yields the same session.
    pub fn start(
        definition: &SessionDefinition,
        assets: &SessionAssets,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, ConfigError> {
        if definition.maps.is_empty() {
            return Err(ConfigError::EmptySession);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(definition.seed);
        let archetypes = Archetypes::from_tunables(&assets.tunables);
        let generator = MapGenerator::new();
        let mut spawning = Spawning::new();

        let mut worlds = Vec::with_capacity(definition.maps.len());
        for (index, name) in definition.maps.iter().enumerate() {
            let map = assets.maps.get(name)?;
            let generated =
                generator.generate(map, &assets.tiles, assets.images.get(name), &mut rng)?;
            let mut world = World::new(generated.grid, generated.start, generated.exit, index);
            let placed = spawning.populate(&mut world, map, &archetypes, &mut rng, out_events);
            info!(
                map = %name,
                index,
                attempts = generated.attempts,
                placed,
                "map ready"
            );
            worlds.push(world);
        }

        let player = Entity::from_template(
            &archetypes.template(EntityKind::Player),
            Vec2::ZERO,
            0.0,
        );
        if let Some(first) = worlds.first_mut() {
            let _ = first.attach_player(player, out_events);
        }

        Ok(Self {
            worlds,
            current: 0,
            stepper: SimStepper::new(archetypes),
            rng,
            frames: 0,
            won: false,
        })
    }

    /// Runs one frame on the active map.
    ///
    /// Reaching the exit moves the player on before the call returns. Once
    /// the last map is cleared further calls do nothing.
    pub fn step(&mut self, intents: &InputIntents, dt: f32, out_events: &mut Vec<Event>) {
        if self.won {
            return;
        }
        let Some(world) = self.worlds.get_mut(self.current) else {
            return;
        };

        let first_event = out_events.len();
        self.stepper
            .step(world, intents, dt, &mut self.rng, out_events);
        self.frames += 1;

        let exit_reached = out_events[first_event..]
            .iter()
            .any(|event| matches!(event, Event::ExitReached { .. }));
        if exit_reached {
            self.go_to_next_map(out_events);
        }
    }

    /// Moves the player from the active map to the start of the next one.
    ///
    /// Bullets left on the abandoned map are cleared. Leaving the last map
    /// ends the session instead.
    pub fn go_to_next_map(&mut self, out_events: &mut Vec<Event>) {
        if self.won {
            return;
        }
        let from = self.current;
        let to = from + 1;
        let is_last = to >= self.worlds.len();
        let Some(world) = self.worlds.get_mut(from) else {
            return;
        };
        apply(world, Command::KillAllBullets, out_events);
        apply(world, Command::SweepGarbage, out_events);

        if is_last {
            self.won = true;
            info!(map = from, frames = self.frames, "game won");
            out_events.push(Event::GameWon);
            return;
        }

        let player = world.detach_player();
        let Some(next) = self.worlds.get_mut(to) else {
            return;
        };
        match player {
            Some(player) => {
                let id = next.attach_player(player, out_events);
                debug!(?id, map = to, "player moved to next map");
            }
            None => warn!(from, to, "left a map without a player"),
        }
        self.current = to;
        info!(from, to, "level transition");
        out_events.push(Event::LevelTransition { from, to });
    }

    /// Active map.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.worlds[self.current]
    }

    /// Mutable access to the active map.
    #[must_use]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.worlds[self.current]
    }

    /// Every map in play order.
    #[must_use]
    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    /// Index of the active map.
    #[must_use]
    pub fn map_index(&self) -> usize {
        query::map_index(self.world())
    }

    /// Frames stepped so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Reports whether the last map was cleared.
    #[must_use]
    pub fn is_won(&self) -> bool {
        self.won
    }

    /// Stepper driving the active map.
    #[must_use]
    pub fn stepper(&self) -> &SimStepper {
        &self.stepper
    }
}
