#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-order frame stepper and the multi-map session built on top of it.
//!
//! A frame runs six phases, each completing before the next begins:
//! tile override ageing, the player's think, every other entity's think,
//! contact resolution, reactions to deaths, and the garbage sweep.

mod session;

use rand::RngCore;
use tile_tanks_core::{Command, EntityKind, Event, InputIntents};
use tile_tanks_system_behavior::{Archetypes, Behavior, ThinkInputs, ThinkPass};
use tile_tanks_system_physics::Physics;
use tile_tanks_world::{apply, query, World};

pub use session::{Session, SessionAssets};

/// Per-frame driver owning the system state shared across frames.
#[derive(Debug)]
pub struct SimStepper {
    archetypes: Archetypes,
    behavior: Behavior,
    physics: Physics,
    commands: Vec<Command>,
}

impl Default for SimStepper {
    fn default() -> Self {
        Self::new(Archetypes::default())
    }
}

impl SimStepper {
    /// Creates a stepper spawning projectiles from the provided archetypes.
    #[must_use]
    pub fn new(archetypes: Archetypes) -> Self {
        Self {
            archetypes,
            behavior: Behavior::default(),
            physics: Physics::new(),
            commands: Vec::new(),
        }
    }

    /// Archetype templates used for spawned entities.
    #[must_use]
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    /// Advances the world by one frame of `dt` seconds.
    ///
    /// Commands emitted by a think pass are applied once the pass completes,
    /// so the player's effects are visible to every other entity this frame.
    pub fn step<R>(
        &mut self,
        world: &mut World,
        intents: &InputIntents,
        dt: f32,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: RngCore,
    {
        let first_event = out_events.len();
        let tracked = query::tracked_entity(world);

        apply(world, Command::AdvanceOverrides { dt }, out_events);

        for pass in [ThinkPass::Player, ThinkPass::Others] {
            self.behavior.handle(
                pass,
                world.frame_parts(),
                ThinkInputs {
                    archetypes: &self.archetypes,
                    intents,
                    dt,
                },
                rng,
                &mut self.commands,
                out_events,
            );
            for command in self.commands.drain(..) {
                apply(world, command, out_events);
            }
        }

        {
            let (entities, grid) = world.entities_and_grid();
            self.physics.handle(entities, grid, out_events);
        }

        let (turret_died, tracked_died) = out_events[first_event..].iter().fold(
            (false, false),
            |(turret, tracked_died), event| match event {
                Event::EntityDied { entity, kind, .. } => (
                    turret || *kind == EntityKind::Scorpio,
                    tracked_died || Some(*entity) == tracked,
                ),
                _ => (turret, tracked_died),
            },
        );
        if turret_died {
            apply(world, Command::RegenerateSolidFields, out_events);
        }
        if tracked_died {
            apply(world, Command::RetrackDebugEntity, out_events);
        }

        apply(world, Command::SweepGarbage, out_events);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tile_tanks_core::{
        Command, EntityId, EntityKind, Event, InputIntents, TileCoord, TileDefinition,
        TileDefinitions, TileTypeId, Tunables,
    };
    use tile_tanks_system_behavior::Archetypes;
    use tile_tanks_world::{apply, query, TileGrid, World};

    use super::SimStepper;

    fn world() -> World {
        let definitions = Arc::new(TileDefinitions::new(vec![
            TileDefinition::new("Floor", false, false),
            TileDefinition::new("Wall", true, false),
            TileDefinition::new("Water", false, true),
        ]));
        let mut grid = TileGrid::filled(9, 7, TileTypeId::new(0), definitions);
        let border: Vec<TileCoord> = grid.coords().filter(|c| grid.is_border(*c)).collect();
        for coord in border {
            grid.set_tile(coord, TileTypeId::new(1));
        }
        World::new(grid, TileCoord::new(1, 1), TileCoord::new(7, 5), 0)
    }

    fn fragile() -> Archetypes {
        Archetypes::from_tunables(
            &Tunables::new()
                .with("scorpio.health", 1.0)
                .with("leo.health", 1.0),
        )
    }

    fn spawn(
        world: &mut World,
        archetypes: &Archetypes,
        kind: EntityKind,
        position: Vec2,
        orientation: f32,
    ) -> EntityId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEntity {
                template: archetypes.template(kind),
                position,
                orientation,
            },
            &mut events,
        );
        match events.first() {
            Some(Event::EntitySpawned { entity, .. }) => *entity,
            other => panic!("unexpected events {other:?}"),
        }
    }

    fn step(stepper: &mut SimStepper, world: &mut World, intents: InputIntents) -> Vec<Event> {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut events = Vec::new();
        stepper.step(world, &intents, 0.016, &mut rng, &mut events);
        events
    }

    #[test]
    fn player_shot_lands_in_the_same_frame() {
        let archetypes = fragile();
        let mut world = world();
        let _ = spawn(&mut world, &archetypes, EntityKind::Player, Vec2::new(1.5, 1.5), 0.0);
        let leo = spawn(&mut world, &archetypes, EntityKind::Leo, Vec2::new(2.0, 1.5), 180.0);
        let mut stepper = SimStepper::new(archetypes);

        let events = step(
            &mut stepper,
            &mut world,
            InputIntents {
                fire_held: true,
                ..InputIntents::default()
            },
        );

        assert!(events.iter().any(|event| matches!(
            event,
            Event::EntityDied { entity, kind: EntityKind::Leo, .. } if *entity == leo
        )));
        assert!(!world.entities().contains(leo));
    }

    #[test]
    fn turret_death_regenerates_solid_fields() {
        let archetypes = fragile();
        let mut world = world();
        let _ = spawn(&mut world, &archetypes, EntityKind::Player, Vec2::new(1.5, 1.5), 0.0);
        let scorpio = spawn(&mut world, &archetypes, EntityKind::Scorpio, Vec2::new(4.5, 3.5), 0.0);
        let _ = spawn(&mut world, &archetypes, EntityKind::GoodBolt, Vec2::new(4.5, 3.5), 0.0);
        apply(
            &mut world,
            Command::RecomputePlayerFields {
                coord: TileCoord::new(1, 1),
            },
            &mut Vec::new(),
        );
        assert!(!world
            .fields()
            .land_to_player
            .is_reachable(TileCoord::new(4, 3)));
        let mut stepper = SimStepper::new(archetypes);

        let events = step(&mut stepper, &mut world, InputIntents::default());

        assert!(events.contains(&Event::SolidFieldsRegenerated));
        assert!(!world.entities().contains(scorpio));
        assert!(world
            .fields()
            .land_to_player
            .is_reachable(TileCoord::new(4, 3)));
    }

    #[test]
    fn tracked_leo_death_selects_the_next_one() {
        let archetypes = fragile();
        let mut world = world();
        let first = spawn(&mut world, &archetypes, EntityKind::Leo, Vec2::new(3.5, 3.5), 0.0);
        let second = spawn(&mut world, &archetypes, EntityKind::Leo, Vec2::new(6.5, 1.5), 0.0);
        let _ = spawn(&mut world, &archetypes, EntityKind::GoodBolt, Vec2::new(3.5, 3.5), 0.0);
        apply(&mut world, Command::RetrackDebugEntity, &mut Vec::new());
        assert_eq!(query::tracked_entity(&world), Some(first));
        let mut stepper = SimStepper::new(archetypes);

        let events = step(&mut stepper, &mut world, InputIntents::default());

        assert_eq!(query::tracked_entity(&world), Some(second));
        assert!(events.contains(&Event::TrackedEntityChanged {
            entity: Some(second)
        }));
    }

    #[test]
    fn expired_overrides_revert_before_entities_think() {
        let archetypes = Archetypes::default();
        let mut world = world();
        apply(
            &mut world,
            Command::ApplyTileOverride {
                position: Vec2::new(3.5, 3.5),
                tile: TileTypeId::new(2),
                duration: 0.01,
            },
            &mut Vec::new(),
        );
        let mut stepper = SimStepper::new(archetypes);

        let events = step(&mut stepper, &mut world, InputIntents::default());

        assert_eq!(
            events.first(),
            Some(&Event::TileReverted {
                coord: TileCoord::new(3, 3),
                tile: TileTypeId::new(0),
            })
        );
    }

    #[test]
    fn spent_projectiles_are_swept_at_frame_end() {
        let archetypes = Archetypes::default();
        let mut world = world();
        let bolt = spawn(&mut world, &archetypes, EntityKind::EvilBolt, Vec2::new(7.95, 3.5), 0.0);
        let mut stepper = SimStepper::new(archetypes);

        let events = step(&mut stepper, &mut world, InputIntents::default());

        assert!(!world.entities().contains(bolt));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::EntityDied { .. })));
    }
}
