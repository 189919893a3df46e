#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-archetype think logic driven through a closed dispatch table.
//!
//! Every entity shares one data record. Its [`EntityKind`] selects the
//! function that updates it each frame. Think functions only mutate the
//! entity they are given; effects on the rest of the world are emitted as
//! [`Command`] values for the caller to apply once the pass completes.

mod archetypes;
mod player;
mod projectiles;
mod pursuit;
mod turret;
mod twins;

use glam::Vec2;
use rand::RngCore;
use tile_tanks_core::{Command, EntityId, EntityKind, Event, InputIntents, TileCoord};
use tile_tanks_world::{Entity, FrameParts, SharedFields, TileGrid};

pub use archetypes::Archetypes;

/// Entities updated by one think pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThinkPass {
    /// Only the player.
    Player,
    /// Every entity except the player.
    Others,
}

/// Frame inputs shared by every entity in a pass.
#[derive(Clone, Copy, Debug)]
pub struct ThinkInputs<'a> {
    /// Archetype templates used for spawned projectiles.
    pub archetypes: &'a Archetypes,
    /// Decoded player intents for this frame.
    pub intents: &'a InputIntents,
    /// Frame length in seconds.
    pub dt: f32,
}

/// Stateful driver that runs the think phase over the entity directory.
#[derive(Debug, Default)]
pub struct Behavior {
    excluded: Vec<TileCoord>,
}

impl Behavior {
    /// Updates every live entity covered by `pass` in slot order.
    ///
    /// Dead non-player entities are skipped. The dead player still thinks so
    /// that debug toggles and respawn requests are honoured.
    pub fn handle<R>(
        &mut self,
        pass: ThinkPass,
        parts: FrameParts<'_>,
        inputs: ThinkInputs<'_>,
        rng: &mut R,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) where
        R: RngCore,
    {
        let FrameParts {
            entities,
            grid,
            fields,
            player,
            exit,
        } = parts;
        let rng: &mut dyn RngCore = rng;

        self.excluded = entities.stationary_tiles();
        let player_body = player.and_then(|id| entities.get(id).map(|entity| Body::of(id, entity)));

        for id in entities.ids() {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            let is_player = entity.kind == EntityKind::Player;
            let selected = match pass {
                ThinkPass::Player => is_player,
                ThinkPass::Others => !is_player,
            };
            if !selected || (!entity.alive && !is_player) {
                continue;
            }
            let twin = entity
                .twin
                .and_then(|twin| entities.get(twin).map(|other| Body::of(twin, other)));

            let Some(entity) = entities.get_mut(id) else {
                continue;
            };
            let mut think = Think {
                id,
                grid,
                fields,
                exit,
                player: player_body,
                twin,
                excluded: &self.excluded,
                archetypes: inputs.archetypes,
                intents: inputs.intents,
                dt: inputs.dt,
                rng: &mut *rng,
                commands: &mut *out_commands,
                events: &mut *out_events,
            };
            think_fn(entity.kind)(entity, &mut think);
        }
    }
}

/// Position summary of another entity read before the think borrow.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) id: EntityId,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) alive: bool,
}

impl Body {
    fn of(id: EntityId, entity: &Entity) -> Self {
        Self {
            id,
            position: entity.position,
            radius: entity.radius,
            alive: entity.alive,
        }
    }
}

/// Everything a think function may read or emit besides its own entity.
pub(crate) struct Think<'a> {
    pub(crate) id: EntityId,
    pub(crate) grid: &'a TileGrid,
    pub(crate) fields: &'a SharedFields,
    pub(crate) exit: TileCoord,
    pub(crate) player: Option<Body>,
    pub(crate) twin: Option<Body>,
    pub(crate) excluded: &'a [TileCoord],
    pub(crate) archetypes: &'a Archetypes,
    pub(crate) intents: &'a InputIntents,
    pub(crate) dt: f32,
    pub(crate) rng: &'a mut dyn RngCore,
    pub(crate) commands: &'a mut Vec<Command>,
    pub(crate) events: &'a mut Vec<Event>,
}

impl Think<'_> {
    /// Live player, if any.
    pub(crate) fn live_player(&self) -> Option<Body> {
        self.player.filter(|player| player.alive)
    }

    /// Queues a projectile spawn.
    pub(crate) fn spawn(&mut self, kind: EntityKind, position: Vec2, orientation: f32) {
        let template = self.archetypes.template(kind);
        self.commands.push(Command::SpawnEntity {
            template,
            position,
            orientation,
        });
    }
}

type ThinkFn = fn(&mut Entity, &mut Think<'_>);

fn think_fn(kind: EntityKind) -> ThinkFn {
    match kind {
        EntityKind::Player => player::think,
        EntityKind::Scorpio => turret::think,
        EntityKind::Leo | EntityKind::Aries | EntityKind::Capricorn => pursuit::think,
        EntityKind::Aquarius => pursuit::think_amphibian,
        EntityKind::GeminiBrother | EntityKind::GeminiSister => twins::think,
        EntityKind::GoodBolt
        | EntityKind::GoodBullet
        | EntityKind::EvilBolt
        | EntityKind::EvilBouncingBolt
        | EntityKind::EvilBullet
        | EntityKind::EvilShell
        | EntityKind::GoodFlame => projectiles::think,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tile_tanks_core::{
        Command, EntityId, EntityKind, Event, InputIntents, TileCoord, TileDefinition,
        TileDefinitions, TileTypeId,
    };
    use tile_tanks_world::{apply, TileGrid, World};

    use crate::{Archetypes, Behavior, ThinkInputs, ThinkPass};

    pub(crate) const FLOOR: TileTypeId = TileTypeId::new(0);
    pub(crate) const WALL: TileTypeId = TileTypeId::new(1);
    pub(crate) const WATER: TileTypeId = TileTypeId::new(2);

    /// Open bordered arena with optional interior walls.
    pub(crate) fn world(width: u32, height: u32, walls: &[(i32, i32)]) -> World {
        let definitions = Arc::new(TileDefinitions::new(vec![
            TileDefinition::new("Floor", false, false),
            TileDefinition::new("Wall", true, false),
            TileDefinition::new("Water", false, true),
        ]));
        let mut grid = TileGrid::filled(width, height, FLOOR, definitions);
        let border: Vec<TileCoord> = grid.coords().filter(|c| grid.is_border(*c)).collect();
        for coord in border {
            grid.set_tile(coord, WALL);
        }
        for &(x, y) in walls {
            grid.set_tile(TileCoord::new(x, y), WALL);
        }
        let exit = TileCoord::new(
            i32::try_from(width).unwrap_or(3) - 2,
            i32::try_from(height).unwrap_or(3) - 2,
        );
        World::new(grid, TileCoord::new(1, 1), exit, 0)
    }

    pub(crate) fn spawn(world: &mut World, kind: EntityKind, position: Vec2, orientation: f32) -> EntityId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEntity {
                template: Archetypes::default().template(kind),
                position,
                orientation,
            },
            &mut events,
        );
        let id = match events.first() {
            Some(Event::EntitySpawned { entity, .. }) => *entity,
            other => panic!("unexpected events {other:?}"),
        };
        if kind == EntityKind::Player {
            apply(
                world,
                Command::RecomputePlayerFields {
                    coord: TileCoord::containing(position),
                },
                &mut events,
            );
        }
        id
    }

    /// Runs one pass and returns the emitted commands and events.
    pub(crate) fn think(
        world: &mut World,
        pass: ThinkPass,
        intents: InputIntents,
        dt: f32,
    ) -> (Vec<Command>, Vec<Event>) {
        let archetypes = Archetypes::default();
        let mut behavior = Behavior::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        behavior.handle(
            pass,
            world.frame_parts(),
            ThinkInputs {
                archetypes: &archetypes,
                intents: &intents,
                dt,
            },
            &mut rng,
            &mut commands,
            &mut events,
        );
        (commands, events)
    }
}
