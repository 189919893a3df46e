#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for one tile-tanks map.
//!
//! The world owns the tile grid, the entity directory and the map-level cost
//! fields. Discrete mutations arrive as [`Command`] values through [`apply`];
//! per-frame systems borrow the state they need through [`World::frame_parts`].

mod cost_field;
mod entities;
mod entity;
pub mod geometry;
pub mod raycast;
mod tiles;

use glam::Vec2;
use tile_tanks_core::{Command, EntityId, EntityKind, Event, TileCoord, UNREACHABLE};
use tracing::debug;

pub use cost_field::CostField;
pub use entities::EntityDirectory;
pub use entity::{Entity, Navigation, Pilot};
pub use tiles::{TileBounds, TileGrid};

/// Map-level cost fields shared by every entity.
#[derive(Clone, Debug, Default)]
pub struct SharedFields {
    /// Distances from the start tile with water treated as solid.
    pub start_to_end: CostField,
    /// Zero on land-traversable tiles, sentinel elsewhere.
    pub land_solid: CostField,
    /// Zero on amphibian-traversable tiles, sentinel elsewhere.
    pub amphibian_solid: CostField,
    /// Land distances to the player's tile.
    pub land_to_player: CostField,
    /// Amphibian distances to the player's tile.
    pub amphibian_to_player: CostField,
}

impl SharedFields {
    /// Distance-to-player field matching the water policy.
    #[must_use]
    pub fn to_player(&self, water_as_solid: bool) -> &CostField {
        if water_as_solid {
            &self.land_to_player
        } else {
            &self.amphibian_to_player
        }
    }
}

/// State borrowed by per-frame systems.
#[derive(Debug)]
pub struct FrameParts<'a> {
    /// Mutable entity storage.
    pub entities: &'a mut EntityDirectory,
    /// Tile grid, read-only while entities think and collide.
    pub grid: &'a TileGrid,
    /// Map-level cost fields.
    pub fields: &'a SharedFields,
    /// Player handle, if the player is on this map.
    pub player: Option<EntityId>,
    /// Exit tile.
    pub exit: TileCoord,
}

/// Authoritative state of one map.
#[derive(Debug)]
pub struct World {
    grid: TileGrid,
    entities: EntityDirectory,
    fields: SharedFields,
    start: TileCoord,
    exit: TileCoord,
    player: Option<EntityId>,
    tracked: Option<EntityId>,
    map_index: usize,
}

impl World {
    /// Installs a generated grid and builds the static fields.
    #[must_use]
    pub fn new(grid: TileGrid, start: TileCoord, exit: TileCoord, map_index: usize) -> Self {
        let mut fields = SharedFields {
            land_solid: CostField::static_mask(&grid, true, UNREACHABLE),
            amphibian_solid: CostField::static_mask(&grid, false, UNREACHABLE),
            ..SharedFields::default()
        };
        fields
            .start_to_end
            .recompute(&grid, start, UNREACHABLE, true, &[]);
        fields
            .land_to_player
            .recompute(&grid, start, UNREACHABLE, true, &[]);
        fields
            .amphibian_to_player
            .recompute(&grid, start, UNREACHABLE, false, &[]);

        Self {
            grid,
            entities: EntityDirectory::new(),
            fields,
            start,
            exit,
            player: None,
            tracked: None,
            map_index,
        }
    }

    /// Tile grid of the map.
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Entity storage.
    #[must_use]
    pub fn entities(&self) -> &EntityDirectory {
        &self.entities
    }

    /// Mutable entity storage.
    #[must_use]
    pub fn entities_mut(&mut self) -> &mut EntityDirectory {
        &mut self.entities
    }

    /// Map-level cost fields.
    #[must_use]
    pub fn fields(&self) -> &SharedFields {
        &self.fields
    }

    /// Splits the world into the borrows used by per-frame systems.
    #[must_use]
    pub fn frame_parts(&mut self) -> FrameParts<'_> {
        FrameParts {
            entities: &mut self.entities,
            grid: &self.grid,
            fields: &self.fields,
            player: self.player,
            exit: self.exit,
        }
    }

    /// Mutable entity storage alongside the read-only grid.
    #[must_use]
    pub fn entities_and_grid(&mut self) -> (&mut EntityDirectory, &TileGrid) {
        (&mut self.entities, &self.grid)
    }

    /// Takes the player out of the map.
    pub fn detach_player(&mut self) -> Option<Entity> {
        let id = self.player.take()?;
        self.entities.remove(id)
    }

    /// Places the player on the start tile, alive and at full health.
    pub fn attach_player(&mut self, mut player: Entity, out_events: &mut Vec<Event>) -> EntityId {
        let start = self.start.center();
        player.position = start;
        player.last_position = start;
        player.velocity = Vec2::ZERO;
        player.alive = true;
        player.garbage = false;
        player.health = player.max_health;

        let kind = player.kind;
        let id = self.entities.spawn(player);
        self.player = Some(id);
        self.recompute_player_fields(self.start);
        out_events.push(Event::EntitySpawned { entity: id, kind });
        id
    }

    fn recompute_player_fields(&mut self, coord: TileCoord) {
        let excluded = self.entities.stationary_tiles();
        self.fields
            .land_to_player
            .recompute(&self.grid, coord, UNREACHABLE, true, &excluded);
        self.fields
            .amphibian_to_player
            .recompute(&self.grid, coord, UNREACHABLE, false, &excluded);
    }

    fn regenerate_solid_fields(&mut self) {
        let excluded = self.entities.stationary_tiles();
        let mut regenerated = 0_usize;
        for id in self.entities.ids() {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if !entity.alive || !entity.kind.is_mobile_npc() {
                continue;
            }
            let seed = entity.tile();
            let water_as_solid = entity.water_as_solid();
            let Some(navigation) = entity.navigation.as_mut() else {
                continue;
            };
            navigation
                .solid
                .recompute(&self.grid, seed, UNREACHABLE, water_as_solid, &excluded);
            regenerated += 1;
        }

        if let Some(coord) = self
            .player
            .and_then(|id| self.entities.get(id))
            .map(Entity::tile)
        {
            self.recompute_player_fields(coord);
        }
        debug!(
            map = self.map_index,
            regenerated, "regenerated solid fields"
        );
    }

    fn retrack_debug_entity(&mut self) -> Option<EntityId> {
        self.tracked = self
            .entities
            .ids_of_kind(EntityKind::Leo)
            .into_iter()
            .find(|id| self.entities.get(*id).is_some_and(|entity| entity.alive));
        self.tracked
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnEntity {
            template,
            position,
            orientation,
        } => {
            let entity = Entity::from_template(&template, position, orientation);
            let id = world.entities.spawn(entity);
            if template.kind == EntityKind::Player {
                world.player = Some(id);
            }
            out_events.push(Event::EntitySpawned {
                entity: id,
                kind: template.kind,
            });
            if template.kind.is_bullet() {
                out_events.push(Event::BulletFired {
                    kind: template.kind,
                    position,
                });
            }
        }
        Command::RemoveEntity { entity } => {
            if world.entities.remove(entity).is_some() && world.player == Some(entity) {
                world.player = None;
            }
        }
        Command::DamageEntity { entity, amount } => {
            let _ = world.entities.damage(entity, amount, out_events);
        }
        Command::ApplyTileOverride {
            position,
            tile,
            duration,
        } => {
            if let Some(coord) = world
                .grid
                .apply_temporary_override(position, tile, duration)
            {
                out_events.push(Event::TileOverridden { coord, tile });
            }
        }
        Command::AdvanceOverrides { dt } => {
            let mut reverted = Vec::new();
            world.grid.advance_overrides(dt, &mut reverted);
            out_events.extend(
                reverted
                    .into_iter()
                    .map(|(coord, tile)| Event::TileReverted { coord, tile }),
            );
        }
        Command::RecomputePlayerFields { coord } => {
            world.recompute_player_fields(coord);
        }
        Command::RegenerateSolidFields => {
            world.regenerate_solid_fields();
            out_events.push(Event::SolidFieldsRegenerated);
        }
        Command::KillAllBullets => {
            for id in world.entities.ids() {
                let is_bullet = world
                    .entities
                    .get(id)
                    .is_some_and(|entity| entity.kind.is_bullet());
                if is_bullet {
                    world.entities.kill(id, out_events);
                }
            }
        }
        Command::RespawnPlayer => {
            let Some(id) = world.player else {
                return;
            };
            let Some(player) = world.entities.get_mut(id) else {
                return;
            };
            if player.alive {
                return;
            }
            player.alive = true;
            player.health = player.max_health;
            out_events.push(Event::PlayerRespawned { entity: id });
        }
        Command::RetrackDebugEntity => {
            let entity = world.retrack_debug_entity();
            out_events.push(Event::TrackedEntityChanged { entity });
        }
        Command::SweepGarbage => {
            let _ = world.entities.sweep_garbage();
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use tile_tanks_core::{EntityId, EntityKind, Faction, TileCoord, TileTypeId};

    use super::{CostField, World};

    /// Tile type at the coordinate.
    #[must_use]
    pub fn tile_at(world: &World, coord: TileCoord) -> Option<TileTypeId> {
        world.grid.tile_at(coord)
    }

    /// Start tile of the map.
    #[must_use]
    pub fn start(world: &World) -> TileCoord {
        world.start
    }

    /// Exit tile of the map.
    #[must_use]
    pub fn exit(world: &World) -> TileCoord {
        world.exit
    }

    /// Player handle, if the player is on this map.
    #[must_use]
    pub fn player(world: &World) -> Option<EntityId> {
        world.player
    }

    /// Position of the map within the session.
    #[must_use]
    pub fn map_index(world: &World) -> usize {
        world.map_index
    }

    /// Debug-tracked roaming entity.
    #[must_use]
    pub fn tracked_entity(world: &World) -> Option<EntityId> {
        world.tracked
    }

    /// Captures a read-only view of every stored entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let mut snapshots: Vec<EntitySnapshot> = world
            .entities
            .iter()
            .map(|(id, entity)| EntitySnapshot {
                id,
                kind: entity.kind,
                faction: entity.faction,
                position: entity.position,
                orientation: entity.orientation,
                turret_orientation: entity.turret_orientation(),
                health: entity.health,
                alive: entity.alive,
                path: entity
                    .navigation
                    .as_ref()
                    .map(|navigation| navigation.path.clone())
                    .unwrap_or_default(),
                laser: entity.laser,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        EntityView { snapshots }
    }

    /// Captures one of the map's cost fields for debug visualisation.
    #[must_use]
    pub fn cost_field_snapshot(world: &World, layer: CostFieldLayer) -> Option<CostFieldSnapshot> {
        let field: &CostField = match layer {
            CostFieldLayer::StartToEnd => &world.fields.start_to_end,
            CostFieldLayer::LandSolid => &world.fields.land_solid,
            CostFieldLayer::AmphibianSolid => &world.fields.amphibian_solid,
            CostFieldLayer::LandToPlayer => &world.fields.land_to_player,
            CostFieldLayer::AmphibianToPlayer => &world.fields.amphibian_to_player,
            CostFieldLayer::TrackedRoam => {
                &world
                    .tracked
                    .and_then(|id| world.entities.get(id))?
                    .navigation
                    .as_ref()?
                    .roam
            }
        };
        Some(CostFieldSnapshot {
            width: field.width(),
            height: field.height(),
            values: field.values().to_vec(),
            sentinel: field.sentinel(),
        })
    }

    /// Cost field layers exposed for debugging.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum CostFieldLayer {
        /// Distances from the start tile.
        StartToEnd,
        /// Static land traversability mask.
        LandSolid,
        /// Static amphibian traversability mask.
        AmphibianSolid,
        /// Land distances to the player.
        LandToPlayer,
        /// Amphibian distances to the player.
        AmphibianToPlayer,
        /// Roam field of the debug-tracked entity.
        TrackedRoam,
    }

    /// Dimensions, values and sentinel of a cost field.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CostFieldSnapshot {
        /// Width in tiles.
        pub width: u32,
        /// Height in tiles.
        pub height: u32,
        /// Row-major values.
        pub values: Vec<u16>,
        /// Value marking unreachable tiles.
        pub sentinel: u16,
    }

    /// Read-only snapshot describing all stored entities.
    #[derive(Clone, Debug)]
    pub struct EntityView {
        snapshots: Vec<EntitySnapshot>,
    }

    impl EntityView {
        /// Iterator over the captured snapshots in handle order.
        pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EntitySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single entity used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Handle of the entity.
        pub id: EntityId,
        /// Archetype.
        pub kind: EntityKind,
        /// Allegiance.
        pub faction: Faction,
        /// Centre position.
        pub position: Vec2,
        /// Body heading in degrees.
        pub orientation: f32,
        /// Absolute turret heading in degrees.
        pub turret_orientation: f32,
        /// Current health.
        pub health: f32,
        /// Alive flag.
        pub alive: bool,
        /// Active waypoints, far end first.
        pub path: Vec<Vec2>,
        /// Active laser segment.
        pub laser: Option<(Vec2, Vec2)>,
    }
}
