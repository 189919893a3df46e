#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tile-tanks simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the per-frame systems. Systems describe discrete
//! mutations as [`Command`] values, the world executes them through its
//! `apply` entry point, and then broadcasts [`Event`] values that rendering and
//! audio collaborators consume fire-and-forget. Definitions, tunables and the
//! uniform [`EntityTemplate`] record also live here so that every crate agrees
//! on the shape of externally authored data.

mod definitions;
mod tunables;

pub use definitions::{
    ConfigError, MapDefinition, MapDefinitions, MapImage, Population, Rgba8, SessionDefinition,
    TileDefinition, TileDefinitions, WormSpec,
};
pub use glam::Vec2;
pub use tunables::Tunables;

/// Sentinel stored in cost fields for tiles that cannot be reached.
pub const UNREACHABLE: u16 = u16::MAX;

/// Maximum number of worm stroke types honoured by procedural generation.
pub const MAX_WORM_TYPES: usize = 4;

/// Distance between tile centres under which two tiles count as adjacent.
pub const ADJACENT_TILE_DISTANCE: f32 = 1.25;

/// Integer coordinate of a tile within the grid. `+y` points north.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by the provided offsets.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Tile containing the provided world position.
    #[must_use]
    pub fn containing(position: Vec2) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
        }
    }

    /// World position of the tile centre.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Four cardinal neighbours in north, east, south, west order.
    #[must_use]
    pub const fn cardinal_neighbors(&self) -> [TileCoord; 4] {
        [
            self.offset(0, 1),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(-1, 0),
        ]
    }

    /// Eight surrounding tiles: cardinals first, then diagonals.
    #[must_use]
    pub const fn surrounding(&self) -> [TileCoord; 8] {
        [
            self.offset(0, 1),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(-1, 0),
            self.offset(-1, 1),
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, -1),
        ]
    }
}

/// Index of a tile type inside [`TileDefinitions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileTypeId(u16);

impl TileTypeId {
    /// Creates a new tile type identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Stable handle to an entity slot.
///
/// The index addresses the slot, the generation distinguishes successive
/// occupants of a reused slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a new entity identifier.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index addressed by the identifier.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot occupant.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Allegiance used to decide which bullets hurt which entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Faction {
    /// The player and the player's projectiles.
    Good,
    /// Every enemy archetype and its projectiles.
    Evil,
}

/// Closed set of entity archetypes.
///
/// Declaration order doubles as the bullet collision order: bodies are
/// checked from the last non-bullet kind down to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Player controlled tank.
    Player,
    /// Stationary turret that blocks navigation while alive.
    Scorpio,
    /// Land-bound chaser firing plain bullets.
    Leo,
    /// Land-bound chaser carrying a reflective shield.
    Aries,
    /// Land-bound chaser firing tracking shells.
    Capricorn,
    /// Amphibious chaser leaving a water trail.
    Aquarius,
    /// First twin of a laser-linked pair.
    GeminiBrother,
    /// Second twin of a laser-linked pair.
    GeminiSister,
    /// Player bolt that bounces off walls twice.
    GoodBolt,
    /// Player bullet.
    GoodBullet,
    /// Enemy bolt.
    EvilBolt,
    /// Enemy bolt that bounces off walls once.
    EvilBouncingBolt,
    /// Enemy bullet.
    EvilBullet,
    /// Enemy shell that steers toward the player.
    EvilShell,
    /// Short-lived flamethrower puff.
    GoodFlame,
}

impl EntityKind {
    /// Number of entity kinds.
    pub const COUNT: usize = 15;

    /// Every kind in declaration order.
    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Player,
        EntityKind::Scorpio,
        EntityKind::Leo,
        EntityKind::Aries,
        EntityKind::Capricorn,
        EntityKind::Aquarius,
        EntityKind::GeminiBrother,
        EntityKind::GeminiSister,
        EntityKind::GoodBolt,
        EntityKind::GoodBullet,
        EntityKind::EvilBolt,
        EntityKind::EvilBouncingBolt,
        EntityKind::EvilBullet,
        EntityKind::EvilShell,
        EntityKind::GoodFlame,
    ];

    /// Position of the kind in [`EntityKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Reports whether the kind is a projectile.
    #[must_use]
    pub const fn is_bullet(self) -> bool {
        matches!(
            self,
            EntityKind::GoodBolt
                | EntityKind::GoodBullet
                | EntityKind::EvilBolt
                | EntityKind::EvilBouncingBolt
                | EntityKind::EvilBullet
                | EntityKind::EvilShell
                | EntityKind::GoodFlame
        )
    }

    /// Reports whether the kind blocks navigation from a fixed tile.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, EntityKind::Scorpio)
    }

    /// Reports whether the kind owns private roam and solid cost fields.
    #[must_use]
    pub const fn is_mobile_npc(self) -> bool {
        matches!(
            self,
            EntityKind::Leo
                | EntityKind::Aries
                | EntityKind::Capricorn
                | EntityKind::Aquarius
                | EntityKind::GeminiBrother
                | EntityKind::GeminiSister
        )
    }

    /// Reports whether the kind is one half of a twin pair.
    #[must_use]
    pub const fn is_twin(self) -> bool {
        matches!(self, EntityKind::GeminiBrother | EntityKind::GeminiSister)
    }

    /// Faction the kind belongs to.
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            EntityKind::Player
            | EntityKind::GoodBolt
            | EntityKind::GoodBullet
            | EntityKind::GoodFlame => Faction::Good,
            _ => Faction::Evil,
        }
    }
}

/// Weapon currently selected by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Weapon {
    /// Bouncing bolts fired along the turret heading.
    #[default]
    Bolt,
    /// Short-range flames sprayed with a random spread.
    Flamethrower,
}

impl Weapon {
    /// Returns the other weapon.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Weapon::Bolt => Weapon::Flamethrower,
            Weapon::Flamethrower => Weapon::Bolt,
        }
    }
}

/// Physics participation flags for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionFlags {
    /// Entity pushes overlapping entities.
    pub does_push: bool,
    /// Entity is displaced by overlapping entities.
    pub pushed_by_entities: bool,
    /// Entity is pushed out of solid tiles.
    pub pushed_by_walls: bool,
    /// Entity can be damaged by hostile bullets.
    pub hit_by_bullets: bool,
    /// Entity treats water as traversable.
    pub traverses_water: bool,
}

impl MotionFlags {
    /// Flags for an ordinary land-bound body.
    pub const BODY: Self = Self {
        does_push: true,
        pushed_by_entities: true,
        pushed_by_walls: true,
        hit_by_bullets: true,
        traverses_water: false,
    };

    /// Flags for a projectile that ignores every other body.
    pub const PROJECTILE: Self = Self {
        does_push: false,
        pushed_by_entities: false,
        pushed_by_walls: false,
        hit_by_bullets: false,
        traverses_water: false,
    };
}

/// Behaviour tunables shared by every archetype.
///
/// Fields that an archetype does not use stay at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArchetypeStats {
    /// Linear speed in tiles per second.
    pub move_speed: f32,
    /// Body turn rate in degrees per second.
    pub turn_speed: f32,
    /// Turret turn rate in degrees per second.
    pub turret_turn_speed: f32,
    /// Maximum distance at which the entity perceives the player.
    pub sight_range: f32,
    /// Half-angle in degrees within which the entity drives forward.
    pub drive_aperture: f32,
    /// Half-angle in degrees within which the entity fires.
    pub fire_aperture: f32,
    /// Seconds between shots.
    pub fire_rate: f32,
    /// Secondary fire rate used by the player's flamethrower.
    pub alternate_fire_rate: f32,
    /// Distance ahead of the centre where projectiles spawn.
    pub bullet_spawn_offset: f32,
    /// Damage dealt on hit, or per second for continuous weapons.
    pub damage: f32,
    /// Wall bounces a projectile may perform.
    pub bounces: u8,
    /// Health lost per second by decaying projectiles.
    pub decay_rate: f32,
    /// Spin applied to decorative orientation in degrees per second.
    pub spin_speed: f32,
    /// Full angle in degrees of the frontal shield sector.
    pub shield_aperture: f32,
    /// Lifetime of tile overrides left behind while moving.
    pub trail_duration: f32,
    /// Random spread in degrees applied to sprayed projectiles.
    pub spread: f32,
}

/// Uniform data record describing how to construct an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityTemplate {
    /// Archetype of the entity.
    pub kind: EntityKind,
    /// Allegiance of the entity.
    pub faction: Faction,
    /// Radius of the collision disc.
    pub radius: f32,
    /// Starting and maximum health.
    pub health: f32,
    /// Physics participation.
    pub flags: MotionFlags,
    /// Behaviour tunables.
    pub stats: ArchetypeStats,
}

/// Decoded per-frame intents supplied by the input collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputIntents {
    /// Desired body heading; zero means no movement.
    pub movement: Vec2,
    /// Desired turret heading; zero leaves the turret alone.
    pub aim: Vec2,
    /// Fire button is held.
    pub fire_held: bool,
    /// Weapon switch was pressed this frame.
    pub switch_weapon: bool,
    /// Invincibility debug toggle was pressed this frame.
    pub toggle_invincible: bool,
    /// No-clip debug toggle was pressed this frame.
    pub toggle_no_clip: bool,
    /// Respawn was requested this frame.
    pub respawn: bool,
}

/// Commands that express all discrete world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Inserts a new entity built from the template.
    SpawnEntity {
        /// Construction record for the entity.
        template: EntityTemplate,
        /// Initial world position.
        position: Vec2,
        /// Initial heading in degrees.
        orientation: f32,
    },
    /// Removes an entity immediately.
    RemoveEntity {
        /// Entity to remove.
        entity: EntityId,
    },
    /// Applies damage to an entity.
    DamageEntity {
        /// Entity receiving the damage.
        entity: EntityId,
        /// Health to subtract.
        amount: f32,
    },
    /// Temporarily replaces the tile under a world position.
    ApplyTileOverride {
        /// World position whose tile is overridden.
        position: Vec2,
        /// Replacement tile type.
        tile: TileTypeId,
        /// Seconds until the override reverts.
        duration: f32,
    },
    /// Ages active tile overrides and reverts expired ones.
    AdvanceOverrides {
        /// Elapsed seconds.
        dt: f32,
    },
    /// Recomputes both distance-to-player fields seeded at the tile.
    RecomputePlayerFields {
        /// Tile currently occupied by the player.
        coord: TileCoord,
    },
    /// Recomputes every mobile entity's solid field and the player fields.
    RegenerateSolidFields,
    /// Marks every projectile as garbage.
    KillAllBullets,
    /// Revives a dead player with full health.
    RespawnPlayer,
    /// Selects a new debug-tracked roaming entity.
    RetrackDebugEntity,
    /// Deletes every entity marked as garbage.
    SweepGarbage,
}

/// Events broadcast by the world and the systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that an entity was inserted.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Archetype of the entity.
        kind: EntityKind,
    },
    /// Reports that an entity lost health.
    EntityDamaged {
        /// Damaged entity.
        entity: EntityId,
        /// Archetype of the entity.
        kind: EntityKind,
        /// Health subtracted.
        amount: f32,
    },
    /// Reports that a non-projectile entity died.
    EntityDied {
        /// Entity that died.
        entity: EntityId,
        /// Archetype of the entity.
        kind: EntityKind,
        /// Position at the time of death.
        position: Vec2,
    },
    /// Reports that the player died.
    PlayerDied {
        /// Player entity.
        entity: EntityId,
    },
    /// Reports that the player was revived.
    PlayerRespawned {
        /// Player entity.
        entity: EntityId,
    },
    /// Reports that a projectile was fired.
    BulletFired {
        /// Projectile archetype.
        kind: EntityKind,
        /// Spawn position.
        position: Vec2,
    },
    /// Reports that a projectile bounced off a wall or shield.
    BulletBounced {
        /// Projectile that bounced.
        entity: EntityId,
        /// Position of the bounce.
        position: Vec2,
    },
    /// Reports that a tile override was applied.
    TileOverridden {
        /// Overridden tile.
        coord: TileCoord,
        /// Replacement type.
        tile: TileTypeId,
    },
    /// Reports that an expired override was reverted.
    TileReverted {
        /// Reverted tile.
        coord: TileCoord,
        /// Restored type.
        tile: TileTypeId,
    },
    /// Reports that mobile entities rebuilt their solid fields.
    SolidFieldsRegenerated,
    /// Reports that the debug-tracked entity changed.
    TrackedEntityChanged {
        /// Newly tracked entity, if any remains.
        entity: Option<EntityId>,
    },
    /// Reports that the player stepped onto the exit tile.
    ExitReached {
        /// Player entity.
        entity: EntityId,
    },
    /// Reports that the session moved to another map.
    LevelTransition {
        /// Index of the map that was left.
        from: usize,
        /// Index of the map that became active.
        to: usize,
    },
    /// Reports that the last map was cleared.
    GameWon,
}
