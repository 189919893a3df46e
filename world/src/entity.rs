//! Uniform entity record.

use glam::Vec2;
use tile_tanks_core::{
    ArchetypeStats, EntityId, EntityKind, EntityTemplate, Faction, MotionFlags, TileCoord, Weapon,
};

use crate::{cost_field::CostField, geometry};

/// Private navigation state owned by a roaming entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Navigation {
    /// Distances from the current roam target.
    pub roam: CostField,
    /// Distances from the entity's own tile, used for reachability and sight.
    pub solid: CostField,
    /// Waypoints with the far end first and the next hop last.
    pub path: Vec<Vec2>,
    /// Position the entity steers toward.
    pub next_waypoint: Vec2,
    /// Far end of the current path.
    pub target: Vec2,
}

/// Debug toggles and weapon selection of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pilot {
    /// Selected weapon.
    pub weapon: Weapon,
    /// Health loss is ignored.
    pub invincible: bool,
    /// Walls do not push the player.
    pub no_clip: bool,
}

/// Simulation record shared by every archetype.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Archetype.
    pub kind: EntityKind,
    /// Allegiance.
    pub faction: Faction,
    /// Centre of the collision disc.
    pub position: Vec2,
    /// Position at the start of the previous think.
    pub last_position: Vec2,
    /// Body heading in degrees.
    pub orientation: f32,
    /// Displacement applied during the last think.
    pub velocity: Vec2,
    /// Current health.
    pub health: f32,
    /// Health restored on respawn.
    pub max_health: f32,
    /// Cleared on death.
    pub alive: bool,
    /// Marked for removal at the end of the frame.
    pub garbage: bool,
    /// Radius of the collision disc.
    pub radius: f32,
    /// Physics participation.
    pub flags: MotionFlags,
    /// Behaviour tunables.
    pub stats: ArchetypeStats,
    /// Seconds until the next shot is allowed.
    pub fire_cooldown: f32,
    /// Remaining wall bounces for projectiles.
    pub bounces_left: u8,
    /// Player or turret has acquired its target this frame.
    pub chasing: bool,
    /// Turret heading relative to the body.
    pub turret_offset: f32,
    /// Decorative spin of flame puffs.
    pub spin_orientation: f32,
    /// Active laser segment.
    pub laser: Option<(Vec2, Vec2)>,
    /// Paired twin, if any.
    pub twin: Option<EntityId>,
    /// Roaming state for mobile enemies.
    pub navigation: Option<Navigation>,
    /// Player controls.
    pub pilot: Pilot,
}

impl Entity {
    /// Builds an entity from its construction record.
    #[must_use]
    pub fn from_template(template: &EntityTemplate, position: Vec2, orientation: f32) -> Self {
        let navigation = template.kind.is_mobile_npc().then(Navigation::default);
        Self {
            kind: template.kind,
            faction: template.faction,
            position,
            last_position: position,
            orientation,
            velocity: Vec2::ZERO,
            health: template.health,
            max_health: template.health,
            alive: true,
            garbage: false,
            radius: template.radius,
            flags: template.flags,
            stats: template.stats,
            fire_cooldown: 0.0,
            bounces_left: template.stats.bounces,
            chasing: false,
            turret_offset: 0.0,
            spin_orientation: orientation,
            laser: None,
            twin: None,
            navigation,
            pilot: Pilot::default(),
        }
    }

    /// Unit vector along the body heading.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        geometry::heading(self.orientation)
    }

    /// Absolute turret heading in degrees.
    #[must_use]
    pub fn turret_orientation(&self) -> f32 {
        self.orientation + self.turret_offset
    }

    /// Tile containing the entity centre.
    #[must_use]
    pub fn tile(&self) -> TileCoord {
        TileCoord::containing(self.position)
    }

    /// Reflects the heading about a surface normal and spends a bounce.
    pub fn bounce_off(&mut self, normal: Vec2) {
        let reflected = geometry::reflect(self.forward(), normal);
        if reflected != Vec2::ZERO {
            self.orientation = geometry::degrees_of(reflected);
        }
        self.bounces_left = self.bounces_left.saturating_sub(1);
    }

    /// Reports whether the entity treats water as solid.
    #[must_use]
    pub const fn water_as_solid(&self) -> bool {
        !self.flags.traverses_water
    }
}
