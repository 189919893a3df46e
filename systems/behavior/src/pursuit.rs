//! Roaming and chasing shared by the mobile enemies.

use glam::Vec2;
use tile_tanks_core::{Command, EntityKind, TileCoord, ADJACENT_TILE_DISTANCE};
use tile_tanks_system_pathing as pathing;
use tile_tanks_world::{geometry, raycast, CostField, Entity};

use crate::{Body, Think};

/// Tile type painted behind amphibious chasers.
const TRAIL_TILE: &str = "Water";

/// Land chasers: Leo, Aries and Capricorn.
pub(crate) fn think(entity: &mut Entity, think: &mut Think<'_>) {
    entity.last_position = entity.position;
    entity.fire_cooldown -= think.dt;

    let sighted = sees_player(entity, think, &think.fields.amphibian_solid).filter(|player| {
        entity.navigation.as_ref().is_some_and(|navigation| {
            navigation
                .solid
                .is_reachable(TileCoord::containing(player.position))
        })
    });
    if let Some(player) = sighted {
        chase(entity, think);
        if is_adjacent(entity.position, player.position) {
            hold_on(entity, player.position);
        }
    }

    advance(entity);
    steer(entity, think.dt);
    finish_leg(entity, think);
    if let Some(kind) = weapon_of(entity.kind) {
        try_fire(entity, think, kind);
    }
}

/// Aquarius: sights with its own solid field, holds position next to the
/// player and leaves a temporary trail of water.
pub(crate) fn think_amphibian(entity: &mut Entity, think: &mut Think<'_>) {
    entity.fire_cooldown -= think.dt;
    entity.last_position = entity.position;

    let sighted = entity.navigation.as_ref().and_then(|navigation| {
        think.player.filter(|player| {
            raycast::has_line_of_sight(
                &navigation.solid,
                entity.position,
                player.position,
                entity.stats.sight_range,
            )
        })
    });
    if sighted.is_some() {
        chase(entity, think);
    }
    advance(entity);

    let beside = think
        .player
        .filter(|player| is_adjacent(entity.position, player.position));
    if let Some(player) = beside {
        hold_on(entity, player.position);
        entity.flags.pushed_by_entities = false;
        entity.velocity = Vec2::ZERO;
        turn_toward(entity, player.position, think.dt);
    } else {
        entity.flags.pushed_by_entities = true;
        steer(entity, think.dt);
    }

    finish_leg(entity, think);
    try_fire(entity, think, EntityKind::EvilBouncingBolt);

    if entity.tile() != TileCoord::containing(entity.last_position) {
        if let Some(tile) = think.grid.definitions().find_ignore_case(TRAIL_TILE) {
            think.commands.push(Command::ApplyTileOverride {
                position: entity.position,
                tile,
                duration: entity.stats.trail_duration,
            });
        }
    }
}

/// Projectile fired by a land chaser, if it carries a gun.
const fn weapon_of(kind: EntityKind) -> Option<EntityKind> {
    match kind {
        EntityKind::Leo => Some(EntityKind::EvilBullet),
        EntityKind::Capricorn => Some(EntityKind::EvilShell),
        _ => None,
    }
}

/// Live player within sight range and visible through `field`.
pub(crate) fn sees_player(entity: &Entity, think: &Think<'_>, field: &CostField) -> Option<Body> {
    think.live_player().filter(|player| {
        raycast::has_line_of_sight(
            field,
            entity.position,
            player.position,
            entity.stats.sight_range,
        )
    })
}

fn is_adjacent(position: Vec2, player: Vec2) -> bool {
    let own = TileCoord::containing(position).center();
    let theirs = TileCoord::containing(player).center();
    own.distance_squared(theirs) <= ADJACENT_TILE_DISTANCE * ADJACENT_TILE_DISTANCE
}

fn chase(entity: &mut Entity, think: &Think<'_>) {
    let field = think.fields.to_player(entity.water_as_solid());
    let limit = entity.stats.sight_range.max(0.0) as usize;
    let position = entity.position;
    if let Some(navigation) = entity.navigation.as_mut() {
        pathing::follow_field(navigation, field, position, limit);
    }
    entity.chasing = true;
}

fn hold_on(entity: &mut Entity, target: Vec2) {
    if let Some(navigation) = entity.navigation.as_mut() {
        navigation.target = target;
        navigation.next_waypoint = target;
    }
}

/// Skips waypoints the entity can already drive to directly.
pub(crate) fn advance(entity: &mut Entity) {
    let (position, orientation, radius, sight) = (
        entity.position,
        entity.orientation,
        entity.radius,
        entity.stats.sight_range,
    );
    if let Some(navigation) = entity.navigation.as_mut() {
        let _ = pathing::advance_waypoint(navigation, position, orientation, radius, sight);
    }
}

fn turn_toward(entity: &mut Entity, point: Vec2, dt: f32) {
    let offset = point - entity.position;
    if offset != Vec2::ZERO {
        entity.orientation = geometry::turn_toward(
            entity.orientation,
            geometry::degrees_of(offset),
            entity.stats.turn_speed * dt,
        );
    }
}

/// Turns toward the next waypoint and drives while it lies within the
/// drive aperture.
pub(crate) fn steer(entity: &mut Entity, dt: f32) {
    entity.velocity = Vec2::ZERO;
    let Some(waypoint) = entity
        .navigation
        .as_ref()
        .map(|navigation| navigation.next_waypoint)
    else {
        return;
    };
    let offset = waypoint - entity.position;
    if offset == Vec2::ZERO {
        return;
    }

    turn_toward(entity, waypoint, dt);
    let forward = entity.forward();
    if geometry::signed_angle_between(offset, forward).abs() <= entity.stats.drive_aperture {
        entity.velocity = forward * entity.stats.move_speed * dt;
        entity.position += entity.velocity;
    }
}

/// Advances past a reached waypoint and picks a new roam target once the
/// current leg is over.
pub(crate) fn finish_leg(entity: &mut Entity, think: &mut Think<'_>) {
    let on_waypoint = entity
        .navigation
        .as_ref()
        .is_some_and(|navigation| entity.tile() == TileCoord::containing(navigation.next_waypoint));
    if on_waypoint {
        advance(entity);
    }

    let tile = entity.tile();
    let position = entity.position;
    let water_as_solid = entity.water_as_solid();
    let chasing = entity.chasing;
    let Some(navigation) = entity.navigation.as_mut() else {
        return;
    };
    if tile != TileCoord::containing(navigation.target) && !navigation.path.is_empty() {
        return;
    }
    if !chasing {
        let _ = pathing::roam_to_random_target(
            navigation,
            position,
            water_as_solid,
            think.grid,
            think.excluded,
            &mut *think.rng,
        );
    }
    entity.chasing = false;
}

/// Fires `kind` along the body heading when the player is chased, visible
/// and inside the fire aperture.
pub(crate) fn try_fire(entity: &mut Entity, think: &mut Think<'_>, kind: EntityKind) {
    if !entity.chasing || entity.fire_cooldown > 0.0 {
        return;
    }
    let Some(player) = sees_player(entity, think, &think.fields.amphibian_solid) else {
        return;
    };
    let forward = entity.forward();
    let angle = geometry::signed_angle_between(player.position - entity.position, forward);
    if angle.abs() > entity.stats.fire_aperture {
        return;
    }

    let position = entity.position + forward * entity.stats.bullet_spawn_offset;
    think.spawn(kind, position, entity.orientation);
    entity.fire_cooldown = entity.stats.fire_rate;
}
