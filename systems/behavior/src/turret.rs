//! Stationary laser turret.

use tile_tanks_core::EntityKind;
use tile_tanks_world::{geometry, raycast, Entity};

use crate::{pursuit, Think};

/// Scorpio tracks a visible player and otherwise sweeps its laser.
pub(crate) fn think(entity: &mut Entity, think: &mut Think<'_>) {
    entity.fire_cooldown -= think.dt;
    let turn = entity.stats.turret_turn_speed * think.dt;

    let sighted = pursuit::sees_player(entity, think, &think.fields.amphibian_solid);
    entity.chasing = sighted.is_some();
    match sighted {
        Some(player) => {
            let goal = geometry::degrees_of(player.position - entity.position);
            entity.orientation = geometry::turn_toward(entity.orientation, goal, turn);
            pursuit::try_fire(entity, think, EntityKind::EvilBolt);
        }
        None => entity.orientation += turn,
    }

    let grid = think.grid;
    let hit = raycast::raycast_tiles(
        entity.position,
        entity.forward(),
        entity.stats.sight_range,
        |coord| grid.blocks_projectiles(coord),
    );
    entity.laser = Some((entity.position, hit.point));
}
