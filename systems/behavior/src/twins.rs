//! Gemini pairs roaming with a laser strung between them.

use glam::Vec2;
use tile_tanks_core::Command;
use tile_tanks_world::{geometry, raycast, Entity};

use crate::{pursuit, Think};

pub(crate) fn think(entity: &mut Entity, think: &mut Think<'_>) {
    entity.last_position = entity.position;
    entity.fire_cooldown -= think.dt;

    pursuit::advance(entity);
    pursuit::steer(entity, think.dt);
    fire_laser(entity, think);
    pursuit::finish_leg(entity, think);
}

fn fire_laser(entity: &mut Entity, think: &mut Think<'_>) {
    let Some(twin) = think.twin.filter(|twin| twin.alive) else {
        entity.laser = None;
        return;
    };
    let to_twin = twin.position - entity.position;
    if to_twin == Vec2::ZERO {
        entity.laser = None;
        return;
    }

    entity.turret_offset = geometry::degrees_of(to_twin) - entity.orientation;
    let forward = geometry::heading(entity.turret_orientation());
    let offset = entity.stats.bullet_spawn_offset;
    let start = entity.position + forward * offset;
    let twin_start = twin.position - to_twin.normalize() * offset;

    let grid = think.grid;
    let hit = raycast::raycast_tiles(start, forward, start.distance(twin_start), |coord| {
        grid.blocks_projectiles(coord)
    });
    entity.laser = Some((start, hit.point));

    let Some(player) = think.live_player() else {
        return;
    };
    let struck = raycast::raycast_vs_disc(
        entity.position,
        forward,
        hit.distance,
        player.position,
        player.radius,
    );
    if struck.is_some() {
        think.commands.push(Command::DamageEntity {
            entity: player.id,
            amount: entity.stats.damage * think.dt,
        });
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use tile_tanks_core::{Command, EntityId, EntityKind};
    use tile_tanks_world::World;

    use crate::pursuit::tests::{others, place};
    use crate::test_support::{spawn, world};

    fn pair(world: &mut World, brother: Vec2, sister: Vec2) -> (EntityId, EntityId) {
        let brother = place(world, EntityKind::GeminiBrother, brother, 0.0);
        let sister = place(world, EntityKind::GeminiSister, sister, 180.0);
        let entities = world.entities_mut();
        entities.get_mut(brother).expect("brother").twin = Some(sister);
        entities.get_mut(sister).expect("sister").twin = Some(brother);
        (brother, sister)
    }

    fn laser_hits(commands: &[Command], player: EntityId) -> usize {
        commands
            .iter()
            .filter(|command| {
                matches!(command, Command::DamageEntity { entity, .. } if *entity == player)
            })
            .count()
    }

    #[test]
    fn both_twins_burn_a_player_between_them() {
        let mut world = world(11, 5, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 2.5), 0.0);
        let (brother, _) = pair(&mut world, Vec2::new(1.5, 2.5), Vec2::new(8.5, 2.5));

        let commands = others(&mut world, 0.1);

        assert_eq!(laser_hits(&commands, player), 2);
        assert!(commands.iter().all(|command| match command {
            Command::DamageEntity { amount, .. } => (*amount - 0.1).abs() < 1e-6,
            _ => true,
        }));
        let (start, _) = world
            .entities()
            .get(brother)
            .and_then(|entity| entity.laser)
            .expect("laser traced");
        assert!(start.x > 1.5);
    }

    #[test]
    fn walls_cut_the_laser() {
        let mut world = world(11, 5, &[(5, 1), (5, 2), (5, 3)]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(6.5, 2.5), 0.0);
        let (brother, _) = pair(&mut world, Vec2::new(1.5, 2.5), Vec2::new(8.5, 2.5));

        let commands = others(&mut world, 0.1);

        assert_eq!(laser_hits(&commands, player), 1);
        let (_, end) = world
            .entities()
            .get(brother)
            .and_then(|entity| entity.laser)
            .expect("laser traced");
        assert!((end.x - 5.0).abs() < 1e-3);
    }

    #[test]
    fn lone_twin_has_no_laser() {
        let mut world = world(11, 5, &[]);
        let gemini = place(&mut world, EntityKind::GeminiBrother, Vec2::new(2.5, 2.5), 0.0);

        let _ = others(&mut world, 0.1);

        assert!(world.entities().get(gemini).expect("gemini").laser.is_none());
    }
}
