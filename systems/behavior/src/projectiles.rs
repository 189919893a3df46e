//! Straight, homing and decaying projectiles.

use glam::Vec2;
use tile_tanks_core::{EntityKind, Event, TileCoord};
use tile_tanks_world::{geometry, Entity};

use crate::Think;

pub(crate) fn think(entity: &mut Entity, think: &mut Think<'_>) {
    let dt = think.dt;
    entity.velocity = entity.forward() * entity.stats.move_speed * dt;
    let future = entity.position + entity.velocity;

    match entity.kind {
        EntityKind::EvilShell => {
            if let Some(player) = think.player {
                let goal = geometry::degrees_of(player.position - entity.position);
                entity.orientation =
                    geometry::turn_toward(entity.orientation, goal, entity.stats.turn_speed * dt);
            }
        }
        EntityKind::GoodFlame => {
            entity.health -= entity.stats.decay_rate * dt;
            entity.spin_orientation += entity.stats.spin_speed * dt;
            if entity.health <= 0.0 {
                expire(entity);
                return;
            }
        }
        _ => {}
    }

    let coord = TileCoord::containing(future);
    if !think.grid.in_bounds(coord) {
        expire(entity);
        return;
    }
    if !think.grid.blocks_projectiles(coord) {
        entity.position = future;
        return;
    }
    if entity.bounces_left == 0 {
        expire(entity);
        return;
    }

    let nearest = think.grid.bounds_of(coord).nearest_point(entity.position);
    let mut normal = (entity.position - nearest).normalize_or_zero();
    if normal == Vec2::ZERO {
        normal = -entity.forward();
    }
    entity.bounce_off(normal);
    think.events.push(Event::BulletBounced {
        entity: think.id,
        position: entity.position,
    });
}

fn expire(entity: &mut Entity) {
    entity.alive = false;
    entity.garbage = true;
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use tile_tanks_core::{EntityKind, Event, InputIntents};

    use crate::test_support::{spawn, think, world};
    use crate::ThinkPass;

    #[test]
    fn projectiles_fly_along_their_heading() {
        let mut world = world(9, 5, &[]);
        let bolt = spawn(&mut world, EntityKind::GoodBolt, Vec2::new(2.5, 2.5), 0.0);

        let _ = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.1);

        let entity = world.entities().get(bolt).expect("bolt");
        assert!((entity.position.x - 3.1).abs() < 1e-4);
        assert!(entity.alive);
    }

    #[test]
    fn spent_projectiles_die_on_walls() {
        let mut world = world(9, 5, &[]);
        let bolt = spawn(&mut world, EntityKind::EvilBolt, Vec2::new(7.9, 2.5), 0.0);

        let (_, events) = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.1);

        let entity = world.entities().get(bolt).expect("kept until swept");
        assert!(!entity.alive);
        assert!(entity.garbage);
        assert!(events.is_empty());
    }

    #[test]
    fn bouncing_bolts_reflect_off_walls() {
        let mut world = world(9, 5, &[]);
        let bolt = spawn(&mut world, EntityKind::GoodBolt, Vec2::new(7.9, 2.5), 0.0);

        let (_, events) = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.1);

        let entity = world.entities().get(bolt).expect("bolt");
        assert!(entity.alive);
        assert_eq!(entity.bounces_left, 1);
        assert!((entity.orientation.abs() - 180.0).abs() < 1e-3);
        assert_eq!(entity.position, Vec2::new(7.9, 2.5));
        assert_eq!(
            events,
            vec![Event::BulletBounced {
                entity: bolt,
                position: Vec2::new(7.9, 2.5),
            }]
        );
    }

    #[test]
    fn shells_home_on_the_player() {
        let mut world = world(9, 5, &[]);
        let _ = spawn(&mut world, EntityKind::Player, Vec2::new(6.5, 2.5), 0.0);
        let shell = spawn(&mut world, EntityKind::EvilShell, Vec2::new(2.5, 2.5), 90.0);

        let _ = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.1);

        let entity = world.entities().get(shell).expect("shell");
        assert!((entity.orientation - 72.0).abs() < 1e-3);
    }

    #[test]
    fn flames_burn_out() {
        let mut world = world(9, 5, &[]);
        let flame = spawn(&mut world, EntityKind::GoodFlame, Vec2::new(2.5, 2.5), 0.0);

        let _ = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.6);
        assert!(world.entities().get(flame).expect("flame").alive);

        let _ = think(&mut world, ThinkPass::Others, InputIntents::default(), 0.6);
        let entity = world.entities().get(flame).expect("flame");
        assert!(!entity.alive);
        assert!(entity.garbage);
    }
}
