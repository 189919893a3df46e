//! Player steering, weapons and debug toggles.

use glam::Vec2;
use rand::Rng;
use tile_tanks_core::{Command, EntityKind, Event, TileCoord, Weapon};
use tile_tanks_world::{geometry, Entity};

use crate::Think;

pub(crate) fn think(entity: &mut Entity, think: &mut Think<'_>) {
    let intents = *think.intents;
    let dt = think.dt;

    if intents.toggle_invincible {
        entity.pilot.invincible = !entity.pilot.invincible;
    }
    if intents.toggle_no_clip {
        entity.pilot.no_clip = !entity.pilot.no_clip;
    }
    entity.flags.pushed_by_walls = !entity.pilot.no_clip;

    if !entity.alive {
        if intents.respawn {
            think.commands.push(Command::RespawnPlayer);
        }
        return;
    }

    entity.fire_cooldown -= dt;
    if intents.switch_weapon {
        entity.pilot.weapon = entity.pilot.weapon.toggled();
        entity.fire_cooldown = 0.0;
    }

    let forward = entity.forward();
    let throttle = intents.movement.length().min(1.0);
    if throttle > 0.0 {
        let goal = geometry::degrees_of(intents.movement);
        entity.orientation =
            geometry::turn_toward(entity.orientation, goal, entity.stats.turn_speed * throttle * dt);
    }
    entity.velocity = forward * entity.stats.move_speed * throttle * dt;
    entity.position += entity.velocity;

    if intents.aim != Vec2::ZERO {
        let goal = geometry::degrees_of(intents.aim) - entity.orientation;
        entity.turret_offset = geometry::turn_toward(
            entity.turret_offset,
            goal,
            entity.stats.turret_turn_speed * dt,
        );
    }

    if intents.fire_held && entity.fire_cooldown <= 0.0 {
        fire(entity, think);
    }

    let tile = entity.tile();
    if tile == think.exit {
        think.events.push(Event::ExitReached { entity: think.id });
    } else if tile != TileCoord::containing(entity.last_position) {
        think
            .commands
            .push(Command::RecomputePlayerFields { coord: tile });
    }
    entity.last_position = entity.position;
}

fn fire(entity: &mut Entity, think: &mut Think<'_>) {
    let (template, orientation, cooldown) = match entity.pilot.weapon {
        Weapon::Bolt => (
            think.archetypes.template(EntityKind::GoodBolt),
            entity.turret_orientation(),
            entity.stats.fire_rate,
        ),
        Weapon::Flamethrower => {
            let spread = entity.stats.spread.abs();
            let jitter = think.rng.gen_range(-spread..=spread);
            (
                think.archetypes.flame(&mut *think.rng),
                entity.turret_orientation() + jitter,
                entity.stats.alternate_fire_rate,
            )
        }
    };

    let position = entity.position + geometry::heading(orientation) * entity.stats.bullet_spawn_offset;
    think.commands.push(Command::SpawnEntity {
        template,
        position,
        orientation,
    });
    entity.fire_cooldown = cooldown;
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use tile_tanks_core::{Command, EntityKind, Event, InputIntents, TileCoord, Weapon};
    use tile_tanks_world::apply;

    use crate::test_support::{spawn, think, world};
    use crate::ThinkPass;

    #[test]
    fn movement_turns_then_drives_forward() {
        let mut world = world(9, 9, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 4.5), 0.0);
        let intents = InputIntents {
            movement: Vec2::Y,
            ..InputIntents::default()
        };

        let _ = think(&mut world, ThinkPass::Player, intents, 0.25);

        let entity = world.entities().get(player).expect("player");
        assert!((entity.orientation - 45.0).abs() < 1e-3);
        assert!((entity.position.x - (4.5 + 1.5 * 0.25)).abs() < 1e-4);
    }

    #[test]
    fn held_fire_spawns_a_bolt_along_the_turret() {
        let mut world = world(9, 9, &[]);
        let _ = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 4.5), 90.0);
        let intents = InputIntents {
            fire_held: true,
            ..InputIntents::default()
        };

        let (commands, _) = think(&mut world, ThinkPass::Player, intents, 0.016);

        let spawned: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEntity {
                    template,
                    position,
                    orientation,
                } => Some((template.kind, *position, *orientation)),
                _ => None,
            })
            .collect();
        assert_eq!(spawned.len(), 1);
        let (kind, position, orientation) = spawned[0];
        assert_eq!(kind, EntityKind::GoodBolt);
        assert!((orientation - 90.0).abs() < 1e-4);
        assert!((position - Vec2::new(4.5, 4.9)).length() < 1e-4);
    }

    #[test]
    fn weapon_switch_selects_flamethrower() {
        let mut world = world(9, 9, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 4.5), 0.0);
        let intents = InputIntents {
            switch_weapon: true,
            fire_held: true,
            ..InputIntents::default()
        };

        let (commands, _) = think(&mut world, ThinkPass::Player, intents, 0.016);

        let entity = world.entities().get(player).expect("player");
        assert_eq!(entity.pilot.weapon, Weapon::Flamethrower);
        assert!((entity.fire_cooldown - 0.05).abs() < 1e-6);
        assert!(commands.iter().any(|command| matches!(
            command,
            Command::SpawnEntity { template, orientation, .. }
                if template.kind == EntityKind::GoodFlame && orientation.abs() <= 15.0
        )));
    }

    #[test]
    fn tile_change_requests_player_field_update() {
        let mut world = world(9, 9, &[]);
        let _ = spawn(&mut world, EntityKind::Player, Vec2::new(4.9, 4.5), 0.0);
        let intents = InputIntents {
            movement: Vec2::X,
            ..InputIntents::default()
        };

        let (commands, _) = think(&mut world, ThinkPass::Player, intents, 0.5);

        assert!(commands.contains(&Command::RecomputePlayerFields {
            coord: TileCoord::new(5, 4),
        }));
    }

    #[test]
    fn reaching_the_exit_is_reported() {
        let mut world = world(7, 7, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.9, 5.5), 0.0);
        let intents = InputIntents {
            movement: Vec2::X,
            ..InputIntents::default()
        };

        let (_, events) = think(&mut world, ThinkPass::Player, intents, 0.5);

        assert!(events.contains(&Event::ExitReached { entity: player }));
    }

    #[test]
    fn dead_player_only_requests_respawn() {
        let mut world = world(9, 9, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 4.5), 0.0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageEntity {
                entity: player,
                amount: 100.0,
            },
            &mut events,
        );
        let intents = InputIntents {
            movement: Vec2::X,
            fire_held: true,
            respawn: true,
            toggle_invincible: true,
            ..InputIntents::default()
        };

        let (commands, _) = think(&mut world, ThinkPass::Player, intents, 0.5);

        assert_eq!(commands, vec![Command::RespawnPlayer]);
        let entity = world.entities().get(player).expect("player kept");
        assert_eq!(entity.position, Vec2::new(4.5, 4.5));
        assert!(entity.pilot.invincible);
    }

    #[test]
    fn no_clip_releases_wall_contacts() {
        let mut world = world(9, 9, &[]);
        let player = spawn(&mut world, EntityKind::Player, Vec2::new(4.5, 4.5), 0.0);
        let intents = InputIntents {
            toggle_no_clip: true,
            ..InputIntents::default()
        };

        let _ = think(&mut world, ThinkPass::Player, intents, 0.016);

        let entity = world.entities().get(player).expect("player");
        assert!(!entity.flags.pushed_by_walls);
    }
}
