//! Construction records for every archetype, read from tunables.

use rand::Rng;
use tile_tanks_core::{ArchetypeStats, EntityKind, EntityTemplate, MotionFlags, Tunables};

/// Templates for every [`EntityKind`], indexed by kind.
#[derive(Clone, Debug)]
pub struct Archetypes {
    templates: Vec<EntityTemplate>,
    flame_spin: (i32, i32),
}

impl Default for Archetypes {
    fn default() -> Self {
        Self::from_tunables(&Tunables::default())
    }
}

impl Archetypes {
    /// Reads every archetype from the tunables, falling back to defaults.
    #[must_use]
    pub fn from_tunables(tunables: &Tunables) -> Self {
        let templates = EntityKind::ALL
            .iter()
            .map(|kind| template(*kind, tunables))
            .collect();
        let low = tunables.value("flame.spin_min", 100.0);
        let high = tunables.value("flame.spin_max", 500.0).max(low);
        Self {
            templates,
            flame_spin: (low as i32, high as i32),
        }
    }

    /// Construction record for the kind.
    #[must_use]
    pub fn template(&self, kind: EntityKind) -> EntityTemplate {
        self.templates[kind.index()]
    }

    /// Flame template with a freshly rolled spin.
    ///
    /// The spin magnitude is drawn from the configured range and odd rolls
    /// spin clockwise.
    pub fn flame<R>(&self, rng: &mut R) -> EntityTemplate
    where
        R: Rng + ?Sized,
    {
        let mut template = self.template(EntityKind::GoodFlame);
        let roll = rng.gen_range(self.flame_spin.0..=self.flame_spin.1);
        let spin = roll as f32;
        template.stats.spin_speed = if roll % 2 == 0 { spin } else { -spin };
        template
    }
}

fn template(kind: EntityKind, tunables: &Tunables) -> EntityTemplate {
    let get = |key: &str, default: f32| tunables.value(key, default);
    let body = |prefix: &str, radius: f32, health: f32| {
        (
            get(&format!("{prefix}.radius"), radius),
            get(&format!("{prefix}.health"), health),
        )
    };

    let (radius, health, flags, stats) = match kind {
        EntityKind::Player => {
            let (radius, health) = body("player", 0.3, 10.0);
            let stats = ArchetypeStats {
                move_speed: get("player.drive_speed", 1.5),
                turn_speed: get("player.turn_speed", 180.0),
                turret_turn_speed: get("player.turret_turn_speed", 360.0),
                fire_rate: get("player.fire_rate", 0.1),
                alternate_fire_rate: get("player.flame_rate", 0.05),
                bullet_spawn_offset: get("player.bullet_offset", 0.4),
                spread: get("player.flame_spread", 15.0),
                ..ArchetypeStats::default()
            };
            (radius, health, MotionFlags::BODY, stats)
        }
        EntityKind::Scorpio => {
            let (radius, health) = body("scorpio", 0.4, 20.0);
            let stats = ArchetypeStats {
                turret_turn_speed: get("scorpio.turret_turn_speed", 30.0),
                sight_range: get("scorpio.sight_range", 10.0),
                fire_rate: get("scorpio.fire_rate", 0.3),
                bullet_spawn_offset: get("scorpio.bullet_offset", 0.4),
                fire_aperture: get("scorpio.fire_aperture", 10.0),
                ..ArchetypeStats::default()
            };
            let flags = MotionFlags {
                pushed_by_entities: false,
                pushed_by_walls: false,
                ..MotionFlags::BODY
            };
            (radius, health, flags, stats)
        }
        EntityKind::Leo => {
            let (radius, health) = body("leo", 0.35, 7.0);
            let stats = ArchetypeStats {
                sight_range: get("leo.sight_range", 5.0),
                turn_speed: get("leo.turn_speed", 45.0),
                move_speed: get("leo.drive_speed", 0.25),
                fire_aperture: get("leo.fire_aperture", 5.0),
                drive_aperture: get("leo.drive_aperture", 45.0),
                bullet_spawn_offset: get("leo.bullet_offset", 0.2),
                fire_rate: get("leo.fire_rate", 2.0),
                ..ArchetypeStats::default()
            };
            (radius, health, MotionFlags::BODY, stats)
        }
        EntityKind::Aries => {
            let (radius, health) = body("aries", 0.35, 10.0);
            let stats = ArchetypeStats {
                move_speed: get("aries.drive_speed", 0.5),
                turn_speed: get("aries.turn_speed", 45.0),
                sight_range: get("aries.sight_range", 7.0),
                shield_aperture: get("aries.shield_aperture", 115.0),
                drive_aperture: get("aries.drive_aperture", 90.0),
                ..ArchetypeStats::default()
            };
            (radius, health, MotionFlags::BODY, stats)
        }
        EntityKind::Capricorn => {
            let (radius, health) = body("capricorn", 0.35, 12.0);
            let stats = ArchetypeStats {
                move_speed: get("capricorn.drive_speed", 0.35),
                turn_speed: get("capricorn.turn_speed", 60.0),
                sight_range: get("capricorn.sight_range", 8.0),
                fire_aperture: get("capricorn.fire_aperture", 10.0),
                drive_aperture: get("capricorn.drive_aperture", 45.0),
                bullet_spawn_offset: get("capricorn.bullet_offset", 0.3),
                fire_rate: get("capricorn.fire_rate", 3.0),
                ..ArchetypeStats::default()
            };
            (radius, health, MotionFlags::BODY, stats)
        }
        EntityKind::Aquarius => {
            let (radius, health) = body("aquarius", 0.35, 10.0);
            let stats = ArchetypeStats {
                move_speed: get("aquarius.drive_speed", 0.5),
                turn_speed: get("aquarius.turn_speed", 45.0),
                sight_range: get("aquarius.sight_range", 7.0),
                drive_aperture: get("aquarius.drive_aperture", 90.0),
                trail_duration: get("aquarius.trail_duration", 10.0),
                fire_aperture: get("aquarius.fire_aperture", 5.0),
                fire_rate: get("aquarius.fire_rate", 2.0),
                bullet_spawn_offset: get("aquarius.bullet_offset", 0.6),
                ..ArchetypeStats::default()
            };
            let flags = MotionFlags {
                traverses_water: true,
                ..MotionFlags::BODY
            };
            (radius, health, flags, stats)
        }
        EntityKind::GeminiBrother | EntityKind::GeminiSister => {
            let (radius, health) = body("gemini", 0.35, 20.0);
            let stats = ArchetypeStats {
                turn_speed: get("gemini.turn_speed", 45.0),
                bullet_spawn_offset: get("gemini.bullet_offset", 0.4),
                drive_aperture: get("gemini.drive_aperture", 45.0),
                move_speed: get("gemini.drive_speed", 0.5),
                damage: get("gemini.laser_damage", 1.0),
                sight_range: get("gemini.sight_range", 10.0),
                ..ArchetypeStats::default()
            };
            let flags = MotionFlags {
                traverses_water: true,
                ..MotionFlags::BODY
            };
            (radius, health, flags, stats)
        }
        EntityKind::GoodBolt | EntityKind::EvilBolt | EntityKind::EvilBouncingBolt => {
            let bounces = match kind {
                EntityKind::GoodBolt => 2,
                EntityKind::EvilBouncingBolt => 1,
                _ => 0,
            };
            let stats = ArchetypeStats {
                move_speed: get("bolt.speed", 6.0),
                damage: get("bolt.damage", 1.0),
                bounces,
                ..ArchetypeStats::default()
            };
            (0.0, 1.0, MotionFlags::PROJECTILE, stats)
        }
        EntityKind::GoodBullet | EntityKind::EvilBullet => {
            let stats = ArchetypeStats {
                move_speed: get("bullet.speed", 4.0),
                damage: get("bullet.damage", 1.0),
                ..ArchetypeStats::default()
            };
            (0.0, 1.0, MotionFlags::PROJECTILE, stats)
        }
        EntityKind::EvilShell => {
            let stats = ArchetypeStats {
                move_speed: get("shell.speed", 2.0),
                turn_speed: get("shell.turn_speed", 180.0),
                damage: get("shell.damage", 3.0),
                ..ArchetypeStats::default()
            };
            (0.0, 1.0, MotionFlags::PROJECTILE, stats)
        }
        EntityKind::GoodFlame => {
            let stats = ArchetypeStats {
                move_speed: get("flame.speed", 0.25),
                damage: get("flame.damage", 0.25),
                decay_rate: get("flame.decay_rate", 1.0),
                ..ArchetypeStats::default()
            };
            (get("flame.radius", 0.25), 1.0, MotionFlags::PROJECTILE, stats)
        }
    };

    EntityTemplate {
        kind,
        faction: kind.faction(),
        radius,
        health,
        flags,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn templates_follow_kind_order() {
        let archetypes = Archetypes::default();

        for kind in EntityKind::ALL {
            assert_eq!(archetypes.template(kind).kind, kind);
        }
    }

    #[test]
    fn tunables_override_defaults() {
        let tunables = Tunables::new()
            .with("leo.sight_range", 9.0)
            .with("bolt.speed", 8.0);
        let archetypes = Archetypes::from_tunables(&tunables);

        assert_eq!(archetypes.template(EntityKind::Leo).stats.sight_range, 9.0);
        assert_eq!(archetypes.template(EntityKind::EvilBolt).stats.move_speed, 8.0);
        assert_eq!(archetypes.template(EntityKind::Aries).stats.sight_range, 7.0);
    }

    #[test]
    fn bounce_budgets_match_projectile_kind() {
        let archetypes = Archetypes::default();

        assert_eq!(archetypes.template(EntityKind::GoodBolt).stats.bounces, 2);
        assert_eq!(archetypes.template(EntityKind::EvilBouncingBolt).stats.bounces, 1);
        assert_eq!(archetypes.template(EntityKind::EvilBolt).stats.bounces, 0);
        assert_eq!(archetypes.template(EntityKind::EvilShell).stats.bounces, 0);
    }

    #[test]
    fn amphibians_traverse_water() {
        let archetypes = Archetypes::default();

        assert!(archetypes.template(EntityKind::Aquarius).flags.traverses_water);
        assert!(archetypes.template(EntityKind::GeminiSister).flags.traverses_water);
        assert!(!archetypes.template(EntityKind::Leo).flags.traverses_water);
        assert!(!archetypes.template(EntityKind::Scorpio).flags.pushed_by_walls);
    }

    #[test]
    fn flame_spin_parity_sets_direction() {
        let archetypes = Archetypes::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        for _ in 0..64 {
            let spin = archetypes.flame(&mut rng).stats.spin_speed;
            assert!((100.0..=500.0).contains(&spin.abs()));
            assert_eq!(spin < 0.0, (spin.abs() as i32) % 2 == 1);
        }
    }
}
