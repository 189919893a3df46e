#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Contact resolution run after every entity has moved.
//!
//! The three phases run in a fixed order: disc overlaps between entities,
//! disc contacts against surrounding solid tiles, then projectile hits.
//! Each phase completes for every entity before the next one starts.

use tile_tanks_core::{EntityId, EntityKind, Event};
use tile_tanks_world::{geometry, EntityDirectory, TileGrid};

/// Stateful contact resolver holding scratch buffers between frames.
#[derive(Debug, Default)]
pub struct Physics {
    bodies: Vec<EntityId>,
    targets: Vec<EntityId>,
}

impl Physics {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every contact phase in order.
    pub fn handle(
        &mut self,
        entities: &mut EntityDirectory,
        grid: &TileGrid,
        out_events: &mut Vec<Event>,
    ) {
        self.resolve_overlaps(entities);
        self.resolve_walls(entities, grid);
        self.resolve_bullet_hits(entities, out_events);
    }

    /// Separates overlapping discs according to their motion flags.
    ///
    /// Two mutually pushable entities split the correction. When only one
    /// side may be displaced it is pushed fully out of the other.
    pub fn resolve_overlaps(&mut self, entities: &mut EntityDirectory) {
        self.bodies.clear();
        self.bodies.extend(entities.ids());

        for &id in &self.bodies {
            let pushes = entities
                .get(id)
                .is_some_and(|entity| entity.alive && entity.flags.does_push);
            if !pushes {
                continue;
            }
            for &other_id in &self.bodies {
                let Some((entity, other)) = entities.pair_mut(id, other_id) else {
                    continue;
                };
                if !other.alive
                    || !geometry::discs_overlap(
                        entity.position,
                        entity.radius,
                        other.position,
                        other.radius,
                    )
                {
                    continue;
                }

                if entity.flags.pushed_by_entities && other.flags.does_push {
                    if other.flags.pushed_by_entities {
                        let _ = geometry::push_discs_apart(
                            &mut entity.position,
                            entity.radius,
                            &mut other.position,
                            other.radius,
                        );
                    } else {
                        let _ = geometry::push_disc_out_of_fixed_disc(
                            &mut entity.position,
                            entity.radius,
                            other.position,
                            other.radius,
                        );
                    }
                } else if other.flags.pushed_by_entities {
                    let _ = geometry::push_disc_out_of_fixed_disc(
                        &mut other.position,
                        other.radius,
                        entity.position,
                        entity.radius,
                    );
                }
            }
        }
    }

    /// Pushes entities out of the solid tiles around their own tile.
    ///
    /// Water counts as solid for entities that cannot traverse it.
    pub fn resolve_walls(&mut self, entities: &mut EntityDirectory, grid: &TileGrid) {
        self.bodies.clear();
        self.bodies.extend(entities.ids());

        for &id in &self.bodies {
            let Some(entity) = entities.get_mut(id) else {
                continue;
            };
            if !entity.alive || !entity.flags.pushed_by_walls {
                continue;
            }
            let water_as_solid = entity.water_as_solid();
            for coord in entity.tile().surrounding() {
                if !grid.in_bounds(coord) || !grid.is_solid(coord, water_as_solid) {
                    continue;
                }
                let _ = geometry::push_disc_out_of_bounds(
                    &mut entity.position,
                    entity.radius,
                    grid.bounds_of(coord),
                );
            }
        }
    }

    /// Applies projectile hits to opposing damageable entities.
    ///
    /// Projectiles are processed in kind order. Targets are visited from the
    /// last non-projectile kind back to the player. An Aries deflects
    /// projectiles that enter its frontal shield sector.
    pub fn resolve_bullet_hits(&mut self, entities: &mut EntityDirectory, out_events: &mut Vec<Event>) {
        self.targets.clear();
        for kind in EntityKind::ALL.into_iter().rev().filter(|kind| !kind.is_bullet()) {
            self.targets.extend(entities.ids_of_kind(kind));
        }

        for kind in EntityKind::ALL.into_iter().filter(|kind| kind.is_bullet()) {
            for bullet in entities.ids_of_kind(kind) {
                self.check_bullet(entities, bullet, out_events);
            }
        }
    }

    fn check_bullet(&self, entities: &mut EntityDirectory, bullet_id: EntityId, out_events: &mut Vec<Event>) {
        if !entities.get(bullet_id).is_some_and(|bullet| bullet.alive) {
            return;
        }
        // A bullet that dies on contact still reaches every target it overlaps this phase.
        for &target_id in &self.targets {
            let Some((bullet, target)) = entities.pair_mut(bullet_id, target_id) else {
                continue;
            };
            if !target.flags.hit_by_bullets || !target.alive || target.faction == bullet.faction {
                continue;
            }

            let shielded = target.kind == EntityKind::Aries
                && geometry::is_point_in_directed_sector(
                    bullet.position,
                    target.position,
                    target.orientation,
                    target.stats.shield_aperture,
                    target.radius,
                );
            if shielded {
                let normal = (bullet.position - target.position).normalize_or_zero();
                let _ = geometry::push_disc_out_of_fixed_disc(
                    &mut bullet.position,
                    target.velocity.length(),
                    target.position,
                    target.radius,
                );
                bullet.bounce_off(normal);
                out_events.push(Event::BulletBounced {
                    entity: bullet_id,
                    position: bullet.position,
                });
                continue;
            }

            if !geometry::discs_overlap(bullet.position, bullet.radius, target.position, target.radius) {
                continue;
            }
            let damage = bullet.stats.damage;
            let lingers = bullet.kind == EntityKind::GoodFlame;
            if lingers {
                bullet.stats.damage = 0.0;
            } else {
                bullet.alive = false;
                bullet.garbage = true;
            }
            if damage > 0.0 {
                let _ = entities.damage(target_id, damage, out_events);
            }
        }
    }
}
