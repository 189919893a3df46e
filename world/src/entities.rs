//! Slot-stable entity storage partitioned by kind.

use tile_tanks_core::{EntityId, EntityKind, Event, TileCoord};

use crate::entity::Entity;

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    kind_slot: usize,
    entity: Option<Entity>,
}

/// Owns every live entity.
///
/// Entities occupy one slot of the all-entities list and one slot of their
/// kind list. Removal empties both slots, insertion fills the first empty
/// slot before growing either list.
#[derive(Clone, Debug)]
pub struct EntityDirectory {
    slots: Vec<Slot>,
    by_kind: Vec<Vec<Option<EntityId>>>,
}

impl Default for EntityDirectory {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            by_kind: vec![Vec::new(); EntityKind::COUNT],
        }
    }
}

impl EntityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity and returns its handle.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let kind = entity.kind;
        let index = self
            .slots
            .iter()
            .position(|slot| slot.entity.is_none())
            .unwrap_or_else(|| {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            });
        let slot = &mut self.slots[index];
        let id = EntityId::new(u32::try_from(index).unwrap_or(u32::MAX), slot.generation);

        let kind_list = &mut self.by_kind[kind.index()];
        let kind_slot = kind_list
            .iter()
            .position(Option::is_none)
            .unwrap_or_else(|| {
                kind_list.push(None);
                kind_list.len() - 1
            });
        kind_list[kind_slot] = Some(id);

        slot.kind_slot = kind_slot;
        slot.entity = Some(entity);
        id
    }

    /// Removes an entity, returning its record.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slot_mut(id)?;
        let entity = slot.entity.take()?;
        let kind_slot = slot.kind_slot;
        slot.generation = slot.generation.wrapping_add(1);

        if let Some(entry) = self.by_kind[entity.kind.index()].get_mut(kind_slot) {
            *entry = None;
        }
        Some(entity)
    }

    /// Looks up a live handle.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(usize::try_from(id.index()).ok()?)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Looks up a live handle mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slot_mut(id)?.entity.as_mut()
    }

    /// Reports whether the handle still addresses its entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access to two distinct entities.
    #[must_use]
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        if a.index() == b.index() || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let a_index = usize::try_from(a.index()).ok()?;
        let b_index = usize::try_from(b.index()).ok()?;
        if a_index < b_index {
            let (low, high) = self.slots.split_at_mut(b_index);
            Some((low[a_index].entity.as_mut()?, high[0].entity.as_mut()?))
        } else {
            let (low, high) = self.slots.split_at_mut(a_index);
            Some((high[0].entity.as_mut()?, low[b_index].entity.as_mut()?))
        }
    }

    /// Handles of every entity in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entity.is_some())
            .map(|(index, slot)| {
                EntityId::new(u32::try_from(index).unwrap_or(u32::MAX), slot.generation)
            })
            .collect()
    }

    /// Handles of every entity of `kind` in kind-slot order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.by_kind[kind.index()].iter().flatten().copied().collect()
    }

    /// Iterates over every entity in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entity = slot.entity.as_ref()?;
            let id = EntityId::new(u32::try_from(index).ok()?, slot.generation);
            Some((id, entity))
        })
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entity.is_some()).count()
    }

    /// Reports whether no entity is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated slots, occupied or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of allocated slots in the kind list.
    #[must_use]
    pub fn kind_slot_count(&self, kind: EntityKind) -> usize {
        self.by_kind[kind.index()].len()
    }

    /// Tiles occupied by live stationary blockers.
    #[must_use]
    pub fn stationary_tiles(&self) -> Vec<TileCoord> {
        self.iter()
            .filter(|(_, entity)| entity.kind.is_stationary() && entity.alive)
            .map(|(_, entity)| entity.tile())
            .collect()
    }

    /// Subtracts health, killing the entity once it reaches zero.
    ///
    /// Dead and invincible entities are unaffected. Returns whether the
    /// entity died.
    pub fn damage(&mut self, id: EntityId, amount: f32, out_events: &mut Vec<Event>) -> bool {
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        if !entity.alive || entity.pilot.invincible {
            return false;
        }

        entity.health -= amount;
        out_events.push(Event::EntityDamaged {
            entity: id,
            kind: entity.kind,
            amount,
        });
        if entity.health > 0.0 {
            return false;
        }
        self.kill(id, out_events);
        true
    }

    /// Kills an entity, cascading to a live twin.
    ///
    /// The player is only marked dead, every other kind is also marked as
    /// garbage. Projectile deaths emit no event.
    pub fn kill(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        if !entity.alive || entity.pilot.invincible {
            return;
        }

        entity.alive = false;
        let kind = entity.kind;
        let position = entity.position;
        let twin = entity.twin;
        if kind == EntityKind::Player {
            out_events.push(Event::PlayerDied { entity: id });
            return;
        }
        entity.garbage = true;
        if !kind.is_bullet() {
            out_events.push(Event::EntityDied {
                entity: id,
                kind,
                position,
            });
        }

        if let Some(twin) = twin {
            let twin_is_partner = self
                .get(twin)
                .is_some_and(|other| other.alive && other.twin == Some(id));
            if twin_is_partner {
                self.kill(twin, out_events);
            }
        }
    }

    /// Deletes every entity marked as garbage, returning the count.
    pub fn sweep_garbage(&mut self) -> usize {
        let doomed: Vec<EntityId> = self
            .iter()
            .filter(|(_, entity)| entity.garbage)
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            let _ = self.remove(*id);
        }
        doomed.len()
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Slot> {
        let slot = self.slots.get_mut(usize::try_from(id.index()).ok()?)?;
        (slot.generation == id.generation()).then_some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use tile_tanks_core::{ArchetypeStats, EntityTemplate, MotionFlags};

    fn template(kind: EntityKind) -> EntityTemplate {
        EntityTemplate {
            kind,
            faction: kind.faction(),
            radius: 0.3,
            health: 2.0,
            flags: if kind.is_bullet() {
                MotionFlags::PROJECTILE
            } else {
                MotionFlags::BODY
            },
            stats: ArchetypeStats::default(),
        }
    }

    fn spawn(directory: &mut EntityDirectory, kind: EntityKind) -> EntityId {
        directory.spawn(Entity::from_template(&template(kind), Vec2::ZERO, 0.0))
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut directory = EntityDirectory::new();
        let first = spawn(&mut directory, EntityKind::Leo);
        let _ = spawn(&mut directory, EntityKind::Leo);

        let _ = directory.remove(first);
        let replacement = spawn(&mut directory, EntityKind::Leo);

        assert_eq!(replacement.index(), first.index());
        assert_ne!(replacement.generation(), first.generation());
        assert_eq!(directory.slot_count(), 2);
        assert_eq!(directory.kind_slot_count(EntityKind::Leo), 2);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut directory = EntityDirectory::new();
        let first = spawn(&mut directory, EntityKind::Aries);
        let _ = directory.remove(first);
        let _ = spawn(&mut directory, EntityKind::Aries);

        assert!(directory.get(first).is_none());
        assert!(directory.remove(first).is_none());
    }

    #[test]
    fn entity_appears_in_one_kind_list() {
        let mut directory = EntityDirectory::new();
        let leo = spawn(&mut directory, EntityKind::Leo);
        let aries = spawn(&mut directory, EntityKind::Aries);

        assert_eq!(directory.ids_of_kind(EntityKind::Leo), vec![leo]);
        assert_eq!(directory.ids_of_kind(EntityKind::Aries), vec![aries]);

        let _ = directory.remove(leo);
        assert!(directory.ids_of_kind(EntityKind::Leo).is_empty());
        assert_eq!(directory.ids(), vec![aries]);
    }

    #[test]
    fn churn_does_not_grow_storage() {
        let mut directory = EntityDirectory::new();
        for _ in 0..50 {
            let bullet = spawn(&mut directory, EntityKind::GoodBolt);
            let _ = directory.remove(bullet);
        }

        assert_eq!(directory.slot_count(), 1);
        assert_eq!(directory.kind_slot_count(EntityKind::GoodBolt), 1);
    }

    #[test]
    fn lethal_damage_marks_garbage_and_reports_death() {
        let mut directory = EntityDirectory::new();
        let leo = spawn(&mut directory, EntityKind::Leo);
        let mut events = Vec::new();

        assert!(!directory.damage(leo, 1.0, &mut events));
        assert!(directory.damage(leo, 1.0, &mut events));

        let entity = directory.get(leo).expect("still stored until swept");
        assert!(!entity.alive);
        assert!(entity.garbage);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EntityDied { kind: EntityKind::Leo, .. })));

        assert_eq!(directory.sweep_garbage(), 1);
        assert!(directory.is_empty());
    }

    #[test]
    fn player_death_is_not_garbage() {
        let mut directory = EntityDirectory::new();
        let player = spawn(&mut directory, EntityKind::Player);
        let mut events = Vec::new();

        let _ = directory.damage(player, 5.0, &mut events);

        let entity = directory.get(player).expect("player kept");
        assert!(!entity.alive);
        assert!(!entity.garbage);
        assert!(events.contains(&Event::PlayerDied { entity: player }));
        assert_eq!(directory.sweep_garbage(), 0);
    }

    #[test]
    fn invincible_player_ignores_damage() {
        let mut directory = EntityDirectory::new();
        let player = spawn(&mut directory, EntityKind::Player);
        directory
            .get_mut(player)
            .expect("player stored")
            .pilot
            .invincible = true;
        let mut events = Vec::new();

        assert!(!directory.damage(player, 50.0, &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn bullet_death_is_silent() {
        let mut directory = EntityDirectory::new();
        let bolt = spawn(&mut directory, EntityKind::EvilBolt);
        let mut events = Vec::new();

        directory.kill(bolt, &mut events);

        assert!(events.is_empty());
        assert!(directory.get(bolt).is_some_and(|bullet| bullet.garbage));
    }

    #[test]
    fn twin_death_cascades() {
        let mut directory = EntityDirectory::new();
        let brother = spawn(&mut directory, EntityKind::GeminiBrother);
        let sister = spawn(&mut directory, EntityKind::GeminiSister);
        directory.get_mut(brother).expect("brother").twin = Some(sister);
        directory.get_mut(sister).expect("sister").twin = Some(brother);
        let mut events = Vec::new();

        directory.kill(sister, &mut events);

        assert!(directory.get(brother).is_some_and(|twin| !twin.alive));
        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::EntityDied { .. }))
            .count();
        assert_eq!(deaths, 2);
    }

    #[test]
    fn twin_in_reused_slot_is_spared() {
        let mut directory = EntityDirectory::new();
        let brother = spawn(&mut directory, EntityKind::GeminiBrother);
        let sister = spawn(&mut directory, EntityKind::GeminiSister);
        directory.get_mut(brother).expect("brother").twin = Some(sister);
        directory.get_mut(sister).expect("sister").twin = Some(brother);

        let _ = directory.remove(sister);
        let newcomer = spawn(&mut directory, EntityKind::GeminiSister);
        assert_eq!(newcomer.index(), sister.index());

        let mut events = Vec::new();
        directory.kill(brother, &mut events);

        assert!(directory.get(newcomer).is_some_and(|entity| entity.alive));
    }
}
