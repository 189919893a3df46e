//! Tally of the events emitted during a run.

use std::{collections::BTreeMap, fmt};

use tile_tanks_core::{EntityKind, Event};

/// Counters accumulated from the simulation event stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) frames: u64,
    pub(crate) shots: usize,
    pub(crate) bounces: usize,
    pub(crate) damage_dealt: f32,
    pub(crate) kills: BTreeMap<String, usize>,
    pub(crate) player_deaths: usize,
    pub(crate) transitions: usize,
    pub(crate) won: bool,
}

impl Summary {
    /// Folds a batch of events into the counters.
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::BulletFired { .. } => self.shots += 1,
                Event::BulletBounced { .. } => self.bounces += 1,
                Event::EntityDamaged { kind, amount, .. } if *kind != EntityKind::Player => {
                    self.damage_dealt += amount;
                }
                Event::EntityDied { kind, .. } => {
                    *self.kills.entry(format!("{kind:?}")).or_default() += 1;
                }
                Event::PlayerDied { .. } => self.player_deaths += 1,
                Event::LevelTransition { .. } => self.transitions += 1,
                Event::GameWon => self.won = true,
                _ => {}
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:        {}", self.frames)?;
        writeln!(f, "shots fired:   {}", self.shots)?;
        writeln!(f, "bounces:       {}", self.bounces)?;
        writeln!(f, "damage dealt:  {:.2}", self.damage_dealt)?;
        writeln!(f, "player deaths: {}", self.player_deaths)?;
        writeln!(f, "transitions:   {}", self.transitions)?;
        writeln!(f, "game won:      {}", self.won)?;
        write!(f, "kills:")?;
        if self.kills.is_empty() {
            return write!(f, "         none");
        }
        for (kind, count) in &self.kills {
            write!(f, "\n  {kind:<12} {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_tanks_core::{EntityId, Vec2};

    #[test]
    fn record_counts_kills_by_kind() {
        let entity = EntityId::new(0, 0);
        let mut summary = Summary::default();

        summary.record(&[
            Event::EntityDied {
                entity,
                kind: EntityKind::Leo,
                position: Vec2::ZERO,
            },
            Event::EntityDied {
                entity,
                kind: EntityKind::Leo,
                position: Vec2::ZERO,
            },
            Event::EntityDamaged {
                entity,
                kind: EntityKind::Player,
                amount: 3.0,
            },
            Event::EntityDamaged {
                entity,
                kind: EntityKind::Aries,
                amount: 1.5,
            },
            Event::GameWon,
        ]);

        assert_eq!(summary.kills.get("Leo"), Some(&2));
        assert_eq!(summary.damage_dealt, 1.5);
        assert!(summary.won);
        assert!(summary.to_string().contains("Leo          2"));
    }
}
