//! Scripted player intents for headless runs.

use clap::ValueEnum;
use tile_tanks_core::{InputIntents, Vec2};

/// Frames spent on each leg of the patrol script.
const PATROL_LEG_FRAMES: u64 = 90;

/// Input script replayed by the runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Script {
    /// No input at all.
    Idle,
    /// Drive toward the far corner, firing ahead.
    #[default]
    Advance,
    /// Drive a square, sweeping the turret and switching weapons each lap.
    Patrol,
}

impl Script {
    /// Intents for the given frame.
    #[must_use]
    pub(crate) fn intents(self, frame: u64) -> InputIntents {
        match self {
            Self::Idle => InputIntents::default(),
            Self::Advance => InputIntents {
                movement: Vec2::new(1.0, 1.0),
                aim: Vec2::new(1.0, 1.0),
                fire_held: frame % 4 == 0,
                respawn: true,
                ..InputIntents::default()
            },
            Self::Patrol => {
                let leg = frame / PATROL_LEG_FRAMES;
                let movement = match leg % 4 {
                    0 => Vec2::X,
                    1 => Vec2::Y,
                    2 => Vec2::NEG_X,
                    _ => Vec2::NEG_Y,
                };
                let sweep = (frame % 360) as f32;
                InputIntents {
                    movement,
                    aim: Vec2::new(sweep.to_radians().cos(), sweep.to_radians().sin()),
                    fire_held: true,
                    switch_weapon: frame > 0 && frame % (PATROL_LEG_FRAMES * 4) == 0,
                    respawn: true,
                    ..InputIntents::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_script_sends_nothing() {
        assert_eq!(Script::Idle.intents(17), InputIntents::default());
    }

    #[test]
    fn patrol_turns_each_leg_and_switches_weapons_each_lap() {
        assert_eq!(Script::Patrol.intents(0).movement, Vec2::X);
        assert_eq!(Script::Patrol.intents(PATROL_LEG_FRAMES).movement, Vec2::Y);
        assert!(!Script::Patrol.intents(0).switch_weapon);
        assert!(Script::Patrol.intents(PATROL_LEG_FRAMES * 4).switch_weapon);
    }
}
