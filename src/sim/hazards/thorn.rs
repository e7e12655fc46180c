//! Moving thorn
//!
//! Two-phase rhythm: lowered, then raised. The thorn's height eases toward
//! the target scale exponentially rather than linearly, so it snaps up fast
//! and settles.

use crate::error::ConfigError;
use crate::settings::MovingThornSettings;
use crate::sim::channel::{ChannelKind, ChannelPolicy};
use crate::sim::collab::Collaborators;
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::motion::{Easing, Keyframes, Motion, Pose};
use crate::sim::phase::{Phase, PhaseTable};

pub struct MovingThorn {
    machine: HazardStateMachine,
}

impl MovingThorn {
    pub fn new(name: &str, settings: &MovingThornSettings, collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let approach = |from, to| Motion {
            keys: Keyframes::Scale(from, to),
            easing: Easing::Approach {
                rate: settings.scale_speed,
            },
        };
        let table = PhaseTable::cycle(
            name,
            vec![
                Phase::new("lowered", settings.deactivate_time)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On)
                    .motion(approach(settings.max_scale, settings.min_scale)),
                Phase::new("raised", settings.active_time)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On)
                    .damage(ChannelPolicy::On)
                    .motion(approach(settings.min_scale, settings.max_scale)),
            ],
        )?;
        let options = MachineOptions {
            rest: Pose::at(settings.origin).with_scale(settings.min_scale),
            start_delay: 0.0,
        };
        let machine = HazardStateMachine::new(name, table, options, collab, &[ChannelKind::Visual])?;
        Ok(Self { machine })
    }

    pub fn advance(&mut self, dt: f32) -> u32 {
        self.machine.advance(dt)
    }

    pub fn force_off(&mut self) {
        self.machine.force_off();
    }

    pub fn reset(&mut self) {
        self.machine.reset();
    }

    pub fn machine(&self) -> &HazardStateMachine {
        &self.machine
    }

    pub fn is_raised(&self) -> bool {
        self.machine.phase().name == "raised"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::recorder::{Call, Recorder};

    #[test]
    fn test_thorn_rhythm() {
        let recorder = Recorder::new();
        let settings = MovingThornSettings::default();
        let mut t = MovingThorn::new("thorn", &settings, recorder.collaborators()).unwrap();
        assert!(!t.is_raised());
        assert!(!t.machine().output().damage.enabled);

        t.advance(0.5);
        assert!(t.is_raised());
        assert!(t.machine().output().damage.enabled);

        // Close to full height well before the raised phase ends
        t.advance(0.2);
        let scale = t.machine().output().pose.scale;
        assert!((scale.y - settings.max_scale.y).abs() < 1e-3);
        assert!((scale.x - settings.max_scale.x).abs() < 1e-5);

        t.advance(1.85);
        assert!(!t.is_raised());
        t.advance(0.3);
        let scale = t.machine().output().pose.scale;
        assert!((scale.y - settings.min_scale.y).abs() < 1e-3);
        assert!(recorder.count(|c| matches!(c, Call::Scale(_))) > 2);
    }

    #[test]
    fn test_thorn_always_solid() {
        let recorder = Recorder::new();
        let mut t = MovingThorn::new("thorn", &MovingThornSettings::default(), recorder.collaborators()).unwrap();
        for _ in 0..300 {
            t.advance(1.0 / 60.0);
            assert!(t.machine().output().collision.enabled);
        }
    }
}
