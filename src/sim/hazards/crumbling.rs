//! Crumbling platform
//!
//! Idle until the player lands on it, then shakes, vanishes for the respawn
//! delay and comes back. Contacts while it is already crumbling are ignored.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::ConfigError;
use crate::settings::CrumblingSettings;
use crate::sim::channel::{ChannelKind, ChannelPolicy};
use crate::sim::collab::{BodyTag, Collaborators};
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::motion::{Easing, Keyframes, Motion, Pose};
use crate::sim::phase::{Phase, PhaseTable};

pub struct CrumblingPlatform {
    machine: HazardStateMachine,
}

impl CrumblingPlatform {
    pub fn new(name: &str, settings: &CrumblingSettings, collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;

        // Platforms sharing a level should not shake in lockstep
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let phase = if settings.shake_frequency > 0.0 {
            rng.random_range(0.0..TAU) / settings.shake_frequency
        } else {
            0.0
        };
        let shake = Motion {
            keys: Keyframes::Position(settings.origin, settings.origin),
            easing: Easing::Shake {
                axis: Vec2::X,
                amplitude: settings.shake_amount,
                frequency: settings.shake_frequency,
                phase,
            },
        };

        let table = PhaseTable::one_shot(
            name,
            vec![
                Phase::new("shaking", settings.shake_duration)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On)
                    .motion(shake),
                Phase::new("vanished", settings.respawn_delay),
                Phase::new("solid", 0.0)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On),
            ],
        )?;
        let options = MachineOptions {
            rest: Pose::at(settings.origin),
            start_delay: 0.0,
        };
        let machine = HazardStateMachine::new(name, table, options, collab, &[ChannelKind::Collision])?;
        Ok(Self { machine })
    }

    /// A body touched the platform. Returns true if this started a crumble.
    pub fn on_contact(&mut self, tag: BodyTag) -> bool {
        if tag != BodyTag::Player {
            return false;
        }
        let started = self.machine.trigger();
        if started {
            log::debug!("{}: crumbling", self.machine.name());
        }
        started
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

    pub fn is_solid(&self) -> bool {
        self.machine.output().collision.enabled
    }

    pub fn is_crumbling(&self) -> bool {
        !self.machine.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::recorder::Recorder;

    fn platform(settings: &CrumblingSettings) -> CrumblingPlatform {
        CrumblingPlatform::new("crumble", settings, Recorder::new().collaborators()).unwrap()
    }

    #[test]
    fn test_idle_until_player_contact() {
        let mut p = platform(&CrumblingSettings::default());
        assert!(p.is_solid());
        p.advance(10.0);
        assert!(p.is_solid());
        assert!(!p.is_crumbling());

        assert!(!p.on_contact(BodyTag::Other));
        assert!(!p.is_crumbling());
    }

    #[test]
    fn test_shake_vanish_restore() {
        let settings = CrumblingSettings {
            origin: Vec2::new(5.0, 2.0),
            seed: 3,
            ..Default::default()
        };
        let mut p = platform(&settings);
        assert!(p.on_contact(BodyTag::Player));
        assert!(p.is_crumbling());

        for _ in 0..50 {
            p.advance(0.0125);
            let pos = p.machine().output().pose.position;
            assert!((pos.x - 5.0).abs() <= settings.shake_amount + 1e-5);
            assert_eq!(pos.y, 2.0);
            assert!(p.is_solid());
        }

        // Contacts mid-crumble are ignored
        assert!(!p.on_contact(BodyTag::Player));

        p.advance(0.5);
        assert!(!p.is_solid());
        assert!(!p.machine().output().visual.enabled);
        assert_eq!(p.machine().output().pose.position, settings.origin);

        p.advance(3.0);
        assert!(p.is_solid());
        assert!(!p.is_crumbling());
        assert!(p.on_contact(BodyTag::Player));
    }

    #[test]
    fn test_seed_changes_shake_phase() {
        let a = CrumblingSettings { seed: 1, ..Default::default() };
        let b = CrumblingSettings { seed: 2, ..Default::default() };
        let mut pa = platform(&a);
        let mut pb = platform(&b);
        pa.on_contact(BodyTag::Player);
        pb.on_contact(BodyTag::Player);
        pa.advance(0.1);
        pb.advance(0.1);
        assert_ne!(
            pa.machine().output().pose.position,
            pb.machine().output().pose.position
        );

        // Same seed, same shake
        let mut pc = platform(&a);
        pc.on_contact(BodyTag::Player);
        pc.advance(0.1);
        assert_eq!(pa.machine().output().pose, pc.machine().output().pose);
    }

    #[test]
    fn test_shake_independent_of_idle_time() {
        let settings = CrumblingSettings { seed: 7, ..Default::default() };
        let mut fresh = platform(&settings);
        let mut old = platform(&settings);
        old.advance(1.0e6);

        fresh.on_contact(BodyTag::Player);
        old.on_contact(BodyTag::Player);
        for _ in 0..8 {
            fresh.advance(0.0125);
            old.advance(0.0125);
            assert_eq!(fresh.machine().output().pose, old.machine().output().pose);
        }
    }
}
