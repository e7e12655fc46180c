//! Platforms that come and go
//!
//! `DisappearingPlatform` blinks on a fixed interval. `SequencePlatform` is
//! solid only when the player's jump count has the right parity.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::ConfigError;
use crate::settings::{DisappearingSettings, SequenceSettings};
use crate::sim::channel::{ChannelKind, ChannelOutput, ChannelPolicy, ChannelSet};
use crate::sim::collab::Collaborators;
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::motion::Pose;
use crate::sim::phase::{Phase, PhaseTable};

/// Two-phase blinking platform. Starts hidden.
pub struct DisappearingPlatform {
    machine: HazardStateMachine,
}

impl DisappearingPlatform {
    pub fn new(name: &str, settings: &DisappearingSettings, collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let table = PhaseTable::cycle(
            name,
            vec![
                Phase::new("hidden", settings.interval),
                Phase::new("shown", settings.interval)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On),
            ],
        )?;
        let options = MachineOptions {
            rest: Pose::at(settings.origin),
            start_delay: settings.initial_delay,
        };
        let machine = HazardStateMachine::new(name, table, options, collab, &[ChannelKind::Collision])?;
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

    pub fn is_solid(&self) -> bool {
        self.machine.output().collision.enabled
    }
}

/// Player jump count shared by every sequence platform in a level
#[derive(Debug, Clone, Default)]
pub struct JumpCounter(Rc<Cell<u32>>);

impl JumpCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_jump(&self) {
        self.0.set(self.0.get().wrapping_add(1));
    }

    pub fn count(&self) -> u32 {
        self.0.get()
    }

    pub fn is_odd(&self) -> bool {
        self.0.get() % 2 == 1
    }

    pub fn reset(&self) {
        self.0.set(0);
    }
}

/// Platform solid on odd (or even) jump counts
pub struct SequencePlatform {
    channels: ChannelSet,
    jumps: JumpCounter,
    is_odd: bool,
    halted: bool,
}

impl SequencePlatform {
    pub fn new(
        name: &str,
        settings: &SequenceSettings,
        collab: Collaborators,
        jumps: JumpCounter,
    ) -> Result<Self, ConfigError> {
        let mut channels = ChannelSet::new(name, collab, &[ChannelKind::Collision])?;
        channels.warn_missing(&[ChannelKind::Visual]);
        channels.present(Pose::at(settings.origin));
        let mut platform = Self {
            channels,
            jumps,
            is_odd: settings.is_odd,
            halted: false,
        };
        platform.refresh();
        Ok(platform)
    }

    pub fn advance(&mut self, _dt: f32) {
        if !self.halted {
            self.refresh();
        }
    }

    pub fn force_off(&mut self) {
        self.halted = true;
        self.channels.force_off();
    }

    pub fn reset(&mut self) {
        self.halted = false;
        self.refresh();
    }

    pub fn is_solid(&self) -> bool {
        self.channels.output(ChannelKind::Collision).enabled
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    fn refresh(&mut self) {
        let active = self.jumps.is_odd() == self.is_odd;
        let output = if active { ChannelOutput::ON } else { ChannelOutput::OFF };
        self.channels.apply(ChannelKind::Visual, output);
        self.channels.apply(ChannelKind::Collision, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::recorder::{Call, Recorder};

    #[test]
    fn test_disappearing_starts_hidden() {
        let recorder = Recorder::new();
        let mut p = DisappearingPlatform::new("p", &DisappearingSettings::default(), recorder.collaborators()).unwrap();
        assert!(!p.is_solid());
        assert_eq!(recorder.last_visible(), Some(false));

        p.advance(2.0);
        assert!(p.is_solid());
        assert_eq!(recorder.last_visible(), Some(true));
        p.advance(2.0);
        assert!(!p.is_solid());
        // Damage is never involved
        assert_eq!(recorder.last_damage(), Some(false));
        assert_eq!(recorder.count(|c| matches!(c, Call::Damage(_))), 1);
    }

    #[test]
    fn test_jump_counter_is_shared() {
        let jumps = JumpCounter::new();
        let other = jumps.clone();
        jumps.record_jump();
        assert_eq!(other.count(), 1);
        assert!(other.is_odd());
        other.reset();
        assert_eq!(jumps.count(), 0);
    }

    #[test]
    fn test_sequence_parity() {
        let jumps = JumpCounter::new();
        let odd_recorder = Recorder::new();
        let even_recorder = Recorder::new();
        let mut odd = SequencePlatform::new(
            "odd",
            &SequenceSettings {
                is_odd: true,
                ..Default::default()
            },
            odd_recorder.collaborators(),
            jumps.clone(),
        )
        .unwrap();
        let mut even = SequencePlatform::new(
            "even",
            &SequenceSettings {
                is_odd: false,
                ..Default::default()
            },
            even_recorder.collaborators(),
            jumps.clone(),
        )
        .unwrap();
        assert!(!odd.is_solid());
        assert!(even.is_solid());

        jumps.record_jump();
        odd.advance(0.01);
        even.advance(0.01);
        assert!(odd.is_solid());
        assert!(!even.is_solid());

        jumps.record_jump();
        odd.advance(0.01);
        even.advance(0.01);
        assert!(!odd.is_solid());
        assert!(even.is_solid());
        assert_eq!(odd_recorder.count(|c| matches!(c, Call::Collider(_))), 3);
    }

    #[test]
    fn test_sequence_force_off_ignores_jumps() {
        let jumps = JumpCounter::new();
        let recorder = Recorder::new();
        let mut p = SequencePlatform::new("p", &SequenceSettings::default(), recorder.collaborators(), jumps.clone())
            .unwrap();
        p.force_off();
        jumps.record_jump();
        p.advance(0.01);
        assert!(!p.is_solid());
        p.reset();
        assert!(p.is_solid());
    }
}
