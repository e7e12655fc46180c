//! Animation-driven wall trap
//!
//! An interval machine fires the animation trigger every `repeat_interval`
//! seconds. Each trigger (timed or manual) cancels the damage window that
//! is running and starts a fresh one: a short arming delay, then damage for
//! `damage_duration`. Windows never overlap or stack.

use crate::error::ConfigError;
use crate::settings::AnimatedWallSettings;
use crate::sim::channel::ChannelPolicy;
use crate::sim::collab::Collaborators;
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::phase::{Phase, PhaseHook, PhaseTable};

pub struct AnimatedWallTrap {
    /// Single cyclic phase whose enter hook fires the animation
    interval: HazardStateMachine,
    /// One-shot damage window: armed, striking, closed
    window: HazardStateMachine,
    always_damage: bool,
    disable_after_first_hit: bool,
}

impl AnimatedWallTrap {
    pub fn new(name: &str, settings: &AnimatedWallSettings, mut collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let animator = collab.take_animator();

        let interval_table = PhaseTable::cycle(
            name,
            vec![
                Phase::new("interval", settings.repeat_interval)
                    .on_enter(PhaseHook::FireTrigger(settings.animation_trigger.clone())),
            ],
        )?;
        let interval = HazardStateMachine::new(
            &format!("{name}/interval"),
            interval_table,
            MachineOptions::default(),
            animator,
            &[],
        )?;

        let window_table = if settings.always_damage {
            PhaseTable::one_shot(name, vec![Phase::new("armed", 0.0).damage(ChannelPolicy::On)])?
        } else {
            PhaseTable::one_shot(
                name,
                vec![
                    Phase::new("arming", settings.damage_start_delay),
                    Phase::new("striking", settings.damage_duration).damage(ChannelPolicy::On),
                    Phase::new("closed", 0.0),
                ],
            )?
        };
        let window = HazardStateMachine::new(name, window_table, MachineOptions::default(), collab, &[])?;

        Ok(Self {
            interval,
            window,
            always_damage: settings.always_damage,
            disable_after_first_hit: settings.disable_after_first_hit,
        })
    }

    pub fn advance(&mut self, dt: f32) {
        let fired = self.interval.advance(dt);
        if fired > 0 && !self.always_damage {
            // Only the latest trigger matters; run its window for the time
            // elapsed since it fired
            let since = self.interval.elapsed();
            self.window.restart();
            self.window.advance(since);
        } else {
            self.window.advance(dt);
        }
    }

    /// Fire the trap now. Also restarts the repeat interval.
    pub fn fire(&mut self) {
        self.interval.restart();
        if !self.always_damage {
            self.window.restart();
        }
    }

    /// The damage emitter reports a landed hit
    pub fn on_damage_dealt(&mut self) {
        if self.disable_after_first_hit && !self.always_damage && self.is_damaging() {
            log::debug!("{}: hit landed, closing window", self.window.name());
            self.window.finish();
        }
    }

    pub fn force_off(&mut self) {
        self.interval.force_off();
        self.window.force_off();
    }

    pub fn reset(&mut self) {
        self.interval.reset();
        self.window.reset();
    }

    pub fn is_damaging(&self) -> bool {
        self.window.output().damage.enabled
    }

    pub fn window(&self) -> &HazardStateMachine {
        &self.window
    }

    /// Seconds until the next timed trigger
    pub fn time_to_trigger(&self) -> f32 {
        (self.interval.phase().duration - self.interval.elapsed()).max(0.0)
    }
}
