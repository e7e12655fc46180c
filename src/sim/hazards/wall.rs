//! Extending wall and floor spike traps
//!
//! Both are the same four-phase cycle: hidden, extending, extended,
//! retracting. Both hurt while extended; they differ in whether damage
//! starts during the extension and whether the collider follows it.

use glam::Vec2;

use crate::error::ConfigError;
use crate::facing;
use crate::settings::{SpikeTrapSettings, WallTrapSettings};
use crate::sim::channel::{ChannelKind, ChannelPolicy};
use crate::sim::collab::Collaborators;
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::motion::{Keyframes, Motion, Pose};
use crate::sim::phase::{Phase, PhaseTable};

/// Shape of a hidden/extending/extended/retracting cycle
#[derive(Debug, Clone, Copy)]
struct Cycle4 {
    hidden: Vec2,
    extended: Vec2,
    hidden_time: f32,
    extend_time: f32,
    extended_time: f32,
    retract_time: f32,
    /// Damage already on while extending; always on once extended
    damage_extending: bool,
    /// Collider on only when damage is; otherwise always solid
    collision_follows_damage: bool,
}

impl Cycle4 {
    fn table(&self, name: &str) -> Result<PhaseTable, ConfigError> {
        let collision = |damaging: bool| {
            if self.collision_follows_damage {
                ChannelPolicy::on_if(damaging)
            } else {
                ChannelPolicy::On
            }
        };
        PhaseTable::cycle(
            name,
            vec![
                Phase::new("hidden", self.hidden_time)
                    .visual(ChannelPolicy::On)
                    .collision(collision(false))
                    .motion(Motion::hold_position(self.hidden)),
                Phase::new("extending", self.extend_time)
                    .visual(ChannelPolicy::On)
                    .collision(collision(self.damage_extending))
                    .damage(ChannelPolicy::on_if(self.damage_extending))
                    .motion(Motion::linear(Keyframes::Position(self.hidden, self.extended))),
                Phase::new("extended", self.extended_time)
                    .visual(ChannelPolicy::On)
                    .collision(collision(true))
                    .damage(ChannelPolicy::On)
                    .motion(Motion::hold_position(self.extended)),
                Phase::new("retracting", self.retract_time)
                    .visual(ChannelPolicy::On)
                    .collision(collision(false))
                    .motion(Motion::linear(Keyframes::Position(self.extended, self.hidden))),
            ],
        )
    }
}

/// Wall block or spike strip on a four-phase cycle
pub struct WallTrap {
    machine: HazardStateMachine,
}

impl WallTrap {
    /// Block sliding out of a wall. Always solid; hurts while extended, and
    /// from the start of the extension when so configured.
    pub fn wall(name: &str, settings: &WallTrapSettings, collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let extended = settings.origin + facing(settings.angle) * settings.extend_distance;
        let cycle = Cycle4 {
            hidden: settings.origin,
            extended,
            hidden_time: settings.wait_time,
            extend_time: settings.extend_time,
            extended_time: settings.stay_time,
            retract_time: settings.retract_time,
            damage_extending: settings.damage_only_while_extending,
            collision_follows_damage: false,
        };
        Self::build(name, cycle, settings.initial_delay, collab)
    }

    /// Spikes rising out of the floor. Solid and hurting only while fully up.
    pub fn spike(name: &str, settings: &SpikeTrapSettings, collab: Collaborators) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let cycle = Cycle4 {
            hidden: settings.origin,
            extended: settings.origin + Vec2::Y * settings.move_amount,
            hidden_time: settings.hide_duration,
            extend_time: settings.show_duration,
            extended_time: settings.stay_duration,
            retract_time: settings.hide_move_duration,
            damage_extending: false,
            collision_follows_damage: true,
        };
        Self::build(name, cycle, settings.initial_delay, collab)
    }

    fn build(name: &str, cycle: Cycle4, start_delay: f32, collab: Collaborators) -> Result<Self, ConfigError> {
        let options = MachineOptions {
            rest: Pose::at(cycle.hidden),
            start_delay,
        };
        let machine = HazardStateMachine::new(name, cycle.table(name)?, options, collab, &[ChannelKind::Visual])?;
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

    pub fn position(&self) -> Vec2 {
        self.machine.output().pose.position
    }

    pub fn is_dangerous(&self) -> bool {
        self.machine.output().damage.enabled
    }
}
