//! Laser trap
//!
//! Four-phase beam: off, fading in (warning color to beam color), on,
//! fading out. Every tick the beam is raycast against scenery before the
//! machine runs, so the drawn line and the collision/damage volumes always
//! share the same length in the same tick.

use std::rc::Rc;

use glam::Vec2;

use crate::error::ConfigError;
use crate::facing;
use crate::settings::LaserSettings;
use crate::sim::channel::{ChannelKind, ChannelPolicy, FadeCurve};
use crate::sim::collab::{Collaborators, LayerMask, ObstacleQuery};
use crate::sim::machine::{HazardStateMachine, MachineOptions};
use crate::sim::motion::{Keyframes, Motion, Pose};
use crate::sim::phase::{Phase, PhaseTable};

/// Beam length after scenery: never longer than configured, never negative
#[inline]
pub fn effective_length(configured: f32, hit_distance: Option<f32>) -> f32 {
    match hit_distance {
        Some(distance) => distance.clamp(0.0, configured),
        None => configured,
    }
}

pub struct LaserTrap {
    machine: HazardStateMachine,
    obstacles: Rc<dyn ObstacleQuery>,
    origin: Vec2,
    direction: Vec2,
    length: f32,
    width: f32,
    obstacle_mask: LayerMask,
    /// Length used this tick
    beam_length: f32,
    /// Length last pushed to the collaborators
    shown_length: Option<f32>,
}

impl LaserTrap {
    pub fn new(
        name: &str,
        settings: &LaserSettings,
        collab: Collaborators,
        obstacles: Rc<dyn ObstacleQuery>,
    ) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        let table = phase_table(name, settings)?;
        let options = MachineOptions {
            rest: Pose::at(settings.origin).with_color(settings.color),
            start_delay: settings.initial_delay,
        };
        let mut machine = HazardStateMachine::new(name, table, options, collab, &[ChannelKind::Visual])?;
        machine.channels_mut().set_hittable_layers(settings.damage_mask);

        let mut laser = Self {
            machine,
            obstacles,
            origin: settings.origin,
            direction: facing(settings.angle),
            length: settings.length,
            width: settings.width,
            obstacle_mask: settings.obstacle_mask,
            beam_length: settings.length,
            shown_length: None,
        };
        laser.update_beam();
        Ok(laser)
    }

    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.machine.is_halted() {
            return 0;
        }
        self.update_beam();
        self.machine.advance(dt)
    }

    pub fn force_off(&mut self) {
        self.machine.force_off();
    }

    pub fn reset(&mut self) {
        self.machine.reset();
        self.update_beam();
    }

    pub fn machine(&self) -> &HazardStateMachine {
        &self.machine
    }

    /// Current beam length after obstacles
    pub fn beam_length(&self) -> f32 {
        self.beam_length
    }

    /// Offset and size of the collision/damage volume in beam space
    /// (x along the beam)
    pub fn hit_volume(&self) -> (Vec2, Vec2) {
        beam_volume(self.beam_length, self.width)
    }

    /// Collision and damage both engaged
    pub fn is_lethal(&self) -> bool {
        let out = self.machine.output();
        out.collision.enabled && out.damage.enabled
    }

    fn update_beam(&mut self) {
        let hit = self
            .obstacles
            .raycast(self.origin, self.direction, self.length, self.obstacle_mask);
        let length = effective_length(self.length, hit);
        self.beam_length = length;
        if self.shown_length == Some(length) {
            return;
        }
        self.shown_length = Some(length);

        let (offset, size) = beam_volume(length, self.width);
        let channels = self.machine.channels_mut();
        channels.set_endpoints(Vec2::ZERO, Vec2::X * length);
        channels.set_extent(offset, size);
    }
}

fn beam_volume(length: f32, width: f32) -> (Vec2, Vec2) {
    (Vec2::new(length / 2.0, 0.0), Vec2::new(length, width))
}

fn phase_table(name: &str, s: &LaserSettings) -> Result<PhaseTable, ConfigError> {
    let engage = s.engage_threshold;
    let fade = |curve| ChannelPolicy::Fade {
        curve,
        threshold: engage,
    };
    // Visuals are drawn for the whole fade, collision/damage past the threshold
    let draw = |curve| ChannelPolicy::Fade { curve, threshold: 0.0 };
    let damage = |policy: ChannelPolicy| {
        if s.damage == 0 {
            ChannelPolicy::Off
        } else if s.damage_only_when_on {
            policy
        } else {
            ChannelPolicy::On
        }
    };

    PhaseTable::cycle(
        name,
        vec![
            Phase::new("off", s.off_time).damage(damage(ChannelPolicy::Off)),
            Phase::new("fading_in", s.fade_in_time)
                .visual(draw(FadeCurve::Rising))
                .collision(fade(FadeCurve::Rising))
                .damage(damage(fade(FadeCurve::Rising)))
                .motion(Motion::linear(Keyframes::Color(s.warning_color, s.color))),
            Phase::new("on", s.on_time)
                .visual(ChannelPolicy::On)
                .collision(ChannelPolicy::On)
                .damage(damage(ChannelPolicy::On)),
            Phase::new("fading_out", s.fade_out_time)
                .visual(draw(FadeCurve::Falling))
                .collision(fade(FadeCurve::Falling))
                .damage(damage(fade(FadeCurve::Falling))),
        ],
    )
}
