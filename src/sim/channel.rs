//! Side-effect channels
//!
//! Each hazard exposes three independently gated outputs: what is drawn
//! (Visual), what blocks (Collision) and what hurts (Damage). A channel is a
//! debounced sink: it stores the latest level every tick but only calls its
//! collaborator when the on/off state actually flips.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collab::{Collaborators, LayerMask};
use super::motion::Pose;
use crate::consts::DEFAULT_ENGAGE_THRESHOLD;
use crate::error::ConfigError;

/// One of the three side-effect channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Visual,
    Collision,
    Damage,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Visual, ChannelKind::Collision, ChannelKind::Damage];

    #[inline]
    fn index(self) -> usize {
        match self {
            ChannelKind::Visual => 0,
            ChannelKind::Collision => 1,
            ChannelKind::Damage => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Visual => "visual",
            ChannelKind::Collision => "collision",
            ChannelKind::Damage => "damage",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level of one channel for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutput {
    pub enabled: bool,
    /// In [0, 1]
    pub intensity: f32,
}

impl ChannelOutput {
    pub const OFF: ChannelOutput = ChannelOutput {
        enabled: false,
        intensity: 0.0,
    };
    pub const ON: ChannelOutput = ChannelOutput {
        enabled: true,
        intensity: 1.0,
    };
}

/// Direction of a fading phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeCurve {
    /// intensity = progress
    Rising,
    /// intensity = 1 - progress
    Falling,
}

/// How a phase drives one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelPolicy {
    Off,
    On,
    /// Intensity follows progress; the channel counts as enabled only while
    /// intensity is above `threshold`. Beams use 0.5 for collision and
    /// damage so they engage once the fade is visually past its midpoint,
    /// and 0 for visuals so the fade itself is drawn.
    Fade { curve: FadeCurve, threshold: f32 },
}

impl ChannelPolicy {
    pub fn rising() -> Self {
        ChannelPolicy::Fade {
            curve: FadeCurve::Rising,
            threshold: DEFAULT_ENGAGE_THRESHOLD,
        }
    }

    pub fn falling() -> Self {
        ChannelPolicy::Fade {
            curve: FadeCurve::Falling,
            threshold: DEFAULT_ENGAGE_THRESHOLD,
        }
    }

    pub fn on_if(on: bool) -> Self {
        if on { ChannelPolicy::On } else { ChannelPolicy::Off }
    }

    /// Replace the engage threshold of a fade; other policies are unchanged
    pub fn with_threshold(self, threshold: f32) -> Self {
        match self {
            ChannelPolicy::Fade { curve, .. } => ChannelPolicy::Fade { curve, threshold },
            other => other,
        }
    }

    /// Channel level at `progress`. Pure: same inputs, same output.
    pub fn evaluate(&self, progress: f32) -> ChannelOutput {
        match *self {
            ChannelPolicy::Off => ChannelOutput::OFF,
            ChannelPolicy::On => ChannelOutput::ON,
            ChannelPolicy::Fade { curve, threshold } => {
                let p = progress.clamp(0.0, 1.0);
                let intensity = match curve {
                    FadeCurve::Rising => p,
                    FadeCurve::Falling => 1.0 - p,
                };
                ChannelOutput {
                    enabled: intensity > threshold,
                    intensity,
                }
            }
        }
    }
}

/// Debounced gate for one channel
#[derive(Debug, Clone)]
pub struct SideEffectChannel {
    kind: ChannelKind,
    output: ChannelOutput,
    /// False until the first `set`; the first value is always dispatched
    primed: bool,
    /// No collaborator: the channel is pinned off
    available: bool,
    dispatches: u32,
}

impl SideEffectChannel {
    pub fn new(kind: ChannelKind, available: bool) -> Self {
        Self {
            kind,
            output: ChannelOutput::OFF,
            primed: false,
            available,
            dispatches: 0,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn output(&self) -> ChannelOutput {
        self.output
    }

    pub fn is_enabled(&self) -> bool {
        self.output.enabled
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Number of times the collaborator was (or would have been) invoked
    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    /// Store a new level. Returns true when the enabled state flipped and
    /// the collaborator must be told.
    pub fn set(&mut self, output: ChannelOutput) -> bool {
        let output = if self.available {
            output
        } else {
            ChannelOutput::OFF
        };
        let edge = !self.primed || output.enabled != self.output.enabled;
        self.output = output;
        self.primed = true;
        if edge {
            self.dispatches += 1;
        }
        edge
    }
}

/// The three channels of a hazard plus the collaborators they feed
pub struct ChannelSet {
    name: String,
    channels: [SideEffectChannel; 3],
    collab: Collaborators,
    shown: Option<Pose>,
}

impl ChannelSet {
    /// Bind collaborators. A missing `required` collaborator is a
    /// configuration error; any other missing one pins its channel off.
    pub fn new(
        name: &str,
        collab: Collaborators,
        required: &[ChannelKind],
    ) -> Result<Self, ConfigError> {
        let present = |kind: ChannelKind| match kind {
            ChannelKind::Visual => collab.render.is_some(),
            ChannelKind::Collision => collab.collision.is_some(),
            ChannelKind::Damage => collab.damage.is_some(),
        };

        for &kind in required {
            if !present(kind) {
                return Err(ConfigError::MissingCollaborator {
                    hazard: name.to_string(),
                    channel: kind,
                });
            }
        }

        let channels = ChannelKind::ALL.map(|kind| {
            let available = present(kind);
            SideEffectChannel::new(kind, available)
        });

        Ok(Self {
            name: name.to_string(),
            channels,
            collab,
            shown: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self, kind: ChannelKind) -> &SideEffectChannel {
        &self.channels[kind.index()]
    }

    pub fn output(&self, kind: ChannelKind) -> ChannelOutput {
        self.channels[kind.index()].output()
    }

    /// Warn once about every channel left without a collaborator
    pub fn warn_missing(&self, used: &[ChannelKind]) {
        for &kind in used {
            if !self.channel(kind).is_available() {
                log::warn!("{}: no {} collaborator, channel stays disabled", self.name, kind);
            }
        }
    }

    /// Set a channel and call its collaborator on an edge
    pub fn apply(&mut self, kind: ChannelKind, output: ChannelOutput) {
        if !self.channels[kind.index()].set(output) {
            return;
        }
        let enabled = self.channels[kind.index()].is_enabled();
        log::debug!("{}: {} -> {}", self.name, kind, if enabled { "on" } else { "off" });
        match kind {
            ChannelKind::Visual => {
                if let Some(render) = self.collab.render.as_mut() {
                    render.set_visible(enabled);
                }
            }
            ChannelKind::Collision => {
                if let Some(collision) = self.collab.collision.as_mut() {
                    collision.set_volume_enabled(enabled);
                }
            }
            ChannelKind::Damage => {
                if let Some(damage) = self.collab.damage.as_mut() {
                    if enabled {
                        damage.enable_damage();
                    } else {
                        damage.disable_damage();
                    }
                }
            }
        }
    }

    /// Push the transform and tint, only the parts that changed
    pub fn present(&mut self, pose: Pose) {
        let Some(render) = self.collab.render.as_mut() else {
            return;
        };
        let last = self.shown;
        if last.map(|p| p.position) != Some(pose.position) {
            render.set_position(pose.position);
        }
        if last.map(|p| p.scale) != Some(pose.scale) {
            render.set_scale(pose.scale);
        }
        if last.map(|p| p.color) != Some(pose.color) {
            render.set_color(pose.color);
        }
        self.shown = Some(pose);
    }

    /// Resize the collision and damage volumes (hazard-local frame)
    pub fn set_extent(&mut self, offset: Vec2, size: Vec2) {
        if let Some(collision) = self.collab.collision.as_mut() {
            collision.set_volume_extent(offset, size);
        }
        if let Some(damage) = self.collab.damage.as_mut() {
            damage.set_damage_extent(offset, size);
        }
    }

    /// Restrict which layers the damage collaborator hurts
    pub fn set_hittable_layers(&mut self, mask: LayerMask) {
        if let Some(damage) = self.collab.damage.as_mut() {
            damage.set_hittable_layers(mask);
        }
    }

    pub fn set_endpoints(&mut self, p0: Vec2, p1: Vec2) {
        if let Some(render) = self.collab.render.as_mut() {
            render.set_endpoints(p0, p1);
        }
    }

    pub fn fire_trigger(&mut self, trigger: &str) {
        match self.collab.animator.as_mut() {
            Some(animator) => {
                log::debug!("{}: trigger '{}'", self.name, trigger);
                animator.fire_trigger(trigger);
            }
            None => log::trace!("{}: no animator for trigger '{}'", self.name, trigger),
        }
    }

    /// All channels off; only channels that change are dispatched
    pub fn force_off(&mut self) {
        for kind in ChannelKind::ALL {
            self.apply(kind, ChannelOutput::OFF);
        }
    }
}
