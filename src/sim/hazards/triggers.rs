//! Overlap-driven pads
//!
//! These react to bodies entering and leaving their trigger volume rather
//! than to time.

use glam::Vec2;

use crate::error::ConfigError;
use crate::settings::{SceneExitSettings, SpringPadSettings};
use crate::sim::collab::{BodyTag, KinematicBody};

/// Bounce pad. Applies exactly one impulse per continuous overlap.
#[derive(Debug, Clone)]
pub struct SpringPad {
    origin: Vec2,
    bounce_velocity: f32,
    rest_epsilon: f32,
    /// Set on bounce, cleared on overlap exit
    bounced: bool,
    enabled: bool,
}

impl SpringPad {
    pub fn new(name: &str, settings: &SpringPadSettings) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        Ok(Self {
            origin: settings.origin,
            bounce_velocity: settings.bounce_velocity,
            rest_epsilon: settings.rest_epsilon,
            bounced: false,
            enabled: true,
        })
    }

    /// A body entered (or is still inside) the pad. Overwrites the body's
    /// vertical velocity if it is the player, not already bounced during this
    /// overlap, and not moving upward. Returns whether it bounced.
    pub fn on_overlap(&mut self, tag: BodyTag, body: &mut dyn KinematicBody) -> bool {
        if !self.enabled || tag != BodyTag::Player || self.bounced {
            return false;
        }
        if body.vertical_velocity() > self.rest_epsilon {
            return false;
        }
        body.set_vertical_velocity(self.bounce_velocity);
        self.bounced = true;
        true
    }

    /// The player left the pad; the next overlap may bounce again
    pub fn on_overlap_exit(&mut self, tag: BodyTag) {
        if tag == BodyTag::Player {
            self.bounced = false;
        }
    }

    pub fn force_off(&mut self) {
        self.enabled = false;
        self.bounced = false;
    }

    pub fn reset(&mut self) {
        self.enabled = true;
        self.bounced = false;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn bounce_velocity(&self) -> f32 {
        self.bounce_velocity
    }

    pub fn has_bounced(&self) -> bool {
        self.bounced
    }
}

/// Trigger volume that asks for another scene
#[derive(Debug, Clone)]
pub struct SceneExit {
    next_scene: String,
    enabled: bool,
}

impl SceneExit {
    pub fn new(name: &str, settings: &SceneExitSettings) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        Ok(Self {
            next_scene: settings.next_scene.clone(),
            enabled: true,
        })
    }

    /// Scene to load if the player entered
    pub fn on_overlap(&self, tag: BodyTag) -> Option<&str> {
        (self.enabled && tag == BodyTag::Player).then_some(self.next_scene.as_str())
    }

    pub fn force_off(&mut self) {
        self.enabled = false;
    }

    pub fn reset(&mut self) {
        self.enabled = true;
    }

    pub fn next_scene(&self) -> &str {
        &self.next_scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::recorder::Body;

    fn pad() -> SpringPad {
        SpringPad::new("pad", &SpringPadSettings::default()).unwrap()
    }

    #[test]
    fn test_single_impulse_per_overlap() {
        let mut pad = pad();
        let mut body = Body { vy: -5.0 };
        assert!(pad.on_overlap(BodyTag::Player, &mut body));
        assert_eq!(body.vy, 25.0);

        // Still inside on later ticks, falling again: no second impulse
        for _ in 0..120 {
            body.vy = -1.0;
            assert!(!pad.on_overlap(BodyTag::Player, &mut body));
        }
        assert_eq!(body.vy, -1.0);

        pad.on_overlap_exit(BodyTag::Player);
        assert!(pad.on_overlap(BodyTag::Player, &mut body));
    }

    #[test]
    fn test_rising_body_passes_through() {
        let mut pad = pad();
        let mut body = Body { vy: 3.0 };
        assert!(!pad.on_overlap(BodyTag::Player, &mut body));
        assert_eq!(body.vy, 3.0);

        // Resting at the threshold still bounces
        body.vy = 0.1;
        assert!(pad.on_overlap(BodyTag::Player, &mut body));
    }

    #[test]
    fn test_other_bodies_ignored() {
        let mut pad = pad();
        let mut body = Body { vy: -5.0 };
        assert!(!pad.on_overlap(BodyTag::Other, &mut body));
        assert!(pad.on_overlap(BodyTag::Player, &mut body));
        // Another body leaving does not re-arm the pad
        pad.on_overlap_exit(BodyTag::Other);
        body.vy = -5.0;
        assert!(!pad.on_overlap(BodyTag::Player, &mut body));
    }

    #[test]
    fn test_disabled_pad() {
        let mut pad = pad();
        pad.force_off();
        let mut body = Body { vy: -5.0 };
        assert!(!pad.on_overlap(BodyTag::Player, &mut body));
        pad.reset();
        assert!(pad.on_overlap(BodyTag::Player, &mut body));
    }

    #[test]
    fn test_scene_exit() {
        let settings = SceneExitSettings {
            next_scene: "stage_2".into(),
        };
        let mut exit = SceneExit::new("exit", &settings).unwrap();
        assert_eq!(exit.on_overlap(BodyTag::Other), None);
        assert_eq!(exit.on_overlap(BodyTag::Player), Some("stage_2"));
        exit.force_off();
        assert_eq!(exit.on_overlap(BodyTag::Player), None);
    }
}
