//! Interpolated hazard motion
//!
//! A [`Motion`] maps phase progress to a value between two keyframes: the
//! hazard's position, scale or color. Most phases interpolate linearly; the
//! thorn uses an exponential approach and the crumbling platform a bounded
//! sinusoidal shake around a fixed origin.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Transform and tint the renderer shows for a hazard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub scale: Vec2,
    /// RGBA, alpha is further scaled by visual intensity
    pub color: Vec4,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            color: Vec4::ONE,
        }
    }
}

impl Pose {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }
}

/// Which pose property a motion drives, with its start and end keyframes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keyframes {
    Position(Vec2, Vec2),
    Scale(Vec2, Vec2),
    Color(Vec4, Vec4),
}

/// How progress maps onto the keyframes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Straight lerp by progress
    Linear,
    /// `end + (start - end) * e^(-rate * t)`, the closed form of a per-frame
    /// `lerp(current, end, dt * rate)`
    Approach { rate: f32 },
    /// `start + axis * sin((t + phase) * frequency) * amplitude`, `t` seconds
    /// into the phase.
    /// The end keyframe is ignored.
    Shake {
        axis: Vec2,
        amplitude: f32,
        frequency: f32,
        phase: f32,
    },
}

/// Interpolation target for one phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub keys: Keyframes,
    pub easing: Easing,
}

impl Motion {
    pub fn linear(keys: Keyframes) -> Self {
        Self {
            keys,
            easing: Easing::Linear,
        }
    }

    /// Hold a position for the whole phase
    pub fn hold_position(position: Vec2) -> Self {
        Self::linear(Keyframes::Position(position, position))
    }

    /// Write the interpolated value into `pose`.
    ///
    /// `elapsed` is seconds into the phase.
    pub fn apply(&self, pose: &mut Pose, progress: f32, elapsed: f32) {
        let t = self.weight(progress, elapsed);
        match self.keys {
            Keyframes::Position(from, to) => {
                pose.position = match self.easing {
                    Easing::Shake { .. } => from + self.shake_offset(elapsed),
                    _ => from.lerp(to, t),
                };
            }
            Keyframes::Scale(from, to) => {
                pose.scale = match self.easing {
                    Easing::Shake { .. } => from + self.shake_offset(elapsed),
                    _ => from.lerp(to, t),
                };
            }
            Keyframes::Color(from, to) => pose.color = from.lerp(to, t),
        }
    }

    fn weight(&self, progress: f32, elapsed: f32) -> f32 {
        match self.easing {
            Easing::Linear => progress,
            Easing::Approach { rate } => 1.0 - (-rate * elapsed).exp(),
            Easing::Shake { .. } => 0.0,
        }
    }

    fn shake_offset(&self, elapsed: f32) -> Vec2 {
        match self.easing {
            Easing::Shake {
                axis,
                amplitude,
                frequency,
                phase,
            } => axis * (((elapsed + phase) * frequency).sin() * amplitude),
            _ => Vec2::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_position_midpoint() {
        let motion = Motion::linear(Keyframes::Position(Vec2::ZERO, Vec2::new(2.0, 0.0)));
        let mut pose = Pose::default();
        motion.apply(&mut pose, 0.5, 0.15);
        assert!((pose.position.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_color_lerp() {
        let warning = Vec4::new(1.0, 0.5, 0.0, 0.5);
        let laser = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let motion = Motion::linear(Keyframes::Color(warning, laser));
        let mut pose = Pose::default();
        motion.apply(&mut pose, 1.0, 0.2);
        assert_eq!(pose.color, laser);
        motion.apply(&mut pose, 0.0, 0.0);
        assert_eq!(pose.color, warning);
    }

    #[test]
    fn test_approach_converges() {
        let min = Vec2::new(1.0, 0.3);
        let max = Vec2::new(1.0, 1.6);
        let motion = Motion {
            keys: Keyframes::Scale(min, max),
            easing: Easing::Approach { rate: 50.0 },
        };
        let mut pose = Pose::default();
        motion.apply(&mut pose, 0.0, 0.0);
        assert!((pose.scale.y - 0.3).abs() < 1e-6);
        motion.apply(&mut pose, 0.5, 0.5);
        assert!((pose.scale.y - 1.6).abs() < 1e-4);
        assert_eq!(pose.scale.x, 1.0);
    }

    #[test]
    fn test_shake_is_bounded_and_single_axis() {
        let origin = Vec2::new(3.0, 4.0);
        let motion = Motion {
            keys: Keyframes::Position(origin, origin),
            easing: Easing::Shake {
                axis: Vec2::X,
                amplitude: 0.1,
                frequency: 50.0,
                phase: 0.3,
            },
        };
        let mut pose = Pose::default();
        for i in 0..200 {
            motion.apply(&mut pose, 0.0, i as f32 * 0.013);
            assert!((pose.position.x - origin.x).abs() <= 0.1 + 1e-6);
            assert_eq!(pose.position.y, origin.y);
        }
    }
}
