//! Platform Hazards - timed traps and platforms for a 2D platformer
//!
//! Core modules:
//! - `sim`: Hazard state machines, side-effect channels, the level driver
//! - `settings`: Data-driven hazard tuning loaded from JSON
//! - `error`: Configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{HazardSettings, LevelSettings};

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Intensity above which a fading beam's collision and damage engage
    pub const DEFAULT_ENGAGE_THRESHOLD: f32 = 0.5;

    /// Bounce pads fire only for bodies moving up slower than this (units/s)
    pub const BOUNCE_REST_EPSILON: f32 = 0.1;

    /// Crumbling platform shake angular frequency (rad/s)
    pub const SHAKE_FREQUENCY: f32 = 50.0;

    /// Pooled bullets switch themselves off after this long (seconds)
    pub const BULLET_LIFETIME: f32 = 3.0;
}

/// Unit vector for a facing angle (radians, 0 = +x)
#[inline]
pub fn facing(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

