//! Hazard and level settings
//!
//! Every tunable a level designer can set, with defaults matching the
//! shipped hazards. Loaded from JSON level files and validated before any
//! hazard is built.

use std::path::Path;

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::LayerMask;

/// Beam that fades in, stays on, fades out, and is cut short by scenery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserSettings {
    /// Anchor in world space
    pub origin: Vec2,
    /// Facing angle in radians (0 = +x)
    pub angle: f32,

    // === Timing ===
    pub off_time: f32,
    /// 0 = switch on instantly
    pub fade_in_time: f32,
    pub on_time: f32,
    /// 0 = switch off instantly
    pub fade_out_time: f32,
    pub initial_delay: f32,

    // === Beam ===
    pub length: f32,
    pub width: f32,
    pub color: Vec4,
    /// Color at the start of the fade-in
    pub warning_color: Vec4,
    /// Intensity above which collision and damage engage during fades
    pub engage_threshold: f32,

    // === Damage ===
    pub damage: u32,
    /// When false the damage emitter stays armed in every phase
    pub damage_only_when_on: bool,
    pub obstacle_mask: LayerMask,
    pub damage_mask: LayerMask,
}

impl Default for LaserSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            angle: 0.0,
            off_time: 2.0,
            fade_in_time: 0.2,
            on_time: 3.0,
            fade_out_time: 0.2,
            initial_delay: 0.0,
            length: 5.0,
            width: 0.1,
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            warning_color: Vec4::new(1.0, 0.5, 0.0, 0.5),
            engage_threshold: DEFAULT_ENGAGE_THRESHOLD,
            damage: 1,
            damage_only_when_on: true,
            obstacle_mask: LayerMask::ALL,
            damage_mask: LayerMask::ALL,
        }
    }
}

impl LaserSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "off_time", self.off_time)?;
        ConfigError::check_duration(hazard, "fade_in_time", self.fade_in_time)?;
        ConfigError::check_positive(hazard, "on_time", self.on_time)?;
        ConfigError::check_duration(hazard, "fade_out_time", self.fade_out_time)?;
        ConfigError::check_duration(hazard, "initial_delay", self.initial_delay)?;
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(ConfigError::invalid(hazard, "length", "must be positive"));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::invalid(hazard, "width", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.engage_threshold) {
            return Err(ConfigError::invalid(hazard, "engage_threshold", "must be in [0, 1)"));
        }
        Ok(())
    }
}

/// Block that slides out of a wall, holds, and slides back
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallTrapSettings {
    /// Hidden position
    pub origin: Vec2,
    /// Direction the block extends in, radians (0 = +x)
    pub angle: f32,
    pub wait_time: f32,
    pub extend_time: f32,
    pub stay_time: f32,
    pub retract_time: f32,
    pub extend_distance: f32,
    pub initial_delay: f32,
    /// Arm damage as soon as the block starts sliding out, not only once extended
    pub damage_only_while_extending: bool,
}

impl Default for WallTrapSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            angle: 0.0,
            wait_time: 2.0,
            extend_time: 0.3,
            stay_time: 1.5,
            retract_time: 0.3,
            extend_distance: 2.0,
            initial_delay: 0.0,
            damage_only_while_extending: false,
        }
    }
}

impl WallTrapSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "wait_time", self.wait_time)?;
        ConfigError::check_duration(hazard, "extend_time", self.extend_time)?;
        ConfigError::check_positive(hazard, "stay_time", self.stay_time)?;
        ConfigError::check_duration(hazard, "retract_time", self.retract_time)?;
        ConfigError::check_duration(hazard, "initial_delay", self.initial_delay)?;
        if !self.extend_distance.is_finite() {
            return Err(ConfigError::invalid(hazard, "extend_distance", "must be finite"));
        }
        Ok(())
    }
}

/// Floor spikes that pop up, stay, and sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeTrapSettings {
    pub origin: Vec2,
    pub hide_duration: f32,
    pub show_duration: f32,
    pub stay_duration: f32,
    pub hide_move_duration: f32,
    /// Rise height
    pub move_amount: f32,
    pub initial_delay: f32,
}

impl Default for SpikeTrapSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            hide_duration: 1.5,
            show_duration: 0.2,
            stay_duration: 2.0,
            hide_move_duration: 0.2,
            move_amount: 0.4,
            initial_delay: 0.0,
        }
    }
}

impl SpikeTrapSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "hide_duration", self.hide_duration)?;
        ConfigError::check_duration(hazard, "show_duration", self.show_duration)?;
        ConfigError::check_positive(hazard, "stay_duration", self.stay_duration)?;
        ConfigError::check_duration(hazard, "hide_move_duration", self.hide_move_duration)?;
        ConfigError::check_duration(hazard, "initial_delay", self.initial_delay)?;
        if !self.move_amount.is_finite() {
            return Err(ConfigError::invalid(hazard, "move_amount", "must be finite"));
        }
        Ok(())
    }
}

/// Thorn that grows and shrinks on a fixed rhythm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingThornSettings {
    pub origin: Vec2,
    /// Time spent lowered
    pub deactivate_time: f32,
    /// Time spent raised
    pub active_time: f32,
    /// Exponential approach rate toward the target scale (1/s)
    pub scale_speed: f32,
    pub max_scale: Vec2,
    pub min_scale: Vec2,
}

impl Default for MovingThornSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            deactivate_time: 0.5,
            active_time: 2.0,
            scale_speed: 50.0,
            max_scale: Vec2::new(1.154001, 1.598883),
            min_scale: Vec2::new(1.154001, 0.3011661),
        }
    }
}

impl MovingThornSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "deactivate_time", self.deactivate_time)?;
        ConfigError::check_positive(hazard, "active_time", self.active_time)?;
        if !(self.scale_speed.is_finite() && self.scale_speed > 0.0) {
            return Err(ConfigError::invalid(hazard, "scale_speed", "must be positive"));
        }
        Ok(())
    }
}

/// Platform that blinks on and off
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisappearingSettings {
    pub origin: Vec2,
    /// Seconds hidden, then the same seconds shown
    pub interval: f32,
    pub initial_delay: f32,
}

impl Default for DisappearingSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            interval: 2.0,
            initial_delay: 0.0,
        }
    }
}

impl DisappearingSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "interval", self.interval)?;
        ConfigError::check_duration(hazard, "initial_delay", self.initial_delay)
    }
}

/// Platform solid only on odd (or even) jump counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub origin: Vec2,
    pub is_odd: bool,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            is_odd: true,
        }
    }
}

/// Platform that shakes when stepped on, vanishes, then comes back
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrumblingSettings {
    pub origin: Vec2,
    pub shake_duration: f32,
    pub respawn_delay: f32,
    /// Horizontal shake amplitude
    pub shake_amount: f32,
    /// Shake angular frequency (rad/s)
    pub shake_frequency: f32,
    /// Seed for the shake phase jitter
    pub seed: u64,
}

impl Default for CrumblingSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            shake_duration: 1.0,
            respawn_delay: 3.0,
            shake_amount: 0.1,
            shake_frequency: SHAKE_FREQUENCY,
            seed: 0,
        }
    }
}

impl CrumblingSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_duration(hazard, "shake_duration", self.shake_duration)?;
        ConfigError::check_duration(hazard, "respawn_delay", self.respawn_delay)?;
        if !(self.shake_amount.is_finite() && self.shake_frequency.is_finite()) {
            return Err(ConfigError::invalid(hazard, "shake", "amount and frequency must be finite"));
        }
        Ok(())
    }
}

/// Door trap driven by an external animation on a repeat interval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatedWallSettings {
    pub repeat_interval: f32,
    pub animation_trigger: String,
    /// Delay from the trigger to the damage window opening
    pub damage_start_delay: f32,
    pub damage_duration: f32,
    /// Damage always armed; the animation still fires
    pub always_damage: bool,
    /// A landed hit closes the open window
    pub disable_after_first_hit: bool,
}

impl Default for AnimatedWallSettings {
    fn default() -> Self {
        Self {
            repeat_interval: 2.0,
            animation_trigger: "SwitchFlipped".to_string(),
            damage_start_delay: 0.1,
            damage_duration: 0.5,
            always_damage: false,
            disable_after_first_hit: true,
        }
    }
}

impl AnimatedWallSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        ConfigError::check_positive(hazard, "repeat_interval", self.repeat_interval)?;
        ConfigError::check_duration(hazard, "damage_start_delay", self.damage_start_delay)?;
        ConfigError::check_duration(hazard, "damage_duration", self.damage_duration)?;
        if self.animation_trigger.is_empty() {
            return Err(ConfigError::invalid(hazard, "animation_trigger", "must not be empty"));
        }
        Ok(())
    }
}

/// Bounce pad
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringPadSettings {
    pub origin: Vec2,
    pub bounce_velocity: f32,
    /// Highest upward speed that still counts as landing
    pub rest_epsilon: f32,
}

impl Default for SpringPadSettings {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            bounce_velocity: 25.0,
            rest_epsilon: BOUNCE_REST_EPSILON,
        }
    }
}

impl SpringPadSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        if !(self.bounce_velocity.is_finite() && self.bounce_velocity > 0.0) {
            return Err(ConfigError::invalid(hazard, "bounce_velocity", "must be positive"));
        }
        if !(self.rest_epsilon.is_finite() && self.rest_epsilon >= 0.0) {
            return Err(ConfigError::invalid(hazard, "rest_epsilon", "must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Turret firing from a fixed bullet pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterSettings {
    pub fire_point: Vec2,
    pub angle: f32,
    pub bullet_count: usize,
    pub bullet_speed: f32,
    pub shoot_delay: f32,
    pub bullet_lifetime: f32,
}

impl Default for ShooterSettings {
    fn default() -> Self {
        Self {
            fire_point: Vec2::ZERO,
            angle: 0.0,
            bullet_count: 10,
            bullet_speed: 20.0,
            shoot_delay: 3.0,
            bullet_lifetime: BULLET_LIFETIME,
        }
    }
}

impl ShooterSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        if self.bullet_count == 0 {
            return Err(ConfigError::invalid(hazard, "bullet_count", "pool must hold at least one bullet"));
        }
        ConfigError::check_positive(hazard, "shoot_delay", self.shoot_delay)?;
        ConfigError::check_positive(hazard, "bullet_lifetime", self.bullet_lifetime)?;
        if !self.bullet_speed.is_finite() {
            return Err(ConfigError::invalid(hazard, "bullet_speed", "must be finite"));
        }
        Ok(())
    }
}

/// Trigger volume that loads another scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneExitSettings {
    pub next_scene: String,
}

impl SceneExitSettings {
    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        if self.next_scene.is_empty() {
            return Err(ConfigError::invalid(hazard, "next_scene", "must not be empty"));
        }
        Ok(())
    }
}

/// One hazard entry in a level file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HazardSettings {
    Laser(LaserSettings),
    WallTrap(WallTrapSettings),
    SpikeTrap(SpikeTrapSettings),
    MovingThorn(MovingThornSettings),
    Disappearing(DisappearingSettings),
    Sequence(SequenceSettings),
    Crumbling(CrumblingSettings),
    AnimatedWall(AnimatedWallSettings),
    SpringPad(SpringPadSettings),
    Shooter(ShooterSettings),
    SceneExit(SceneExitSettings),
}

impl HazardSettings {
    pub fn kind_str(&self) -> &'static str {
        match self {
            HazardSettings::Laser(_) => "laser",
            HazardSettings::WallTrap(_) => "wall_trap",
            HazardSettings::SpikeTrap(_) => "spike_trap",
            HazardSettings::MovingThorn(_) => "moving_thorn",
            HazardSettings::Disappearing(_) => "disappearing",
            HazardSettings::Sequence(_) => "sequence",
            HazardSettings::Crumbling(_) => "crumbling",
            HazardSettings::AnimatedWall(_) => "animated_wall",
            HazardSettings::SpringPad(_) => "spring_pad",
            HazardSettings::Shooter(_) => "shooter",
            HazardSettings::SceneExit(_) => "scene_exit",
        }
    }

    pub fn validate(&self, hazard: &str) -> Result<(), ConfigError> {
        match self {
            HazardSettings::Laser(s) => s.validate(hazard),
            HazardSettings::WallTrap(s) => s.validate(hazard),
            HazardSettings::SpikeTrap(s) => s.validate(hazard),
            HazardSettings::MovingThorn(s) => s.validate(hazard),
            HazardSettings::Disappearing(s) => s.validate(hazard),
            HazardSettings::Sequence(_) => Ok(()),
            HazardSettings::Crumbling(s) => s.validate(hazard),
            HazardSettings::AnimatedWall(s) => s.validate(hazard),
            HazardSettings::SpringPad(s) => s.validate(hazard),
            HazardSettings::Shooter(s) => s.validate(hazard),
            HazardSettings::SceneExit(s) => s.validate(hazard),
        }
    }
}

/// A level's hazard layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub name: String,
    pub hazards: Vec<HazardSettings>,
}

impl LevelSettings {
    /// Parse and validate a level from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: LevelSettings = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Read, parse and validate a level file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::from_json(&json)?;
        log::info!("Loaded level '{}' ({} hazards)", level.name, level.hazards.len());
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, hazard) in self.hazards.iter().enumerate() {
            hazard.validate(&hazard_name(hazard, i))?;
        }
        Ok(())
    }

    /// One of everything, default tuning
    pub fn demo() -> Self {
        Self {
            name: "demo".to_string(),
            hazards: vec![
                HazardSettings::Laser(LaserSettings {
                    origin: Vec2::new(0.0, 4.0),
                    ..Default::default()
                }),
                HazardSettings::WallTrap(WallTrapSettings {
                    origin: Vec2::new(6.0, 1.0),
                    ..Default::default()
                }),
                HazardSettings::SpikeTrap(SpikeTrapSettings {
                    origin: Vec2::new(10.0, 0.0),
                    initial_delay: 0.5,
                    ..Default::default()
                }),
                HazardSettings::MovingThorn(MovingThornSettings {
                    origin: Vec2::new(12.0, 0.0),
                    ..Default::default()
                }),
                HazardSettings::Disappearing(DisappearingSettings {
                    origin: Vec2::new(14.0, 2.0),
                    ..Default::default()
                }),
                HazardSettings::Sequence(SequenceSettings {
                    origin: Vec2::new(16.0, 2.0),
                    is_odd: true,
                }),
                HazardSettings::Sequence(SequenceSettings {
                    origin: Vec2::new(18.0, 2.0),
                    is_odd: false,
                }),
                HazardSettings::Crumbling(CrumblingSettings {
                    origin: Vec2::new(20.0, 2.0),
                    seed: 7,
                    ..Default::default()
                }),
                HazardSettings::AnimatedWall(AnimatedWallSettings::default()),
                HazardSettings::SpringPad(SpringPadSettings {
                    origin: Vec2::new(24.0, 0.0),
                    ..Default::default()
                }),
                HazardSettings::Shooter(ShooterSettings {
                    fire_point: Vec2::new(30.0, 1.0),
                    angle: std::f32::consts::PI,
                    ..Default::default()
                }),
                HazardSettings::SceneExit(SceneExitSettings {
                    next_scene: "stage_2".to_string(),
                }),
            ],
        }
    }
}

/// Display name of the `index`-th hazard of a level
pub fn hazard_name(hazard: &HazardSettings, index: usize) -> String {
    format!("{}#{}", hazard.kind_str(), index)
}
