//! Deterministic hazard simulation
//!
//! All hazard logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, time arrives as an explicit `dt`
//! - Seeded RNG only
//! - Stable iteration order (by hazard id)
//! - No rendering or engine dependencies; effects go through `collab` traits

pub mod channel;
pub mod collab;
pub mod hazards;
pub mod level;
pub mod machine;
pub mod motion;
pub mod phase;
pub mod timer;

pub use channel::{ChannelKind, ChannelOutput, ChannelPolicy, ChannelSet, FadeCurve, SideEffectChannel};
pub use collab::{
    Animator, BodyTag, CollisionVolume, Collaborators, DamageEmitter, KinematicBody, LayerMask, LogSink,
    ObstacleQuery, OpenSpace, RenderTarget,
};
pub use hazards::{
    AnimatedWallTrap, Bullet, CrumblingPlatform, DisappearingPlatform, Hazard, JumpCounter, LaserTrap, MovingThorn,
    SceneExit, SequencePlatform, Shooter, SpringPad, WallTrap,
};
pub use level::{HazardSlot, Level, LevelEvent, OverlapEvent, OverlapKind, TickInput, tick};
pub use machine::{HazardOutput, HazardStateMachine, MachineOptions};
pub use motion::{Easing, Keyframes, Motion, Pose};
pub use phase::{Phase, PhaseHook, PhaseTable, Wrap};
pub use timer::PhaseTimer;
