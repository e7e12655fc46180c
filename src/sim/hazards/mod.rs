//! Concrete hazards
//!
//! Every hazard a level can place, built from its [`HazardSettings`] entry.
//! [`Hazard`] is a closed enum so the level driver dispatches with a plain
//! `match` instead of trait objects.

pub mod animated_wall;
pub mod crumbling;
pub mod laser;
pub mod platform;
pub mod shooter;
pub mod thorn;
pub mod triggers;
pub mod wall;

use std::rc::Rc;

pub use animated_wall::AnimatedWallTrap;
pub use crumbling::CrumblingPlatform;
pub use laser::{LaserTrap, effective_length};
pub use platform::{DisappearingPlatform, JumpCounter, SequencePlatform};
pub use shooter::{Bullet, Shooter};
pub use thorn::MovingThorn;
pub use triggers::{SceneExit, SpringPad};
pub use wall::WallTrap;

use super::collab::{Collaborators, ObstacleQuery};
use super::machine::{HazardOutput, HazardStateMachine};
use crate::error::ConfigError;
use crate::settings::HazardSettings;

pub enum Hazard {
    Laser(LaserTrap),
    Wall(WallTrap),
    Thorn(MovingThorn),
    Disappearing(DisappearingPlatform),
    Sequence(SequencePlatform),
    Crumbling(CrumblingPlatform),
    AnimatedWall(AnimatedWallTrap),
    SpringPad(SpringPad),
    Shooter(Shooter),
    SceneExit(SceneExit),
}

impl Hazard {
    /// Build the hazard a settings entry describes
    pub fn build(
        name: &str,
        settings: &HazardSettings,
        collab: Collaborators,
        obstacles: &Rc<dyn ObstacleQuery>,
        jumps: &JumpCounter,
    ) -> Result<Self, ConfigError> {
        let hazard = match settings {
            HazardSettings::Laser(s) => Hazard::Laser(LaserTrap::new(name, s, collab, Rc::clone(obstacles))?),
            HazardSettings::WallTrap(s) => Hazard::Wall(WallTrap::wall(name, s, collab)?),
            HazardSettings::SpikeTrap(s) => Hazard::Wall(WallTrap::spike(name, s, collab)?),
            HazardSettings::MovingThorn(s) => Hazard::Thorn(MovingThorn::new(name, s, collab)?),
            HazardSettings::Disappearing(s) => Hazard::Disappearing(DisappearingPlatform::new(name, s, collab)?),
            HazardSettings::Sequence(s) => {
                Hazard::Sequence(SequencePlatform::new(name, s, collab, jumps.clone())?)
            }
            HazardSettings::Crumbling(s) => Hazard::Crumbling(CrumblingPlatform::new(name, s, collab)?),
            HazardSettings::AnimatedWall(s) => Hazard::AnimatedWall(AnimatedWallTrap::new(name, s, collab)?),
            HazardSettings::SpringPad(s) => Hazard::SpringPad(SpringPad::new(name, s)?),
            HazardSettings::Shooter(s) => Hazard::Shooter(Shooter::new(name, s)?),
            HazardSettings::SceneExit(s) => Hazard::SceneExit(SceneExit::new(name, s)?),
        };
        Ok(hazard)
    }

    pub fn advance(&mut self, dt: f32) {
        match self {
            Hazard::Laser(h) => {
                h.advance(dt);
            }
            Hazard::Wall(h) => {
                h.advance(dt);
            }
            Hazard::Thorn(h) => {
                h.advance(dt);
            }
            Hazard::Disappearing(h) => {
                h.advance(dt);
            }
            Hazard::Sequence(h) => h.advance(dt),
            Hazard::Crumbling(h) => {
                h.advance(dt);
            }
            Hazard::AnimatedWall(h) => h.advance(dt),
            Hazard::Shooter(h) => {
                h.advance(dt);
            }
            Hazard::SpringPad(_) | Hazard::SceneExit(_) => {}
        }
    }

    /// Every output off, no further advancing until reset
    pub fn force_off(&mut self) {
        match self {
            Hazard::Laser(h) => h.force_off(),
            Hazard::Wall(h) => h.force_off(),
            Hazard::Thorn(h) => h.force_off(),
            Hazard::Disappearing(h) => h.force_off(),
            Hazard::Sequence(h) => h.force_off(),
            Hazard::Crumbling(h) => h.force_off(),
            Hazard::AnimatedWall(h) => h.force_off(),
            Hazard::SpringPad(h) => h.force_off(),
            Hazard::Shooter(h) => h.force_off(),
            Hazard::SceneExit(h) => h.force_off(),
        }
    }

    /// Back to the configured initial state
    pub fn reset(&mut self) {
        match self {
            Hazard::Laser(h) => h.reset(),
            Hazard::Wall(h) => h.reset(),
            Hazard::Thorn(h) => h.reset(),
            Hazard::Disappearing(h) => h.reset(),
            Hazard::Sequence(h) => h.reset(),
            Hazard::Crumbling(h) => h.reset(),
            Hazard::AnimatedWall(h) => h.reset(),
            Hazard::SpringPad(h) => h.reset(),
            Hazard::Shooter(h) => h.reset(),
            Hazard::SceneExit(h) => h.reset(),
        }
    }

    /// The phase machine behind a timed hazard
    pub fn machine(&self) -> Option<&HazardStateMachine> {
        match self {
            Hazard::Laser(h) => Some(h.machine()),
            Hazard::Wall(h) => Some(h.machine()),
            Hazard::Thorn(h) => Some(h.machine()),
            Hazard::Disappearing(h) => Some(h.machine()),
            Hazard::Crumbling(h) => Some(h.machine()),
            Hazard::AnimatedWall(h) => Some(h.window()),
            Hazard::Sequence(_) | Hazard::SpringPad(_) | Hazard::Shooter(_) | Hazard::SceneExit(_) => None,
        }
    }

    pub fn output(&self) -> Option<HazardOutput> {
        self.machine().map(HazardStateMachine::output)
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Hazard::Laser(_) => "laser",
            Hazard::Wall(_) => "wall",
            Hazard::Thorn(_) => "thorn",
            Hazard::Disappearing(_) => "disappearing",
            Hazard::Sequence(_) => "sequence",
            Hazard::Crumbling(_) => "crumbling",
            Hazard::AnimatedWall(_) => "animated_wall",
            Hazard::SpringPad(_) => "spring_pad",
            Hazard::Shooter(_) => "shooter",
            Hazard::SceneExit(_) => "scene_exit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LevelSettings;
    use crate::sim::collab::OpenSpace;
    use crate::sim::collab::recorder::Recorder;

    #[test]
    fn test_build_every_demo_hazard() {
        let obstacles: Rc<dyn ObstacleQuery> = Rc::new(OpenSpace);
        let jumps = JumpCounter::new();
        for (i, settings) in LevelSettings::demo().hazards.iter().enumerate() {
            let name = crate::settings::hazard_name(settings, i);
            let mut hazard = Hazard::build(&name, settings, Recorder::new().collaborators(), &obstacles, &jumps).unwrap();
            hazard.advance(0.5);
            hazard.force_off();
            if let Some(out) = hazard.output() {
                assert!(!out.damage.enabled, "{name} still damaging after force_off");
                assert!(!out.collision.enabled);
            }
            hazard.reset();
        }
    }
}
