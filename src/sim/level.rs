//! Level driver
//!
//! Owns every hazard of a level plus the shared jump counter, and advances
//! them all from one fixed-timestep `tick`. Overlap events reported by the
//! host's physics are routed to the hazard they name before time advances,
//! so a reaction and the timers it affects land in the same tick.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::collab::{BodyTag, Collaborators, KinematicBody, ObstacleQuery};
use super::hazards::{Hazard, JumpCounter};
use super::machine::HazardOutput;
use crate::error::ConfigError;
use crate::settings::{HazardSettings, LevelSettings, hazard_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapKind {
    Enter,
    /// Still overlapping on a later tick
    Stay,
    Exit,
}

/// A body touching a hazard's trigger volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapEvent {
    pub hazard: u32,
    pub tag: BodyTag,
    pub kind: OverlapKind,
    /// Pool slot, for bullets
    pub bullet: Option<usize>,
}

impl OverlapEvent {
    pub fn player(hazard: u32, kind: OverlapKind) -> Self {
        Self {
            hazard,
            tag: BodyTag::Player,
            kind,
            bullet: None,
        }
    }
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// The player jumped this tick
    pub jump: bool,
    pub overlaps: Vec<OverlapEvent>,
    /// Hazards whose damage emitter landed a hit this tick
    pub damage_dealt: Vec<u32>,
}

/// Something the host should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelEvent {
    Bounced { hazard: u32, velocity: f32 },
    CrumbleStarted { hazard: u32 },
    BulletHit { hazard: u32, slot: usize },
    LoadScene(String),
}

pub struct HazardSlot {
    pub id: u32,
    pub name: String,
    pub hazard: Hazard,
    pub active: bool,
}

pub struct Level {
    pub name: String,
    /// Sorted by id for deterministic iteration
    slots: Vec<HazardSlot>,
    jumps: JumpCounter,
    obstacles: Rc<dyn ObstacleQuery>,
    time_ticks: u64,
    events: Vec<LevelEvent>,
    next_id: u32,
}

impl Level {
    pub fn new(name: impl Into<String>, obstacles: Rc<dyn ObstacleQuery>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            jumps: JumpCounter::new(),
            obstacles,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Build every hazard of a level file. `collaborators` supplies the
    /// bindings for each hazard by name.
    pub fn from_settings(
        settings: &LevelSettings,
        obstacles: Rc<dyn ObstacleQuery>,
        mut collaborators: impl FnMut(&str, &HazardSettings) -> Collaborators,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut level = Self::new(settings.name.clone(), obstacles);
        for (i, entry) in settings.hazards.iter().enumerate() {
            let name = hazard_name(entry, i);
            let collab = collaborators(&name, entry);
            let hazard = Hazard::build(&name, entry, collab, &level.obstacles, &level.jumps)?;
            level.add(name, hazard);
        }
        log::info!("Level '{}' ready with {} hazards", level.name, level.slots.len());
        Ok(level)
    }

    /// Add a hazard; returns its id
    pub fn add(&mut self, name: impl Into<String>, hazard: Hazard) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push(HazardSlot {
            id,
            name: name.into(),
            hazard,
            active: true,
        });
        id
    }

    pub fn jumps(&self) -> &JumpCounter {
        &self.jumps
    }

    pub fn obstacles(&self) -> &Rc<dyn ObstacleQuery> {
        &self.obstacles
    }

    pub fn slots(&self) -> &[HazardSlot] {
        &self.slots
    }

    pub fn get(&self, id: u32) -> Option<&HazardSlot> {
        self.slots
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.slots[i])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut HazardSlot> {
        match self.slots.binary_search_by_key(&id, |s| s.id) {
            Ok(i) => Some(&mut self.slots[i]),
            Err(_) => None,
        }
    }

    pub fn find(&self, name: &str) -> Option<&HazardSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn output(&self, id: u32) -> Option<HazardOutput> {
        self.get(id).and_then(|s| s.hazard.output())
    }

    /// Deactivating forces every output off at once; reactivating resets
    /// the hazard to its configured start. Returns false for unknown ids.
    pub fn set_active(&mut self, id: u32, active: bool) -> bool {
        let Some(slot) = self.get_mut(id) else {
            return false;
        };
        if slot.active == active {
            return true;
        }
        slot.active = active;
        if active {
            slot.hazard.reset();
        } else {
            slot.hazard.force_off();
        }
        log::debug!("{}: {}", slot.name, if active { "activated" } else { "deactivated" });
        true
    }

    /// Start the level over: jump count zeroed, every hazard reset and active
    pub fn restart(&mut self) {
        self.jumps.reset();
        for slot in &mut self.slots {
            slot.active = true;
            slot.hazard.reset();
        }
        self.time_ticks = 0;
        self.events.clear();
        log::info!("Level '{}' restarted", self.name);
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Advance the level by one fixed timestep
pub fn tick(level: &mut Level, input: &TickInput, player: &mut dyn KinematicBody, dt: f32) {
    level.time_ticks += 1;

    if input.jump {
        level.jumps.record_jump();
    }

    for overlap in &input.overlaps {
        route_overlap(level, overlap, player);
    }

    for &id in &input.damage_dealt {
        match level.get_mut(id) {
            Some(HazardSlot {
                active: true,
                hazard: Hazard::AnimatedWall(trap),
                ..
            }) => trap.on_damage_dealt(),
            _ => {}
        }
    }

    for slot in level.slots.iter_mut().filter(|s| s.active) {
        slot.hazard.advance(dt);
    }
}

fn route_overlap(level: &mut Level, overlap: &OverlapEvent, player: &mut dyn KinematicBody) {
    let Ok(index) = level.slots.binary_search_by_key(&overlap.hazard, |s| s.id) else {
        log::warn!("overlap with unknown hazard {}", overlap.hazard);
        return;
    };
    let slot = &mut level.slots[index];
    if !slot.active {
        return;
    }
    let id = slot.id;
    let entering = overlap.kind == OverlapKind::Enter;

    match (&mut slot.hazard, overlap.kind) {
        (Hazard::SpringPad(pad), OverlapKind::Exit) => pad.on_overlap_exit(overlap.tag),
        (Hazard::SpringPad(pad), _) => {
            if pad.on_overlap(overlap.tag, player) {
                level.events.push(LevelEvent::Bounced {
                    hazard: id,
                    velocity: pad.bounce_velocity(),
                });
            }
        }
        (Hazard::Crumbling(platform), _) if entering => {
            if platform.on_contact(overlap.tag) {
                level.events.push(LevelEvent::CrumbleStarted { hazard: id });
            }
        }
        (Hazard::SceneExit(exit), _) if entering => {
            if let Some(scene) = exit.on_overlap(overlap.tag) {
                log::info!("{}: loading scene '{}'", slot.name, scene);
                level.events.push(LevelEvent::LoadScene(scene.to_string()));
            }
        }
        (Hazard::Shooter(shooter), _) if entering => {
            let hit = overlap
                .bullet
                .filter(|&bullet| shooter.on_bullet_hit(bullet, overlap.tag));
            if let Some(bullet) = hit {
                level.events.push(LevelEvent::BulletHit { hazard: id, slot: bullet });
            }
        }
        _ => {}
    }
}
