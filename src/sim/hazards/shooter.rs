//! Turret with a fixed bullet pool
//!
//! Fires on its first tick and then every `shoot_delay` seconds. Bullets
//! come from a fixed pool in round-robin order; firing reuses the oldest
//! slot whether or not that bullet is still flying.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::facing;
use crate::settings::ShooterSettings;
use crate::sim::collab::BodyTag;
use crate::sim::timer::PhaseTimer;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bullet {
    pub active: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds since fired
    pub age: f32,
}

pub struct Shooter {
    name: String,
    bullets: Vec<Bullet>,
    /// Slot the next shot uses
    next: usize,
    timer: PhaseTimer,
    fire_point: Vec2,
    velocity: Vec2,
    lifetime: f32,
    /// First shot taken
    primed: bool,
    halted: bool,
    shots: u64,
}

impl Shooter {
    pub fn new(name: &str, settings: &ShooterSettings) -> Result<Self, ConfigError> {
        settings.validate(name)?;
        Ok(Self {
            name: name.to_string(),
            bullets: vec![Bullet::default(); settings.bullet_count],
            next: 0,
            timer: PhaseTimer::new(settings.shoot_delay, 0.0),
            fire_point: settings.fire_point,
            velocity: facing(settings.angle) * settings.bullet_speed,
            lifetime: settings.bullet_lifetime,
            primed: false,
            halted: false,
            shots: 0,
        })
    }

    /// Move bullets, expire old ones, fire when due. Returns shots fired.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.halted {
            return 0;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            bullet.position += bullet.velocity * dt;
            bullet.age += dt;
            if bullet.age >= self.lifetime {
                bullet.active = false;
            }
        }

        let mut fired = 0;
        if !self.primed {
            self.primed = true;
            self.fire(0.0);
            fired += 1;
        }
        let delay = self.timer.duration();
        self.timer.advance(dt);
        // A full round of the pool overwrites every slot; only the last round matters
        let rounds = self.timer.skip_cycles(delay * self.bullets.len() as f32);
        self.shots += rounds * self.bullets.len() as u64;
        while self.timer.is_complete() {
            self.timer.roll_over(delay);
            // Fired part-way through this tick: already this old
            let age = self.timer.elapsed();
            self.fire(age);
            fired += 1;
        }
        fired
    }

    /// A bullet touched something. Player hits switch the bullet off.
    pub fn on_bullet_hit(&mut self, slot: usize, tag: BodyTag) -> bool {
        if tag != BodyTag::Player {
            return false;
        }
        match self.bullets.get_mut(slot) {
            Some(bullet) if bullet.active => {
                bullet.active = false;
                log::debug!("{}: bullet {} hit player", self.name, slot);
                true
            }
            _ => false,
        }
    }

    pub fn force_off(&mut self) {
        self.halted = true;
        self.clear();
    }

    pub fn reset(&mut self) {
        self.halted = false;
        self.primed = false;
        self.next = 0;
        let delay = self.timer.duration();
        self.timer.reset(delay);
        self.clear();
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn active_count(&self) -> usize {
        self.bullets.iter().filter(|b| b.active).count()
    }

    pub fn shots(&self) -> u64 {
        self.shots
    }

    fn fire(&mut self, age: f32) {
        let slot = self.next;
        self.bullets[slot] = Bullet {
            active: true,
            position: self.fire_point + self.velocity * age,
            velocity: self.velocity,
            age,
        };
        self.next = (slot + 1) % self.bullets.len();
        self.shots += 1;
        log::trace!("{}: fired slot {}", self.name, slot);
    }

    fn clear(&mut self) {
        for bullet in &mut self.bullets {
            bullet.active = false;
        }
    }
}
