//! External collaborators
//!
//! Hazards never search their environment. Everything they drive (collision
//! volumes, damage emitters, renderers, animators) or query (obstacles) is
//! handed to them at construction through these traits.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Bitmask of physics layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub fn contains(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }

    /// Layer numbers set in the mask, lowest first
    pub fn layers(self) -> impl Iterator<Item = u32> {
        (0..32).filter(move |&layer| self.contains(layer))
    }
}

/// Tag of a body reported in overlap events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyTag {
    Player,
    Other,
}

/// Collider the hazard toggles and resizes
pub trait CollisionVolume {
    fn set_volume_enabled(&mut self, enabled: bool);

    /// Offset and size of the volume in the hazard's local frame
    fn set_volume_extent(&mut self, _origin: Vec2, _size: Vec2) {}
}

/// Damage emitter the hazard arms and disarms
pub trait DamageEmitter {
    fn enable_damage(&mut self);
    fn disable_damage(&mut self);
    fn set_damage_extent(&mut self, _offset: Vec2, _size: Vec2) {}
    /// Layers the emitter may hurt
    fn set_hittable_layers(&mut self, _mask: LayerMask) {}
}

/// Renderer plus transform of the hazard's visible object
pub trait RenderTarget {
    fn set_visible(&mut self, visible: bool);
    fn set_color(&mut self, _rgba: Vec4) {}
    /// Line endpoints in the hazard's local frame (beams)
    fn set_endpoints(&mut self, _p0: Vec2, _p1: Vec2) {}
    fn set_position(&mut self, _position: Vec2) {}
    fn set_scale(&mut self, _scale: Vec2) {}
}

/// Animation controller, fire-and-forget
pub trait Animator {
    fn fire_trigger(&mut self, name: &str);
}

/// Scene geometry the beam is blocked by
pub trait ObstacleQuery {
    /// Distance to the first obstacle on `mask` along `direction`, if any
    /// within `max_distance`
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask)
    -> Option<f32>;
}

/// A body whose vertical velocity a bounce pad can read and overwrite
pub trait KinematicBody {
    fn vertical_velocity(&self) -> f32;
    fn set_vertical_velocity(&mut self, velocity: f32);
}

/// Scene with nothing to hit
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl ObstacleQuery for OpenSpace {
    fn raycast(&self, _: Vec2, _: Vec2, _: f32, _: LayerMask) -> Option<f32> {
        None
    }
}

/// Optional collaborator references owned by one hazard
#[derive(Default)]
pub struct Collaborators {
    pub collision: Option<Box<dyn CollisionVolume>>,
    pub damage: Option<Box<dyn DamageEmitter>>,
    pub render: Option<Box<dyn RenderTarget>>,
    pub animator: Option<Box<dyn Animator>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collision(mut self, collision: impl CollisionVolume + 'static) -> Self {
        self.collision = Some(Box::new(collision));
        self
    }

    pub fn with_damage(mut self, damage: impl DamageEmitter + 'static) -> Self {
        self.damage = Some(Box::new(damage));
        self
    }

    pub fn with_render(mut self, render: impl RenderTarget + 'static) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn with_animator(mut self, animator: impl Animator + 'static) -> Self {
        self.animator = Some(Box::new(animator));
        self
    }

    /// Split off the animator, leaving the channel collaborators
    pub fn take_animator(&mut self) -> Collaborators {
        Collaborators {
            animator: self.animator.take(),
            ..Default::default()
        }
    }
}

/// Collaborator that only logs what it is told (demo runner)
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// One sink per collaborator slot, all tagged with the hazard name
    pub fn collaborators(name: &str) -> Collaborators {
        Collaborators::new()
            .with_collision(LogSink::new(name))
            .with_damage(LogSink::new(name))
            .with_render(LogSink::new(name))
            .with_animator(LogSink::new(name))
    }
}

impl CollisionVolume for LogSink {
    fn set_volume_enabled(&mut self, enabled: bool) {
        log::debug!("[{}] collider {}", self.name, if enabled { "on" } else { "off" });
    }

    fn set_volume_extent(&mut self, origin: Vec2, size: Vec2) {
        log::trace!("[{}] collider extent {:?} {:?}", self.name, origin, size);
    }
}

impl DamageEmitter for LogSink {
    fn enable_damage(&mut self) {
        log::debug!("[{}] damage armed", self.name);
    }

    fn disable_damage(&mut self) {
        log::debug!("[{}] damage disarmed", self.name);
    }

    fn set_hittable_layers(&mut self, mask: LayerMask) {
        if mask == LayerMask::ALL {
            log::debug!("[{}] damage hits every layer", self.name);
        } else {
            let layers: Vec<u32> = mask.layers().collect();
            log::debug!("[{}] damage hits layers {:?}", self.name, layers);
        }
    }
}

impl RenderTarget for LogSink {
    fn set_visible(&mut self, visible: bool) {
        log::debug!("[{}] {}", self.name, if visible { "shown" } else { "hidden" });
    }

    fn set_position(&mut self, position: Vec2) {
        log::trace!("[{}] position {:?}", self.name, position);
    }
}

impl Animator for LogSink {
    fn fire_trigger(&mut self, name: &str) {
        log::debug!("[{}] animation trigger '{}'", self.name, name);
    }
}

/// Recording collaborators for tests
#[cfg(test)]
pub mod recorder {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Collider(bool),
        ColliderExtent(Vec2, Vec2),
        Damage(bool),
        DamageExtent(Vec2, Vec2),
        HittableLayers(LayerMask),
        Visible(bool),
        Color(Vec4),
        Endpoints(Vec2, Vec2),
        Position(Vec2),
        Scale(Vec2),
        Trigger(String),
    }

    /// Shared call log; clones record into the same log
    #[derive(Debug, Clone, Default)]
    pub struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl Recorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn collaborators(&self) -> Collaborators {
            Collaborators::new()
                .with_collision(self.clone())
                .with_damage(self.clone())
                .with_render(self.clone())
                .with_animator(self.clone())
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn clear(&self) {
            self.calls.borrow_mut().clear();
        }

        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }

        /// Last value sent to a toggle, if any
        pub fn last_damage(&self) -> Option<bool> {
            self.calls.borrow().iter().rev().find_map(|c| match c {
                Call::Damage(on) => Some(*on),
                _ => None,
            })
        }

        pub fn last_collider(&self) -> Option<bool> {
            self.calls.borrow().iter().rev().find_map(|c| match c {
                Call::Collider(on) => Some(*on),
                _ => None,
            })
        }

        pub fn last_visible(&self) -> Option<bool> {
            self.calls.borrow().iter().rev().find_map(|c| match c {
                Call::Visible(on) => Some(*on),
                _ => None,
            })
        }

        pub fn last_position(&self) -> Option<Vec2> {
            self.calls.borrow().iter().rev().find_map(|c| match c {
                Call::Position(p) => Some(*p),
                _ => None,
            })
        }

        fn push(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl CollisionVolume for Recorder {
        fn set_volume_enabled(&mut self, enabled: bool) {
            self.push(Call::Collider(enabled));
        }

        fn set_volume_extent(&mut self, origin: Vec2, size: Vec2) {
            self.push(Call::ColliderExtent(origin, size));
        }
    }

    impl DamageEmitter for Recorder {
        fn enable_damage(&mut self) {
            self.push(Call::Damage(true));
        }

        fn disable_damage(&mut self) {
            self.push(Call::Damage(false));
        }

        fn set_damage_extent(&mut self, offset: Vec2, size: Vec2) {
            self.push(Call::DamageExtent(offset, size));
        }

        fn set_hittable_layers(&mut self, mask: LayerMask) {
            self.push(Call::HittableLayers(mask));
        }
    }

    impl RenderTarget for Recorder {
        fn set_visible(&mut self, visible: bool) {
            self.push(Call::Visible(visible));
        }

        fn set_color(&mut self, rgba: Vec4) {
            self.push(Call::Color(rgba));
        }

        fn set_endpoints(&mut self, p0: Vec2, p1: Vec2) {
            self.push(Call::Endpoints(p0, p1));
        }

        fn set_position(&mut self, position: Vec2) {
            self.push(Call::Position(position));
        }

        fn set_scale(&mut self, scale: Vec2) {
            self.push(Call::Scale(scale));
        }
    }

    impl Animator for Recorder {
        fn fire_trigger(&mut self, name: &str) {
            self.push(Call::Trigger(name.to_string()));
        }
    }

    /// Wall at a fixed distance along any ray
    #[derive(Debug, Clone, Copy)]
    pub struct WallAt(pub f32);

    impl ObstacleQuery for WallAt {
        fn raycast(&self, _: Vec2, _: Vec2, max_distance: f32, _: LayerMask) -> Option<f32> {
            (self.0 <= max_distance).then_some(self.0)
        }
    }

    /// Vertical velocity holder
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Body {
        pub vy: f32,
    }

    impl KinematicBody for Body {
        fn vertical_velocity(&self) -> f32 {
            self.vy
        }

        fn set_vertical_velocity(&mut self, velocity: f32) {
            self.vy = velocity;
        }
    }
}
