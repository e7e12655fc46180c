//! Phase descriptors
//!
//! A hazard's behavior is a table of phases built once from its settings and
//! never mutated afterward.

use super::channel::{ChannelKind, ChannelPolicy};
use super::motion::Motion;
use crate::error::ConfigError;

/// Side effect run when a phase is entered or left
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseHook {
    /// Fire a named trigger on the animator
    FireTrigger(String),
}

/// One timed segment of a hazard cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: &'static str,
    /// Seconds; 0 completes immediately
    pub duration: f32,
    pub visual: ChannelPolicy,
    pub collision: ChannelPolicy,
    pub damage: ChannelPolicy,
    pub motion: Option<Motion>,
    pub on_enter: Option<PhaseHook>,
    pub on_exit: Option<PhaseHook>,
}

impl Phase {
    /// A phase with every channel off and no motion
    pub fn new(name: &'static str, duration: f32) -> Self {
        Self {
            name,
            duration,
            visual: ChannelPolicy::Off,
            collision: ChannelPolicy::Off,
            damage: ChannelPolicy::Off,
            motion: None,
            on_enter: None,
            on_exit: None,
        }
    }

    pub fn visual(mut self, policy: ChannelPolicy) -> Self {
        self.visual = policy;
        self
    }

    pub fn collision(mut self, policy: ChannelPolicy) -> Self {
        self.collision = policy;
        self
    }

    pub fn damage(mut self, policy: ChannelPolicy) -> Self {
        self.damage = policy;
        self
    }

    pub fn motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn on_enter(mut self, hook: PhaseHook) -> Self {
        self.on_enter = Some(hook);
        self
    }

    pub fn on_exit(mut self, hook: PhaseHook) -> Self {
        self.on_exit = Some(hook);
        self
    }

    pub fn policy(&self, kind: ChannelKind) -> ChannelPolicy {
        match kind {
            ChannelKind::Visual => self.visual,
            ChannelKind::Collision => self.collision,
            ChannelKind::Damage => self.damage,
        }
    }
}

/// What happens after the last phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// Return to phase 0 forever
    Cycle,
    /// Stay in the last phase until restarted from outside
    HoldLast,
}

/// Validated, ordered phase list
#[derive(Debug, Clone)]
pub struct PhaseTable {
    phases: Vec<Phase>,
    wrap: Wrap,
    initial: usize,
}

impl PhaseTable {
    pub fn new(
        hazard: &str,
        phases: Vec<Phase>,
        wrap: Wrap,
        initial: usize,
    ) -> Result<Self, ConfigError> {
        if phases.is_empty() {
            return Err(ConfigError::EmptyPhaseTable {
                hazard: hazard.to_string(),
            });
        }
        if initial >= phases.len() {
            return Err(ConfigError::InvalidPhaseIndex {
                hazard: hazard.to_string(),
                index: initial,
                len: phases.len(),
            });
        }
        for phase in &phases {
            ConfigError::check_duration(hazard, phase.name, phase.duration)?;
        }
        if wrap == Wrap::Cycle && phases.iter().map(|p| p.duration).sum::<f32>() <= 0.0 {
            return Err(ConfigError::ZeroCycle {
                hazard: hazard.to_string(),
            });
        }
        Ok(Self {
            phases,
            wrap,
            initial,
        })
    }

    /// Cyclic table starting at phase 0
    pub fn cycle(hazard: &str, phases: Vec<Phase>) -> Result<Self, ConfigError> {
        Self::new(hazard, phases, Wrap::Cycle, 0)
    }

    /// One-shot table resting in its last phase until restarted
    pub fn one_shot(hazard: &str, phases: Vec<Phase>) -> Result<Self, ConfigError> {
        let last = phases.len().saturating_sub(1);
        Self::new(hazard, phases, Wrap::HoldLast, last)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Phase {
        &self.phases[index]
    }

    pub fn wrap(&self) -> Wrap {
        self.wrap
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn last(&self) -> usize {
        self.phases.len() - 1
    }

    /// Index after `index`, honoring the wrap mode
    pub fn next(&self, index: usize) -> usize {
        match self.wrap {
            Wrap::Cycle => (index + 1) % self.phases.len(),
            Wrap::HoldLast => (index + 1).min(self.last()),
        }
    }

    /// Sum of all durations
    pub fn cycle_duration(&self) -> f32 {
        self.phases.iter().map(|p| p.duration).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter()
    }
}
