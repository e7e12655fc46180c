//! Hazard state machine
//!
//! Drives a [`PhaseTable`] from an external tick. Each `advance`:
//! 1. adds `dt` to the phase timer,
//! 2. takes every phase transition the elapsed time allows (exit hook,
//!    next index, enter hook, carry-over),
//! 3. evaluates channel policies and motion for the resulting phase and
//!    progress, and pushes them through the [`ChannelSet`].
//!
//! Channel levels are recomputed from (phase, progress) every tick, never
//! accumulated, so a machine read at any point is tick-coherent.

use serde::{Deserialize, Serialize};

use super::channel::{ChannelKind, ChannelOutput, ChannelPolicy, ChannelSet};
use super::collab::Collaborators;
use super::motion::Pose;
use super::phase::{Phase, PhaseHook, PhaseTable, Wrap};
use super::timer::PhaseTimer;
use crate::error::ConfigError;

/// Snapshot of everything a machine currently emits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardOutput {
    pub visual: ChannelOutput,
    pub collision: ChannelOutput,
    pub damage: ChannelOutput,
    /// Pose as shown, color alpha already scaled by visual intensity
    pub pose: Pose,
}

impl HazardOutput {
    pub fn channel(&self, kind: ChannelKind) -> ChannelOutput {
        match kind {
            ChannelKind::Visual => self.visual,
            ChannelKind::Collision => self.collision,
            ChannelKind::Damage => self.damage,
        }
    }

    fn off(pose: Pose) -> Self {
        Self {
            visual: ChannelOutput::OFF,
            collision: ChannelOutput::OFF,
            damage: ChannelOutput::OFF,
            pose,
        }
    }
}

/// Construction options beyond the phase table
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineOptions {
    /// Pose used for any property the current phase does not animate
    pub rest: Pose,
    /// Seconds before phase 0 starts running (>= 0)
    pub start_delay: f32,
}

/// Timed finite-state hazard
pub struct HazardStateMachine {
    table: PhaseTable,
    index: usize,
    timer: PhaseTimer,
    rest: Pose,
    halted: bool,
    output: HazardOutput,
    channels: ChannelSet,
}

impl HazardStateMachine {
    /// Build a machine and emit its initial state to the collaborators.
    ///
    /// `required` lists channels whose collaborator must be present.
    pub fn new(
        name: &str,
        table: PhaseTable,
        options: MachineOptions,
        collab: Collaborators,
        required: &[ChannelKind],
    ) -> Result<Self, ConfigError> {
        ConfigError::check_duration(name, "start_delay", options.start_delay)?;
        let channels = ChannelSet::new(name, collab, required)?;

        let used: Vec<ChannelKind> = ChannelKind::ALL
            .into_iter()
            .filter(|&kind| {
                table
                    .iter()
                    .any(|p| p.policy(kind) != ChannelPolicy::Off)
            })
            .collect();
        channels.warn_missing(&used);

        let index = table.initial();
        let timer = PhaseTimer::new(table.get(index).duration, options.start_delay);
        let mut machine = Self {
            table,
            index,
            timer,
            rest: options.rest,
            halted: false,
            output: HazardOutput::off(options.rest),
            channels,
        };
        machine.refresh();
        Ok(machine)
    }

    /// Advance by `dt` seconds. Returns the number of phase transitions taken.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.halted {
            return 0;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.timer.advance(dt);
        let transitions = self.run_transitions();
        self.refresh();
        transitions
    }

    /// Everything off immediately and stop advancing. Used on deactivation.
    pub fn force_off(&mut self) {
        self.halted = true;
        self.channels.force_off();
        self.output = HazardOutput::off(self.output.pose);
        log::debug!("{}: forced off", self.channels.name());
    }

    /// Back to the initial phase with the configured start delay
    pub fn reset(&mut self) {
        self.halted = false;
        self.index = self.table.initial();
        self.timer.reset(self.table.get(self.index).duration);
        self.refresh();
    }

    /// Cancel whatever is running and enter phase 0 now. The current phase's
    /// exit hook does not run; phase 0's enter hook does.
    pub fn restart(&mut self) {
        self.halted = false;
        self.index = 0;
        self.timer.restart(self.table.get(0).duration);
        log::debug!("{}: restart -> {}", self.channels.name(), self.table.get(0).name);
        run_hook(&mut self.channels, self.table.get(0).on_enter.as_ref());
        self.run_transitions();
        self.refresh();
    }

    /// Restart only if resting in the held last phase. Returns whether it started.
    pub fn trigger(&mut self) -> bool {
        if self.halted || !self.is_idle() {
            return false;
        }
        self.restart();
        true
    }

    /// Jump straight to the held last phase without running hooks
    pub fn finish(&mut self) {
        let last = self.table.last();
        self.index = last;
        self.timer.restart(self.table.get(last).duration);
        self.refresh();
    }

    /// Output for `index` at `progress` without touching machine state
    pub fn evaluate(&self, index: usize, progress: f32) -> HazardOutput {
        let phase = self.table.get(index);
        let progress = progress.clamp(0.0, 1.0);
        let mut pose = self.rest;
        if let Some(motion) = &phase.motion {
            motion.apply(&mut pose, progress, progress * phase.duration);
        }
        let visual = phase.visual.evaluate(progress);
        pose.color.w *= visual.intensity;
        HazardOutput {
            visual,
            collision: phase.collision.evaluate(progress),
            damage: phase.damage.evaluate(progress),
            pose,
        }
    }

    pub fn name(&self) -> &str {
        self.channels.name()
    }

    pub fn phase_index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> &Phase {
        self.table.get(self.index)
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    pub fn progress(&self) -> f32 {
        self.timer.progress()
    }

    /// Seconds into the current phase
    pub fn elapsed(&self) -> f32 {
        self.timer.elapsed()
    }

    pub fn is_delaying(&self) -> bool {
        self.timer.is_delaying()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Resting in the held last phase of a one-shot table
    pub fn is_idle(&self) -> bool {
        self.table.wrap() == Wrap::HoldLast && self.index == self.table.last()
    }

    pub fn output(&self) -> HazardOutput {
        self.output
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelSet {
        &mut self.channels
    }

    fn run_transitions(&mut self) -> u32 {
        if self.table.wrap() == Wrap::Cycle {
            let skipped = self.timer.skip_cycles(self.table.cycle_duration());
            if skipped > 0 {
                log::debug!("{}: skipped {} whole cycles", self.channels.name(), skipped);
            }
        }
        let mut transitions = 0;
        while !self.is_idle() && self.timer.is_complete() {
            let from = self.index;
            let to = self.table.next(from);
            run_hook(&mut self.channels, self.table.get(from).on_exit.as_ref());
            log::debug!(
                "{}: {} -> {}",
                self.channels.name(),
                self.table.get(from).name,
                self.table.get(to).name
            );
            self.index = to;
            self.timer.roll_over(self.table.get(to).duration);
            run_hook(&mut self.channels, self.table.get(to).on_enter.as_ref());
            transitions += 1;
        }
        transitions
    }

    fn refresh(&mut self) {
        let output = self.evaluate(self.index, self.timer.progress());
        for kind in ChannelKind::ALL {
            self.channels.apply(kind, output.channel(kind));
        }
        self.channels.present(output.pose);
        // Unavailable channels are pinned off; report what was applied
        self.output = HazardOutput {
            visual: self.channels.output(ChannelKind::Visual),
            collision: self.channels.output(ChannelKind::Collision),
            damage: self.channels.output(ChannelKind::Damage),
            pose: output.pose,
        };
    }
}

fn run_hook(channels: &mut ChannelSet, hook: Option<&PhaseHook>) {
    match hook {
        Some(PhaseHook::FireTrigger(name)) => channels.fire_trigger(name),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::sim::collab::recorder::{Call, Recorder};
    use crate::sim::motion::{Keyframes, Motion};

    const HIDDEN: Vec2 = Vec2::new(0.0, 0.0);
    const EXTENDED: Vec2 = Vec2::new(2.0, 0.0);

    fn four_phase(hidden: f32, extending: f32, extended: f32, retracting: f32) -> PhaseTable {
        PhaseTable::cycle(
            "test",
            vec![
                Phase::new("hidden", hidden).visual(ChannelPolicy::On),
                Phase::new("extending", extending)
                    .visual(ChannelPolicy::On)
                    .motion(Motion::linear(Keyframes::Position(HIDDEN, EXTENDED))),
                Phase::new("extended", extended)
                    .visual(ChannelPolicy::On)
                    .collision(ChannelPolicy::On)
                    .damage(ChannelPolicy::On)
                    .motion(Motion::hold_position(EXTENDED)),
                Phase::new("retracting", retracting)
                    .visual(ChannelPolicy::On)
                    .motion(Motion::linear(Keyframes::Position(EXTENDED, HIDDEN))),
            ],
        )
        .unwrap()
    }

    fn machine(table: PhaseTable, recorder: &Recorder) -> HazardStateMachine {
        HazardStateMachine::new("test", table, MachineOptions::default(), recorder.collaborators(), &[])
            .unwrap()
    }

    #[test]
    fn test_four_phase_timeline() {
        let recorder = Recorder::new();
        let mut m = machine(four_phase(2.0, 0.3, 1.5, 0.3), &recorder);
        assert_eq!(m.phase().name, "hidden");

        assert_eq!(m.advance(2.0), 1);
        assert_eq!(m.phase().name, "extending");
        assert_eq!(m.progress(), 0.0);

        m.advance(0.15);
        assert!((m.progress() - 0.5).abs() < 1e-4);
        assert!((m.output().pose.position.x - 1.0).abs() < 1e-3);
        assert!(!m.output().damage.enabled);

        m.advance(0.15);
        assert_eq!(m.phase().name, "extended");
        assert!(m.output().damage.enabled);
        assert_eq!(recorder.last_damage(), Some(true));

        m.advance(1.5);
        assert_eq!(m.phase().name, "retracting");
        assert!(!m.output().damage.enabled);

        m.advance(0.3);
        assert_eq!(m.phase().name, "hidden");
        assert_eq!(m.output().pose.position, HIDDEN);
        assert_eq!(recorder.last_damage(), Some(false));
        assert!((m.table().cycle_duration() - 4.1).abs() < 1e-5);
    }

    #[test]
    fn test_large_dt_takes_several_transitions() {
        let recorder = Recorder::new();
        let mut m = machine(four_phase(1.0, 0.5, 1.0, 0.5), &recorder);
        // 3.25s: hidden(1) + extending(.5) + extended(1) + .75 past -> retracting done, hidden .25
        assert_eq!(m.advance(3.25), 4);
        assert_eq!(m.phase().name, "hidden");
        assert!((m.elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_huge_dt_returns_in_a_valid_phase() {
        let table = PhaseTable::cycle(
            "test",
            vec![
                Phase::new("off", 0.3),
                Phase::new("on", 0.3).damage(ChannelPolicy::On),
            ],
        )
        .unwrap();
        let recorder = Recorder::new();
        let mut m = machine(table, &recorder);
        let transitions = m.advance(1.0e8);
        assert!((2..=5).contains(&transitions));
        assert!(m.phase_index() < 2);
        assert!(m.elapsed() < m.phase().duration);
        assert_eq!(m.output().damage.enabled, m.phase().name == "on");

        // Keeps running normally afterwards
        let index = m.phase_index();
        m.advance(0.3);
        assert_ne!(m.phase_index(), index);
    }

    #[test]
    fn test_zero_duration_phase_passes_in_one_tick() {
        let table = PhaseTable::cycle(
            "test",
            vec![
                Phase::new("off", 1.0),
                Phase::new("flash", 0.0).visual(ChannelPolicy::On),
                Phase::new("on", 1.0).damage(ChannelPolicy::On),
            ],
        )
        .unwrap();
        let recorder = Recorder::new();
        let mut m = machine(table, &recorder);
        assert_eq!(m.advance(1.0), 2);
        assert_eq!(m.phase().name, "on");
    }

    #[test]
    fn test_unchanged_channels_are_not_redispatched() {
        let recorder = Recorder::new();
        let mut m = machine(four_phase(2.0, 0.3, 1.5, 0.3), &recorder);
        recorder.clear();
        for _ in 0..100 {
            m.advance(0.01);
        }
        // Still hidden after 1s: nothing toggled
        assert_eq!(recorder.count(|c| matches!(c, Call::Damage(_) | Call::Collider(_) | Call::Visible(_))), 0);
    }

    #[test]
    fn test_start_delay() {
        let recorder = Recorder::new();
        let options = MachineOptions {
            start_delay: 1.0,
            ..Default::default()
        };
        let mut m =
            HazardStateMachine::new("test", four_phase(2.0, 0.5, 1.0, 0.5), options, recorder.collaborators(), &[])
                .unwrap();
        m.advance(2.5);
        assert!(!m.is_delaying());
        assert_eq!(m.phase().name, "hidden");
        m.advance(0.5);
        assert_eq!(m.phase().name, "extending");

        m.reset();
        assert!(m.is_delaying());
        assert_eq!(m.phase_index(), 0);
    }

    #[test]
    fn test_step_across_start_delay_matches_single_step() {
        let recorder = Recorder::new();
        let options = MachineOptions {
            start_delay: 1.0,
            ..Default::default()
        };
        let build = || {
            HazardStateMachine::new("test", four_phase(0.5, 0.5, 1.0, 0.5), options, recorder.collaborators(), &[])
                .unwrap()
        };
        let mut split = build();
        let mut whole = build();
        split.advance(0.75);
        assert!(split.is_delaying());
        split.advance(1.0);
        whole.advance(1.75);

        assert_eq!(whole.phase().name, "extending");
        assert_eq!(split.phase_index(), whole.phase_index());
        assert_eq!(split.elapsed(), whole.elapsed());
        assert_eq!(split.output(), whole.output());
    }

    #[test]
    fn test_force_off_halts_and_clears() {
        let recorder = Recorder::new();
        let mut m = machine(four_phase(1.0, 0.5, 1.0, 0.5), &recorder);
        m.advance(1.75);
        assert!(m.output().damage.enabled);

        m.force_off();
        assert_eq!(recorder.last_damage(), Some(false));
        assert_eq!(recorder.last_collider(), Some(false));
        assert_eq!(recorder.last_visible(), Some(false));
        assert_eq!(m.advance(10.0), 0);
        assert!(!m.output().damage.enabled);

        m.reset();
        assert!(!m.is_halted());
        assert_eq!(recorder.last_visible(), Some(true));
    }

    #[test]
    fn test_hooks_fire_on_transition() {
        let table = PhaseTable::cycle(
            "test",
            vec![
                Phase::new("wait", 1.0).on_exit(PhaseHook::FireTrigger("Go".into())),
                Phase::new("act", 1.0).on_enter(PhaseHook::FireTrigger("Act".into())),
            ],
        )
        .unwrap();
        let recorder = Recorder::new();
        let mut m = machine(table, &recorder);
        assert_eq!(recorder.count(|c| matches!(c, Call::Trigger(_))), 0);
        m.advance(1.0);
        let triggers: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Trigger(_)))
            .collect();
        assert_eq!(triggers, vec![Call::Trigger("Go".into()), Call::Trigger("Act".into())]);
    }

    #[test]
    fn test_one_shot_trigger_only_when_idle() {
        let table = PhaseTable::one_shot(
            "test",
            vec![
                Phase::new("busy", 1.0).damage(ChannelPolicy::On),
                Phase::new("rest", 0.0),
            ],
        )
        .unwrap();
        let recorder = Recorder::new();
        let mut m = machine(table, &recorder);
        assert!(m.is_idle());
        assert_eq!(m.advance(50.0), 0);

        assert!(m.trigger());
        assert!(m.output().damage.enabled);
        assert!(!m.trigger());
        m.advance(1.0);
        assert!(m.is_idle());
        assert!(!m.output().damage.enabled);
    }

    #[test]
    fn test_missing_optional_collaborator_stays_off() {
        let recorder = Recorder::new();
        let mut collab = recorder.collaborators();
        collab.damage = None;
        let mut m =
            HazardStateMachine::new("test", four_phase(1.0, 0.5, 1.0, 0.5), MachineOptions::default(), collab, &[])
                .unwrap();
        m.advance(1.75);
        assert!(m.output().collision.enabled);
        assert!(!m.output().damage.enabled);
    }

    #[test]
    fn test_missing_required_collaborator_rejected() {
        let result = HazardStateMachine::new(
            "test",
            four_phase(1.0, 0.5, 1.0, 0.5),
            MachineOptions::default(),
            Collaborators::new(),
            &[ChannelKind::Damage],
        );
        assert!(matches!(result, Err(ConfigError::MissingCollaborator { .. })));
    }

    /// Durations and steps in 1/64 s so float sums are exact
    fn sixty_fourths(n: u32) -> f32 {
        n as f32 / 64.0
    }

    proptest! {
        #[test]
        fn prop_time_is_additive(
            durations in prop::array::uniform4(1u32..128),
            delay in 0u32..256,
            pre in 0u32..256,
            dt1 in 0u32..512,
            dt2 in 0u32..512,
        ) {
            let [a, b, c, d] = durations.map(sixty_fourths);
            let recorder = Recorder::new();
            let options = MachineOptions {
                start_delay: sixty_fourths(delay),
                ..Default::default()
            };
            let build = || {
                HazardStateMachine::new("test", four_phase(a, b, c, d), options, recorder.collaborators(), &[])
                    .unwrap()
            };
            let mut split = build();
            let mut whole = build();
            split.advance(sixty_fourths(pre));
            whole.advance(sixty_fourths(pre));

            split.advance(sixty_fourths(dt1));
            split.advance(sixty_fourths(dt2));
            whole.advance(sixty_fourths(dt1 + dt2));

            prop_assert_eq!(split.is_delaying(), whole.is_delaying());
            prop_assert_eq!(split.phase_index(), whole.phase_index());
            prop_assert_eq!(split.elapsed(), whole.elapsed());
            prop_assert_eq!(split.output(), whole.output());
        }

        #[test]
        fn prop_full_cycle_returns_to_same_state(
            durations in prop::array::uniform4(1u32..128),
            pre in 0u32..1024,
        ) {
            let [a, b, c, d] = durations.map(sixty_fourths);
            let recorder = Recorder::new();
            let mut m = machine(four_phase(a, b, c, d), &recorder);
            m.advance(sixty_fourths(pre));
            let (index, elapsed) = (m.phase_index(), m.elapsed());

            m.advance(m.table().cycle_duration());

            prop_assert_eq!(m.phase_index(), index);
            prop_assert_eq!(m.elapsed(), elapsed);
        }

        #[test]
        fn prop_output_is_pure_in_phase_and_progress(
            index in 0usize..4,
            progress in 0.0f32..=1.0,
            noise in 0u32..512,
        ) {
            let recorder = Recorder::new();
            let mut m = machine(four_phase(1.0, 0.5, 1.0, 0.5), &recorder);
            let before = m.evaluate(index, progress);
            m.advance(sixty_fourths(noise));
            prop_assert_eq!(m.evaluate(index, progress), before);
        }
    }
}
