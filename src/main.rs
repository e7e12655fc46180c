//! Platform Hazards demo runner
//!
//! Loads a level (JSON path as the first argument, otherwise the built-in
//! demo layout), drives it with a fixed-timestep loop and logs what the
//! hazards tell their collaborators. Run with `RUST_LOG=debug` to see every
//! channel edge and phase transition.
//!
//! Usage: `platform-hazards [level.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;
    use std::rc::Rc;

    use platform_hazards::ConfigError;
    use platform_hazards::LevelSettings;
    use platform_hazards::consts::*;
    use platform_hazards::sim::{
        Hazard, KinematicBody, Level, LogSink, OpenSpace, OverlapEvent, OverlapKind, TickInput, tick,
    };

    /// Host frame time, deliberately uneven
    const FRAME_TIMES: [f32; 3] = [1.0 / 60.0, 1.0 / 60.0, 1.0 / 40.0];
    const DEFAULT_SECONDS: f32 = 12.0;
    const GRAVITY: f32 = -40.0;
    const JUMP_EVERY: f32 = 1.5;

    /// Scripted player: jumps on a fixed rhythm, lands on every spring pad
    /// and crumbling platform once
    struct Player {
        vy: f32,
    }

    impl KinematicBody for Player {
        fn vertical_velocity(&self) -> f32 {
            self.vy
        }

        fn set_vertical_velocity(&mut self, velocity: f32) {
            self.vy = velocity;
        }
    }

    struct Demo {
        level: Level,
        player: Player,
        accumulator: f32,
        input: TickInput,
        time: f32,
        next_jump: f32,
        touched: bool,
    }

    impl Demo {
        fn new(level: Level) -> Self {
            Self {
                level,
                player: Player { vy: 0.0 },
                accumulator: 0.0,
                input: TickInput::default(),
                time: 0.0,
                next_jump: JUMP_EVERY,
                touched: false,
            }
        }

        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.script();
                let input = self.input.clone();
                tick(&mut self.level, &input, &mut self.player, SIM_DT);
                self.accumulator -= SIM_DT;
                self.time += SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input = TickInput::default();
                self.player.vy = (self.player.vy + GRAVITY * SIM_DT).max(-20.0);
            }

            for event in self.level.drain_events() {
                log::info!("t={:.2}s {:?}", self.time, event);
            }
        }

        fn script(&mut self) {
            if self.time >= self.next_jump {
                self.input.jump = true;
                self.next_jump += JUMP_EVERY;
                log::debug!("t={:.2}s jump #{}", self.time, self.level.jumps().count() + 1);
            }
            if !self.touched && self.time >= 1.0 {
                self.touched = true;
                for slot in self.level.slots() {
                    if matches!(slot.hazard, Hazard::SpringPad(_) | Hazard::Crumbling(_)) {
                        self.input.overlaps.push(OverlapEvent::player(slot.id, OverlapKind::Enter));
                    }
                }
            }
        }

        fn report(&self) {
            for slot in self.level.slots() {
                match slot.hazard.machine() {
                    Some(machine) => {
                        let out = machine.output();
                        log::info!(
                            "{:<16} phase={:<12} visual={} collision={} damage={}",
                            slot.name,
                            machine.phase().name,
                            out.visual.enabled,
                            out.collision.enabled,
                            out.damage.enabled
                        );
                    }
                    None => log::info!("{:<16} ({})", slot.name, slot.hazard.kind_str()),
                }
            }
        }
    }

    pub fn run() -> Result<(), ConfigError> {
        let args: Vec<String> = std::env::args().collect();
        let settings = match args.get(1) {
            Some(path) => LevelSettings::load(Path::new(path))?,
            None => LevelSettings::demo(),
        };
        let seconds = args
            .get(2)
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_SECONDS);

        let level = Level::from_settings(&settings, Rc::new(OpenSpace), |name, _| LogSink::collaborators(name))?;
        let mut demo = Demo::new(level);

        let mut frame = 0;
        while demo.time < seconds {
            demo.update(FRAME_TIMES[frame % FRAME_TIMES.len()]);
            frame += 1;
        }

        log::info!("Ran {} ticks over {} frames", demo.level.time_ticks(), frame);
        demo.report();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Platform Hazards demo starting...");

    if let Err(err) = native::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on wasm
}
