//! Sensor Jump entry point
//!
//! Headless native runner: builds the real sensors and drives the session at
//! the fixed simulation rate. A windowed front end feeds key events and draws
//! snapshots through the same `Session` API.

use std::thread;
use std::time::{Duration, Instant};

use sensor_jump::consts::*;
use sensor_jump::{Session, Settings};

fn main() {
    env_logger::init();
    log::info!("Sensor Jump (native) starting...");

    let settings = Settings::from_env();
    match serde_json::to_string(&settings) {
        Ok(json) => log::info!("Settings: {}", json),
        Err(e) => log::warn!("Could not render settings: {}", e),
    }

    let mut session = Session::with_hardware(&settings);
    let frames = run(&mut session, settings.max_frames);

    match serde_json::to_string(&session.snapshot()) {
        Ok(json) => log::info!("Final snapshot after {} frames: {}", frames, json),
        Err(e) => log::warn!("Could not render snapshot: {}", e),
    }
    session.shutdown();
}

/// Fixed timestep loop; returns the number of frames simulated
fn run(session: &mut Session, max_frames: Option<u64>) -> u64 {
    let step = Duration::from_secs_f32(SIM_DT);
    let mut accumulator = Duration::ZERO;
    let mut last = Instant::now();
    let mut frames: u64 = 0;

    loop {
        let now = Instant::now();
        accumulator += now - last;
        last = now;

        let mut substeps = 0;
        while accumulator >= step && substeps < MAX_SUBSTEPS {
            if !session.frame(&[]) {
                return frames;
            }
            accumulator -= step;
            substeps += 1;
            frames += 1;
            if max_frames.is_some_and(|max| frames >= max) {
                return frames;
            }
        }
        // A stalled sensor read cost us several frames; drop the backlog
        if substeps == MAX_SUBSTEPS {
            log::debug!("Dropping {:?} of simulation backlog", accumulator);
            accumulator = Duration::ZERO;
        }

        thread::sleep(step.saturating_sub(accumulator));
    }
}
