//! Frame driver owned by the presentation layer
//!
//! One `frame()` call = one fused input poll + one simulation tick. The
//! presentation layer only reads [`Snapshot`]s and hands in key events.

use serde::Serialize;

use crate::consts::*;
use crate::input::{InputFusion, KeyEvent, PlayerContext};
use crate::sensors::{
    DigitalInputPort, DistanceProbe, GpiogetTransport, SoxAmplitudeSource, VoiceActivityMonitor,
};
use crate::settings::{Settings, time_seed};
use crate::sim::{GameEvent, GamePhase, GameState, Obstacle, Posture, Rect, player_rect, tick};

/// Read-only view of one frame for drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player_x: f32,
    pub player_y: f32,
    pub posture: Posture,
    pub grounded: bool,
    pub hitbox: Rect,
    pub obstacles: Vec<Obstacle>,
    pub fire_breath: bool,
}

pub struct Session {
    state: GameState,
    fusion: InputFusion,
    quit: bool,
}

impl Session {
    pub fn new(fusion: InputFusion, seed: u64) -> Self {
        log::info!("Game initialized with seed: {}", seed);
        Self {
            state: GameState::new(seed),
            fusion,
            quit: false,
        }
    }

    /// Real sensors as described by `settings`; missing ones degrade to keyboard
    pub fn with_hardware(settings: &Settings) -> Self {
        let button = DigitalInputPort::new(GpiogetTransport::new(
            settings.gpio_chip.clone(),
            settings.gpio_line,
        ));
        let distance = DistanceProbe::spawn(&settings.distance_command);
        let voice = if settings.voice_enabled {
            VoiceActivityMonitor::start(SoxAmplitudeSource::new())
        } else {
            log::info!("Voice input turned off in settings");
            VoiceActivityMonitor::disabled()
        };
        let seed = settings.seed.unwrap_or_else(time_seed);
        Self::new(InputFusion::new(button, distance, voice), seed)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn fusion(&self) -> &InputFusion {
        &self.fusion
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Run one frame. Returns false once quit has been requested.
    pub fn frame(&mut self, keys: &[KeyEvent]) -> bool {
        if self.quit || keys.contains(&KeyEvent::Quit) {
            self.quit = true;
            return false;
        }

        let ctx = PlayerContext {
            grounded: self.state.grounded,
            game_over: self.state.is_game_over(),
        };
        let input = self.fusion.poll(ctx, keys);
        tick(&mut self.state, &input, SIM_DT);

        for event in self.state.drain_events() {
            match event {
                GameEvent::Restarted => {
                    self.fusion.reset();
                    log::info!("Game restarted");
                }
                GameEvent::GameOver {
                    obstacle_id,
                    time_ticks,
                } => {
                    log::info!(
                        "Game over: hit obstacle {} after {} frames",
                        obstacle_id,
                        time_ticks
                    );
                }
                GameEvent::FireBreath => log::info!("Fire breath!"),
                GameEvent::ObstacleSpawned { id, kind } => {
                    log::debug!("Spawned {:?} obstacle {}", kind, id);
                }
                GameEvent::Jumped => log::debug!("Jump"),
            }
        }
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        Snapshot {
            time_ticks: state.time_ticks,
            phase: state.phase,
            player_x: PLAYER_X,
            player_y: state.player_y,
            posture: state.posture,
            grounded: state.grounded,
            hitbox: player_rect(state.posture, PLAYER_X, state.player_y),
            obstacles: state.obstacles.clone(),
            fire_breath: state.fire_breath_ticks > 0,
        }
    }

    /// Stop background samplers; bounded even if a capture hangs
    pub fn shutdown(&mut self) {
        self.fusion.shutdown();
        log::info!("Session shut down after {} frames", self.state.time_ticks);
    }
}
