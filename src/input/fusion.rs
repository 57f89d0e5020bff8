//! Per-frame sensor fusion
//!
//! Each call to [`InputFusion::poll`] samples every sensor at most once and
//! produces one immutable [`InputState`] for the simulation step:
//! - Button: released→pressed edge, gated by ground contact, cooldown and posture
//! - Distance: squat hysteresis, sampled every `DISTANCE_POLL_INTERVAL` frames
//! - Voice: the monitor's flag is read and cleared, giving a one-frame pulse
//!
//! Keyboard events from the presentation layer merge into the same state.

use super::keyboard::KeyEvent;
use super::squat::{SquatState, SquatThresholds};
use crate::consts::*;
use crate::sensors::{Absent, ButtonInput, DistanceInput, Level, VoiceInput};

/// Fused input for exactly one simulation step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    /// Accepted jump (or restart while the game is over)
    pub jump_edge: bool,
    /// Posture after this frame's squat decision
    pub squat_active: bool,
    /// One-frame pulse per voice detection
    pub voice_active: bool,
    /// Explicit restart key
    pub restart: bool,
}

/// What fusion needs to know about the player before deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerContext {
    pub grounded: bool,
    pub game_over: bool,
}

impl Default for PlayerContext {
    fn default() -> Self {
        Self {
            grounded: true,
            game_over: false,
        }
    }
}

pub struct InputFusion {
    button: Box<dyn ButtonInput>,
    distance: Box<dyn DistanceInput>,
    voice: Box<dyn VoiceInput>,
    thresholds: SquatThresholds,
    previous_level: Level,
    cooldown_frames: u32,
    squat: SquatState,
    /// Frames since the last reset, for the distance polling cadence
    frame: u32,
}

impl InputFusion {
    pub fn new(
        button: impl ButtonInput + 'static,
        distance: impl DistanceInput + 'static,
        voice: impl VoiceInput + 'static,
    ) -> Self {
        Self {
            button: Box::new(button),
            distance: Box::new(distance),
            voice: Box::new(voice),
            thresholds: SquatThresholds::default(),
            previous_level: Level::High,
            cooldown_frames: 0,
            squat: SquatState::default(),
            frame: 0,
        }
    }

    /// No sensors at all; keyboard events only
    pub fn keyboard_only() -> Self {
        Self::new(Absent, Absent, Absent)
    }

    pub fn with_thresholds(mut self, thresholds: SquatThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn cooldown_frames(&self) -> u32 {
        self.cooldown_frames
    }

    pub fn squat_active(&self) -> bool {
        self.squat.active
    }

    /// Sample all sensors once and build this frame's input
    pub fn poll(&mut self, ctx: PlayerContext, keys: &[KeyEvent]) -> InputState {
        self.cooldown_frames = self.cooldown_frames.saturating_sub(1);

        let level = self.button.read();
        let distance = if self.frame % DISTANCE_POLL_INTERVAL == 0 {
            self.distance.read()
        } else {
            None
        };
        let voice = self.voice.take();
        self.frame = self.frame.wrapping_add(1);

        let pressed_edge = level.is_pressed() && !self.previous_level.is_pressed();
        self.previous_level = level;

        // Posture is frozen once the run is over
        if !ctx.game_over {
            if keys.contains(&KeyEvent::SquatToggle) {
                self.squat.toggle(ctx.grounded);
            }
            if let Some(mm) = distance {
                if self.squat.update(mm, ctx.grounded, &self.thresholds) {
                    log::debug!("Squat {} at {} mm", self.squat.active, mm);
                }
            }
        }

        let wants_jump = pressed_edge || keys.contains(&KeyEvent::Jump);
        // While the run is over an edge only means "restart"
        let allowed = ctx.game_over || (ctx.grounded && !self.squat.active);
        let jump_edge = wants_jump && allowed && self.cooldown_frames == 0;
        if jump_edge {
            self.cooldown_frames = JUMP_COOLDOWN_FRAMES;
        }

        InputState {
            jump_edge,
            squat_active: self.squat.active,
            voice_active: voice || keys.contains(&KeyEvent::Special),
            restart: keys.contains(&KeyEvent::Restart),
        }
    }

    /// Forget all edge, cooldown and posture tracking after a restart
    ///
    /// The last observed button level is kept so a button still held across
    /// the restart cannot fire an edge on the next frame.
    pub fn reset(&mut self) {
        self.cooldown_frames = 0;
        self.squat = SquatState::default();
        self.frame = 0;
    }

    /// Stop background samplers
    pub fn shutdown(&mut self) {
        self.voice.stop();
    }
}
