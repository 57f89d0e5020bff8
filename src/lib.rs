//! Sensor Jump - a side-scrolling jump game played with physical sensors
//!
//! Core modules:
//! - `sensors`: GPIO button, distance probe and voice monitor adapters
//! - `input`: Fusion of raw sensor samples into one per-frame input state
//! - `sim`: Deterministic simulation (physics, obstacles, collisions)
//! - `session`: Frame driver owned by the presentation layer
//! - `settings`: Device identifiers and external command lines

pub mod input;
pub mod sensors;
pub mod session;
pub mod settings;
pub mod sim;

pub use input::{InputFusion, InputState, KeyEvent};
pub use session::{Session, Snapshot};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use std::ops::RangeInclusive;
    use std::time::Duration;

    /// Fixed simulation timestep (30 Hz keeps the sensor polling cheap on a Pi)
    pub const SIM_DT: f32 = 1.0 / 30.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield dimensions
    pub const SCREEN_WIDTH: f32 = 640.0;
    pub const SCREEN_HEIGHT: f32 = 480.0;

    /// Player placement and size (standing)
    pub const PLAYER_X: f32 = 100.0;
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 60.0;
    /// Squatting keeps the feet on the ground and halves the height
    pub const PLAYER_SQUAT_HEIGHT: f32 = 30.0;
    /// Ground line: the largest y the player's top edge may reach
    pub const GROUND_Y: f32 = SCREEN_HEIGHT - PLAYER_HEIGHT;

    /// Vertical kinematics, per 30 Hz frame
    pub const GRAVITY: f32 = 1.5;
    pub const JUMP_POWER: f32 = -22.0;

    /// Obstacles
    pub const OBSTACLE_SPEED: f32 = 10.0;
    pub const OBSTACLE_WIDTH: f32 = 20.0;
    pub const OBSTACLE_HEIGHT: f32 = 40.0;
    pub const AIR_OBSTACLE_HEIGHT: f32 = 20.0;
    /// Air obstacles float at head height: a standing player hits them, a squatting one ducks under
    pub const AIR_OBSTACLE_Y: f32 = SCREEN_HEIGHT - 55.0;
    pub const SPAWN_INTERVAL: u32 = 80;
    pub const AIR_OBSTACLE_CHANCE: f64 = 0.3;

    /// Frames a voice-triggered fire breath stays active
    pub const FIRE_BREATH_TICKS: u32 = 20;

    /// Frames after an accepted jump during which further edges are ignored
    pub const JUMP_COOLDOWN_FRAMES: u32 = 10;

    /// Squat hysteresis thresholds (mm from the ceiling-mounted sensor)
    pub const SQUAT_ENTER_MM: i32 = 260;
    pub const SQUAT_EXIT_MM: i32 = 200;
    /// Readings outside this window are sensor noise
    pub const DISTANCE_PLAUSIBLE_MM: RangeInclusive<i32> = 20..=2000;
    /// The distance probe is read every N frames
    pub const DISTANCE_POLL_INTERVAL: u32 = 3;

    /// Voice detection
    pub const VOICE_WINDOW: Duration = Duration::from_millis(300);
    pub const VOICE_THRESHOLD: f32 = 0.05;
    pub const VOICE_DEBOUNCE: Duration = Duration::from_millis(500);
    pub const VOICE_ERROR_BACKOFF: Duration = Duration::from_secs(1);
    pub const VOICE_STOP_TIMEOUT: Duration = Duration::from_secs(1);
}
