//! Device settings
//!
//! Which GPIO line, which distance helper, whether to listen for voice.
//! Gameplay thresholds are compile-time constants in `consts`; only the wiring
//! of the machine varies, and it is read from the environment at startup.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Environment variable names
pub const ENV_GPIO_CHIP: &str = "JUMP_GPIO_CHIP";
pub const ENV_GPIO_LINE: &str = "JUMP_GPIO_LINE";
pub const ENV_DISTANCE_CMD: &str = "JUMP_DISTANCE_CMD";
pub const ENV_VOICE: &str = "JUMP_VOICE";
pub const ENV_SEED: &str = "JUMP_SEED";
pub const ENV_MAX_FRAMES: &str = "JUMP_MAX_FRAMES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // === Button ===
    /// GPIO chip holding the jump button line
    pub gpio_chip: String,
    /// Line offset of the jump button
    pub gpio_line: u32,

    // === Distance sensor ===
    /// Helper printing one distance (mm) per line, program first
    pub distance_command: Vec<String>,

    // === Voice ===
    /// Start the microphone sampler
    pub voice_enabled: bool,

    // === Run ===
    /// Obstacle RNG seed; `None` picks one from the clock at startup
    pub seed: Option<u64>,
    /// Stop after this many frames (headless runs)
    pub max_frames: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gpio_chip: "gpiochip0".to_string(),
            gpio_line: 17,

            distance_command: vec!["python3".to_string(), "vl53.py".to_string()],

            voice_enabled: true,

            seed: None,
            max_frames: None,
        }
    }
}

impl Settings {
    /// Defaults overridden by `JUMP_*` environment variables
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply(|key| std::env::var(key).ok());
        settings.resolve_seed();
        settings
    }

    /// The configured seed, fixing a clock-based one if none was given
    pub fn resolve_seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(time_seed)
    }

    /// Apply overrides from a lookup; unparseable values are logged and skipped
    pub fn apply(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(chip) = lookup(ENV_GPIO_CHIP) {
            self.gpio_chip = chip;
        }
        if let Some(line) = parse_var(&lookup, ENV_GPIO_LINE) {
            self.gpio_line = line;
        }
        if let Some(command) = lookup(ENV_DISTANCE_CMD) {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if parts.is_empty() {
                log::warn!("{} is empty, keeping {:?}", ENV_DISTANCE_CMD, self.distance_command);
            } else {
                self.distance_command = parts;
            }
        }
        if let Some(voice) = lookup(ENV_VOICE) {
            self.voice_enabled = !matches!(voice.to_lowercase().as_str(), "0" | "off" | "false" | "no");
        }
        if let Some(seed) = parse_var(&lookup, ENV_SEED) {
            self.seed = Some(seed);
        }
        if let Some(frames) = parse_var(&lookup, ENV_MAX_FRAMES) {
            self.max_frames = Some(frames);
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?} (not a number)", key, raw);
            None
        }
    }
}

pub(crate) fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}
