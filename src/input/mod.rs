//! Input fusion
//!
//! Turns three independently timed sensors plus keyboard fallback into one
//! `InputState` per simulation step.

pub mod fusion;
pub mod keyboard;
pub mod squat;

pub use fusion::{InputFusion, InputState, PlayerContext};
pub use keyboard::KeyEvent;
pub use squat::{SquatState, SquatThresholds};
