//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Inputs arrive as one fused `InputState` per step; no sensor access

pub mod hitbox;
pub mod state;
pub mod tick;

pub use hitbox::{HitboxCache, Rect, player_rect};
pub use state::{GameEvent, GamePhase, GameState, Obstacle, ObstacleKind, Posture};
pub use tick::tick;
