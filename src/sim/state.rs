//! Game state and core simulation types
//!
//! Everything the step function mutates lives here. A run is fully determined
//! by its seed and the sequence of fused inputs.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::hitbox::{HitboxCache, Rect};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Hit an obstacle; waiting for a restart trigger
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    Standing,
    Squatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Sits on the ground; jump over it
    Ground,
    /// Floats at head height; squat under it
    Air,
}

/// An obstacle scrolling in from the right edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// New obstacle just beyond the right edge of the screen
    pub fn spawn(id: u32, kind: ObstacleKind) -> Self {
        let (y, height) = match kind {
            ObstacleKind::Ground => (SCREEN_HEIGHT - OBSTACLE_HEIGHT, OBSTACLE_HEIGHT),
            ObstacleKind::Air => (AIR_OBSTACLE_Y, AIR_OBSTACLE_HEIGHT),
        };
        Self {
            id,
            x: SCREEN_WIDTH,
            y,
            width: OBSTACLE_WIDTH,
            height,
            kind,
        }
    }

    #[inline]
    pub fn advance(&mut self, dx: f32) {
        self.x -= dx;
    }

    /// Fully past the left edge
    #[inline]
    pub fn off_screen(&self) -> bool {
        self.x + self.width < 0.0
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Things that happened during a tick, drained by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    ObstacleSpawned { id: u32, kind: ObstacleKind },
    FireBreath,
    GameOver { obstacle_id: u32, time_ticks: u64 },
    Restarted,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed; restarts replay the same obstacle sequence
    pub seed: u64,
    rng: Pcg32,
    /// Frames simulated in the current run
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Top edge of the player sprite (screen coordinates, y down)
    pub player_y: f32,
    pub player_vy: f32,
    pub grounded: bool,
    pub posture: Posture,
    /// Active obstacles in spawn order
    pub obstacles: Vec<Obstacle>,
    /// Frames since the last spawn
    pub spawn_timer: u32,
    /// Frames left on the voice-triggered fire breath
    pub fire_breath_ticks: u32,
    pub hitbox: HitboxCache,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Playing,
            player_y: GROUND_Y,
            player_vy: 0.0,
            grounded: true,
            posture: Posture::Standing,
            obstacles: Vec::new(),
            spawn_timer: 0,
            fire_breath_ticks: 0,
            hitbox: HitboxCache::default(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Back to the initial state of this run, RNG included
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Player rectangle for the current posture, through the cache
    pub fn player_hitbox(&mut self) -> Rect {
        self.hitbox.resolve(self.posture, PLAYER_X, self.player_y)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
