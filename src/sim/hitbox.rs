//! Axis-aligned rectangles and the player's cached hitbox
//!
//! The player's hitbox shape depends only on posture, so it is cached and
//! rebuilt when posture changes. Position moves every frame and is applied on
//! every lookup.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Posture;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap; touching edges do not collide
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min, self.max());
        let (b_min, b_max) = (other.min, other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }
}

/// Posture-dependent part of the hitbox, relative to the sprite's top-left
#[derive(Debug, Clone, Copy, PartialEq)]
struct HitboxShape {
    offset: Vec2,
    size: Vec2,
}

impl HitboxShape {
    fn for_posture(posture: Posture) -> Self {
        match posture {
            Posture::Standing => Self {
                offset: Vec2::ZERO,
                size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            },
            // Feet stay put, the head drops
            Posture::Squatting => Self {
                offset: Vec2::new(0.0, PLAYER_HEIGHT - PLAYER_SQUAT_HEIGHT),
                size: Vec2::new(PLAYER_WIDTH, PLAYER_SQUAT_HEIGHT),
            },
        }
    }

    fn at(&self, x: f32, y: f32) -> Rect {
        Rect {
            min: Vec2::new(x, y) + self.offset,
            size: self.size,
        }
    }
}

/// Uncached player rectangle, for read-only views
pub fn player_rect(posture: Posture, x: f32, y: f32) -> Rect {
    HitboxShape::for_posture(posture).at(x, y)
}

#[derive(Debug, Clone, Default)]
pub struct HitboxCache {
    cached: Option<(Posture, HitboxShape)>,
    rebuilds: u32,
}

impl HitboxCache {
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn cached_posture(&self) -> Option<Posture> {
        self.cached.map(|(posture, _)| posture)
    }

    /// Number of shape rebuilds since creation
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    /// Rectangle for `posture` at `(x, y)`; the shape is rebuilt if stale
    pub fn resolve(&mut self, posture: Posture, x: f32, y: f32) -> Rect {
        let shape = match self.cached {
            Some((cached, shape)) if cached == posture => shape,
            _ => {
                let shape = HitboxShape::for_posture(posture);
                self.cached = Some((posture, shape));
                self.rebuilds += 1;
                shape
            }
        };
        shape.at(x, y)
    }
}
