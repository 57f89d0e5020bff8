//! Fixed timestep simulation tick
//!
//! Advances the game by one frame from one fused `InputState`.

use rand::Rng;

use super::state::{GameEvent, GamePhase, GameState, Obstacle, ObstacleKind, Posture};
use crate::consts::*;
use crate::input::InputState;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &InputState, dt: f32) {
    // Game over: nothing moves until a restart trigger
    if state.phase == GamePhase::GameOver {
        if input.jump_edge || input.restart {
            state.reset();
            state.events.push(GameEvent::Restarted);
        }
        return;
    }

    state.time_ticks += 1;
    // Constants are tuned per frame; scale if a caller steps with another dt
    let k = dt / SIM_DT;

    // Posture follows the fused squat decision
    let posture = if input.squat_active {
        Posture::Squatting
    } else {
        Posture::Standing
    };
    if posture != state.posture {
        state.posture = posture;
        state.hitbox.invalidate();
    }

    if input.jump_edge && state.grounded && state.posture == Posture::Standing {
        state.player_vy = JUMP_POWER;
        state.grounded = false;
        state.events.push(GameEvent::Jumped);
    }

    if input.voice_active {
        state.fire_breath_ticks = FIRE_BREATH_TICKS;
        state.events.push(GameEvent::FireBreath);
    } else {
        state.fire_breath_ticks = state.fire_breath_ticks.saturating_sub(1);
    }

    state.player_vy += GRAVITY * k;
    state.player_y += state.player_vy * k;
    if state.player_y >= GROUND_Y {
        state.player_y = GROUND_Y;
        state.player_vy = 0.0;
        state.grounded = true;
    }

    state.spawn_timer += 1;
    if state.spawn_timer >= SPAWN_INTERVAL {
        spawn_obstacle(state);
        state.spawn_timer = 0;
    }

    for obstacle in &mut state.obstacles {
        obstacle.advance(OBSTACLE_SPEED * k);
    }
    state.obstacles.retain(|o| !o.off_screen());

    // Resolve after posture and position are final for this frame
    let hitbox = state.player_hitbox();
    if let Some(hit) = state.obstacles.iter().find(|o| o.rect().overlaps(&hitbox)) {
        let obstacle_id = hit.id;
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            obstacle_id,
            time_ticks: state.time_ticks,
        });
    }
}

fn spawn_obstacle(state: &mut GameState) {
    let kind = if state.rng_mut().random_bool(AIR_OBSTACLE_CHANCE) {
        ObstacleKind::Air
    } else {
        ObstacleKind::Ground
    };
    let id = state.next_entity_id();
    state.obstacles.push(Obstacle::spawn(id, kind));
    state.events.push(GameEvent::ObstacleSpawned { id, kind });
}
