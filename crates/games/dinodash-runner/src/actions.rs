use serde::{Deserialize, Serialize};

use dinodash_core::game_trait::PlayerId;
use dinodash_core::time::{Millis, elapsed_since};

use crate::config::RunnerConfig;
use crate::state::GameState;

/// An action a player can submit between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunnerAction {
    /// Replace horizontal velocity with an accumulated stride speed.
    Speed { speed: f32 },
    Jump,
    Ready,
}

impl RunnerAction {
    pub fn encode(&self) -> Vec<u8> {
        rmp_serde::to_vec(self).expect("runner action serialization must succeed")
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        rmp_serde::from_slice(data).ok()
    }
}

/// Apply one action for `player_id`. Returns whether state changed.
///
/// Every precondition failure is a silent no-op: unknown player, wrong
/// phase, dead runner or knockback cooldown.
pub fn apply_action(
    state: &mut GameState,
    player_id: PlayerId,
    action: RunnerAction,
    now: Millis,
    config: &RunnerConfig,
) -> bool {
    match action {
        RunnerAction::Speed { speed } => set_speed(state, player_id, speed, now, config),
        RunnerAction::Jump => jump(state, player_id, now, config),
        RunnerAction::Ready => mark_ready(state, player_id),
    }
}

/// Set a runner's horizontal velocity.
///
/// Rejected before the race starts, for dead runners, for non-finite
/// values, and until strictly more than the cooldown has passed since the
/// last knockback.
pub fn set_speed(
    state: &mut GameState,
    player_id: PlayerId,
    speed: f32,
    now: Millis,
    config: &RunnerConfig,
) -> bool {
    if !state.race_started(now) || !speed.is_finite() {
        return false;
    }
    let Some(runner) = state.players.get_mut(&player_id) else {
        return false;
    };
    if runner.dead
        || elapsed_since(now, runner.last_bounce_at) <= config.timing.bounce_cooldown_ms
    {
        return false;
    }
    runner.vx = speed;
    true
}

/// Start a jump for a runner standing still on the ground. No double jumps.
pub fn jump(state: &mut GameState, player_id: PlayerId, now: Millis, config: &RunnerConfig) -> bool {
    if !state.race_started(now) {
        return false;
    }
    let Some(runner) = state.players.get_mut(&player_id) else {
        return false;
    };
    if runner.dead || !runner.on_ground() || runner.vy != 0.0 {
        return false;
    }
    runner.vy = config.physics.jump_velocity;
    true
}

/// Opt in to the round. Irreversible until the next restart.
pub fn mark_ready(state: &mut GameState, player_id: PlayerId) -> bool {
    match state.players.get_mut(&player_id) {
        Some(runner) if !runner.dead && !runner.ready => {
            runner.ready = true;
            true
        },
        _ => false,
    }
}
