use dinodash_core::game_trait::PlayerId;
use dinodash_core::time::Millis;

use crate::actions::RunnerAction;
use crate::config::RunnerConfig;
use crate::physics::cell_index;
use crate::state::{GameState, Items, Runner};
use crate::stride::{Foot, StrideModel};

/// Drives one seat: readies up, strides at a steady cadence and jumps
/// ahead of ground obstacles and gaps.
#[derive(Debug, Clone)]
pub struct BotDriver {
    player_id: PlayerId,
    stride: StrideModel,
    next_foot: Foot,
    next_step_at: Millis,
}

impl BotDriver {
    pub fn new(player_id: PlayerId, config: &RunnerConfig) -> Self {
        Self {
            player_id,
            stride: StrideModel::new(config.stride.clone(), config.physics.knockback_vx),
            next_foot: Foot::Right,
            next_step_at: 0,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Actions to submit for the snapshot `state` observed at `now`.
    pub fn drive(&mut self, state: &GameState, now: Millis, config: &RunnerConfig) -> Vec<RunnerAction> {
        let Some(runner) = state.players.get(&self.player_id) else {
            return Vec::new();
        };
        if runner.dead {
            return Vec::new();
        }
        if !runner.ready {
            return vec![RunnerAction::Ready];
        }
        if !state.race_started(now) || state.game_over {
            return Vec::new();
        }

        self.stride.observe_events(&state.events, self.player_id);
        if now >= self.next_step_at {
            if self.stride.step(self.next_foot, now) {
                self.next_foot = self.next_foot.other();
            }
            self.next_step_at = now + config.bot.step_interval_ms;
        }
        self.stride.frame(now);

        let mut actions = Vec::new();
        if let Some(speed) = self.stride.poll_send(now) {
            actions.push(RunnerAction::Speed { speed });
        }
        if should_jump(runner, &state.items, config) {
            actions.push(RunnerAction::Jump);
        }
        actions
    }
}

/// Whether a grounded runner is about to reach a hazard it must clear.
pub fn should_jump(runner: &Runner, items: &Items, config: &RunnerConfig) -> bool {
    if !runner.on_ground() || runner.vy != 0.0 {
        return false;
    }
    let travel = runner.vx / 2.0;
    if travel <= 0.0 {
        return false;
    }
    let cell_size = config.physics.cell_size;
    let cell = cell_index(runner.x, cell_size);
    let lead = travel * config.bot.jump_lead_ticks;

    (1..=config.bot.lookahead_cells).any(|offset| {
        let Some(&item) = items.get(&(cell + offset)) else {
            return false;
        };
        // Gaps swallow grounded runners from a few cells before their own.
        let danger_cell = if item.is_gap() {
            cell + offset - (item.gap_reach() - 1)
        } else if item.is_ground_obstacle() {
            cell + offset
        } else {
            return false;
        };
        danger_cell as f32 * cell_size - runner.x <= lead
    })
}
