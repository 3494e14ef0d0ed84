use dinodash_core::game_trait::PlayerId;
use dinodash_core::host::{Outcome, RoundResults};
use dinodash_core::time::Millis;

use crate::config::TimingConfig;
use crate::state::GameState;

pub const REASON_ALL_OUT: &str = "All out!";
pub const REASON_TIME_OVER: &str = "Time over!";

/// Why the round should end at `now`, if it should.
///
/// The clock running out takes precedence when both conditions hold.
pub fn terminal_reason(state: &GameState, now: Millis) -> Option<&'static str> {
    if now >= state.end_game_at {
        Some(REASON_TIME_OVER)
    } else if state.all_dead() {
        Some(REASON_ALL_OUT)
    } else {
        None
    }
}

/// Flag game over if a terminal condition holds. Returns the reason when
/// the flag flips on this call.
pub fn check_game_over(
    state: &mut GameState,
    now: Millis,
    timing: &TimingConfig,
) -> Option<&'static str> {
    if state.game_over {
        return None;
    }
    let reason = terminal_reason(state, now)?;
    state.game_over = true;
    state.game_over_reason = reason.to_string();
    state.report_winner_at = now + timing.report_delay_ms;
    Some(reason)
}

/// Runner with the greatest `x`. Ties go to the lowest id.
pub fn winner(state: &GameState) -> Option<PlayerId> {
    let mut best: Option<(PlayerId, f32)> = None;
    for runner in state.players.values() {
        match best {
            Some((_, x)) if runner.x <= x => {},
            _ => best = Some((runner.id, runner.x)),
        }
    }
    best.map(|(id, _)| id)
}

/// Won/lost classification for every runner.
pub fn classify(state: &GameState) -> RoundResults {
    let winner = winner(state);
    state
        .players
        .keys()
        .map(|&id| {
            let outcome = if Some(id) == winner {
                Outcome::Won
            } else {
                Outcome::Lost
            };
            (id, outcome)
        })
        .collect()
}
