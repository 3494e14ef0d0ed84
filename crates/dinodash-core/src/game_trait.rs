use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::host::{RoundHost, RoundResults};
use crate::player::Player;

/// Unique identifier for a player in the game.
pub type PlayerId = u64;

/// Core trait that every Dino Dash round implementation must satisfy.
///
/// The host owns the clock, the tick cadence and action ordering; the game
/// only owns its state. Every entry point receives the host explicitly so
/// nothing inside a game reads ambient globals.
pub trait RoundGame: Send + Sync {
    /// Game metadata for the session lobby.
    fn metadata(&self) -> GameMetadata;

    /// Simulation tick rate in Hz.
    fn tick_rate(&self) -> f32 {
        30.0
    }

    /// Build a fresh round for a fixed roster. The roster may not change
    /// until the next `setup`.
    fn setup(&mut self, players: &[Player], config: &GameConfig, host: &dyn RoundHost);

    /// Advance the authoritative state by exactly one tick.
    fn tick(&mut self, host: &mut dyn RoundHost) -> Vec<RoundEvent>;

    /// Apply one encoded player action atomically between ticks.
    /// Invalid payloads and failed preconditions are silent no-ops.
    fn apply_action(&mut self, player_id: PlayerId, payload: &[u8], host: &dyn RoundHost);

    /// Ask for a new round on the same roster. The next `tick` performs it.
    fn request_restart(&mut self);

    /// Serialize the authoritative state for broadcast.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace local state with an authoritative snapshot.
    fn apply_state(&mut self, state: &[u8]);

    /// Whether the winner report for this round has fired.
    fn is_round_complete(&self) -> bool;

    /// Win/loss classification at the current instant.
    fn round_results(&self) -> RoundResults;
}

/// Game metadata for the session lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub min_players: u8,
    pub max_players: u8,
    pub estimated_round_duration: Duration,
}

impl GameMetadata {
    /// Whether a roster of `count` players can be seated.
    pub fn accepts_roster(&self, count: usize) -> bool {
        (self.min_players as usize..=self.max_players as usize).contains(&count)
    }
}

/// Configuration for a round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed shared by every replica so track generation agrees.
    pub seed: u64,
    pub custom: HashMap<String, String>,
}

/// Session-level notifications produced by a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoundEvent {
    /// Everyone is ready and the start countdown has been scheduled.
    Started { starts_at: u64 },
    GameOver { reason: String },
    ResultReported(RoundResults),
    Restarted,
}

/// Generates the `RoundGame` methods that are identical across games:
/// `serialize_state`, `apply_state`, `is_round_complete`.
///
/// Requires the implementing struct to have a `state: $StateType` field,
/// and `$StateType` to have a `winner_reported: bool` field.
#[macro_export]
macro_rules! round_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("game state serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            if let Ok(s) = rmp_serde::from_slice::<$StateType>(state) {
                self.state = s;
            }
        }

        fn is_round_complete(&self) -> bool {
            self.state.winner_reported
        }
    };
}
