use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a Dino Dash session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub max_players: u8,
    pub round_count: u8,
    pub between_round_duration: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            round_count: 1,
            between_round_duration: Duration::from_secs(5),
        }
    }
}

/// Current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Lobby,
    InGame,
    BetweenRounds,
    Finished,
}
