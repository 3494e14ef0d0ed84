use serde::{Deserialize, Serialize};

use crate::game_trait::PlayerId;
use crate::host::RoundResults;
use crate::player::Player;

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Host
    Action = 0x01,

    // Host -> Client
    GameState = 0x10,
    GameStart = 0x13,
    RoundEnd = 0x14,
    GameEnd = 0x15,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Action),
            0x10 => Some(Self::GameState),
            0x13 => Some(Self::GameStart),
            0x14 => Some(Self::RoundEnd),
            0x15 => Some(Self::GameEnd),
            _ => None,
        }
    }
}

/// Messages a client sends to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Action(ActionMsg),
}

/// Messages the host sends to every client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    GameStart(GameStartMsg),
    GameState(GameStateMsg),
    RoundEnd(RoundEndMsg),
    GameEnd(GameEndMsg),
}

/// An encoded game action from one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMsg {
    pub player_id: PlayerId,
    pub data: Vec<u8>,
}

/// A new round has been set up for this roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStartMsg {
    /// `protocol::PROTOCOL_VERSION` of the sending host.
    pub protocol_version: u8,
    pub game_name: String,
    pub round: u8,
    pub players: Vec<Player>,
}

/// Authoritative state snapshot for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateMsg {
    pub tick: u32,
    pub state_data: Vec<u8>,
}

/// Winner report for a finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEndMsg {
    pub round: u8,
    pub results: RoundResults,
}

/// The session is over; no further state follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEndMsg {
    pub rounds_played: u8,
}
