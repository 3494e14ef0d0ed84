use serde::{Deserialize, Serialize};

use crate::game_trait::PlayerId;

/// A player seated in a Dino Dash session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    /// Driven by the host's bot rather than a remote client.
    pub is_bot: bool,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_bot: false,
        }
    }

    pub fn bot(id: PlayerId) -> Self {
        Self {
            id,
            display_name: format!("Bot{id}"),
            is_bot: true,
        }
    }
}
