pub mod config;
pub mod game_loop;
pub mod host;

use dinodash_core::game_trait::PlayerId;
use dinodash_core::player::Player;

/// Roster of `bots` bot players with ids starting at 1.
pub fn bot_roster(bots: u8) -> Vec<Player> {
    (1..=bots as PlayerId).map(Player::bot).collect()
}
