use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game_trait::PlayerId;
use crate::time::Millis;

/// Services a session host provides to a running round.
///
/// Every replica must observe the same `now()` for the same tick; the host
/// is responsible for that, the game only reads it.
pub trait RoundHost {
    /// Monotonic round clock in milliseconds.
    fn now(&self) -> Millis;

    /// Hand the final classification to the session. Called once per round.
    fn report_result(&mut self, results: &RoundResults);
}

/// Final classification of a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Won,
    Lost,
}

/// Per-player outcomes for one round, ordered by player id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResults(pub BTreeMap<PlayerId, Outcome>);

impl RoundResults {
    pub fn outcome(&self, player_id: PlayerId) -> Option<Outcome> {
        self.0.get(&player_id).copied()
    }

    /// Players marked `Won`, in id order.
    pub fn winners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.0
            .iter()
            .filter(|&(_, &o)| o == Outcome::Won)
            .map(|(&id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PlayerId, Outcome)> for RoundResults {
    fn from_iter<I: IntoIterator<Item = (PlayerId, Outcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
