use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dinodash_core::game_trait::PlayerId;
use dinodash_core::time::Millis;

/// Integer index of a track cell: `floor(x / cell_size)`.
pub type CellIndex = i64;

/// Sparse track layout. A missing key is an empty cell.
pub type Items = BTreeMap<CellIndex, Item>;

/// Obstacle kinds that can occupy a track cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    SmallCactus,
    Cactus,
    Rocks,
    Gap,
    Flying,
    /// Double-width gap.
    Gap2,
}

impl Item {
    pub const ALL: [Item; 6] = [
        Item::SmallCactus,
        Item::Cactus,
        Item::Rocks,
        Item::Gap,
        Item::Flying,
        Item::Gap2,
    ];

    pub fn is_gap(self) -> bool {
        matches!(self, Item::Gap | Item::Gap2)
    }

    /// Solid obstacles that sit on the ground and must be jumped.
    pub fn is_ground_obstacle(self) -> bool {
        matches!(self, Item::SmallCactus | Item::Cactus | Item::Rocks)
    }

    /// Number of cells, starting at the runner's own, from which a gap
    /// swallows a grounded runner. Zero for anything that is not a gap.
    pub fn gap_reach(self) -> CellIndex {
        match self {
            Item::Gap => 2,
            Item::Gap2 => 3,
            _ => 0,
        }
    }
}

/// Physical and lobby state of one runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    pub id: PlayerId,
    /// Distance along the track.
    pub x: f32,
    /// Height offset: 0 is the ground, negative is airborne.
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub sprite: u32,
    /// Fell through a gap. Keeps falling, never collides again.
    pub dead: bool,
    pub last_bounce_at: Millis,
    pub ready: bool,
}

impl Runner {
    pub fn new(id: PlayerId, x: f32, sprite: u32) -> Self {
        Self {
            id,
            x,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            sprite,
            dead: false,
            last_bounce_at: 0,
            ready: false,
        }
    }

    pub fn on_ground(&self) -> bool {
        self.y == 0.0
    }

    /// Put the runner back on the start grid. Keeps id and sprite.
    pub fn reset(&mut self, x: f32) {
        *self = Self::new(self.id, x, self.sprite);
    }
}

/// Kind of a transient collision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Hit,
    Died,
}

/// A collision or fall resolved during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub cell_index: CellIndex,
    pub item: Item,
    pub player_id: PlayerId,
    pub kind: EventKind,
}

/// Authoritative round state, replicated every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub players: BTreeMap<PlayerId, Runner>,
    pub items: Items,
    pub next_sprite_index: u32,
    pub end_game_at: Millis,
    /// `0` until every runner is ready.
    pub game_start_at: Millis,
    /// Events of the most recent tick only.
    pub events: Vec<GameEvent>,
    pub game_over: bool,
    pub game_over_reason: String,
    pub report_winner_at: Millis,
    pub winner_reported: bool,
    /// True on the first snapshot of a freshly initialized round.
    pub restart: bool,
}

impl GameState {
    pub fn empty() -> Self {
        Self {
            players: BTreeMap::new(),
            items: Items::new(),
            next_sprite_index: 0,
            end_game_at: 0,
            game_start_at: 0,
            events: Vec::new(),
            game_over: false,
            game_over_reason: String::new(),
            report_winner_at: 0,
            winner_reported: false,
            restart: false,
        }
    }

    pub fn all_ready(&self) -> bool {
        self.players.values().all(|r| r.ready)
    }

    pub fn all_dead(&self) -> bool {
        self.players.values().all(|r| r.dead)
    }

    /// Whether the start countdown has completed at `now`.
    pub fn race_started(&self, now: Millis) -> bool {
        self.game_start_at != 0 && now >= self.game_start_at
    }
}
