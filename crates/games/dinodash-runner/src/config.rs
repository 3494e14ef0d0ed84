use serde::{Deserialize, Serialize};

use dinodash_core::time::{Millis, secs};

/// Gravity added to an airborne runner's vertical velocity each tick.
pub const GRAVITY: f32 = 1.9;
/// Vertical velocity of a fresh jump (negative is up).
pub const JUMP_VELOCITY: f32 = -10.0;
/// Horizontal velocity forced by a knockback.
pub const KNOCKBACK_VX: f32 = -20.0;
/// Vertical velocity forced by a knockback.
pub const KNOCKBACK_VY: f32 = -10.0;
/// Vertical velocity given to a runner that drops into a gap.
pub const FALL_VY: f32 = 1.0;
/// Width of one track cell in distance units.
pub const CELL_SIZE: f32 = 32.0;

/// Physics constants. All velocities are per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    pub knockback_vx: f32,
    pub knockback_vy: f32,
    pub fall_vy: f32,
    pub cell_size: f32,
    /// A flying obstacle hits runners strictly above this height (`y < flying_hit_below`).
    pub flying_hit_below: f32,
    /// A ground obstacle hits runners strictly below this height (`y > ground_hit_above`).
    pub ground_hit_above: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            knockback_vx: KNOCKBACK_VX,
            knockback_vy: KNOCKBACK_VY,
            fall_vy: FALL_VY,
            cell_size: CELL_SIZE,
            flying_hit_below: -10.0,
            ground_hit_above: -8.0,
        }
    }
}

/// Round-clock windows, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Length of the race. `end_game_at` is kept this far ahead of the clock
    /// until the start countdown completes.
    pub round_duration_ms: Millis,
    /// Countdown between "everyone ready" and the race start.
    pub start_delay_ms: Millis,
    /// Gap between game over and the winner report.
    pub report_delay_ms: Millis,
    /// Speed input is ignored until strictly more than this has elapsed since a knockback.
    pub bounce_cooldown_ms: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            round_duration_ms: secs(60),
            start_delay_ms: secs(4),
            report_delay_ms: secs(1),
            bounce_cooldown_ms: 500,
        }
    }
}

/// Selection weights for generated obstacles. Must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemWeights {
    pub small_cactus: f32,
    pub cactus: f32,
    pub rocks: f32,
    pub flying: f32,
    pub gap: f32,
    pub gap2: f32,
}

impl Default for ItemWeights {
    fn default() -> Self {
        Self {
            small_cactus: 0.15,
            cactus: 0.15,
            rocks: 0.10,
            flying: 0.20,
            gap: 0.20,
            gap2: 0.20,
        }
    }
}

impl ItemWeights {
    pub fn total(&self) -> f32 {
        self.small_cactus + self.cactus + self.rocks + self.flying + self.gap + self.gap2
    }
}

/// Track generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub item_count: usize,
    /// Cursor position before the first step.
    pub start_cell: i64,
    /// Inclusive step range between consecutive items.
    pub min_step: i64,
    pub max_step: i64,
    pub weights: ItemWeights,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            item_count: 500,
            start_cell: 20,
            min_step: 10,
            max_step: 19,
            weights: ItemWeights::default(),
        }
    }
}

/// Starting grid and visual variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// X of the first seated runner.
    pub spawn_x: f32,
    /// Each later runner starts this far behind the previous one.
    pub spawn_spacing: f32,
    pub sprite_variants: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            spawn_x: 100.0,
            spawn_spacing: 20.0,
            sprite_variants: 4,
        }
    }
}

/// Caller-side speed accumulation used by clients and bots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrideConfig {
    /// Speed added by each alternating step.
    pub step_gain: f32,
    /// Per-frame multiplier while moving forward.
    pub forward_decay: f32,
    /// Per-frame multiplier while recoiling from a knockback.
    pub recoil_decay: f32,
    /// Forward speed below this stops once the runner has been idle long enough.
    pub idle_stop_speed: f32,
    pub idle_stop_ms: Millis,
    /// Minimum spacing between speed actions.
    pub send_interval_ms: Millis,
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            step_gain: 1.0,
            forward_decay: 0.995,
            recoil_decay: 0.75,
            idle_stop_speed: 0.1,
            idle_stop_ms: 1_000,
            send_interval_ms: 200,
        }
    }
}

/// Bot driving parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Time between simulated steps.
    pub step_interval_ms: Millis,
    /// Cells scanned ahead for hazards.
    pub lookahead_cells: i64,
    /// Jump when a hazard is this many ticks of travel away.
    pub jump_lead_ticks: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 150,
            lookahead_cells: 4,
            jump_lead_ticks: 3.0,
        }
    }
}

/// Top-level runner configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub track: TrackConfig,
    pub roster: RosterConfig,
    pub stride: StrideConfig,
    pub bot: BotConfig,
}

/// Problems found by [`RunnerConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    WeightsDoNotSumToOne(f32),
    NegativeWeight,
    BadStepRange { min: i64, max: i64 },
    ZeroSpriteVariants,
    NonPositiveCellSize,
    ThresholdsOverlap { flying: f32, ground: f32 },
    StartDelayOutOfRange(Millis),
}

/// Accepted countdown lengths. A zero delay would schedule the start at the
/// unscheduled sentinel when the host clock reads 0.
pub const START_DELAY_RANGE_MS: std::ops::RangeInclusive<Millis> = 3_000..=4_000;

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeightsDoNotSumToOne(total) => {
                write!(f, "item weights sum to {total}, expected 1")
            },
            Self::NegativeWeight => write!(f, "item weights must be non-negative"),
            Self::BadStepRange { min, max } => {
                write!(f, "track step range {min}..={max} is empty or non-positive")
            },
            Self::ZeroSpriteVariants => write!(f, "sprite_variants must be > 0"),
            Self::NonPositiveCellSize => write!(f, "cell_size must be > 0"),
            Self::ThresholdsOverlap { flying, ground } => write!(
                f,
                "flying_hit_below ({flying}) must sit above ground_hit_above ({ground})"
            ),
            Self::StartDelayOutOfRange(ms) => write!(
                f,
                "start_delay_ms {ms} outside {}..={}",
                START_DELAY_RANGE_MS.start(),
                START_DELAY_RANGE_MS.end()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RunnerConfig {
    /// Load config from `DINODASH_RUNNER_CONFIG` or `config/runner.toml`.
    /// Falls back to defaults if the file is missing, unparseable or invalid.
    pub fn load() -> Self {
        let path = std::env::var("DINODASH_RUNNER_CONFIG")
            .unwrap_or_else(|_| "config/runner.toml".to_string());
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match Self::from_toml(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Failed to load {path}: {e}, using defaults");
                Self::default()
            },
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.track.weights;
        if [w.small_cactus, w.cactus, w.rocks, w.flying, w.gap, w.gap2]
            .iter()
            .any(|&v| v < 0.0)
        {
            return Err(ConfigError::NegativeWeight);
        }
        let total = w.total();
        if (total - 1.0).abs() > 1e-4 {
            return Err(ConfigError::WeightsDoNotSumToOne(total));
        }
        if self.track.min_step <= 0 || self.track.min_step > self.track.max_step {
            return Err(ConfigError::BadStepRange {
                min: self.track.min_step,
                max: self.track.max_step,
            });
        }
        if self.roster.sprite_variants == 0 {
            return Err(ConfigError::ZeroSpriteVariants);
        }
        if self.physics.cell_size <= 0.0 {
            return Err(ConfigError::NonPositiveCellSize);
        }
        if self.physics.flying_hit_below > self.physics.ground_hit_above {
            return Err(ConfigError::ThresholdsOverlap {
                flying: self.physics.flying_hit_below,
                ground: self.physics.ground_hit_above,
            });
        }
        if !START_DELAY_RANGE_MS.contains(&self.timing.start_delay_ms) {
            return Err(ConfigError::StartDelayOutOfRange(self.timing.start_delay_ms));
        }
        Ok(())
    }
}
