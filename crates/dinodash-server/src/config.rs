use std::time::Duration;

use serde::Deserialize;

use dinodash_core::room::RoomConfig;

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Top-level server configuration, loaded from `dinodash.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bot runners seated in every session.
    pub bots: u8,
    /// Track seed. Drawn at startup when unset.
    pub seed: Option<u64>,
    pub rounds: u8,
    pub between_round_secs: u64,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bots: 4,
            seed: None,
            rounds: 3,
            between_round_secs: 5,
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoPlayers,
    TooManyPlayers { count: u8, max: u8 },
    NoRounds,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPlayers => write!(f, "bots must be > 0"),
            Self::TooManyPlayers { count, max } => {
                write!(f, "{count} players configured, at most {max} fit on the track")
            },
            Self::NoRounds => write!(f, "rounds must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Check the config against the session limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = RoomConfig::default().max_players;
        if self.bots == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if self.bots > max {
            return Err(ConfigError::TooManyPlayers {
                count: self.bots,
                max,
            });
        }
        if self.rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        Ok(())
    }

    /// Session settings derived from this config.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            round_count: self.rounds,
            between_round_duration: Duration::from_secs(self.between_round_secs),
            ..RoomConfig::default()
        }
    }

    /// Load config from `dinodash.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("dinodash.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from dinodash.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse dinodash.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No dinodash.toml found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("DINODASH_BOTS")
            && let Ok(n) = val.parse::<u8>()
        {
            self.bots = n;
        }
        if let Some(val) = var("DINODASH_SEED")
            && let Ok(n) = val.parse::<u64>()
        {
            self.seed = Some(n);
        }
        if let Some(val) = var("DINODASH_ROUNDS")
            && let Ok(n) = val.parse::<u8>()
        {
            self.rounds = n;
        }
        if let Some(val) = var("DINODASH_BETWEEN_ROUND_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.between_round_secs = n;
        }
        if let Some(val) = var("DINODASH_LOG_FORMAT") {
            match val.as_str() {
                "json" => self.log_format = LogFormat::Json,
                "pretty" => self.log_format = LogFormat::Pretty,
                other => tracing::warn!(value = other, "Unknown DINODASH_LOG_FORMAT, ignoring"),
            }
        }
    }
}
