use serde::{Deserialize, Serialize};
use std::{ops::Range, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String)
}

/// Algorithm tunables. Read once at start-up and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Oldest match considered when building a sample from scratch (unix seconds)
    pub min_date: i64,
    /// End of the sampling window (unix seconds). Newer matches form the
    /// "current window" used for backfill and eviction.
    pub max_date: i64,
    pub games_min_solo: usize,
    pub games_min_total: usize,
    pub games_max_total: usize,
    pub games_min_tier: usize,

    pub scaling_log: f64,
    pub flat_log: f64,
    pub power_log: f64,
    pub scaling_pond_max: f64,
    pub threshold_pond_max: f64,
    pub scaling_per_solo_min: f64,
    pub flat_per_solo_scaling: f64,
    pub scaling_winrate: f64,
    pub power_delta_winrate: f64,
    pub scaling_tier_power: f64,
    pub power_distier_min: f64,
    pub flat_distier_power: f64,
    pub scaling_distier_min: f64,
    pub flat_distier_scaling: f64,
    pub scaling_distier_dir: f64,

    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub retry: RetryPolicy
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Config::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.games_min_total == 0 {
            return Err(ConfigError::Invalid("games_min_total must be positive".to_string()));
        }
        if self.games_min_solo > self.games_min_total {
            return Err(ConfigError::Invalid(format!(
                "games_min_solo ({}) exceeds games_min_total ({})",
                self.games_min_solo, self.games_min_total
            )));
        }
        if self.games_min_total > self.games_max_total {
            return Err(ConfigError::Invalid(format!(
                "games_min_total ({}) exceeds games_max_total ({})",
                self.games_min_total, self.games_max_total
            )));
        }
        if self.min_date > self.max_date {
            return Err(ConfigError::Invalid("min_date is after max_date".to_string()));
        }
        if self.pacing.batch_size == 0 || self.pacing.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid("batch size and concurrency must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be positive".to_string()));
        }

        Ok(())
    }
}

/// Delays and limits used to stay polite with the remote service.
/// Ranges are uniform random draws in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub page_delay_ms: Range<u64>,
    pub launch_jitter_ms: Range<u64>,
    pub reverify_launch_delay_ms: u64,
    pub opponent_launch_delay_ms: u64,
    pub batch_delay_ms: u64,
    pub player_delay_ms: u64,
    pub idle_delay_ms: u64,
    pub batch_size: usize,
    pub max_concurrent_fetches: usize
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig {
            page_delay_ms: 200..400,
            launch_jitter_ms: 333..667,
            reverify_launch_delay_ms: 50,
            opponent_launch_delay_ms: 200,
            batch_delay_ms: 5_000,
            player_delay_ms: 15_000,
            idle_delay_ms: 150_000,
            batch_size: 50,
            max_concurrent_fetches: 10
        }
    }
}

impl PacingConfig {
    /// No waiting at all, for tests and dry runs.
    pub fn immediate() -> PacingConfig {
        PacingConfig {
            page_delay_ms: 0..0,
            launch_jitter_ms: 0..0,
            reverify_launch_delay_ms: 0,
            opponent_launch_delay_ms: 0,
            batch_delay_ms: 0,
            player_delay_ms: 0,
            idle_delay_ms: 0,
            ..PacingConfig::default()
        }
    }

    pub fn page_delay(&self) -> Duration {
        random_duration(&self.page_delay_ms)
    }

    pub fn launch_jitter(&self) -> Duration {
        random_duration(&self.launch_jitter_ms)
    }
}

/// Backoff policy of the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// First backoff delay, drawn once per request
    pub initial_delay_ms: Range<u64>,
    pub max_attempts: u32
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            initial_delay_ms: 2_500..5_000,
            max_attempts: 5
        }
    }
}

impl RetryPolicy {
    pub fn initial_delay(&self) -> Duration {
        random_duration(&self.initial_delay_ms)
    }
}

/// Uniform draw from `range`; an empty range yields its start.
pub fn random_duration(range: &Range<u64>) -> Duration {
    use rand::Rng;

    if range.is_empty() {
        return Duration::from_millis(range.start);
    }

    Duration::from_millis(rand::rng().random_range(range.clone()))
}
