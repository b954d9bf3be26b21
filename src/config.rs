use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::error::ConfigError;

/// Tunables for the war lifecycle. Windows are counted in scheduler ticks
/// (one tick per `tick_period_ms`, one second by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarSettings {
    #[serde(default = "default_join_time")]
    pub join_time_secs: u32,
    #[serde(default = "default_ready_time")]
    pub ready_time_secs: u32,
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    #[serde(default)]
    pub max_players: Option<usize>,
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
}

fn default_join_time() -> u32 {
    60
}

fn default_ready_time() -> u32 {
    10
}

fn default_min_players() -> usize {
    1
}

fn default_tick_period_ms() -> u64 {
    1000
}

impl Default for WarSettings {
    fn default() -> Self {
        WarSettings {
            join_time_secs: default_join_time(),
            ready_time_secs: default_ready_time(),
            min_players: default_min_players(),
            max_players: None,
            tick_period_ms: default_tick_period_ms(),
        }
    }
}

impl WarSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: WarSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.join_time_secs == 0 {
            return Err(ConfigError::Invalid { field: "join_time_secs", reason: "must be at least 1".to_string() });
        }
        if self.ready_time_secs == 0 {
            return Err(ConfigError::Invalid { field: "ready_time_secs", reason: "must be at least 1".to_string() });
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid { field: "tick_period_ms", reason: "must be at least 1".to_string() });
        }
        if let Some(max) = self.max_players {
            if max < self.min_players {
                return Err(ConfigError::Invalid {
                    field: "max_players",
                    reason: format!("{} is below min_players ({})", max, self.min_players),
                });
            }
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}
