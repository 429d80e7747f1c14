//! rollcall.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    pub server: ServerConfig,
    pub heartbeat: HeartbeatConfig,
    pub floor: FloorConfig,
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// How long a server counts as alive after its last checkin.
    pub ttl: String,
    /// How often expired entries are physically removed.
    pub reap_interval: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ttl: "5m".to_string(),
            reap_interval: "1m".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    /// Snapshots retained per component.
    pub history_capacity: usize,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Tick period.
    pub interval: String,
    /// Upper bound on a single sink call.
    pub sink_timeout: String,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            interval: "1m".to_string(),
            sink_timeout: "10s".to_string(),
        }
    }
}

impl RollcallConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: RollcallConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every duration parses and every bound is non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        self.heartbeat_ttl()?;
        self.reap_interval()?;
        self.tick_interval()?;
        self.sink_timeout()?;
        if self.floor.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "floor.history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn heartbeat_ttl(&self) -> ConfigResult<Duration> {
        non_zero_duration("heartbeat.ttl", &self.heartbeat.ttl)
    }

    pub fn reap_interval(&self) -> ConfigResult<Duration> {
        non_zero_duration("heartbeat.reap_interval", &self.heartbeat.reap_interval)
    }

    pub fn tick_interval(&self) -> ConfigResult<Duration> {
        non_zero_duration("evaluator.interval", &self.evaluator.interval)
    }

    pub fn sink_timeout(&self) -> ConfigResult<Duration> {
        non_zero_duration("evaluator.sink_timeout", &self.evaluator.sink_timeout)
    }
}

/// Longest duration any setting may take.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn non_zero_duration(field: &'static str, value: &str) -> ConfigResult<Duration> {
    match parse_duration(value) {
        Some(d) if !d.is_zero() && d <= MAX_DURATION => Ok(d),
        _ => Err(ConfigError::Duration {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "1h".
///
/// A bare number is taken as seconds. Values that overflow are `None`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
