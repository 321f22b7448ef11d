//! Engine configuration.
//!
//! Configuration is assembled from built-in defaults, an optional YAML file
//! (see [`loader`]), and command-line overrides, then checked by
//! [`validation::Validator`] before the server starts.

pub mod loader;
pub mod validation;

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::game::board::{Coord, GenerationParams};

pub use loader::{ConfigLoader, LoadResult, LoadWarning};
pub use validation::{ValidationResult, Validator};

/// Default bind address for the HTTP/WebSocket listener.
pub const DEFAULT_BIND: &str = "0.0.0.0:5001";

/// Default troop-generation period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default travel time for one cell of distance.
pub const DEFAULT_TIME_PER_CELL: Duration = Duration::from_secs(1);

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Board generation tunables.
    pub board: GenerationParams,
    /// Tick and travel timing.
    pub timing: TimingConfig,
    /// Listener settings.
    pub server: ServerSettings,
}

/// Tick period and move travel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Period of the troop-generation ticker.
    #[serde(deserialize_with = "deserialize_duration")]
    pub tick_interval: Duration,
    /// Travel time per cell of Euclidean distance.
    #[serde(deserialize_with = "deserialize_duration")]
    pub time_per_cell: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            time_per_cell: DEFAULT_TIME_PER_CELL,
        }
    }
}

impl TimingConfig {
    /// Travel time between two cells: distance × time per cell.
    #[must_use]
    pub fn travel_time(&self, from: Coord, to: Coord) -> Duration {
        self.time_per_cell.mul_f64(from.distance_to(to))
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to bind, `host:port`, `:port` or `port`.
    pub bind: String,
    /// Port for the Prometheus exporter; disabled when unset.
    pub metrics_port: Option<u16>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            metrics_port: None,
        }
    }
}

/// Accepts human-readable durations such as `"1s"`, `"250ms"` or `"1m 30s"`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_time_scales_with_distance() {
        let timing = TimingConfig::default();
        assert_eq!(
            timing.travel_time(Coord::new(0, 0), Coord::new(0, 3)),
            Duration::from_secs(3)
        );
        assert_eq!(
            timing.travel_time(Coord::new(0, 0), Coord::new(3, 4)),
            Duration::from_secs(5)
        );
        assert_eq!(
            timing.travel_time(Coord::new(2, 2), Coord::new(2, 2)),
            Duration::ZERO
        );
    }

    #[test]
    fn travel_time_uses_configured_unit() {
        let timing = TimingConfig {
            time_per_cell: Duration::from_millis(200),
            ..TimingConfig::default()
        };
        assert_eq!(
            timing.travel_time(Coord::new(0, 0), Coord::new(3, 4)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: EngineConfig = serde_yaml::from_str(
            "board:\n  size: 20\ntiming:\n  tick_interval: 500ms\n",
        )
        .unwrap();
        assert_eq!(config.board.size, 20);
        assert!((config.board.spawn_ratio - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.timing.tick_interval, Duration::from_millis(500));
        assert_eq!(config.timing.time_per_cell, DEFAULT_TIME_PER_CELL);
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_durations() {
        assert!(serde_yaml::from_str::<EngineConfig>("boards: {}\n").is_err());
        assert!(
            serde_yaml::from_str::<EngineConfig>("timing:\n  tick_interval: soon\n").is_err()
        );
    }
}
