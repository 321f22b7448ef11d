//! Configuration validation.
//!
//! Validation runs on the fully assembled [`EngineConfig`] and collects ALL
//! issues rather than stopping at the first one.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{Severity, ValidationIssue};

/// Smallest board that still has four distinct corners and room for spawns.
pub const MIN_BOARD_SIZE: usize = 4;

/// Largest board accepted. Full snapshots are broadcast every tick.
pub const MAX_BOARD_SIZE: usize = 256;

/// Tick periods below this are accepted with a warning.
const FAST_TICK_WARNING: Duration = Duration::from_millis(50);

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent startup).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &EngineConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_board(config);
        self.validate_timing(config);
        self.validate_server(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_board(&mut self, config: &EngineConfig) {
        let board = &config.board;
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board.size) {
            self.error(
                "board.size",
                format!(
                    "board size {} is outside {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}",
                    board.size
                ),
            );
        }
        self.check_unit_interval("board.spawn_ratio", board.spawn_ratio);
        self.check_unit_interval(
            "board.center_block_probability",
            board.center_block_probability,
        );
        self.check_unit_interval(
            "board.edge_midpoint_probability",
            board.edge_midpoint_probability,
        );
    }

    fn validate_timing(&mut self, config: &EngineConfig) {
        let timing = &config.timing;
        if timing.tick_interval.is_zero() {
            self.error("timing.tick_interval", "tick interval must be non-zero");
        } else if timing.tick_interval < FAST_TICK_WARNING {
            self.warning(
                "timing.tick_interval",
                format!(
                    "tick interval {:?} broadcasts full state very frequently",
                    timing.tick_interval
                ),
            );
        }
        if timing.time_per_cell.is_zero() {
            self.error("timing.time_per_cell", "time per cell must be non-zero");
        }
    }

    fn validate_server(&mut self, config: &EngineConfig) {
        if config.server.bind.trim().is_empty() {
            self.error("server.bind", "bind address must not be empty");
        }
        if config.server.metrics_port == Some(0) {
            self.error("server.metrics_port", "metrics port must be non-zero");
        }
    }

    fn check_unit_interval(&mut self, path: &str, value: f64) {
        if !(0.0..=1.0).contains(&value) {
            self.error(path, format!("{value} is outside [0, 1]"));
        }
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let result = Validator::new().validate(&EngineConfig::default());
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn collects_every_error() {
        let mut config = EngineConfig::default();
        config.board.size = 2;
        config.board.spawn_ratio = 1.5;
        config.board.edge_midpoint_probability = -0.1;
        config.timing.tick_interval = Duration::ZERO;
        config.timing.time_per_cell = Duration::ZERO;
        config.server.bind = "  ".to_string();

        let result = Validator::new().validate(&config);
        assert!(result.has_errors());
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "board.size",
                "board.spawn_ratio",
                "board.edge_midpoint_probability",
                "timing.tick_interval",
                "timing.time_per_cell",
                "server.bind",
            ]
        );
    }

    #[test]
    fn nan_probability_is_rejected() {
        let mut config = EngineConfig::default();
        config.board.center_block_probability = f64::NAN;
        let result = Validator::new().validate(&config);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn very_fast_tick_is_a_warning() {
        let mut config = EngineConfig::default();
        config.timing.tick_interval = Duration::from_millis(10);
        let result = Validator::new().validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn validator_is_reusable() {
        let mut validator = Validator::new();
        let mut bad = EngineConfig::default();
        bad.board.size = 1000;
        assert!(validator.validate(&bad).has_errors());
        assert!(validator.validate(&EngineConfig::default()).is_valid());
    }
}
