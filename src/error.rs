//! Error types for `GridClash`
//!
//! Top-level error hierarchy with exit-code mapping, configuration errors
//! that carry every validation issue found, transport errors, and the typed
//! reasons a submitted move can be rejected.

use std::path::PathBuf;
use thiserror::Error;

use crate::game::board::Team;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `GridClash` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Transport error (bind failed, listener crashed)
    pub const TRANSPORT_ERROR: i32 = 4;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `GridClash` operations.
///
/// Aggregates the domain-specific errors and maps each to an exit code.
#[derive(Debug, Error)]
pub enum GridClashError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport layer error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridClashError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Transport(_) => ExitCode::TRANSPORT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", format_issues(.errors))]
    ValidationError {
        /// Path to the configuration file (or `<cli>` for flag overrides)
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set ({message})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied with the `${VAR:?message}` form
        message: String,
    },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Dotted path to the problematic field (e.g., "board.size")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An outbound event could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to bind the listener
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer went away while events were being written
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}

// ============================================================================
// Move Rejections
// ============================================================================

/// Reason a submitted move was not accepted.
///
/// Rejections never reach the board. The engine logs them and the
/// transport reports them back to the submitting connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveRejection {
    /// No session exists under the given key
    #[error("session '{0}' does not exist")]
    SessionNotFound(String),

    /// The session is paused; moves are rejected rather than queued
    #[error("session is paused")]
    Paused,

    /// The connection has not joined this session
    #[error("connection is not a player in this session")]
    UnknownPlayer,

    /// The move's declared team differs from the player's team
    #[error("move declares team {declared} but player is on team {assigned}")]
    TeamMismatch {
        /// Team named in the move
        declared: Team,
        /// Team the player joined with
        assigned: Team,
    },

    /// A coordinate lies outside the board
    #[error("coordinate ({row}, {col}) is outside the board")]
    OutOfBounds {
        /// Offending row
        row: usize,
        /// Offending column
        col: usize,
    },

    /// Source or destination is unclaimed, non-spawn territory
    #[error("cell ({row}, {col}) is inert territory")]
    InertCell {
        /// Offending row
        row: usize,
        /// Offending column
        col: usize,
    },
}

impl MoveRejection {
    /// Stable label for metrics and wire payloads.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::Paused => "paused",
            Self::UnknownPlayer => "unknown_player",
            Self::TeamMismatch { .. } => "team_mismatch",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::InertCell { .. } => "inert_cell",
        }
    }
}
