//! CLI argument definitions.
//!
//! All Clap derive structs for `gridclash` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Real-time multiplayer territory game server.
#[derive(Parser, Debug)]
#[command(name = "gridclash", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "GRIDCLASH_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "GRIDCLASH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the game server.
    Serve(ServeArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Serve Command
// ============================================================================

/// Arguments for `serve`. Flags override values from `--config`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "GRIDCLASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind HTTP/WebSocket listener on `[host:]port`.
    #[arg(short, long, env = "GRIDCLASH_BIND")]
    pub bind: Option<String>,

    /// Side length of newly created boards.
    #[arg(long, env = "GRIDCLASH_BOARD_SIZE")]
    pub board_size: Option<usize>,

    /// Troop generation period (e.g. `1s`, `500ms`).
    #[arg(long, value_parser = humantime::parse_duration, env = "GRIDCLASH_TICK_INTERVAL")]
    pub tick_interval: Option<Duration>,

    /// Travel time per cell of distance (e.g. `1s`, `250ms`).
    #[arg(long, value_parser = humantime::parse_duration, env = "GRIDCLASH_TIME_PER_CELL")]
    pub time_per_cell: Option<Duration>,

    /// Serve Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "GRIDCLASH_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
