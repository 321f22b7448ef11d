//! `GridClash` - real-time multiplayer territory game server

use clap::Parser;
use tokio_util::sync::CancellationToken;

use gridclash::cli::args::Cli;
use gridclash::cli::commands;
use gridclash::error::ExitCode;
use gridclash::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    let result = commands::dispatch(cli, cancel).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Cancels `cancel` on the first Ctrl+C or SIGTERM and exits on the second.
async fn shutdown_on_signal(cancel: CancellationToken) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                eprintln!("error: failed to register SIGTERM handler: {e}");
                std::process::exit(ExitCode::ERROR);
            }
        };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }

    eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
    cancel.cancel();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
        _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
    }
}
