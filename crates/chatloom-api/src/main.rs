//! Chatloom CLI and REST API entry point.
//!
//! Binary name: `chatloom`
//!
//! Parses CLI arguments, initializes storage and the session manager, then
//! dispatches to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use chatloom_observe::tracing_setup::{init_tracing, shutdown_tracing};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatloom", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli::log_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Chatloom API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Modes => {
            cli::mode::list_modes(&state, cli.json)?;
        }

        Commands::Threads { user } => {
            cli::thread::list_threads(&state, user, cli.json).await?;
        }

        Commands::Ask {
            message,
            thread,
            mode,
            user,
        } => {
            cli::thread::ask(&state, &message, thread, &mode, user, cli.json).await?;
        }

        Commands::History { thread_id, user } => {
            cli::thread::history(&state, thread_id, user, cli.json).await?;
        }

        Commands::Delete {
            thread_id,
            user,
            force,
        } => {
            cli::thread::delete_thread(&state, thread_id, user, force, cli.json).await?;
        }

        Commands::DeleteAll { user, force } => {
            cli::thread::delete_all(&state, user, force, cli.json).await?;
        }

        Commands::Status { check_provider } => {
            cli::status::status(&state, check_provider, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
