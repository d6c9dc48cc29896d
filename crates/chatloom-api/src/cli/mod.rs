//! CLI command definitions and dispatch for the `chatloom` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod mode;
pub mod status;
pub mod thread;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Threaded chat sessions backed by checkpointed conversation flows.
#[derive(Parser)]
#[command(name = "chatloom", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List the chat modes a new thread can use.
    Modes,

    /// List a user's threads, most recently updated first.
    #[command(alias = "ls")]
    Threads {
        /// User id (defaults to `default_user_id` from config.toml).
        #[arg(long, short)]
        user: Option<String>,
    },

    /// Send a message, starting a new thread unless --thread is given.
    Ask {
        /// The message text.
        message: String,

        /// Continue this existing thread.
        #[arg(long, short)]
        thread: Option<Uuid>,

        /// Mode for a new thread (ignored when continuing a thread).
        #[arg(long, short, default_value = "qna")]
        mode: String,

        #[arg(long, short)]
        user: Option<String>,
    },

    /// Print the messages of a thread.
    History {
        thread_id: Uuid,

        #[arg(long, short)]
        user: Option<String>,
    },

    /// Delete a single thread.
    #[command(alias = "rm")]
    Delete {
        thread_id: Uuid,

        #[arg(long, short)]
        user: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Delete every thread a user owns.
    DeleteAll {
        #[arg(long, short)]
        user: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and storage status.
    Status {
        /// Send a tiny request to verify the provider key and endpoint.
        #[arg(long)]
        check_provider: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Tracing filter for the given verbosity flags.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,chatloom=debug",
        _ => "trace",
    }
}
