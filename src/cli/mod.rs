//! cli
//!
//! Command-line interface layer for foundry-editor.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialise logging
//! - Delegate to command handlers
//!
//! The CLI layer is thin. The web editor itself lives in [`crate::server`].

pub mod args;
pub mod commands;

pub use args::{Cli, Command, DocumentKind};

use std::process::ExitCode;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `debug`. Logs go to stderr so the
/// `validate` report on stdout stays machine-readable.
pub fn init_tracing(debug: bool, json: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug, cli.json_logs);
    commands::dispatch(cli.command).await
}
