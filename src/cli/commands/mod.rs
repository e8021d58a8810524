//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler loads what it needs (configuration, schemas), calls into
//! the library and formats the result. Errors are returned as `anyhow`
//! errors with context and printed by `main`.

mod serve;
mod validate;

pub use serve::serve;
pub use validate::validate;

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::args::Command;

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command) -> Result<ExitCode> {
    match command {
        Command::Serve { config, bind } => {
            serve::serve(config.as_deref(), bind.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { kind, file, config } => {
            let passed = validate::validate(kind.into(), &file, config.as_deref()).await?;
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
