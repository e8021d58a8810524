//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--json-logs`: Emit newline-delimited JSON log lines

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::EditorType;

/// foundry-editor - edit PURL configs and registry entries through GitHub pull requests
#[derive(Parser, Debug)]
#[command(name = "foundry-editor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Document family accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentKind {
    /// PURL configuration (YAML)
    Purl,
    /// Registry entry (Markdown with YAML front matter)
    Registry,
}

impl From<DocumentKind> for EditorType {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Purl => EditorType::Purl,
            DocumentKind::Registry => EditorType::Registry,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web editor
    #[command(
        long_about = "Run the web editor.\n\n\
            Loads the configuration, compiles the configured JSON Schemas, fetches the \
            ontology metadata catalog and serves the editor until interrupted. The GitHub \
            OAuth credentials and the session secret must be configured.",
        after_help = "\
EXAMPLES:
    # Serve with the default configuration search path
    foundry-editor serve

    # Serve a specific configuration on all interfaces
    foundry-editor serve --config /etc/foundry-editor.toml --bind 0.0.0.0:8080"
    )]
    Serve {
        /// Configuration file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Listen address, overriding the configured one
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Validate a local document
    #[command(
        long_about = "Validate a local document with the configured schemas.\n\n\
            Prints the validation report as JSON. Exits non-zero when the document \
            has a YAML syntax error or a schema error.",
        after_help = "\
EXAMPLES:
    foundry-editor validate --type purl config/agro.yml
    foundry-editor validate --type registry ontology/agro.md --config editor.toml"
    )]
    Validate {
        /// Kind of document
        #[arg(long = "type", value_enum, value_name = "TYPE")]
        kind: DocumentKind,

        /// File to validate
        file: PathBuf,

        /// Configuration file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}
