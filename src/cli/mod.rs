//! cli
//!
//! Command-line interface layer for gito.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging and load configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`commands`], which do all their filesystem work through
//! [`crate::overlay::GitOverlay`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.debug);

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    tracing::debug!(path = ?loaded.path, "configuration loaded");

    let ctx = commands::Context {
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        json: cli.json,
        overlay: loaded.config.overlay,
        config_path: loaded.path,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr, filtered by `RUST_LOG`. `--debug` turns on this crate's
/// debug events on top of whatever `RUST_LOG` asks for.
fn init_logging(debug: bool) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    if debug {
        if let Ok(directive) = "gitoverlay=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
