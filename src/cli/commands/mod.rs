//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Performs its filesystem calls through the installed overlay
//! 2. Formats and displays output
//!
//! # Async Commands
//!
//! Filesystem commands are async. [`dispatch`] installs a [`GitOverlay`]
//! into the process-wide [`FsSlot`], runs the handler on a tokio runtime,
//! and uninstalls the overlay afterwards.

mod cat;
mod completion;
mod config_cmd;
mod links;
mod ls;
mod stat;
mod tree;

// Re-export command functions for testing and direct invocation
pub use cat::cat;
pub use completion::completion;
pub use config_cmd::show as config_show;
pub use links::{readlink, realpath};
pub use ls::ls;
pub use stat::stat;
pub use tree::{tree, walk, TreeEntry};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::args::Command;
use crate::core::config::OverlayConfig;
use crate::overlay::{FsSlot, GitOverlay};
use crate::ui::output::Verbosity;
use crate::vfs::{Filesystem, HostFs};

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub verbosity: Verbosity,
    /// Print machine-readable JSON.
    pub json: bool,
    /// Overlay layout in effect.
    pub overlay: OverlayConfig,
    /// File the overlay layout was read from, if any.
    pub config_path: Option<PathBuf>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            json: false,
            overlay: OverlayConfig::default(),
            config_path: None,
        }
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Ls { path, long } => {
            with_overlay(ctx, |fs| async move { ls(fs.as_ref(), ctx, &path, long).await })
        }
        Command::Cat { path } => with_overlay(ctx, |fs| async move { cat(fs.as_ref(), &path).await }),
        Command::Stat { path, no_follow } => with_overlay(ctx, |fs| async move {
            stat(fs.as_ref(), ctx, &path, no_follow).await
        }),
        Command::Readlink { path } => {
            with_overlay(ctx, |fs| async move { readlink(fs.as_ref(), ctx, &path).await })
        }
        Command::Realpath { path } => {
            with_overlay(ctx, |fs| async move { realpath(fs.as_ref(), ctx, &path).await })
        }
        Command::Tree { path, depth } => {
            with_overlay(ctx, |fs| async move { tree(fs.as_ref(), ctx, &path, depth).await })
        }
        Command::Config => config_show(ctx),
        Command::Completion { shell } => completion(shell),
    }
}

/// Run `f` against the overlay while it is installed globally.
fn with_overlay<F, Fut>(ctx: &Context, f: F) -> Result<()>
where
    F: FnOnce(Arc<dyn Filesystem>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    let installation = GitOverlay::with_config(HostFs::new(), &ctx.overlay).install_global();
    let result = rt.block_on(f(FsSlot::global().current()));
    installation.uninstall();
    result
}
