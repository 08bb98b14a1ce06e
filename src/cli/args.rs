//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <file>`: Read overlay settings from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output where supported

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gito - browse git branches, tags, commits and the index as directories
#[derive(Parser, Debug)]
#[command(name = "gito")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read overlay settings from this file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print machine-readable JSON (ls, stat, tree)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory
    #[command(
        name = "ls",
        long_about = "List the entries of a directory.\n\n\
            Any path below a repository root (a directory ending in .git) may \
            use the overlay entry to reach the object graph.",
        after_help = "\
EXAMPLES:
    # The virtual object types of a repository
    gito ls app.git/gitFakeFs

    # Local branches
    gito ls app.git/gitFakeFs/branches

    # Top-level files of a tag
    gito ls app.git/gitFakeFs/tags/v1.0"
    )]
    Ls {
        /// Directory to list
        path: PathBuf,

        /// Show kind, mode and size for each entry
        #[arg(short, long)]
        long: bool,
    },

    /// Print a file
    #[command(
        name = "cat",
        after_help = "\
EXAMPLES:
    # A file as committed on main
    gito cat app.git/gitFakeFs/branches/main/README.md

    # The staged version of a file
    gito cat .git/gitFakeFs/index/src/lib.rs"
    )]
    Cat {
        /// File to print
        path: PathBuf,
    },

    /// Show metadata for a path
    Stat {
        /// Path to inspect
        path: PathBuf,

        /// Do not follow a final symbolic link
        #[arg(long)]
        no_follow: bool,
    },

    /// Print the target of a symbolic link
    Readlink {
        /// Link to read
        path: PathBuf,
    },

    /// Resolve a path to its canonical form
    Realpath {
        /// Path to resolve
        path: PathBuf,
    },

    /// Recursively list a directory
    #[command(
        name = "tree",
        after_help = "\
EXAMPLES:
    # Every file staged for the next commit that differs from HEAD
    gito tree .git/gitFakeFs/changesInIndex

    # Two levels of a commit
    gito tree app.git/gitFakeFs/commits/<sha> --depth 2"
    )]
    Tree {
        /// Directory to walk
        path: PathBuf,

        /// Maximum depth to descend (unlimited by default)
        #[arg(long, value_name = "N")]
        depth: Option<usize>,
    },

    /// Show the effective overlay configuration
    Config,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    gito completion bash > ~/.local/share/bash-completion/completions/gito

    # Zsh
    gito completion zsh > ~/.zfunc/_gito

    # Fish
    gito completion fish > ~/.config/fish/completions/gito.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
