//! gitoverlay - the git object graph as ordinary directories
//!
//! Every repository root (a directory ending in `.git`) gains a synthetic
//! entry, `gitFakeFs`, under which branches, tags, commits, the checked-out
//! revision, the index and the staged changes appear as read-only
//! directory trees. Paths that do not go through a repository root reach
//! the real filesystem untouched.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (`gito`)
//! - [`overlay`] - Routes each filesystem call; installs the overlay
//! - [`cache`] - Coalescing caches for handles, names and providers
//! - [`core`] - Domain types, path classification, configuration
//! - [`git`] - Single interface for all Git access
//! - [`vfs`] - Filesystem traits and the host filesystem
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Paths without a repository root behave exactly as on the inner filesystem
//! 2. The overlay root always lists the six object types in a fixed order
//! 3. Each repository is opened, and each view built, at most once per overlay
//! 4. Nothing is ever written to a repository

pub mod cache;
pub mod cli;
pub mod core;
pub mod git;
pub mod overlay;
pub mod ui;
pub mod vfs;
