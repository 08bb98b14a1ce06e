//! ui
//!
//! User-facing output for the `gito` binary.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All command output goes through this module so quiet, debug and JSON
//! modes behave the same way everywhere. Diagnostics go through `tracing`
//! instead.

pub mod output;
