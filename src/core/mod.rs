//! core
//!
//! Core domain types, path classification and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectType, ProviderConfig, Oid, RefName
//! - [`paths`] - Pure path classification for the overlay
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Nothing in this module performs repository I/O
//! - Classification is deterministic and side-effect free

pub mod config;
pub mod paths;
pub mod types;
