//! git
//!
//! Repository access for the overlay.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. The overlay talks to repositories through the
//! [`RepositoryBackend`] trait; [`Git2Backend`] is the production
//! implementation.
//!
//! # Responsibilities
//!
//! - Opening a repository at an exact root path
//! - Enumerating references
//! - Walking combined commit history
//! - Serving revision, index and changes-in-index views as a filesystem
//!
//! # Invariants
//!
//! - Read-only: nothing here writes to the repository
//! - All git2 work runs on tokio's blocking pool
//!
//! # Example
//!
//! ```ignore
//! use gitoverlay::git::{Git2Backend, RepositoryBackend};
//! use gitoverlay::core::types::{ObjectType, ProviderConfig};
//! use gitoverlay::vfs::Filesystem;
//! use std::{path::Path, sync::Arc};
//!
//! let backend = Git2Backend;
//! let repo = Arc::new(backend.open(Path::new("/src/app.git")).await?);
//! let main = backend.provider(repo, ProviderConfig::for_name(ObjectType::Branches, "main")?);
//! let readme = main.read_to_string(Path::new("/README.md")).await?;
//! ```

mod backend;
mod interface;
mod revision_fs;

pub use backend::{Git2Backend, RepositoryBackend};
pub use interface::{GitError, Repository};
pub use revision_fs::RevisionFs;
