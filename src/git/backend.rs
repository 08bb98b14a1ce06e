//! git::backend
//!
//! The seam between the overlay and repository access.
//!
//! The overlay only needs four things from a repository: open it, list its
//! references, walk its history, and build a data provider for a view. The
//! [`RepositoryBackend`] trait names exactly those, so the overlay can be
//! driven by something other than git2 (tests count history walks through
//! it).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::interface::{GitError, Repository};
use super::revision_fs::RevisionFs;
use crate::core::types::{Oid, ProviderConfig, RefName};
use crate::vfs::Filesystem;

/// Repository access used by the overlay.
#[async_trait]
pub trait RepositoryBackend: Send + Sync + 'static {
    /// An opened repository.
    type Handle: Send + Sync + 'static;

    /// A filesystem over one view of a repository.
    type Provider: Filesystem + 'static;

    /// Open the repository rooted at `path`.
    async fn open(&self, path: &Path) -> Result<Self::Handle, GitError>;

    /// Full names of every reference.
    async fn references(&self, handle: Arc<Self::Handle>) -> Result<Vec<RefName>, GitError>;

    /// One combined history walk from `starts`, each commit listed once.
    async fn walk_commits(
        &self,
        handle: Arc<Self::Handle>,
        starts: Vec<RefName>,
    ) -> Result<Vec<Oid>, GitError>;

    /// Build the provider for `config`. Must not perform I/O.
    fn provider(&self, handle: Arc<Self::Handle>, config: ProviderConfig) -> Self::Provider;
}

/// The git2-backed implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Backend;

#[async_trait]
impl RepositoryBackend for Git2Backend {
    type Handle = Repository;
    type Provider = RevisionFs;

    async fn open(&self, path: &Path) -> Result<Repository, GitError> {
        let path = path.to_path_buf();
        blocking(move || Repository::open(&path)).await
    }

    async fn references(&self, handle: Arc<Repository>) -> Result<Vec<RefName>, GitError> {
        blocking(move || handle.reference_names()).await
    }

    async fn walk_commits(
        &self,
        handle: Arc<Repository>,
        starts: Vec<RefName>,
    ) -> Result<Vec<Oid>, GitError> {
        blocking(move || handle.walk_commits(&starts)).await
    }

    fn provider(&self, handle: Arc<Repository>, config: ProviderConfig) -> RevisionFs {
        RevisionFs::new(handle, config)
    }
}

async fn blocking<T, F>(f: F) -> Result<T, GitError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GitError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GitError::Internal {
            message: format!("repository task failed: {e}"),
        })?
}
