//! cache
//!
//! Per-process memoization of repository work.
//!
//! Three caches sit between the overlay and a [`RepositoryBackend`]:
//!
//! - [`RepositoryCache`]: repository root → opened handle
//! - [`NameResolver`]: (repository root, object type) → names listed under it
//! - [`ProviderCache`]: (repository root, canonical provider config) → provider
//!
//! All three are built on [`Memo`], so concurrent first requests for a key
//! share one backend call. Successful entries live as long as the overlay;
//! failures are handed to the callers that waited on them and then dropped.

mod memo;

pub use memo::Memo;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::types::{ObjectType, ProviderConfig};
use crate::git::{GitError, RepositoryBackend};

/// Opened repository handles, keyed by repository root.
pub struct RepositoryCache<B: RepositoryBackend> {
    backend: Arc<B>,
    handles: Memo<PathBuf, Arc<B::Handle>, GitError>,
}

impl<B: RepositoryBackend> RepositoryCache<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            handles: Memo::new(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The handle for the repository rooted at `repo`, opening it once.
    pub async fn get(&self, repo: &Path) -> Result<Arc<B::Handle>, GitError> {
        self.handles
            .get_or_compute(repo.to_path_buf(), || async {
                tracing::debug!(repo = %repo.display(), "opening repository");
                self.backend.open(repo).await.map(Arc::new)
            })
            .await
    }
}

/// Names listed under `branches`, `tags` and `commits`.
///
/// Branch and tag names come from the repository's references. Commit ids
/// come from one combined history walk over every reference.
pub struct NameResolver<B: RepositoryBackend> {
    repos: Arc<RepositoryCache<B>>,
    names: Memo<(PathBuf, ObjectType), Arc<Vec<String>>, GitError>,
}

impl<B: RepositoryBackend> NameResolver<B> {
    pub fn new(repos: Arc<RepositoryCache<B>>) -> Self {
        Self {
            repos,
            names: Memo::new(),
        }
    }

    /// Names for `object_type` in `repo`. Types without names list nothing.
    pub async fn names(
        &self,
        repo: &Path,
        object_type: ObjectType,
    ) -> Result<Arc<Vec<String>>, GitError> {
        if !object_type.has_names() {
            return Ok(Arc::new(Vec::new()));
        }

        self.names
            .get_or_compute((repo.to_path_buf(), object_type), || {
                self.resolve(repo, object_type)
            })
            .await
    }

    /// Whether `name` is listed under `object_type` in `repo`.
    pub async fn contains(
        &self,
        repo: &Path,
        object_type: ObjectType,
        name: &str,
    ) -> Result<bool, GitError> {
        Ok(self
            .names(repo, object_type)
            .await?
            .iter()
            .any(|n| n == name))
    }

    async fn resolve(&self, repo: &Path, object_type: ObjectType) -> Result<Arc<Vec<String>>, GitError> {
        let handle = self.repos.get(repo).await?;
        let backend = self.repos.backend();
        let refs = backend.references(Arc::clone(&handle)).await?;

        let names: Vec<String> = match object_type {
            ObjectType::Commits => backend
                .walk_commits(handle, refs)
                .await?
                .into_iter()
                .map(|oid| oid.to_string())
                .collect(),
            _ => refs
                .iter()
                .filter_map(|r| r.short_name_for(object_type))
                .map(str::to_string)
                .collect(),
        };

        tracing::debug!(
            repo = %repo.display(),
            object_type = %object_type,
            count = names.len(),
            "resolved names"
        );
        Ok(Arc::new(names))
    }
}

/// Data providers, keyed by repository root and canonical config.
pub struct ProviderCache<B: RepositoryBackend> {
    repos: Arc<RepositoryCache<B>>,
    providers: Memo<(PathBuf, ProviderConfig), Arc<B::Provider>, GitError>,
}

impl<B: RepositoryBackend> ProviderCache<B> {
    pub fn new(repos: Arc<RepositoryCache<B>>) -> Self {
        Self {
            repos,
            providers: Memo::new(),
        }
    }

    /// The provider for `config` in `repo`.
    ///
    /// Configs that differ only by an absent versus `false` index flag share
    /// one provider.
    pub async fn get(
        &self,
        repo: &Path,
        config: &ProviderConfig,
    ) -> Result<Arc<B::Provider>, GitError> {
        let config = config.canonical();
        let key = (repo.to_path_buf(), config.clone());
        self.providers
            .get_or_compute(key, || async move {
                let handle = self.repos.get(repo).await?;
                tracing::debug!(repo = %repo.display(), config = %config, "creating provider");
                Ok(Arc::new(self.repos.backend().provider(handle, config)))
            })
            .await
    }

    /// Number of distinct providers created or in flight.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
