//! overlay
//!
//! The git object graph as a directory tree on top of a real filesystem.
//!
//! # Architecture
//!
//! [`GitOverlay`] decorates any [`Filesystem`] / [`SyncFilesystem`]. Every
//! call is classified by [`PathClassifier`] and then either:
//!
//! - forwarded untouched to the inner filesystem,
//! - answered synthetically (overlay root listing, directory metadata for
//!   object-type roots, computed real paths), or
//! - delegated to a per-view provider from [`ProviderCache`].
//!
//! ```text
//! <repo>.git/gitFakeFs/
//! ├── HEAD/...              checked-out revision
//! ├── branches/<name>/...   branch tip
//! ├── tags/<name>/...       tagged revision
//! ├── commits/<sha>/...     any reachable commit
//! ├── index/...             staged paths
//! └── changesInIndex/...    staged paths that differ from HEAD
//! ```
//!
//! # Invariants
//!
//! - Not-found errors carry the requested path, in the same shape as the
//!   inner filesystem's own (`ENOENT, no such file or directory '<path>'`)
//! - Synthetic async answers yield to the scheduler once before completing
//! - Blocking calls never touch a repository; paths that need one fail with
//!   [`io::ErrorKind::Unsupported`]
//! - Caches belong to one overlay instance and are never evicted
//!
//! # Example
//!
//! ```ignore
//! use gitoverlay::overlay::GitOverlay;
//! use gitoverlay::vfs::{Filesystem, HostFs};
//! use std::path::Path;
//!
//! let fs = GitOverlay::new(HostFs::new());
//! let names = fs.read_dir(Path::new("/src/app.git/gitFakeFs/branches")).await?;
//! let readme = fs
//!     .read_to_string(Path::new("/src/app.git/gitFakeFs/branches/main/README.md"))
//!     .await?;
//! ```

mod install;

pub use install::{FsSlot, Installation};

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{NameResolver, ProviderCache, RepositoryCache};
use crate::core::config::OverlayConfig;
use crate::core::paths::{self, PathClass, PathClassifier};
use crate::core::types::{ObjectType, ProviderConfig};
use crate::git::{Git2Backend, RepositoryBackend};
use crate::vfs::{self, Filesystem, HostFs, Metadata, Operation, SyncFilesystem};

/// How a call below `<repo>/<entry>/<type>` is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ObjectRoute {
    /// Synthetic directory metadata.
    Directory,
    /// The resolver's name list for the object type.
    Names(ObjectType),
    /// Directory metadata once the name is known to exist.
    NamedDirectory(ObjectType, String),
    /// `realpath(<repo>)/<entry>/<mount>`.
    Realpath(PathBuf),
    /// A call on the provider for `config` at `path`.
    Provider {
        config: ProviderConfig,
        /// Where the view is mounted below the overlay root.
        mount: PathBuf,
        path: PathBuf,
    },
    Unsupported,
    /// A name that cannot exist under its object type.
    Missing,
}

impl ObjectRoute {
    fn plan(op: Operation, object_type: ObjectType, fragments: &[String]) -> Self {
        let mount = PathBuf::from(object_type.as_str());

        if fragments.is_empty() {
            match op {
                Operation::Stat | Operation::Lstat => return ObjectRoute::Directory,
                Operation::Realpath => return ObjectRoute::Realpath(mount),
                _ => {}
            }
        }

        if !object_type.has_names() {
            return ObjectRoute::Provider {
                config: ProviderConfig::for_head_view(object_type),
                mount,
                path: provider_path(fragments),
            };
        }

        match fragments.split_first() {
            None if op.is_listing() => ObjectRoute::Names(object_type),
            None => ObjectRoute::Unsupported,
            Some((name, [])) if op.is_metadata() => {
                ObjectRoute::NamedDirectory(object_type, name.clone())
            }
            Some((name, rest)) => match ProviderConfig::for_name(object_type, name) {
                Ok(config) => ObjectRoute::Provider {
                    config,
                    mount: mount.join(name),
                    path: provider_path(rest),
                },
                Err(_) => ObjectRoute::Missing,
            },
        }
    }
}

fn provider_path(fragments: &[String]) -> PathBuf {
    let mut path = PathBuf::from("/");
    path.extend(fragments);
    path
}

fn normal_components(path: &Path) -> impl Iterator<Item = Component<'_>> {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
}

/// Complete a synthetic answer on a later scheduler turn.
async fn deferred<T>(result: io::Result<T>) -> io::Result<T> {
    tokio::task::yield_now().await;
    result
}

/// Report provider and resolver errors against the requested path.
fn for_requested(path: &Path) -> impl FnOnce(io::Error) -> io::Error + '_ {
    move |err| vfs::retarget(err, path)
}

/// The synthetic answer for a route that needs no repository.
fn refused<T>(op: Operation, path: &Path, route: &ObjectRoute) -> io::Result<T> {
    match route {
        ObjectRoute::Missing => Err(vfs::not_found(path)),
        _ => Err(vfs::unsupported(op, path)),
    }
}

/// A filesystem with the git object graph mounted below every repository.
pub struct GitOverlay<F, B: RepositoryBackend = Git2Backend> {
    inner: Arc<F>,
    classifier: PathClassifier,
    names: NameResolver<B>,
    providers: ProviderCache<B>,
}

impl<F> GitOverlay<F> {
    /// Overlay `inner` with the default layout (`*.git/gitFakeFs`).
    pub fn new(inner: F) -> Self {
        Self::with_config(inner, &OverlayConfig::default())
    }

    pub fn with_config(inner: F, config: &OverlayConfig) -> Self {
        Self::with_backend(inner, config, Git2Backend)
    }
}

impl Default for GitOverlay<HostFs> {
    fn default() -> Self {
        Self::new(HostFs::new())
    }
}

impl<F, B: RepositoryBackend> GitOverlay<F, B> {
    /// Overlay `inner`, reaching repositories through `backend`.
    pub fn with_backend(inner: F, config: &OverlayConfig, backend: B) -> Self {
        let repos = Arc::new(RepositoryCache::new(Arc::new(backend)));
        Self {
            inner: Arc::new(inner),
            classifier: config.classifier(),
            names: NameResolver::new(Arc::clone(&repos)),
            providers: ProviderCache::new(repos),
        }
    }

    /// Number of distinct data providers this overlay has created.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Classify `path` after making it absolute. Only the passthrough route
    /// keeps using the caller's path; every other route carries the
    /// normalized repository root.
    fn route(&self, op: Operation, path: &Path) -> io::Result<PathClass> {
        let absolute = paths::resolve(path)?;
        let class = self.classifier.classify(&absolute);
        tracing::trace!(%op, path = %absolute.display(), route = ?class, "dispatch");
        Ok(class)
    }

    /// `entries` with the overlay entry first and exactly once.
    fn with_entry(&self, entries: Vec<String>) -> Vec<String> {
        let entry = self.classifier.entry_name();
        let mut names = Vec::with_capacity(entries.len() + 1);
        names.push(entry.to_string());
        names.extend(entries.into_iter().filter(|name| name != entry));
        names
    }

    fn overlay_path(&self, real_repo: PathBuf, mount: &Path) -> PathBuf {
        let mut path = real_repo.join(self.classifier.entry_name());
        path.extend(normal_components(mount));
        path
    }
}

impl<F: Filesystem, B: RepositoryBackend> GitOverlay<F, B> {
    async fn provider(&self, repo: &Path, config: &ProviderConfig) -> io::Result<Arc<B::Provider>> {
        Ok(self.providers.get(repo, config).await?)
    }

    async fn names(&self, repo: &Path, object_type: ObjectType) -> io::Result<Vec<String>> {
        Ok(self.names.names(repo, object_type).await?.as_ref().clone())
    }

    async fn named_directory(
        &self,
        repo: &Path,
        object_type: ObjectType,
        name: &str,
    ) -> io::Result<Metadata> {
        if self.names.contains(repo, object_type, name).await? {
            Ok(Metadata::directory())
        } else {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    async fn realpath_of(&self, repo: &Path, mount: &Path) -> io::Result<PathBuf> {
        let real_repo = self.inner.realpath(repo).await?;
        Ok(self.overlay_path(real_repo, mount))
    }

    /// Shared handling of `stat` and `lstat` below the overlay entry.
    async fn object_metadata(
        &self,
        op: Operation,
        path: &Path,
        repo: &Path,
        object_type: ObjectType,
        fragments: &[String],
    ) -> io::Result<Metadata> {
        match ObjectRoute::plan(op, object_type, fragments) {
            ObjectRoute::Directory => deferred(Ok(Metadata::directory())).await,
            ObjectRoute::NamedDirectory(object_type, name) => self
                .named_directory(repo, object_type, &name)
                .await
                .map_err(for_requested(path)),
            ObjectRoute::Provider { config, path: inner, .. } => {
                let provider = self.provider(repo, &config).await.map_err(for_requested(path))?;
                let result = if op == Operation::Lstat {
                    provider.lstat(&inner).await
                } else {
                    provider.stat(&inner).await
                };
                result.map_err(for_requested(path))
            }
            route => deferred(refused(op, path, &route)).await,
        }
    }
}

#[async_trait]
impl<F, B> Filesystem for GitOverlay<F, B>
where
    F: Filesystem + 'static,
    B: RepositoryBackend,
{
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let op = Operation::ReadDir;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_dir(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => Ok(self.with_entry(self.inner.read_dir(&repo).await?)),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => deferred(Ok(ObjectType::listing())).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => match ObjectRoute::plan(op, object_type, &fragments) {
                ObjectRoute::Names(object_type) => self
                    .names(&repo, object_type)
                    .await
                    .map_err(for_requested(path)),
                ObjectRoute::Provider { config, path: inner, .. } => {
                    let provider = self
                        .provider(&repo, &config)
                        .await
                        .map_err(for_requested(path))?;
                    provider
                        .read_dir(&inner)
                        .await
                        .map_err(for_requested(path))
                }
                route => deferred(refused(op, path, &route)).await,
            },
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let op = Operation::Stat;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.stat(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.stat(&repo).await,
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => deferred(Ok(Metadata::directory())).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => {
                self.object_metadata(op, path, &repo, object_type, &fragments)
                    .await
            }
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }

    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        let op = Operation::Lstat;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.lstat(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.lstat(&repo).await,
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => deferred(Ok(Metadata::directory())).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => {
                self.object_metadata(op, path, &repo, object_type, &fragments)
                    .await
            }
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let op = Operation::ReadFile;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_file(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.read_file(&repo).await,
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => deferred(Err(vfs::unsupported(op, path))).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => match ObjectRoute::plan(op, object_type, &fragments) {
                ObjectRoute::Provider { config, path: inner, .. } => {
                    let provider = self
                        .provider(&repo, &config)
                        .await
                        .map_err(for_requested(path))?;
                    provider
                        .read_file(&inner)
                        .await
                        .map_err(for_requested(path))
                }
                route => deferred(refused(op, path, &route)).await,
            },
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let op = Operation::ReadLink;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_link(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.read_link(&repo).await,
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => deferred(Err(vfs::unsupported(op, path))).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => match ObjectRoute::plan(op, object_type, &fragments) {
                ObjectRoute::Provider { config, path: inner, .. } => {
                    let provider = self
                        .provider(&repo, &config)
                        .await
                        .map_err(for_requested(path))?;
                    provider
                        .read_link(&inner)
                        .await
                        .map_err(for_requested(path))
                }
                route => deferred(refused(op, path, &route)).await,
            },
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        let op = Operation::Realpath;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.realpath(path).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.realpath(&repo).await,
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: true,
            } => self.realpath_of(&repo, Path::new("")).await,
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => match ObjectRoute::plan(op, object_type, &fragments) {
                ObjectRoute::Realpath(mount) => self.realpath_of(&repo, &mount).await,
                ObjectRoute::Provider {
                    config,
                    mount,
                    path: inner,
                } => {
                    let provider = self
                        .provider(&repo, &config)
                        .await
                        .map_err(for_requested(path))?;
                    let canonical = provider
                        .realpath(&inner)
                        .await
                        .map_err(for_requested(path))?;
                    let mut real = self.realpath_of(&repo, &mount).await?;
                    real.extend(normal_components(&canonical));
                    Ok(real)
                }
                route => deferred(refused(op, path, &route)).await,
            },
            PathClass::UnknownObjectType { .. } => deferred(Err(vfs::not_found(path))).await,
        }
    }
}

/// The error a blocking call gets for a route it cannot take.
fn refuse_blocking(op: Operation, path: &Path, route: &ObjectRoute) -> io::Error {
    match route {
        ObjectRoute::Unsupported => vfs::unsupported(op, path),
        ObjectRoute::Missing => vfs::not_found(path),
        _ => vfs::not_implemented(op),
    }
}

impl<F: SyncFilesystem, B: RepositoryBackend> GitOverlay<F, B> {
    fn object_metadata_sync(
        &self,
        op: Operation,
        path: &Path,
        object_type: ObjectType,
        fragments: &[String],
    ) -> io::Result<Metadata> {
        match ObjectRoute::plan(op, object_type, fragments) {
            ObjectRoute::Directory => Ok(Metadata::directory()),
            route => Err(refuse_blocking(op, path, &route)),
        }
    }
}

/// Blocking calls answer what the overlay can work out without opening a
/// repository: the repository root, the overlay root and object-type roots.
impl<F, B> SyncFilesystem for GitOverlay<F, B>
where
    F: SyncFilesystem,
    B: RepositoryBackend,
{
    fn read_dir_sync(&self, path: &Path) -> io::Result<Vec<String>> {
        let op = Operation::ReadDir;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_dir_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => Ok(self.with_entry(self.inner.read_dir_sync(&repo)?)),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Ok(ObjectType::listing()),
            PathClass::ObjectType { .. } => Err(vfs::not_implemented(op)),
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }

    fn stat_sync(&self, path: &Path) -> io::Result<Metadata> {
        let op = Operation::Stat;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.stat_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.stat_sync(&repo),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Ok(Metadata::directory()),
            PathClass::ObjectType {
                object_type,
                fragments,
                ..
            } => self.object_metadata_sync(op, path, object_type, &fragments),
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }

    fn lstat_sync(&self, path: &Path) -> io::Result<Metadata> {
        let op = Operation::Lstat;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.lstat_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.lstat_sync(&repo),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Ok(Metadata::directory()),
            PathClass::ObjectType {
                object_type,
                fragments,
                ..
            } => self.object_metadata_sync(op, path, object_type, &fragments),
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }

    fn read_file_sync(&self, path: &Path) -> io::Result<Vec<u8>> {
        let op = Operation::ReadFile;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_file_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.read_file_sync(&repo),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Err(vfs::unsupported(op, path)),
            PathClass::ObjectType {
                object_type,
                fragments,
                ..
            } => Err(refuse_blocking(
                op,
                path,
                &ObjectRoute::plan(op, object_type, &fragments),
            )),
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }

    fn read_link_sync(&self, path: &Path) -> io::Result<PathBuf> {
        let op = Operation::ReadLink;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.read_link_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.read_link_sync(&repo),
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Err(vfs::unsupported(op, path)),
            PathClass::ObjectType {
                object_type,
                fragments,
                ..
            } => Err(refuse_blocking(
                op,
                path,
                &ObjectRoute::plan(op, object_type, &fragments),
            )),
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }

    fn realpath_sync(&self, path: &Path) -> io::Result<PathBuf> {
        let op = Operation::Realpath;
        let class = self.route(op, path)?;
        match class {
            PathClass::Passthrough => self.inner.realpath_sync(path),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: false,
            } => self.inner.realpath_sync(&repo),
            PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: true,
            } => {
                let real_repo = self.inner.realpath_sync(&repo)?;
                Ok(self.overlay_path(real_repo, Path::new("")))
            }
            PathClass::ObjectType {
                repo,
                object_type,
                fragments,
            } => match ObjectRoute::plan(op, object_type, &fragments) {
                ObjectRoute::Realpath(mount) => {
                    let real_repo = self.inner.realpath_sync(&repo)?;
                    Ok(self.overlay_path(real_repo, &mount))
                }
                route => Err(refuse_blocking(op, path, &route)),
            },
            PathClass::UnknownObjectType { .. } => Err(vfs::not_found(path)),
        }
    }
}

impl<F, B> GitOverlay<F, B>
where
    F: Filesystem + 'static,
    B: RepositoryBackend,
{
    /// Install this overlay as the process-wide filesystem.
    pub fn install_global(self) -> Installation<'static> {
        FsSlot::global().install(Arc::new(self))
    }
}
