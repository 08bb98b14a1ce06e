//! git::revision_fs
//!
//! A read-only [`Filesystem`] over one view of a repository: the file tree
//! of a revision, the staged index, or the index entries that differ from
//! `HEAD`.
//!
//! # Views
//!
//! The view is selected by [`ProviderConfig`] and loaded once, on first
//! use. Later changes to the repository are not observed by the same
//! instance.
//!
//! # Paths
//!
//! Paths are relative to the view root; a leading `/` is optional.
//! Symbolic links are followed for intermediate components always, and for
//! the final component by every operation except `lstat` and `read_link`.
//! `..` at the root stays at the root. Absolute link targets dangle.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use super::interface::{GitError, Repository};
use crate::core::types::{Oid, ProviderConfig};
use crate::vfs::{self, Filesystem, Metadata, Operation};

/// Maximum symbolic links followed while resolving one path.
const MAX_LINK_HOPS: usize = 40;

const MODE_TYPE_MASK: u32 = 0o170000;
const MODE_TREE: u32 = 0o040000;
const MODE_SYMLINK: u32 = 0o120000;
const MODE_GITLINK: u32 = 0o160000;

/// A directory inside a view.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DirRef {
    /// A git tree object.
    Tree(git2::Oid),
    /// A directory implied by index paths (`""` is the root).
    Prefix(String),
    /// A submodule: a directory with nothing in it.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir(DirRef),
    File { oid: git2::Oid, mode: u32 },
    Symlink { oid: git2::Oid },
}

impl Node {
    fn from_mode(mode: u32, oid: git2::Oid) -> Self {
        match mode & MODE_TYPE_MASK {
            MODE_TREE => Node::Dir(DirRef::Tree(oid)),
            MODE_SYMLINK => Node::Symlink { oid },
            MODE_GITLINK => Node::Dir(DirRef::Empty),
            _ => Node::File { oid, mode },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StagedBlob {
    oid: git2::Oid,
    mode: u32,
}

/// The loaded content a provider serves.
#[derive(Debug)]
enum View {
    Tree {
        root: git2::Oid,
        modified: Option<DateTime<Utc>>,
    },
    Index {
        entries: BTreeMap<String, StagedBlob>,
    },
}

impl View {
    fn load(repo: &git2::Repository, config: &ProviderConfig) -> Result<Self, GitError> {
        let revision = config.revision_ref.as_str();

        if config.wants_index() || config.wants_changes_in_index() {
            let index = repo.index().map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

            // An unborn HEAD compares as an empty tree.
            let base = if config.wants_changes_in_index() {
                match repo.revparse_single(revision) {
                    Ok(object) => Some(
                        object
                            .peel_to_tree()
                            .map_err(|e| GitError::from_git2(e, revision))?,
                    ),
                    Err(e)
                        if matches!(
                            e.code(),
                            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch
                        ) =>
                    {
                        None
                    }
                    Err(e) => return Err(GitError::from_git2(e, revision)),
                }
            } else {
                None
            };

            let mut entries = BTreeMap::new();
            for entry in index.iter() {
                // Conflict stages are not part of the staged snapshot
                if (entry.flags >> 12) & 0x3 != 0 {
                    continue;
                }
                let path = String::from_utf8_lossy(&entry.path).into_owned();
                if config.wants_changes_in_index() {
                    let unchanged = base
                        .as_ref()
                        .and_then(|tree| tree.get_path(Path::new(&path)).ok())
                        .is_some_and(|e| e.id() == entry.id && e.filemode() as u32 == entry.mode);
                    if unchanged {
                        continue;
                    }
                }
                entries.insert(
                    path,
                    StagedBlob {
                        oid: entry.id,
                        mode: entry.mode,
                    },
                );
            }
            return Ok(View::Index { entries });
        }

        let commit = peel_revision(repo, revision).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound
            | git2::ErrorCode::InvalidSpec
            | git2::ErrorCode::Ambiguous
            | git2::ErrorCode::UnbornBranch
            | git2::ErrorCode::Peel => GitError::RefNotFound {
                refname: revision.to_string(),
            },
            _ => GitError::from_git2(e, revision),
        })?;
        let modified = DateTime::from_timestamp(commit.committer().when().seconds(), 0);

        Ok(View::Tree {
            root: commit.tree_id(),
            modified,
        })
    }

    fn root(&self) -> DirRef {
        match self {
            View::Tree { root, .. } => DirRef::Tree(*root),
            View::Index { .. } => DirRef::Prefix(String::new()),
        }
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        match self {
            View::Tree { modified, .. } => *modified,
            View::Index { .. } => None,
        }
    }

    fn child(
        &self,
        repo: &git2::Repository,
        dir: &DirRef,
        name: &str,
    ) -> Result<Option<Node>, GitError> {
        match (self, dir) {
            (_, DirRef::Tree(oid)) => {
                let tree = repo
                    .find_tree(*oid)
                    .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
                Ok(tree
                    .get_name(name)
                    .map(|entry| Node::from_mode(entry.filemode() as u32, entry.id())))
            }
            (View::Index { entries }, DirRef::Prefix(prefix)) => {
                let full = join_prefix(prefix, name);
                if let Some(blob) = entries.get(&full) {
                    return Ok(Some(Node::from_mode(blob.mode, blob.oid)));
                }
                let below = format!("{full}/");
                let is_dir = entries
                    .range(below.clone()..)
                    .next()
                    .is_some_and(|(path, _)| path.starts_with(&below));
                Ok(is_dir.then(|| Node::Dir(DirRef::Prefix(full))))
            }
            _ => Ok(None),
        }
    }

    fn children(&self, repo: &git2::Repository, dir: &DirRef) -> Result<Vec<String>, GitError> {
        match (self, dir) {
            (_, DirRef::Tree(oid)) => {
                let tree = repo
                    .find_tree(*oid)
                    .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
                Ok(tree
                    .iter()
                    .map(|entry| String::from_utf8_lossy(entry.name_bytes()).into_owned())
                    .collect())
            }
            (View::Index { entries }, DirRef::Prefix(prefix)) => {
                let start = if prefix.is_empty() {
                    String::new()
                } else {
                    format!("{prefix}/")
                };
                let names: BTreeSet<String> = entries
                    .range(start.clone()..)
                    .map(|(path, _)| path)
                    .take_while(|path| path.starts_with(&start))
                    .filter_map(|path| path[start.len()..].split('/').next())
                    .map(str::to_string)
                    .collect();
                Ok(names.into_iter().collect())
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// The commit `revision` names.
///
/// Full ref names and full commit ids are looked up exactly; anything else
/// (`HEAD`) goes through revparse.
fn peel_revision<'r>(
    repo: &'r git2::Repository,
    revision: &str,
) -> Result<git2::Commit<'r>, git2::Error> {
    if revision.starts_with("refs/") {
        return repo.find_reference(revision)?.peel_to_commit();
    }
    if Oid::new(revision).is_ok() {
        return repo.find_commit(git2::Oid::from_str(revision)?);
    }
    repo.revparse_single(revision)?.peel_to_commit()
}

fn join_prefix(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Outcome of resolving a path inside a view.
#[derive(Debug)]
struct Resolved {
    node: Node,
    /// Link-free components from the view root.
    canonical: Vec<String>,
}

impl Resolved {
    fn canonical_path(&self) -> PathBuf {
        let mut path = PathBuf::from("/");
        path.extend(&self.canonical);
        path
    }
}

fn resolve(
    repo: &git2::Repository,
    view: &View,
    path: &Path,
    follow_final: bool,
) -> io::Result<Resolved> {
    let root = Node::Dir(view.root());
    let mut pending: VecDeque<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    let mut stack: Vec<(String, Node)> = Vec::new();
    let mut hops = 0;

    while let Some(name) = pending.pop_front() {
        let current = stack.last().map(|(_, node)| node).unwrap_or(&root);
        let Node::Dir(dir) = current else {
            return Err(vfs::not_a_directory(path));
        };

        if name == ".." {
            stack.pop();
            continue;
        }
        if name == "." {
            continue;
        }

        let child = view
            .child(repo, dir, &name)?
            .ok_or_else(|| vfs::not_found(path))?;

        match child {
            Node::Symlink { oid } if follow_final || !pending.is_empty() => {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(vfs::too_many_links(path));
                }
                let target = read_blob(repo, oid)?;
                let target = String::from_utf8_lossy(&target);
                if target.starts_with('/') {
                    return Err(vfs::not_found(path));
                }
                for component in target.split('/').rev().filter(|c| !c.is_empty()) {
                    pending.push_front(component.to_string());
                }
            }
            node => stack.push((name, node)),
        }
    }

    let (canonical, nodes): (Vec<String>, Vec<Node>) = stack.into_iter().unzip();
    Ok(Resolved {
        node: nodes.into_iter().last().unwrap_or(root),
        canonical,
    })
}

fn read_blob(repo: &git2::Repository, oid: git2::Oid) -> Result<Vec<u8>, GitError> {
    let blob = repo
        .find_blob(oid)
        .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
    Ok(blob.content().to_vec())
}

fn blob_size(repo: &git2::Repository, oid: git2::Oid) -> Result<u64, GitError> {
    let odb = repo.odb()?;
    let (size, _) = odb
        .read_header(oid)
        .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
    Ok(size as u64)
}

fn metadata(repo: &git2::Repository, view: &View, node: &Node) -> Result<Metadata, GitError> {
    let meta = match node {
        Node::Dir(_) => Metadata::directory(),
        Node::File { oid, mode } => Metadata::file(blob_size(repo, *oid)?, *mode),
        Node::Symlink { oid } => Metadata::symlink(blob_size(repo, *oid)?),
    };
    Ok(meta.with_modified(view.modified()))
}

/// Data provider for one view of one repository.
///
/// Shared by every caller that asks for an equivalent [`ProviderConfig`].
pub struct RevisionFs {
    repo: Arc<Repository>,
    config: ProviderConfig,
    view: OnceCell<Arc<View>>,
}

impl std::fmt::Debug for RevisionFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionFs")
            .field("repo", &self.repo.path())
            .field("config", &self.config)
            .finish()
    }
}

impl RevisionFs {
    pub fn new(repo: Arc<Repository>, config: ProviderConfig) -> Self {
        Self {
            repo,
            config,
            view: OnceCell::new(),
        }
    }

    async fn view(&self) -> io::Result<Arc<View>> {
        let view = self
            .view
            .get_or_try_init(|| async {
                let config = self.config.clone();
                tracing::debug!(repo = %self.repo.path().display(), %config, "loading view");
                self.repo
                    .run(move |repo| View::load(repo, &config).map(Arc::new))
                    .await
            })
            .await
            .map_err(io::Error::from)?;
        Ok(Arc::clone(view))
    }

    /// Resolve `path` in the view and hand the result to `f` on the
    /// blocking pool.
    async fn with_resolved<T, F>(&self, path: &Path, follow_final: bool, f: F) -> io::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&git2::Repository, &View, Resolved, &Path) -> io::Result<T> + Send + 'static,
    {
        let view = self.view().await?;
        let path = path.to_path_buf();
        self.repo
            .run(move |repo| {
                let resolved = resolve(repo, &view, &path, follow_final)?;
                f(repo, view.as_ref(), resolved, path.as_path())
            })
            .await
    }
}

#[async_trait]
impl Filesystem for RevisionFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        self.with_resolved(path, true, |repo, view, resolved, path| match &resolved.node {
            Node::Dir(dir) => Ok(view.children(repo, dir)?),
            _ => Err(vfs::not_a_directory(path)),
        })
        .await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.with_resolved(path, true, |repo, view, resolved, _| {
            Ok(metadata(repo, view, &resolved.node)?)
        })
        .await
    }

    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        self.with_resolved(path, false, |repo, view, resolved, _| {
            Ok(metadata(repo, view, &resolved.node)?)
        })
        .await
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.with_resolved(path, true, |repo, _, resolved, path| match resolved.node {
            Node::File { oid, .. } => Ok(read_blob(repo, oid)?),
            Node::Dir(_) => Err(vfs::is_a_directory(path)),
            Node::Symlink { .. } => Err(vfs::unsupported(Operation::ReadFile, path)),
        })
        .await
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.with_resolved(path, false, |repo, _, resolved, path| match resolved.node {
            Node::Symlink { oid } => {
                let target = read_blob(repo, oid)?;
                Ok(PathBuf::from(String::from_utf8_lossy(&target).into_owned()))
            }
            _ => Err(vfs::not_a_link(path)),
        })
        .await
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        self.with_resolved(path, true, |_, _, resolved, _| Ok(resolved.canonical_path()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_from_mode() {
        let oid = git2::Oid::zero();
        assert_eq!(Node::from_mode(0o040000, oid), Node::Dir(DirRef::Tree(oid)));
        assert_eq!(Node::from_mode(0o120000, oid), Node::Symlink { oid });
        assert_eq!(Node::from_mode(0o160000, oid), Node::Dir(DirRef::Empty));
        assert_eq!(
            Node::from_mode(0o100755, oid),
            Node::File {
                oid,
                mode: 0o100755
            }
        );
    }

    fn index_view(paths: &[&str]) -> View {
        View::Index {
            entries: paths
                .iter()
                .map(|p| {
                    (
                        p.to_string(),
                        StagedBlob {
                            oid: git2::Oid::zero(),
                            mode: 0o100644,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn index_children_are_first_segments() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let view = index_view(&["a-b", "a.txt", "a/x", "a/y/z", "b"]);

        let root = view.children(&repo, &view.root()).unwrap();
        assert_eq!(root, vec!["a", "a-b", "a.txt", "b"]);

        let a = view
            .children(&repo, &DirRef::Prefix("a".into()))
            .unwrap();
        assert_eq!(a, vec!["x", "y"]);
    }

    #[test]
    fn index_child_lookup() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let view = index_view(&["a/x", "b"]);
        let root = view.root();

        assert_eq!(
            view.child(&repo, &root, "a").unwrap(),
            Some(Node::Dir(DirRef::Prefix("a".into())))
        );
        assert!(matches!(
            view.child(&repo, &root, "b").unwrap(),
            Some(Node::File { .. })
        ));
        assert_eq!(view.child(&repo, &root, "c").unwrap(), None);
        // "a/" prefix must not match "a-b"-style siblings
        assert_eq!(view.child(&repo, &root, "a/").unwrap(), None);
    }

    #[test]
    fn resolve_in_index_view() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let view = index_view(&["sub/dir/file.txt", "top.txt"]);

        let resolved = resolve(&repo, &view, Path::new("/sub/./dir/../dir/file.txt"), true).unwrap();
        assert_eq!(resolved.canonical_path(), PathBuf::from("/sub/dir/file.txt"));

        let root = resolve(&repo, &view, Path::new("/"), true).unwrap();
        assert_eq!(root.canonical_path(), PathBuf::from("/"));
        assert!(matches!(root.node, Node::Dir(_)));

        let above = resolve(&repo, &view, Path::new("/../top.txt"), true).unwrap();
        assert_eq!(above.canonical_path(), PathBuf::from("/top.txt"));

        let missing = resolve(&repo, &view, Path::new("/nope"), true).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);

        let through_file = resolve(&repo, &view, Path::new("/top.txt/x"), true).unwrap_err();
        assert_eq!(through_file.kind(), io::ErrorKind::NotADirectory);
    }
}
