//! git::interface
//!
//! Repository handle implementation using git2.
//!
//! This module is the **single doorway** to git2 for reference enumeration
//! and history walks. Revision and index views live in
//! [`super::revision_fs`] and reach git2 only through
//! [`Repository::run`].
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Path is not a repository root
//! - [`GitError::RefNotFound`]: Requested ref or revision does not exist
//! - [`GitError::ObjectNotFound`]: Requested object does not exist
//!
//! `GitError` is `Clone` so one failed open or walk can be handed to every
//! caller waiting on it.
//!
//! # Concurrency
//!
//! `git2::Repository` is `Send` but not `Sync`. The handle keeps it behind a
//! mutex and [`Repository::run`] executes closures on tokio's blocking pool.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::core::types::{Oid, RefName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// The path is not a repository root.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    pub(crate) fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::UnbornBranch => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Whether this error means "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::NotARepo { .. } | GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. }
        )
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

impl From<GitError> for io::Error {
    fn from(err: GitError) -> Self {
        let kind = if err.is_not_found() {
            io::ErrorKind::NotFound
        } else {
            io::ErrorKind::Other
        };
        io::Error::new(kind, err)
    }
}

/// An opened repository.
///
/// Opened exactly at the repository root path (no discovery), so a bare
/// `project.git` directory and the `.git` directory of a work tree are
/// both valid roots.
pub struct Repository {
    path: PathBuf,
    repo: Mutex<git2::Repository>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .finish()
    }
}

impl Repository {
    /// Open the repository whose root is `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository root
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo: Mutex::new(repo),
        })
    }

    /// The repository root this handle was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the underlying repository on the blocking pool.
    pub async fn run<T, E, F>(self: &Arc<Self>, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<GitError> + Send + 'static,
        F: FnOnce(&git2::Repository) -> Result<T, E> + Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.with_repo(f))
            .await
            .map_err(|e| {
                E::from(GitError::Internal {
                    message: format!("repository task failed: {e}"),
                })
            })?
    }

    /// Run `f` against the underlying repository on the current thread.
    pub fn with_repo<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<GitError>,
        F: FnOnce(&git2::Repository) -> Result<T, E>,
    {
        let repo = self.repo.lock().map_err(|_| GitError::Internal {
            message: "repository lock poisoned".to_string(),
        })?;
        f(&repo)
    }

    // =========================================================================
    // Ref Enumeration
    // =========================================================================

    /// List the full names of every reference (`refs/...`).
    ///
    /// Refs with non-UTF8 or otherwise invalid names are skipped.
    pub fn reference_names(&self) -> Result<Vec<RefName>, GitError> {
        self.with_repo(|repo| {
            let refs = repo.references().map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

            let mut names = Vec::new();
            for reference in refs {
                let reference = reference.map_err(|e| GitError::Internal {
                    message: e.message().to_string(),
                })?;
                let Some(name) = reference.name() else {
                    continue;
                };
                if let Ok(name) = RefName::new(name) {
                    names.push(name);
                }
            }
            Ok(names)
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Walk the combined history reachable from `starts`.
    ///
    /// Symbolic refs are skipped, as are refs that do not peel to a commit.
    /// The walk is one traversal over the union, so every commit appears
    /// once. Order is topological with children before parents, newest
    /// first among unrelated commits.
    pub fn walk_commits(&self, starts: &[RefName]) -> Result<Vec<Oid>, GitError> {
        self.with_repo(|repo| {
            let mut revwalk = repo.revwalk().map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            revwalk
                .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
                .map_err(|e| GitError::Internal {
                    message: e.message().to_string(),
                })?;

            for refname in starts {
                let reference = match repo.find_reference(refname.as_str()) {
                    Ok(r) => r,
                    // Deleted since enumeration
                    Err(e) if e.code() == git2::ErrorCode::NotFound => continue,
                    Err(e) => return Err(GitError::from_git2(e, refname.as_str())),
                };
                if reference.kind() != Some(git2::ReferenceType::Direct) {
                    continue;
                }
                let Ok(commit) = reference.peel_to_commit() else {
                    continue;
                };
                revwalk
                    .push(commit.id())
                    .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
            }

            let mut oids = Vec::new();
            for oid in revwalk {
                let oid = oid.map_err(|e| GitError::Internal {
                    message: e.message().to_string(),
                })?;
                oids.push(Oid::new(oid.to_string())?);
            }
            Ok(oids)
        })
    }
}
