//! core::paths
//!
//! Path classification for the overlay.
//!
//! # Overview
//!
//! Every filesystem call is routed by looking at the shape of its path.
//! A path is interesting only if one of its segments ends with the
//! repository-root suffix (`.git` by default) and that segment is either the
//! last one or is followed by the overlay entry (`gitFakeFs` by default):
//!
//! ```text
//! /src/app.git                          repository root
//! /src/app.git/gitFakeFs                overlay root
//! /src/app.git/gitFakeFs/branches/main  object type + fragments
//! /src/app.git/gitFakeFs/stash          unknown object type
//! /src/app.git/objects/pack             pass-through
//! ```
//!
//! The leftmost qualifying segment wins. Classification is pure: it never
//! touches the filesystem or a repository.
//!
//! # Example
//!
//! ```
//! use gitoverlay::core::paths::{PathClass, PathClassifier};
//! use gitoverlay::core::types::ObjectType;
//! use std::path::Path;
//!
//! let classifier = PathClassifier::new(".git", "gitFakeFs");
//! match classifier.classify(Path::new("/repo.git/gitFakeFs/tags/v1/README")) {
//!     PathClass::ObjectType { repo, object_type, fragments } => {
//!         assert_eq!(repo, Path::new("/repo.git"));
//!         assert_eq!(object_type, ObjectType::Tags);
//!         assert_eq!(fragments, vec!["v1", "README"]);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::types::ObjectType;

/// Routing category of an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    /// No repository root on the path; the real filesystem handles it.
    Passthrough,

    /// The repository root itself, or the overlay root directly below it.
    RepoOrOverlayRoot {
        /// The repository root.
        repo: PathBuf,
        /// True for `<repo>/<entry>`, false for `<repo>`.
        overlay_root: bool,
    },

    /// `<repo>/<entry>/<type>/...`
    ObjectType {
        repo: PathBuf,
        object_type: ObjectType,
        /// Fragments after the object type, possibly empty.
        fragments: Vec<String>,
    },

    /// `<repo>/<entry>/<name>/...` where `<name>` is not an object type.
    UnknownObjectType {
        repo: PathBuf,
        name: String,
        fragments: Vec<String>,
    },
}

impl PathClass {
    /// The repository root this path routes to, if any.
    pub fn repo(&self) -> Option<&Path> {
        match self {
            PathClass::Passthrough => None,
            PathClass::RepoOrOverlayRoot { repo, .. }
            | PathClass::ObjectType { repo, .. }
            | PathClass::UnknownObjectType { repo, .. } => Some(repo),
        }
    }

    /// Number of fragments below the overlay root (0 for the overlay root,
    /// 1 for an object-type directory, ...). `None` outside the overlay.
    pub fn depth(&self) -> Option<usize> {
        match self {
            PathClass::RepoOrOverlayRoot {
                overlay_root: true, ..
            } => Some(0),
            PathClass::ObjectType { fragments, .. }
            | PathClass::UnknownObjectType { fragments, .. } => Some(1 + fragments.len()),
            _ => None,
        }
    }
}

/// Classifies absolute paths against a repository suffix and entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathClassifier {
    repository_suffix: String,
    entry_name: String,
}

impl PathClassifier {
    pub fn new(repository_suffix: impl Into<String>, entry_name: impl Into<String>) -> Self {
        Self {
            repository_suffix: repository_suffix.into(),
            entry_name: entry_name.into(),
        }
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Classify an absolute, normalized path.
    ///
    /// Empty fragments (trailing or doubled separators) never take part in
    /// classification.
    pub fn classify(&self, path: &Path) -> PathClass {
        let components: Vec<Component<'_>> = path.components().collect();

        for (i, component) in components.iter().enumerate() {
            let Component::Normal(name) = component else {
                continue;
            };
            if !name.to_string_lossy().ends_with(&self.repository_suffix) {
                continue;
            }

            let rest: Vec<String> = components[i + 1..]
                .iter()
                .filter_map(|c| match c {
                    Component::Normal(n) => Some(n.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();

            let repo: PathBuf = components[..=i].iter().collect();
            match rest.split_first() {
                None => {
                    return PathClass::RepoOrOverlayRoot {
                        repo,
                        overlay_root: false,
                    }
                }
                Some((first, below)) if *first == self.entry_name => {
                    return Self::classify_overlay(repo, below);
                }
                // A later segment may still qualify.
                Some(_) => continue,
            }
        }

        PathClass::Passthrough
    }

    fn classify_overlay(repo: PathBuf, below: &[String]) -> PathClass {
        let Some((first, fragments)) = below.split_first() else {
            return PathClass::RepoOrOverlayRoot {
                repo,
                overlay_root: true,
            };
        };

        match ObjectType::from_name(first) {
            Some(object_type) => PathClass::ObjectType {
                repo,
                object_type,
                fragments: fragments.to_vec(),
            },
            None => PathClass::UnknownObjectType {
                repo,
                name: first.clone(),
                fragments: fragments.to_vec(),
            },
        }
    }
}

/// Make `path` absolute against `cwd` and normalize it lexically.
///
/// `.` segments are dropped and `..` pops a segment but never climbs above
/// the root. Symbolic links are not consulted.
///
/// ```
/// use gitoverlay::core::paths::absolutize;
/// use std::path::Path;
///
/// assert_eq!(
///     absolutize(Path::new("../b/./c/"), Path::new("/work/a")),
///     Path::new("/work/b/c")
/// );
/// assert_eq!(absolutize(Path::new("/../x"), Path::new("/cwd")), Path::new("/x"));
/// ```
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // pop() refuses to remove the root
                normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

/// [`absolutize`] against the process working directory.
pub fn resolve(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(absolutize(path, Path::new("/")));
    }
    Ok(absolutize(path, &std::env::current_dir()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PathClassifier {
        PathClassifier::new(".git", "gitFakeFs")
    }

    fn classify(path: &str) -> PathClass {
        classifier().classify(Path::new(path))
    }

    #[test]
    fn no_repository_segment_passes_through() {
        assert_eq!(classify("/"), PathClass::Passthrough);
        assert_eq!(classify("/home/user/src/main.rs"), PathClass::Passthrough);
        assert_eq!(classify("/home/user/.github/workflows"), PathClass::Passthrough);
    }

    #[test]
    fn repository_internals_pass_through() {
        assert_eq!(classify("/work/.git/objects/pack"), PathClass::Passthrough);
        assert_eq!(classify("/work/repo.git/HEAD"), PathClass::Passthrough);
    }

    #[test]
    fn repository_root() {
        assert_eq!(
            classify("/work/repo.git"),
            PathClass::RepoOrOverlayRoot {
                repo: PathBuf::from("/work/repo.git"),
                overlay_root: false,
            }
        );
        assert_eq!(
            classify("/work/.git/"),
            PathClass::RepoOrOverlayRoot {
                repo: PathBuf::from("/work/.git"),
                overlay_root: false,
            }
        );
    }

    #[test]
    fn overlay_root_with_and_without_trailing_separator() {
        let expected = PathClass::RepoOrOverlayRoot {
            repo: PathBuf::from("/work/repo.git"),
            overlay_root: true,
        };
        assert_eq!(classify("/work/repo.git/gitFakeFs"), expected);
        assert_eq!(classify("/work/repo.git/gitFakeFs/"), expected);
        assert_eq!(expected.depth(), Some(0));
    }

    #[test]
    fn object_type_levels() {
        assert_eq!(
            classify("/r.git/gitFakeFs/branches"),
            PathClass::ObjectType {
                repo: PathBuf::from("/r.git"),
                object_type: ObjectType::Branches,
                fragments: vec![],
            }
        );
        let deep = classify("/r.git/gitFakeFs/commits/abc/dir/file.txt");
        assert_eq!(
            deep,
            PathClass::ObjectType {
                repo: PathBuf::from("/r.git"),
                object_type: ObjectType::Commits,
                fragments: vec!["abc".into(), "dir".into(), "file.txt".into()],
            }
        );
        assert_eq!(deep.depth(), Some(4));
    }

    #[test]
    fn unknown_object_type() {
        assert_eq!(
            classify("/r.git/gitFakeFs/foobar"),
            PathClass::UnknownObjectType {
                repo: PathBuf::from("/r.git"),
                name: "foobar".into(),
                fragments: vec![],
            }
        );
    }

    #[test]
    fn leftmost_qualifying_segment_wins() {
        let class = classify("/a.git/gitFakeFs/HEAD/vendored.git/gitFakeFs");
        assert_eq!(class.repo(), Some(Path::new("/a.git")));
    }

    #[test]
    fn later_segment_qualifies_when_earlier_does_not() {
        assert_eq!(
            classify("/a.git/worktrees/b.git"),
            PathClass::RepoOrOverlayRoot {
                repo: PathBuf::from("/a.git/worktrees/b.git"),
                overlay_root: false,
            }
        );
    }

    #[test]
    fn suffix_must_end_the_segment() {
        assert_eq!(classify("/work/repo.gitx/gitFakeFs"), PathClass::Passthrough);
    }

    #[test]
    fn custom_names() {
        let c = PathClassifier::new(".repo", "@git");
        assert_eq!(
            c.classify(Path::new("/x/y.repo/@git/index")),
            PathClass::ObjectType {
                repo: PathBuf::from("/x/y.repo"),
                object_type: ObjectType::Index,
                fragments: vec![],
            }
        );
        assert_eq!(c.classify(Path::new("/x/y.git/gitFakeFs")), PathClass::Passthrough);
    }

    #[test]
    fn absolutize_relative_and_dots() {
        assert_eq!(
            absolutize(Path::new("repo.git/./gitFakeFs/../gitFakeFs"), Path::new("/w")),
            PathBuf::from("/w/repo.git/gitFakeFs")
        );
        assert_eq!(absolutize(Path::new("/"), Path::new("/w")), PathBuf::from("/"));
    }
}
