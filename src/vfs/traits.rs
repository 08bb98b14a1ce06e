//! Core VFS traits and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// File metadata, as returned by `stat` and `lstat`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes (0 for directories, target length for symlinks).
    pub size: u64,
    /// Unix mode bits including the file type (e.g. `0o100644`).
    pub mode: u32,
    /// Last modification time, if known.
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata of a synthetic directory.
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            mode: 0o040755,
            modified: None,
        }
    }

    pub fn file(size: u64, mode: u32) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            mode,
            modified: None,
        }
    }

    pub fn symlink(target_len: u64) -> Self {
        Self {
            kind: EntryKind::Symlink,
            size: target_len,
            mode: 0o120000,
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

impl From<std::fs::Metadata> for Metadata {
    fn from(meta: std::fs::Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = match kind {
            EntryKind::Directory => 0o040755,
            EntryKind::Symlink => 0o120000,
            EntryKind::File => 0o100644,
        };

        Self {
            kind,
            size: if kind == EntryKind::Directory { 0 } else { meta.len() },
            mode,
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// The operations every filesystem in this crate exposes.
///
/// Used for routing decisions and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadDir,
    Stat,
    Lstat,
    ReadFile,
    ReadLink,
    Realpath,
}

impl Operation {
    /// Directory listing.
    pub fn is_listing(self) -> bool {
        self == Operation::ReadDir
    }

    /// `stat`/`lstat` style metadata queries.
    pub fn is_metadata(self) -> bool {
        matches!(self, Operation::Stat | Operation::Lstat)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::ReadDir => "read_dir",
            Operation::Stat => "stat",
            Operation::Lstat => "lstat",
            Operation::ReadFile => "read_file",
            Operation::ReadLink => "read_link",
            Operation::Realpath => "realpath",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Asynchronous filesystem interface.
///
/// Paths are interpreted by the implementation: the host filesystem takes
/// them as-is, revision views take them relative to the view root.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// List the entry names of a directory.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Get metadata, following symbolic links.
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// Get metadata without following a final symbolic link.
    async fn lstat(&self, path: &Path) -> io::Result<Metadata>;

    /// Read the entire contents of a file.
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read the target of a symbolic link.
    async fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Resolve a path to its canonical, link-free form.
    async fn realpath(&self, path: &Path) -> io::Result<PathBuf>;

    /// Read a file as UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }
}

/// Blocking counterpart of [`Filesystem`].
///
/// Implementations that cannot answer without blocking I/O they do not own
/// (such as repository access behind the overlay) fail with
/// [`io::ErrorKind::Unsupported`].
pub trait SyncFilesystem: Send + Sync {
    fn read_dir_sync(&self, path: &Path) -> io::Result<Vec<String>>;

    fn stat_sync(&self, path: &Path) -> io::Result<Metadata>;

    fn lstat_sync(&self, path: &Path) -> io::Result<Metadata>;

    fn read_file_sync(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_link_sync(&self, path: &Path) -> io::Result<PathBuf>;

    fn realpath_sync(&self, path: &Path) -> io::Result<PathBuf>;
}
