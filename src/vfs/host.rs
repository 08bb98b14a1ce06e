//! Host filesystem backend.
//!
//! Thin pass-through to the operating system. Async operations use
//! `tokio::fs`, blocking ones `std::fs`. Paths are used as given.

use super::traits::{Filesystem, Metadata, SyncFilesystem};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl HostFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filesystem for HostFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        Ok(fs::metadata(path).await?.into())
    }

    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        Ok(fs::symlink_metadata(path).await?.into())
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path).await
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path).await
    }
}

impl SyncFilesystem for HostFs {
    fn read_dir_sync(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn stat_sync(&self, path: &Path) -> io::Result<Metadata> {
        Ok(std::fs::metadata(path)?.into())
    }

    fn lstat_sync(&self, path: &Path) -> io::Result<Metadata> {
        Ok(std::fs::symlink_metadata(path)?.into())
    }

    fn read_file_sync(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_link_sync(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn realpath_sync(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}
