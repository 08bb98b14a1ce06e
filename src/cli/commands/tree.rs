//! tree command - Recursively list a directory
//!
//! # Design
//!
//! The walk is depth-first and pre-order, in the order each directory lists
//! its entries. Entries are inspected with `lstat`, so symbolic links are
//! reported but never descended into.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::Context;
use crate::ui::output;
use crate::vfs::{EntryKind, Filesystem};

/// One entry found by [`walk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    /// Path relative to the walk root.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// 1 for direct children of the root.
    pub depth: usize,
}

/// Walk `root`, descending at most `max_depth` levels.
pub async fn walk(
    fs: &dyn Filesystem,
    root: &Path,
    max_depth: Option<usize>,
) -> io::Result<Vec<TreeEntry>> {
    let mut found = Vec::new();
    let mut pending: Vec<(PathBuf, usize)> = children(fs, root, Path::new(""), 1).await?;

    while let Some((relative, depth)) = pending.pop() {
        let metadata = fs.lstat(&root.join(&relative)).await?;

        if metadata.is_dir() && max_depth.map_or(true, |max| depth < max) {
            pending.extend(children(fs, root, &relative, depth + 1).await?);
        }

        found.push(TreeEntry {
            path: relative,
            kind: metadata.kind,
            depth,
        });
    }

    Ok(found)
}

/// Children of `root/relative`, reversed so the stack pops them in order.
async fn children(
    fs: &dyn Filesystem,
    root: &Path,
    relative: &Path,
    depth: usize,
) -> io::Result<Vec<(PathBuf, usize)>> {
    let names = fs.read_dir(&root.join(relative)).await?;
    Ok(names
        .into_iter()
        .rev()
        .map(|name| (relative.join(name), depth))
        .collect())
}

/// Print every entry below `path`.
pub async fn tree(
    fs: &dyn Filesystem,
    ctx: &Context,
    path: &Path,
    depth: Option<usize>,
) -> Result<()> {
    let entries = walk(fs, path, depth)
        .await
        .with_context(|| format!("cannot walk '{}'", path.display()))?;

    if ctx.json {
        output::json(&entries)?;
        return Ok(());
    }

    for entry in &entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = if entry.kind == EntryKind::Directory { "/" } else { "" };
        output::print(
            format!("{}{}{}", "  ".repeat(entry.depth - 1), name, marker),
            ctx.verbosity,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::HostFs;

    #[tokio::test]
    async fn walks_pre_order() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/c.txt"), "c").unwrap();
        std::fs::write(dir.path().join("z.txt"), "z").unwrap();

        let entries = walk(&HostFs::new(), dir.path(), None).await.unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a"),
                PathBuf::from("a/b"),
                PathBuf::from("a/b/c.txt"),
                PathBuf::from("z.txt"),
            ]
        );
        assert_eq!(entries[2].depth, 3);
        assert_eq!(entries[2].kind, EntryKind::File);
    }

    #[tokio::test]
    async fn depth_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let entries = walk(&HostFs::new(), dir.path(), Some(1)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("a"));
    }
}
