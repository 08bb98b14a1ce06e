//! ls command - List a directory

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::Context;
use crate::ui::output;
use crate::vfs::{Filesystem, Metadata};

#[derive(Debug, Serialize)]
struct LongEntry {
    name: String,
    #[serde(flatten)]
    metadata: Metadata,
}

/// List the entries of `path`.
pub async fn ls(fs: &dyn Filesystem, ctx: &Context, path: &Path, long: bool) -> Result<()> {
    let names = fs
        .read_dir(path)
        .await
        .with_context(|| format!("cannot list '{}'", path.display()))?;

    if !long {
        if ctx.json {
            output::json(&names)?;
        } else {
            for name in &names {
                output::print(name, ctx.verbosity);
            }
        }
        return Ok(());
    }

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let metadata = fs
            .lstat(&path.join(&name))
            .await
            .with_context(|| format!("cannot stat '{}'", path.join(&name).display()))?;
        entries.push(LongEntry { name, metadata });
    }

    if ctx.json {
        output::json(&entries)?;
    } else {
        for entry in &entries {
            output::print(
                format!("{} {}", output::format_metadata(&entry.metadata), entry.name),
                ctx.verbosity,
            );
        }
    }
    Ok(())
}
