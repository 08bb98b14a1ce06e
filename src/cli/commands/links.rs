//! readlink and realpath commands

use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::ui::output;
use crate::vfs::Filesystem;

/// Print the target of the symbolic link at `path`.
pub async fn readlink(fs: &dyn Filesystem, ctx: &Context, path: &Path) -> Result<()> {
    let target = fs
        .read_link(path)
        .await
        .with_context(|| format!("cannot read link '{}'", path.display()))?;
    output::print(target.display(), ctx.verbosity);
    Ok(())
}

/// Print the canonical form of `path`.
pub async fn realpath(fs: &dyn Filesystem, ctx: &Context, path: &Path) -> Result<()> {
    let real = fs
        .realpath(path)
        .await
        .with_context(|| format!("cannot resolve '{}'", path.display()))?;
    output::print(real.display(), ctx.verbosity);
    Ok(())
}
