//! stat command - Show metadata for a path

use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::ui::output;
use crate::vfs::Filesystem;

/// Print metadata for `path`, following a final link unless `no_follow`.
pub async fn stat(fs: &dyn Filesystem, ctx: &Context, path: &Path, no_follow: bool) -> Result<()> {
    let metadata = if no_follow {
        fs.lstat(path).await
    } else {
        fs.stat(path).await
    }
    .with_context(|| format!("cannot stat '{}'", path.display()))?;

    if ctx.json {
        output::json(&metadata)?;
    } else {
        output::print(
            format!("{} {}", output::format_metadata(&metadata), path.display()),
            ctx.verbosity,
        );
    }
    Ok(())
}
