//! cat command - Print a file

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::ui::output;
use crate::vfs::Filesystem;

/// Write the contents of `path` to stdout.
pub async fn cat(fs: &dyn Filesystem, path: &Path) -> Result<()> {
    let bytes = fs
        .read_file(path)
        .await
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    output::raw(&bytes)?;
    Ok(())
}
