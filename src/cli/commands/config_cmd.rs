//! config command - Show the effective overlay configuration

use anyhow::Result;
use serde::Serialize;

use super::Context;
use crate::core::config::OverlayConfig;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct Effective<'a> {
    source: Option<String>,
    #[serde(flatten)]
    overlay: &'a OverlayConfig,
}

/// Print where configuration came from and the values in effect.
pub fn show(ctx: &Context) -> Result<()> {
    let source = ctx.config_path.as_ref().map(|p| p.display().to_string());

    if ctx.json {
        output::json(&Effective {
            source,
            overlay: &ctx.overlay,
        })?;
        return Ok(());
    }

    output::print(
        format!("source: {}", source.as_deref().unwrap_or("(defaults)")),
        ctx.verbosity,
    );
    output::print(
        format!("repository_suffix = {:?}", ctx.overlay.repository_suffix),
        ctx.verbosity,
    );
    output::print(
        format!("entry_name = {:?}", ctx.overlay.entry_name),
        ctx.verbosity,
    );
    Ok(())
}
