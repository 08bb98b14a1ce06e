//! Architecture enforcement tests.
//!
//! These tests keep the layering visible in `lib.rs` honest:
//!
//! 1. **Git doorway** - only `src/git/` names `git2`
//! 2. **Commands go through the overlay** - command handlers never touch the
//!    host filesystem themselves
//! 3. **Errors go to the caller** - the overlay and caches never log at
//!    warn/error level
//! 4. **Logging setup** - only the CLI layer installs a subscriber

use std::fs;
use std::path::{Path, PathBuf};

/// All `.rs` files below `dir`.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("Failed to read directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Source lines outside `#[cfg(test)]` modules.
///
/// Test modules sit at the end of each file in this crate, so everything
/// from the first `#[cfg(test)]` on is skipped.
fn production_source(path: &Path) -> String {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(index) => content[..index].to_string(),
        None => content,
    }
}

fn violations(dir: &str, allowed: &[&str], needles: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for path in rust_files(Path::new(dir)) {
        let display = path.display().to_string();
        if allowed.iter().any(|prefix| display.starts_with(prefix)) {
            continue;
        }
        let source = production_source(&path);
        for needle in needles {
            if source.contains(needle) {
                found.push(format!("{}: uses `{}`", display, needle));
            }
        }
    }
    found
}

#[test]
fn only_git_module_uses_git2() {
    let found = violations("src", &["src/git/"], &["git2::"]);
    assert!(
        found.is_empty(),
        "git2 used outside src/git/:\n{}",
        found.join("\n")
    );
}

#[test]
fn commands_do_not_touch_host_filesystem() {
    // mod.rs builds the overlay over the host filesystem; handlers only see
    // the installed `Filesystem`.
    let found = violations(
        "src/cli/commands",
        &["src/cli/commands/mod.rs"],
        &["std::fs", "tokio::fs", "HostFs"],
    );
    assert!(
        found.is_empty(),
        "command handlers bypass the overlay:\n{}",
        found.join("\n")
    );
}

#[test]
fn overlay_does_not_log_errors() {
    let mut found = violations(
        "src/overlay",
        &[],
        &["tracing::warn!", "tracing::error!"],
    );
    found.extend(violations(
        "src/cache",
        &[],
        &["tracing::warn!", "tracing::error!"],
    ));
    assert!(
        found.is_empty(),
        "overlay errors belong to the caller:\n{}",
        found.join("\n")
    );
}

#[test]
fn only_cli_installs_subscriber() {
    let found = violations("src", &["src/cli/mod.rs"], &["tracing_subscriber"]);
    assert!(
        found.is_empty(),
        "tracing subscriber configured outside the CLI:\n{}",
        found.join("\n")
    );
}
