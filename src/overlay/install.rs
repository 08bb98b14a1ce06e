//! overlay::install
//!
//! An explicitly owned filesystem binding.
//!
//! Code that wants "the filesystem" asks an [`FsSlot`] for it instead of
//! reaching for the host directly. Installing an overlay into the slot swaps
//! what every such caller sees; [`Installation::uninstall`] puts back exactly
//! what was bound before, including nothing at all.
//!
//! # Example
//!
//! ```
//! use gitoverlay::overlay::{FsSlot, GitOverlay};
//! use gitoverlay::vfs::HostFs;
//! use std::sync::Arc;
//!
//! let slot = FsSlot::new();
//! let installation = slot.install(Arc::new(GitOverlay::new(HostFs::new())));
//! assert!(slot.is_installed());
//! installation.uninstall();
//! assert!(!slot.is_installed());
//! ```

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::vfs::{Filesystem, HostFs};

type Binding = Option<Arc<dyn Filesystem>>;

/// A replaceable filesystem binding.
pub struct FsSlot {
    bound: RwLock<Binding>,
}

static GLOBAL: FsSlot = FsSlot::new();

impl FsSlot {
    /// An empty slot; [`current`](Self::current) yields the host filesystem.
    pub const fn new() -> Self {
        Self {
            bound: RwLock::new(None),
        }
    }

    /// The process-wide slot.
    pub fn global() -> &'static FsSlot {
        &GLOBAL
    }

    /// The installed filesystem, or the host filesystem if none is.
    pub fn current(&self) -> Arc<dyn Filesystem> {
        match self.read().as_ref() {
            Some(fs) => Arc::clone(fs),
            None => Arc::new(HostFs::new()),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.read().is_some()
    }

    /// Bind `fs`, remembering the previous binding.
    pub fn install(&self, fs: Arc<dyn Filesystem>) -> Installation<'_> {
        let previous = self.write().replace(Arc::clone(&fs));
        tracing::debug!(replaced = previous.is_some(), "filesystem installed");
        Installation {
            slot: self,
            installed: fs,
            previous,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Binding> {
        self.bound.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Binding> {
        self.bound.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for FsSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// A filesystem bound into an [`FsSlot`].
///
/// Dropping this leaves the filesystem installed.
#[must_use = "call uninstall() to restore the previous filesystem"]
pub struct Installation<'a> {
    slot: &'a FsSlot,
    installed: Arc<dyn Filesystem>,
    previous: Binding,
}

impl Installation<'_> {
    /// The filesystem this installation bound.
    pub fn filesystem(&self) -> Arc<dyn Filesystem> {
        Arc::clone(&self.installed)
    }

    /// Restore the binding that was in place before [`FsSlot::install`].
    pub fn uninstall(self) {
        *self.slot.write() = self.previous;
        tracing::debug!("filesystem uninstalled");
    }
}
