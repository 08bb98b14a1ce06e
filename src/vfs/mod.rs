//! vfs
//!
//! The filesystem interface the overlay consumes and exposes.
//!
//! # Design
//!
//! Two traits describe the same operation set:
//!
//! - [`Filesystem`]: asynchronous, the primary convention
//! - [`SyncFilesystem`]: blocking, `_sync`-suffixed operations
//!
//! [`HostFs`] implements both over the operating system. The overlay
//! decorates any implementation and implements the same traits, so it can
//! be substituted wherever a filesystem is injected.

mod error;
mod host;
mod traits;

pub use error::{
    is_a_directory, not_a_directory, not_a_link, not_found, not_implemented, retarget,
    too_many_links, unsupported,
};
pub use host::HostFs;
pub use traits::{EntryKind, Filesystem, Metadata, Operation, SyncFilesystem};
