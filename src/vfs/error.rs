//! Error constructors shared by every filesystem in the crate.
//!
//! Virtual not-found errors use the same [`io::ErrorKind`] and message shape
//! as the host filesystem, so callers cannot tell them apart.

use std::io;
use std::path::Path;

use super::traits::Operation;

/// The requested path does not exist.
pub fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("ENOENT, no such file or directory '{}'", path.display()),
    )
}

/// A path component that must be a directory is not one.
pub fn not_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotADirectory,
        format!("ENOTDIR, not a directory '{}'", path.display()),
    )
}

/// The operation needs a directory but got something else, or vice versa.
pub fn is_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("EISDIR, illegal operation on a directory '{}'", path.display()),
    )
}

/// `read_link` on something that is not a symbolic link.
pub fn not_a_link(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("EINVAL, invalid argument '{}'", path.display()),
    )
}

pub fn too_many_links(path: &Path) -> io::Error {
    io::Error::other(format!(
        "ELOOP, too many levels of symbolic links '{}'",
        path.display()
    ))
}

/// The operation has no meaning on this virtual node.
pub fn unsupported(op: Operation, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{op} not supported on virtual directory '{}'", path.display()),
    )
}

/// A blocking variant was asked for something that needs repository I/O.
pub fn not_implemented(op: Operation) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{op}_sync: not implemented"),
    )
}

/// `err` reported against `path` instead of the path it was raised for.
///
/// Errors from the constructors in this module and repository not-found
/// errors are rebuilt; anything else is returned unchanged.
pub fn retarget(err: io::Error, path: &Path) -> io::Error {
    let message = err.to_string();
    match err.kind() {
        io::ErrorKind::NotFound => not_found(path),
        io::ErrorKind::NotADirectory => not_a_directory(path),
        io::ErrorKind::IsADirectory => is_a_directory(path),
        io::ErrorKind::InvalidInput if message.starts_with("EINVAL") => not_a_link(path),
        _ if message.starts_with("ELOOP") => too_many_links(path),
        _ => err,
    }
}
