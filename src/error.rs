use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type alias for filesystem and operation errors.
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Classified errors surfaced to the panels and the status line.
///
/// Raw `io::Error` values never leave the services layer; they are mapped
/// through [`FsError::classify`] so the UI can render a stable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("{0}: no such file or directory")]
    NotFound(String),

    #[error("{0}: permission denied")]
    PermissionDenied(String),

    #[error("{0}: not a directory")]
    NotADirectory(String),

    #[error("{0}: already exists")]
    AlreadyExists(String),

    /// Another file operation is still running.
    #[error("another operation is in progress")]
    Busy,

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("`{command}` exited with status {status}")]
    ExternalProcessFailed { command: String, status: i32 },

    #[error("{0}")]
    Io(String),
}

impl FsError {
    /// Map a raw I/O error for `path` into the taxonomy.
    pub fn classify(path: &Path, err: io::Error) -> Self {
        let what = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(what),
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied(what),
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists(what),
            _ => {
                if err.raw_os_error() == Some(libc::ENOTDIR) {
                    FsError::NotADirectory(what)
                } else {
                    FsError::Io(format!("{}: {}", what, err))
                }
            }
        }
    }
}
