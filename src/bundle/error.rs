//! Bundle error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from compiling a bundle entry.
///
/// Every variant names the file it originates from.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("entry not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: scss: {message}", path.display())]
    Scss { path: PathBuf, message: String },

    #[error("{}: css: {message}", path.display())]
    Css { path: PathBuf, message: String },

    #[error("{}: syntax error: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: cannot resolve import `{specifier}`", path.display())]
    UnresolvedImport { path: PathBuf, specifier: String },

    #[error("{}: {message}", path.display())]
    Unsupported { path: PathBuf, message: String },

    #[error("{}: circular import of {}", path.display(), via.display())]
    Cycle { path: PathBuf, via: PathBuf },
}

impl BundleError {
    pub(crate) fn unsupported(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            message: message.into(),
        }
    }
}
