//! Template error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}:{line}: cannot include {}: {source}", path.display(), include.display())]
    Include {
        path: PathBuf,
        line: usize,
        include: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {} includes itself", path.display(), include.display())]
    IncludeCycle {
        path: PathBuf,
        line: usize,
        include: PathBuf,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: `{url}` does not resolve to a file in the serve root", page.display())]
    DanglingReference { page: PathBuf, url: String },
}

impl TemplateError {
    pub(crate) fn syntax(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
