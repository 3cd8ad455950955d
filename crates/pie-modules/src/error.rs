use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The directory does not describe a valid module repository.
    #[error("{0}")]
    Metadata(String),

    #[error("Could not checkout branch '{branch}': {stderr}")]
    Checkout { branch: String, stderr: String },

    #[error("`git {command}` failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RepositoryError {
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
