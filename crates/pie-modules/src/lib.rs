//! Module repositories: discovery under the modules directory, metadata
//! validation, and git/pip synchronisation.
//!
//! All operations here are blocking; async callers should wrap them in
//! `tokio::task::spawn_blocking`.

pub mod error;
mod git;
pub mod manager;
pub mod metadata;
pub mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use manager::RepositoryManager;
pub use repository::{BASE_REPOSITORY, CommitInfo, Executables, Repository};
