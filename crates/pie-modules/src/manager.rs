use std::path::{Path, PathBuf};

use crate::error::{RepositoryError, RepositoryResult};
use crate::metadata::INIT_FILE;
use crate::repository::{Executables, Repository};

const PYCACHE: &str = "__pycache__";

/// Keeps track of the module repositories found in the modules directory.
#[derive(Debug)]
pub struct RepositoryManager {
    dir: PathBuf,
    executables: Executables,
    repositories: Vec<Repository>,
    log: Vec<String>,
}

impl RepositoryManager {
    /// Create a manager and scan `dir` right away.
    pub fn new(dir: impl Into<PathBuf>, executables: Executables) -> RepositoryResult<Self> {
        let mut manager = Self {
            dir: dir.into(),
            executables,
            repositories: Vec::new(),
            log: Vec::new(),
        };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn executables(&self) -> &Executables {
        &self.executables
    }

    /// Rescan the modules directory.
    ///
    /// Directories without an `__init__.py` are ignored; directories whose
    /// metadata is invalid are skipped and noted in [`log`](Self::log). The
    /// repository list is replaced only once the scan succeeds.
    pub fn refresh(&mut self) -> RepositoryResult<()> {
        let dir = self
            .dir
            .canonicalize()
            .map_err(|e| RepositoryError::io(&self.dir, e))?;

        let mut found: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| RepositoryError::io(&dir, e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.file_name().is_some_and(|name| name != PYCACHE))
            .collect();
        found.sort();

        let mut repositories = Vec::with_capacity(found.len());
        for directory in found {
            if !directory.join(INIT_FILE).is_file() {
                continue;
            }

            match Repository::open_with(&directory, None, &self.executables) {
                Ok(repository) => repositories.push(repository),
                Err(RepositoryError::Metadata(reason)) => {
                    let dir_name = directory
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    tracing::warn!(directory = %dir_name, %reason, "Skipping module directory");
                    self.log
                        .push(format!("Directory '{dir_name}' is not a repository: {reason}"));
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(count = repositories.len(), "Module repositories refreshed");
        self.repositories = repositories;
        Ok(())
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn get_repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repository| repository.name == name)
    }

    /// Messages about directories skipped since the last [`flush_log`](Self::flush_log).
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn flush_log(&mut self) {
        self.log.clear();
    }
}
