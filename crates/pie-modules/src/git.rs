use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{RepositoryError, RepositoryResult};

/// Runs git inside a repository directory.
pub(crate) struct Git<'a> {
    program: &'a str,
    dir: &'a Path,
    search_parents: bool,
}

impl<'a> Git<'a> {
    /// Without `search_parents`, git must find the repository at `dir` itself
    /// and may not climb into enclosing checkouts.
    pub(crate) fn new(program: &'a str, dir: &'a Path, search_parents: bool) -> Self {
        Self {
            program,
            dir,
            search_parents,
        }
    }

    pub(crate) fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(self.program);
        command.args(args).current_dir(self.dir);
        if !self.search_parents {
            if let Some(parent) = std::path::absolute(self.dir).ok().and_then(|d| d.parent().map(Path::to_path_buf)) {
                command.env("GIT_CEILING_DIRECTORIES", parent);
            }
        }
        command
    }

    /// Run a git subcommand and return its trimmed stdout.
    pub(crate) fn run(&self, args: &[&str]) -> RepositoryResult<String> {
        tracing::debug!(dir = %self.dir.display(), "git {}", args.join(" "));
        let output = spawn(self.command(args), self.program)?;
        if !output.status.success() {
            return Err(RepositoryError::Git {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Run `command`, mapping a failure to start `program` to an I/O error.
pub(crate) fn spawn(mut command: Command, program: &str) -> RepositoryResult<Output> {
    command
        .output()
        .map_err(|source| RepositoryError::io(PathBuf::from(program), source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn ceiling(command: &Command) -> Option<PathBuf> {
        command
            .get_envs()
            .find(|(key, _)| *key == OsStr::new("GIT_CEILING_DIRECTORIES"))
            .and_then(|(_, value)| value.map(PathBuf::from))
    }

    #[test]
    fn test_ceiling_stops_parent_search() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("fun");

        let command = Git::new("git", &repo, false).command(&["status"]);
        assert_eq!(ceiling(&command), Some(dir.path().to_path_buf()));
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec![OsStr::new("status")]);
    }

    #[test]
    fn test_parent_search_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let command = Git::new("git", dir.path(), true).command(&["pull"]);
        assert_eq!(ceiling(&command), None);
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Git::new("/nonexistent/git", dir.path(), false)
            .run(&["status"])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Io { .. }));
    }
}
