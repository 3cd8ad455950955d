//! A single module repository checked out under the modules directory.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{RepositoryError, RepositoryResult};
use crate::git::{self, Git};
use crate::metadata::{self, Metadata};

/// The repository bundled with the bot. It lives inside the bot's own
/// checkout, so its git directory is looked up in parent directories.
pub const BASE_REPOSITORY: &str = "base";

pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// External programs a repository shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    pub git: String,
    /// Interpreter that runs `-m pip install -r requirements.txt`.
    pub python: String,
}

impl Default for Executables {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            python: "python3".to_string(),
        }
    }
}

/// The latest commit of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct Repository {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub name: String,
    pub module_names: Vec<String>,
    executables: Executables,
}

impl Repository {
    pub fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        Self::open_with(path, None, &Executables::default())
    }

    /// Open the repository at `path`, checking out `branch` first when given.
    pub fn open_with(
        path: impl Into<PathBuf>,
        branch: Option<&str>,
        executables: &Executables,
    ) -> RepositoryResult<Self> {
        let path = path.into();
        if let Some(branch) = branch {
            checkout(&Git::new(&executables.git, &path, false), branch)?;
        }

        let Metadata { name, module_names } = metadata::read(&path)?;
        Ok(Self {
            path,
            branch: branch.map(str::to_string),
            name,
            module_names,
            executables: executables.clone(),
        })
    }

    pub fn is_base(&self) -> bool {
        self.name == BASE_REPOSITORY
    }

    fn git(&self) -> Git<'_> {
        Git::new(&self.executables.git, &self.path, self.is_base())
    }

    /// Fetch from origin and check out `branch`.
    pub fn change_branch(&mut self, branch: &str) -> RepositoryResult<()> {
        checkout(&self.git(), branch)?;
        self.branch = Some(branch.to_string());
        Ok(())
    }

    /// Clone `url` into `path`.
    pub fn git_clone(path: &Path, url: &str, executables: &Executables) -> RepositoryResult<()> {
        let target = std::path::absolute(path).map_err(|e| RepositoryError::io(path, e))?;
        tracing::info!(url, path = %target.display(), "Cloning repository");

        let mut command = Command::new(&executables.git);
        command.arg("clone").arg(url).arg(&target);
        let output = git::spawn(command, &executables.git)?;
        if !output.status.success() {
            return Err(RepositoryError::Git {
                command: format!("clone {url}"),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// `git pull`, returning git's output.
    pub fn git_pull(&self, force: bool) -> RepositoryResult<String> {
        if force {
            self.git().run(&["pull", "--force"])
        } else {
            self.git().run(&["pull"])
        }
    }

    /// Drop local changes and pull: fetch, `reset --hard` to the remote
    /// counterpart of the active branch, then force pull.
    pub fn git_reset_pull(&self) -> RepositoryResult<String> {
        let git = self.git();
        git.run(&["fetch", "origin"])?;

        let branch = self.active_branch()?;
        let reset = git.run(&["reset", "--hard", &format!("origin/{branch}")])?;
        let pull = git.run(&["pull", "--force"])?;
        Ok(format!("{reset}\n{pull}"))
    }

    pub fn active_branch(&self) -> RepositoryResult<String> {
        let branch = self.git().run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            return Err(RepositoryError::Git {
                command: "rev-parse --abbrev-ref HEAD".to_string(),
                stderr: "HEAD is detached".to_string(),
            });
        }
        Ok(branch)
    }

    pub fn head_commit(&self) -> RepositoryResult<CommitInfo> {
        let line = self.git().run(&["log", "-1", "--format=%H%x1f%an%x1f%aI%x1f%s"])?;
        parse_commit(&line).ok_or_else(|| RepositoryError::Git {
            command: "log -1".to_string(),
            stderr: format!("unexpected output: {line}"),
        })
    }

    fn requirements(&self) -> Option<PathBuf> {
        let file = self.path.join(REQUIREMENTS_FILE);
        file.is_file().then_some(file)
    }

    /// SHA-256 of `requirements.txt`, or `None` when the repository has none.
    pub fn requirements_txt_hash(&self) -> RepositoryResult<Option<String>> {
        let Some(file) = self.requirements() else {
            return Ok(None);
        };

        let mut handle = File::open(&file).map_err(|e| RepositoryError::io(&file, e))?;
        let mut hasher = Sha256::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let read = handle.read(&mut chunk).map_err(|e| RepositoryError::io(&file, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&chunk[..read]);
        }
        Ok(Some(hex::encode(hasher.finalize())))
    }

    /// Install the packages listed in `requirements.txt`.
    ///
    /// Returns the installer's stderr, or its stdout when stderr is empty;
    /// `None` when the repository has no requirements.
    pub fn install_requirements(&self) -> RepositoryResult<Option<String>> {
        let Some(file) = self.requirements() else {
            return Ok(None);
        };
        let file = std::path::absolute(&file).map_err(|e| RepositoryError::io(&file, e))?;

        tracing::info!(repository = %self.name, "Installing requirements");
        let mut command = Command::new(&self.executables.python);
        command.args(["-m", "pip", "install", "-r"]).arg(&file);
        let output = git::spawn(command, &self.executables.python)?;
        tracing::debug!(status = %output.status, "Installer finished");

        let result = if output.stderr.is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Ok(Some(String::from_utf8_lossy(&result).into_owned()))
    }
}

fn checkout(git: &Git<'_>, branch: &str) -> RepositoryResult<()> {
    git.run(&["fetch", "origin"])?;
    match git.run(&["checkout", branch]) {
        Ok(_) => Ok(()),
        Err(RepositoryError::Git { stderr, .. }) => Err(RepositoryError::Checkout {
            branch: branch.to_string(),
            stderr,
        }),
        Err(e) => Err(e),
    }
}

fn parse_commit(line: &str) -> Option<CommitInfo> {
    let mut fields = line.splitn(4, '\u{1f}');
    let hash = fields.next()?.to_string();
    let author = fields.next()?.to_string();
    let timestamp = DateTime::parse_from_rfc3339(fields.next()?).ok()?.with_timezone(&Utc);
    let summary = fields.next()?.to_string();
    Some(CommitInfo {
        hash,
        author,
        timestamp,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn repository(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        fs::create_dir_all(path.join("core")).unwrap();
        fs::write(path.join("core").join("__init__.py"), "").unwrap();
        fs::write(path.join("core").join("module.py"), "").unwrap();
        fs::write(path.join("repo.conf"), format!("[repository]\nname = {name}\nmodules = core\n")).unwrap();
        path
    }

    #[test]
    fn test_open() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::open(repository(dir.path(), "fun")).unwrap();
        assert_eq!(repo.name, "fun");
        assert_eq!(repo.module_names, vec!["core"]);
        assert_eq!(repo.branch, None);
        assert!(!repo.is_base());
    }

    #[test]
    fn test_open_invalid_is_metadata_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        assert!(Repository::open(dir.path().join("empty")).unwrap_err().is_metadata());
    }

    #[test]
    fn test_requirements_hash() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::open(repository(dir.path(), "fun")).unwrap();
        assert_eq!(repo.requirements_txt_hash().unwrap(), None);

        fs::write(repo.path.join(REQUIREMENTS_FILE), "hello").unwrap();
        assert_eq!(
            repo.requirements_txt_hash().unwrap().as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
    }

    #[test]
    fn test_requirements_hash_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::open(repository(dir.path(), "fun")).unwrap();
        let content = "discord.py>=2.0\n".repeat(200);
        fs::write(repo.path.join(REQUIREMENTS_FILE), &content).unwrap();

        let expected = hex::encode(Sha256::digest(content.as_bytes()));
        assert_eq!(repo.requirements_txt_hash().unwrap(), Some(expected));
    }

    #[test]
    fn test_install_requirements_output() {
        let dir = tempfile::tempdir().unwrap();
        let executables = Executables {
            git: "git".to_string(),
            python: "echo".to_string(),
        };
        let repo = Repository::open_with(repository(dir.path(), "fun"), None, &executables).unwrap();
        assert_eq!(repo.install_requirements().unwrap(), None);

        fs::write(repo.path.join(REQUIREMENTS_FILE), "requests\n").unwrap();
        let output = repo.install_requirements().unwrap().unwrap();
        assert!(output.starts_with("-m pip install -r /"));
        assert!(output.trim_end().ends_with(REQUIREMENTS_FILE));
    }

    #[test]
    fn test_clone_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing-source");
        let err = Repository::git_clone(
            &dir.path().join("target"),
            &missing.display().to_string(),
            &Executables::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::Git { .. } | RepositoryError::Io { .. }));
        assert!(!dir.path().join("target").exists());
    }

    fn run_git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(["-c", "user.name=Pie Test", "-c", "user.email=pie@example.org", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&output.stderr));
    }

    /// A git repository with `main` and `dev` branches pointing at one commit.
    fn origin(root: &Path, name: &str) -> PathBuf {
        let path = repository(root, name);
        run_git(&path, &["init"]);
        run_git(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(&path, &["add", "."]);
        run_git(&path, &["commit", "-m", "init"]);
        run_git(&path, &["branch", "dev"]);
        path
    }

    fn clone(root: &Path, origin: &Path, branch: Option<&str>) -> Repository {
        let target = root.join("modules").join("fun");
        fs::create_dir_all(root.join("modules")).unwrap();
        Repository::git_clone(&target, &origin.display().to_string(), &Executables::default()).unwrap();
        Repository::open_with(&target, branch, &Executables::default()).unwrap()
    }

    #[test]
    fn test_open_with_branch() {
        let dir = tempfile::tempdir().unwrap();
        let origin = origin(dir.path(), "origin");
        let mut repo = clone(dir.path(), &origin, Some("dev"));
        assert_eq!(repo.branch.as_deref(), Some("dev"));
        assert_eq!(repo.active_branch().unwrap(), "dev");

        repo.change_branch("main").unwrap();
        assert_eq!(repo.branch.as_deref(), Some("main"));
        assert_eq!(repo.active_branch().unwrap(), "main");
    }

    #[test]
    fn test_checkout_failure() {
        let dir = tempfile::tempdir().unwrap();
        let origin = origin(dir.path(), "origin");
        let mut repo = clone(dir.path(), &origin, None);

        let err = repo.change_branch("nope").unwrap_err();
        assert!(matches!(&err, RepositoryError::Checkout { branch, .. } if branch == "nope"));
        assert!(err.to_string().starts_with("Could not checkout branch 'nope': "));
        assert_eq!(repo.branch, None);

        let target = repo.path.clone();
        let err = Repository::open_with(&target, Some("nope"), &Executables::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::Checkout { .. }));
    }

    #[test]
    fn test_reset_pull_discards_local_changes() {
        let dir = tempfile::tempdir().unwrap();
        let origin = origin(dir.path(), "origin");
        let repo = clone(dir.path(), &origin, Some("dev"));

        let module = repo.path.join("core").join("module.py");
        fs::write(&module, "broken = True\n").unwrap();
        repo.git_reset_pull().unwrap();
        assert_eq!(fs::read_to_string(&module).unwrap(), "");
        assert_eq!(repo.active_branch().unwrap(), "dev");
    }

    #[test]
    fn test_pull_and_head_commit() {
        let dir = tempfile::tempdir().unwrap();
        let origin = origin(dir.path(), "origin");
        let repo = clone(dir.path(), &origin, Some("dev"));
        assert_eq!(repo.head_commit().unwrap().summary, "init");

        run_git(&origin, &["checkout", "dev"]);
        fs::write(origin.join(REQUIREMENTS_FILE), "requests\n").unwrap();
        run_git(&origin, &["add", "."]);
        run_git(&origin, &["commit", "-m", "second"]);

        assert_eq!(repo.requirements_txt_hash().unwrap(), None);
        repo.git_pull(false).unwrap();
        assert!(repo.requirements_txt_hash().unwrap().is_some());

        let commit = repo.head_commit().unwrap();
        assert_eq!(commit.summary, "second");
        assert_eq!(commit.author, "Pie Test");
        assert_eq!(commit.hash.len(), 40);
    }

    #[test]
    fn test_only_base_uses_parent_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let origin = origin(dir.path(), "origin");

        let fun = Repository::open(repository(&origin, "fun")).unwrap();
        assert!(matches!(fun.active_branch().unwrap_err(), RepositoryError::Git { .. }));

        let base = Repository::open(repository(&origin, BASE_REPOSITORY)).unwrap();
        assert_eq!(base.active_branch().unwrap(), "main");
    }

    #[test]
    fn test_parse_commit() {
        let commit = parse_commit("abc123\u{1f}Jane Doe\u{1f}2024-03-01T12:30:00+01:00\u{1f}Fix: a\u{1f}b").unwrap();
        assert_eq!(commit.hash, "abc123");
        assert_eq!(commit.author, "Jane Doe");
        assert_eq!(commit.timestamp.to_rfc3339(), "2024-03-01T11:30:00+00:00");
        assert_eq!(commit.summary, "Fix: a\u{1f}b");

        assert_eq!(parse_commit("abc123"), None);
    }
}
