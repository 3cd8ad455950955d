//! # pie-admin
//!
//! Maintenance command line for a pie deployment: database migrations, the
//! global bot configuration, module repositories and module storage.

use std::path::Path;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pie_common::config::AppConfig;
use pie_common::error::{PieError, PieResult};
use pie_common::models::{ConfigUpdate, StorageValue};
use pie_common::text::{PAGE_LIMIT, TableRow, create_table};
use pie_common::validation::{validate_key, validate_request};
use pie_db::Database;
use pie_modules::{BASE_REPOSITORY, Executables, Repository, RepositoryError, RepositoryManager};

/// Administer a pie bot installation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Print records as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show or change the global bot configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Manage module repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },
    /// Inspect and edit values stored by modules
    Storage {
        #[command(subcommand)]
        command: StorageCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Set {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// online, idle, dnd or invisible
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum RepoCommand {
    /// List repositories found in the modules directory
    List,
    /// Clone a repository into the modules directory
    Install {
        url: String,
        /// Directory name; defaults to the last segment of the URL
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Pull a repository and reinstall its requirements when they changed
    Update {
        name: String,
        #[arg(long)]
        force: bool,
        /// Discard local changes first
        #[arg(long)]
        reset: bool,
    },
    /// Delete a repository
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
enum StorageCommand {
    Get {
        module: String,
        guild_id: i64,
        /// Omit to list every key of the module
        key: Option<String>,
    },
    Set {
        module: String,
        guild_id: i64,
        key: String,
        value: String,
        /// bool, int, float or str
        #[arg(long = "type", default_value = "str")]
        value_type: String,
        /// Keep the stored value if the key exists
        #[arg(long)]
        keep: bool,
    },
    Remove {
        module: String,
        guild_id: i64,
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pie=info".into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;
    if let Err(e) = &result {
        let code = e.downcast_ref::<PieError>().map_or("INTERNAL_ERROR", PieError::error_code);
        tracing::error!(code, error = %e, "Command failed");
    }
    result
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = pie_common::config::init().map_err(PieError::from)?;

    match args.command {
        Commands::Migrate => {
            open_database(config).await?;
        }
        Commands::Config { command } => {
            let db = open_database(config).await?;
            run_config(&db, command, args.json).await?;
        }
        Commands::Storage { command } => {
            let db = open_database(config).await?;
            run_storage(&db, command, args.json).await?;
        }
        Commands::Repo { command } => {
            let json = args.json;
            tokio::task::spawn_blocking(move || run_repo(config, command, json)).await??;
        }
    }

    Ok(())
}

/// Connect and bring the schema up to date, so every command works on a
/// fresh database.
async fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let db = Database::connect(config).await?;
    db.migrate().await?;
    Ok(db)
}

fn print_table<I>(items: I, header: &[(&str, &str)])
where
    I: IntoIterator,
    I::Item: TableRow,
{
    for page in create_table(items, header, PAGE_LIMIT, false) {
        println!("{page}");
    }
}

// ============================================================================
// config
// ============================================================================

const CONFIG_HEADER: &[(&str, &str)] = &[("prefix", "Prefix"), ("language", "Language"), ("status", "Status")];

async fn run_config(db: &Database, command: ConfigCommand, json: bool) -> PieResult<()> {
    let repo = db.config();
    let mut current = repo.get().await?;

    if let ConfigCommand::Set {
        prefix,
        language,
        status,
    } = command
    {
        let update = ConfigUpdate {
            prefix,
            language,
            status,
        };
        validate_request(&update)?;
        current.apply(update);
        current = repo.save(&current).await?;
        tracing::info!(prefix = %current.prefix, language = %current.language, status = %current.status, "Configuration updated");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&current).map_err(anyhow::Error::from)?);
    } else {
        print_table([&current], CONFIG_HEADER);
    }
    Ok(())
}

// ============================================================================
// storage
// ============================================================================

const STORAGE_HEADER: &[(&str, &str)] = &[("key", "Key"), ("type", "Type"), ("value", "Value")];

async fn run_storage(db: &Database, command: StorageCommand, json: bool) -> PieResult<()> {
    let repo = db.storage();

    match command {
        StorageCommand::Get { module, guild_id, key } => {
            validate_key("module", &module)?;
            let items: Vec<_> = match key {
                Some(key) => repo
                    .get(&module, guild_id, &key)
                    .await?
                    .into_iter()
                    .collect(),
                None => repo.get_all(&module, guild_id).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items).map_err(anyhow::Error::from)?);
            } else if items.is_empty() {
                println!("Nothing stored.");
            } else {
                print_table(&items, STORAGE_HEADER);
            }
        }
        StorageCommand::Set {
            module,
            guild_id,
            key,
            value,
            value_type,
            keep,
        } => {
            validate_key("module", &module)?;
            validate_key("key", &key)?;
            let value = StorageValue::parse(&value, &value_type);
            match repo.set(&module, guild_id, &key, value, !keep).await? {
                Some(stored) => println!("Stored {} = {} ({}).", stored.key, stored.value, stored.value_type),
                None => println!("Key '{key}' already exists, kept the stored value."),
            }
        }
        StorageCommand::Remove { module, guild_id, key } => {
            if repo.remove(&module, guild_id, &key).await? {
                println!("Removed '{key}'.");
            } else {
                println!("Key '{key}' was not stored.");
            }
        }
    }
    Ok(())
}

// ============================================================================
// repo
// ============================================================================

struct RepositoryRow<'a>(&'a Repository);

impl TableRow for RepositoryRow<'_> {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "name" => Some(self.0.name.clone()),
            "modules" => Some(self.0.module_names.join(", ")),
            "path" => Some(self.0.path.display().to_string()),
            _ => None,
        }
    }
}

const REPOSITORY_HEADER: &[(&str, &str)] = &[("name", "Repository"), ("modules", "Modules"), ("path", "Path")];

fn executables(config: &AppConfig) -> Executables {
    Executables {
        git: config.modules.git.clone(),
        python: config.modules.python.clone(),
    }
}

fn run_repo(config: &AppConfig, command: RepoCommand, json: bool) -> anyhow::Result<()> {
    let mut manager = RepositoryManager::new(&config.modules.dir, executables(config))
        .with_context(|| format!("Could not scan '{}'", config.modules.dir.display()))?;

    match command {
        RepoCommand::List => {
            if json {
                let listing: Vec<_> = manager
                    .repositories()
                    .iter()
                    .map(|r| serde_json::json!({ "name": r.name, "modules": r.module_names, "path": r.path }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_table(manager.repositories().iter().map(RepositoryRow), REPOSITORY_HEADER);
            }
            for line in manager.log() {
                eprintln!("{line}");
            }
            manager.flush_log();
        }
        RepoCommand::Install { url, name, branch } => {
            let dir_name = match name {
                Some(name) => name,
                None => directory_name(&url).with_context(|| format!("Cannot derive a directory name from '{url}'"))?,
            };
            let target = manager.dir().join(&dir_name);
            if target.exists() {
                return Err(PieError::already_exists(format!("'{}'", target.display())).into());
            }

            Repository::git_clone(&target, &url, manager.executables())?;
            let repository = match Repository::open_with(&target, branch.as_deref(), manager.executables()) {
                Ok(repository) => repository,
                Err(e) => {
                    remove_clone(&target);
                    return Err(e.into());
                }
            };
            if manager.get_repository(&repository.name).is_some() {
                remove_clone(&target);
                return Err(PieError::already_exists(format!("Repository '{}'", repository.name)).into());
            }

            print_install_output(&repository)?;
            println!(
                "Installed repository '{}' with modules: {}",
                repository.name,
                repository.module_names.join(", ")
            );
        }
        RepoCommand::Update { name, force, reset } => {
            let repository = find_repository(&manager, &name)?;

            let before = repository.requirements_txt_hash()?;
            let output = if reset {
                repository.git_reset_pull()?
            } else {
                repository.git_pull(force)?
            };
            println!("{output}");

            let after = repository.requirements_txt_hash()?;
            if after.is_some() && before != after {
                print_install_output(repository)?;
            }
            manager.refresh()?;
        }
        RepoCommand::Remove { name } => {
            if name == BASE_REPOSITORY {
                bail!("Repository '{BASE_REPOSITORY}' cannot be removed");
            }
            let repository = find_repository(&manager, &name)?;
            std::fs::remove_dir_all(&repository.path)
                .with_context(|| format!("Could not delete '{}'", repository.path.display()))?;
            println!("Removed repository '{name}'.");
            manager.refresh()?;
        }
    }
    Ok(())
}

fn find_repository<'a>(manager: &'a RepositoryManager, name: &str) -> PieResult<&'a Repository> {
    manager
        .get_repository(name)
        .ok_or_else(|| PieError::not_found(format!("Repository '{name}'")))
}

fn print_install_output(repository: &Repository) -> Result<(), RepositoryError> {
    if let Some(output) = repository.install_requirements()? {
        println!("{}", output.trim_end());
    }
    Ok(())
}

fn remove_clone(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "Could not remove failed clone");
    }
}

/// `https://host/org/fun.git` -> `fun`
fn directory_name(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pie_common::config::{DatabaseConfig, ModulesConfig};

    #[test]
    fn test_directory_name() {
        assert_eq!(directory_name("https://github.com/pumpkin-py/pumpkin-fun.git"), Some("pumpkin-fun".into()));
        assert_eq!(directory_name("git@github.com:org/boards"), Some("boards".into()));
        assert_eq!(directory_name("https://example.org/repo/"), Some("repo".into()));
        assert_eq!(directory_name(".git"), None);
    }

    #[test]
    fn test_cli_parses() {
        let args = CliArgs::try_parse_from(["pie-admin", "repo", "update", "fun", "--reset"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Repo {
                command: RepoCommand::Update { reset: true, force: false, .. }
            }
        ));

        let args =
            CliArgs::try_parse_from(["pie-admin", "--json", "storage", "set", "fun", "1", "count", "3", "--type", "int"])
                .unwrap();
        assert!(args.json);
    }

    fn test_config(modules: &Path) -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            modules: ModulesConfig {
                dir: modules.to_path_buf(),
                git: "git".to_string(),
                python: "python3".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_commands_run_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_database(&test_config(dir.path())).await.unwrap();

        run_config(&db, ConfigCommand::Show, false).await.unwrap();
        let set = StorageCommand::Set {
            module: "fun".to_string(),
            guild_id: 1,
            key: "count".to_string(),
            value: "3".to_string(),
            value_type: "int".to_string(),
            keep: false,
        };
        run_storage(&db, set, true).await.unwrap();

        let err = run_config(
            &db,
            ConfigCommand::Set {
                prefix: None,
                language: None,
                status: Some("asleep".to_string()),
            },
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let get = StorageCommand::Get {
            module: "bad module".to_string(),
            guild_id: 1,
            key: None,
        };
        assert!(matches!(run_storage(&db, get, false).await, Err(PieError::Validation { .. })));
    }

    #[test]
    fn test_find_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("fun");
        std::fs::create_dir_all(repo.join("fun")).unwrap();
        std::fs::write(repo.join("__init__.py"), "").unwrap();
        std::fs::write(repo.join("fun").join("__init__.py"), "").unwrap();
        std::fs::write(repo.join("fun").join("module.py"), "").unwrap();
        std::fs::write(repo.join("repo.conf"), "[repository]\nname = fun\nmodules = fun\n").unwrap();

        let manager = RepositoryManager::new(dir.path(), Executables::default()).unwrap();
        assert_eq!(find_repository(&manager, "fun").unwrap().name, "fun");

        let err = find_repository(&manager, "boards").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Repository 'boards' not found");
    }

    #[test]
    fn test_install_into_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fun")).unwrap();
        let config = test_config(dir.path());

        let command = RepoCommand::Install {
            url: "https://example.org/pie/fun.git".to_string(),
            name: None,
            branch: None,
        };
        let err = run_repo(&config, command, false).unwrap_err();
        let err = err.downcast_ref::<PieError>().unwrap();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        let err = run_repo(&config, RepoCommand::Update { name: "fun".to_string(), force: false, reset: false }, false)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<PieError>(), Some(PieError::NotFound { .. })));
    }
}
