//! Runtime settings for pie tools: where the database lives and how module
//! repositories are synchronised.
//!
//! Sources, highest priority first: `PIE__*` environment variables (a `.env`
//! file is loaded into the environment), an optional `config.*` file in the
//! working directory, built-in defaults.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// The configuration stored by [`init`].
///
/// # Panics
/// When called before [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("Config not initialized. Call pie_common::config::init() first.")
}

/// Load the configuration and store it for [`get`]. Later calls keep the
/// first stored value.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    let _ = dotenvy::dotenv();

    let app_config = load()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

/// Build the configuration from defaults, an optional `config.*` file and
/// `PIE__*` environment variables without storing it globally.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    let cfg = config::Config::builder()
        .set_default("database.url", "sqlite://pie.db?mode=rwc")?
        .set_default("database.max_connections", 5)?
        .set_default("database.min_connections", 1)?
        .set_default("modules.dir", "modules")?
        .set_default("modules.git", "git")?
        .set_default("modules.python", "python3")?
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (PIE__DATABASE__URL, PIE__MODULES__DIR, etc.)
        .add_source(
            config::Environment::with_prefix("PIE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    cfg.try_deserialize()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub modules: ModulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL: `sqlite://...` or `postgres://...`
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModulesConfig {
    /// Directory scanned for module repositories.
    pub dir: PathBuf,
    /// Git executable used for clone/pull/reset.
    pub git: String,
    /// Python interpreter used to run `pip install -r requirements.txt`.
    pub python: String,
}
