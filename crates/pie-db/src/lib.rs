//! # pie-db
//!
//! Database layer for pie. One data-access object per table, all sharing a
//! single `sqlx::AnyPool` so the same code runs on:
//! - **SQLite**: single-process deployments and tests
//! - **PostgreSQL**: shared deployments

pub mod repository;

use anyhow::Result;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use repository::{
    AcDefaultRepo, AcLevelMappingRepo, AdminModuleRepo, AutoThreadRepo, BookmarkRepo,
    ChannelOverwriteRepo, ConfigRepo, GuildLanguageRepo, MemberLanguageRepo, RoleOverwriteRepo,
    SpamChannelRepo, StorageRepo, UserOverwriteRepo, UserPinRepo, UserThreadRepo,
};

/// Shared database state handed to every caller that needs persistence.
#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
}

impl Database {
    /// Connect using the application configuration.
    pub async fn connect(config: &pie_common::config::AppConfig) -> Result<Self> {
        Self::connect_url(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
    }

    /// Connect to the database at `url` (`sqlite://...` or `postgres://...`).
    pub async fn connect_url(url: &str, max_connections: u32, min_connections: u32) -> Result<Self> {
        sqlx::any::install_default_drivers();

        tracing::info!("Connecting to database...");
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(url)
            .await?;
        tracing::info!("Connected to database");

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Health check: verify the database is reachable.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub fn config(&self) -> ConfigRepo {
        ConfigRepo::new(self.pool.clone())
    }

    pub fn ac_defaults(&self) -> AcDefaultRepo {
        AcDefaultRepo::new(self.pool.clone())
    }

    pub fn role_overwrites(&self) -> RoleOverwriteRepo {
        RoleOverwriteRepo::new(self.pool.clone())
    }

    pub fn user_overwrites(&self) -> UserOverwriteRepo {
        UserOverwriteRepo::new(self.pool.clone())
    }

    pub fn channel_overwrites(&self) -> ChannelOverwriteRepo {
        ChannelOverwriteRepo::new(self.pool.clone())
    }

    pub fn ac_level_mappings(&self) -> AcLevelMappingRepo {
        AcLevelMappingRepo::new(self.pool.clone())
    }

    pub fn spam_channels(&self) -> SpamChannelRepo {
        SpamChannelRepo::new(self.pool.clone())
    }

    pub fn storage(&self) -> StorageRepo {
        StorageRepo::new(self.pool.clone())
    }

    pub fn guild_languages(&self) -> GuildLanguageRepo {
        GuildLanguageRepo::new(self.pool.clone())
    }

    pub fn member_languages(&self) -> MemberLanguageRepo {
        MemberLanguageRepo::new(self.pool.clone())
    }

    pub fn admin_modules(&self) -> AdminModuleRepo {
        AdminModuleRepo::new(self.pool.clone())
    }

    pub fn user_pins(&self) -> UserPinRepo {
        UserPinRepo::new(self.pool.clone())
    }

    pub fn user_threads(&self) -> UserThreadRepo {
        UserThreadRepo::new(self.pool.clone())
    }

    pub fn bookmarks(&self) -> BookmarkRepo {
        BookmarkRepo::new(self.pool.clone())
    }

    pub fn auto_threads(&self) -> AutoThreadRepo {
        AutoThreadRepo::new(self.pool.clone())
    }
}

/// In-memory SQLite database with migrations applied.
///
/// A single connection that never idles out, so every query sees the same
/// in-memory database.
#[cfg(test)]
pub(crate) async fn test_db() -> Database {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let db = Database { pool };
    db.migrate().await.expect("migrations");
    db
}
