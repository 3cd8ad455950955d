//! Repositories for the settings of the bundled `base` modules.
//!
//! Per-channel preferences accept `None` for a guild-wide setting; it is
//! stored under [`pie_common::any_row::NO_CHANNEL`].

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyRow;

use pie_common::Snowflake;
use pie_common::any_row::channel_key;
use pie_common::models::features::{AdminModule, AutoThread, Bookmark, UserPin, UserThread};

use super::{DbResult, Repository};

// ============================================================================
// Module switches
// ============================================================================

#[derive(Clone)]
pub struct AdminModuleRepo {
    pool: AnyPool,
}

impl AdminModuleRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Add or update a module entry.
    pub async fn add(&self, name: &str, enabled: bool) -> DbResult<AdminModule> {
        sqlx::query(
            r#"
            INSERT INTO base_admin_modules (name, enabled)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET enabled = excluded.enabled
            "#,
        )
        .bind(name)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(AdminModule {
            name: name.to_string(),
            enabled,
        })
    }

    pub async fn get(&self, name: &str) -> DbResult<Option<AdminModule>> {
        sqlx::query_as::<_, AdminModule>("SELECT name, enabled FROM base_admin_modules WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_all(&self) -> DbResult<Vec<AdminModule>> {
        sqlx::query_as::<_, AdminModule>("SELECT name, enabled FROM base_admin_modules ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn remove(&self, name: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM base_admin_modules WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<AdminModule> for AdminModuleRepo {
    type Key = String;
    type Scope = ();

    async fn put(&self, record: &AdminModule) -> DbResult<AdminModule> {
        self.add(&record.name, record.enabled).await
    }

    async fn get(&self, name: &String) -> DbResult<Option<AdminModule>> {
        AdminModuleRepo::get(self, name).await
    }

    async fn get_all(&self, _scope: &()) -> DbResult<Vec<AdminModule>> {
        AdminModuleRepo::get_all(self).await
    }

    async fn remove(&self, name: &String) -> DbResult<u64> {
        AdminModuleRepo::remove(self, name).await
    }
}

// ============================================================================
// Reaction limits (user pins, user threads)
// ============================================================================

/// `(guild_id, channel_id) -> reaction_limit` table; user pins and user
/// threads share this shape.
#[derive(Clone)]
struct ReactionLimitTable {
    pool: AnyPool,
    table: &'static str,
}

impl ReactionLimitTable {
    async fn put(&self, guild_id: Snowflake, channel_id: Option<Snowflake>, limit: i64) -> DbResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (guild_id, channel_id, reaction_limit)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, channel_id) DO UPDATE SET reaction_limit = excluded.reaction_limit
            "#,
            self.table
        );
        sqlx::query(&sql)
            .bind(guild_id)
            .bind(channel_key(channel_id))
            .bind(limit)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get<T>(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, AnyRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT guild_id, channel_id, reaction_limit FROM {} WHERE guild_id = $1 AND channel_id = $2",
            self.table
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(guild_id)
            .bind(channel_key(channel_id))
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_all<T>(&self, guild_id: Snowflake) -> DbResult<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, AnyRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT guild_id, channel_id, reaction_limit FROM {} WHERE guild_id = $1 ORDER BY channel_id",
            self.table
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(guild_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn remove(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<u64> {
        let sql = format!("DELETE FROM {} WHERE guild_id = $1 AND channel_id = $2", self.table);
        let result = sqlx::query(&sql)
            .bind(guild_id)
            .bind(channel_key(channel_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct UserPinRepo {
    table: ReactionLimitTable,
}

impl UserPinRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self {
            table: ReactionLimitTable {
                pool,
                table: "base_base_userpin",
            },
        }
    }

    /// Set the pin limit, replacing the previous preference.
    pub async fn add(&self, guild_id: Snowflake, channel_id: Option<Snowflake>, limit: i64) -> DbResult<UserPin> {
        self.table.put(guild_id, channel_id, limit).await?;
        Ok(UserPin {
            guild_id,
            channel_id,
            limit,
        })
    }

    pub async fn get(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<Option<UserPin>> {
        self.table.get(guild_id, channel_id).await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<UserPin>> {
        self.table.get_all(guild_id).await
    }

    pub async fn remove(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<u64> {
        self.table.remove(guild_id, channel_id).await
    }
}

#[async_trait]
impl Repository<UserPin> for UserPinRepo {
    type Key = (Snowflake, Option<Snowflake>);
    type Scope = Snowflake;

    async fn put(&self, record: &UserPin) -> DbResult<UserPin> {
        self.add(record.guild_id, record.channel_id, record.limit).await
    }

    async fn get(&self, (guild_id, channel_id): &Self::Key) -> DbResult<Option<UserPin>> {
        UserPinRepo::get(self, *guild_id, *channel_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<UserPin>> {
        UserPinRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id): &Self::Key) -> DbResult<u64> {
        UserPinRepo::remove(self, *guild_id, *channel_id).await
    }
}

#[derive(Clone)]
pub struct UserThreadRepo {
    table: ReactionLimitTable,
}

impl UserThreadRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self {
            table: ReactionLimitTable {
                pool,
                table: "base_base_userthread",
            },
        }
    }

    /// Set the thread limit, replacing the previous preference.
    pub async fn add(&self, guild_id: Snowflake, channel_id: Option<Snowflake>, limit: i64) -> DbResult<UserThread> {
        self.table.put(guild_id, channel_id, limit).await?;
        Ok(UserThread {
            guild_id,
            channel_id,
            limit,
        })
    }

    pub async fn get(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<Option<UserThread>> {
        self.table.get(guild_id, channel_id).await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<UserThread>> {
        self.table.get_all(guild_id).await
    }

    pub async fn remove(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<u64> {
        self.table.remove(guild_id, channel_id).await
    }
}

#[async_trait]
impl Repository<UserThread> for UserThreadRepo {
    type Key = (Snowflake, Option<Snowflake>);
    type Scope = Snowflake;

    async fn put(&self, record: &UserThread) -> DbResult<UserThread> {
        self.add(record.guild_id, record.channel_id, record.limit).await
    }

    async fn get(&self, (guild_id, channel_id): &Self::Key) -> DbResult<Option<UserThread>> {
        UserThreadRepo::get(self, *guild_id, *channel_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<UserThread>> {
        UserThreadRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id): &Self::Key) -> DbResult<u64> {
        UserThreadRepo::remove(self, *guild_id, *channel_id).await
    }
}

// ============================================================================
// Bookmarks
// ============================================================================

#[derive(Clone)]
pub struct BookmarkRepo {
    pool: AnyPool,
}

impl BookmarkRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, guild_id: Snowflake, channel_id: Option<Snowflake>, enabled: bool) -> DbResult<Bookmark> {
        sqlx::query(
            r#"
            INSERT INTO base_base_bookmarks (guild_id, channel_id, enabled)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, channel_id) DO UPDATE SET enabled = excluded.enabled
            "#,
        )
        .bind(guild_id)
        .bind(channel_key(channel_id))
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(Bookmark {
            guild_id,
            channel_id,
            enabled,
        })
    }

    pub async fn get(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<Option<Bookmark>> {
        sqlx::query_as::<_, Bookmark>(
            "SELECT guild_id, channel_id, enabled FROM base_base_bookmarks WHERE guild_id = $1 AND channel_id = $2",
        )
        .bind(guild_id)
        .bind(channel_key(channel_id))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<Bookmark>> {
        sqlx::query_as::<_, Bookmark>(
            "SELECT guild_id, channel_id, enabled FROM base_base_bookmarks WHERE guild_id = $1 ORDER BY channel_id",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, channel_id: Option<Snowflake>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM base_base_bookmarks WHERE guild_id = $1 AND channel_id = $2")
            .bind(guild_id)
            .bind(channel_key(channel_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<Bookmark> for BookmarkRepo {
    type Key = (Snowflake, Option<Snowflake>);
    type Scope = Snowflake;

    async fn put(&self, record: &Bookmark) -> DbResult<Bookmark> {
        self.add(record.guild_id, record.channel_id, record.enabled).await
    }

    async fn get(&self, (guild_id, channel_id): &Self::Key) -> DbResult<Option<Bookmark>> {
        BookmarkRepo::get(self, *guild_id, *channel_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<Bookmark>> {
        BookmarkRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id): &Self::Key) -> DbResult<u64> {
        BookmarkRepo::remove(self, *guild_id, *channel_id).await
    }
}

// ============================================================================
// Auto threads
// ============================================================================

#[derive(Clone)]
pub struct AutoThreadRepo {
    pool: AnyPool,
}

impl AutoThreadRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Enable auto threads in a channel, or update their archive duration.
    pub async fn add(&self, guild_id: Snowflake, channel_id: Snowflake, duration: i64) -> DbResult<AutoThread> {
        sqlx::query(
            r#"
            INSERT INTO base_base_autothread (guild_id, channel_id, duration)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, channel_id) DO UPDATE SET duration = excluded.duration
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .bind(duration)
        .execute(&self.pool)
        .await?;

        Ok(AutoThread {
            guild_id,
            channel_id,
            duration,
        })
    }

    pub async fn get(&self, guild_id: Snowflake, channel_id: Snowflake) -> DbResult<Option<AutoThread>> {
        sqlx::query_as::<_, AutoThread>(
            "SELECT guild_id, channel_id, duration FROM base_base_autothread WHERE guild_id = $1 AND channel_id = $2",
        )
        .bind(guild_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<AutoThread>> {
        sqlx::query_as::<_, AutoThread>(
            "SELECT guild_id, channel_id, duration FROM base_base_autothread WHERE guild_id = $1 ORDER BY channel_id",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, channel_id: Snowflake) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM base_base_autothread WHERE guild_id = $1 AND channel_id = $2")
            .bind(guild_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<AutoThread> for AutoThreadRepo {
    type Key = (Snowflake, Snowflake);
    type Scope = Snowflake;

    async fn put(&self, record: &AutoThread) -> DbResult<AutoThread> {
        self.add(record.guild_id, record.channel_id, record.duration).await
    }

    async fn get(&self, (guild_id, channel_id): &Self::Key) -> DbResult<Option<AutoThread>> {
        AutoThreadRepo::get(self, *guild_id, *channel_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<AutoThread>> {
        AutoThreadRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id): &Self::Key) -> DbResult<u64> {
        AutoThreadRepo::remove(self, *guild_id, *channel_id).await
    }
}
