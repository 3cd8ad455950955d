//! Access-control repositories.
//!
//! `add` never overwrites: it returns `None` when an entry already exists for
//! the key, so a command's level or an overwrite has to be removed before it
//! can be changed. [`Repository::put`] is the overwriting variant.

use async_trait::async_trait;
use sqlx::AnyPool;

use pie_common::Snowflake;
use pie_common::models::acl::{
    AcDefault, AcLevel, AcLevelMapping, ChannelOverwrite, RoleOverwrite, UserOverwrite,
};

use super::{DbResult, Repository};

// ============================================================================
// Default command levels
// ============================================================================

#[derive(Clone)]
pub struct AcDefaultRepo {
    pool: AnyPool,
}

impl AcDefaultRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Set the default level of a command, unless one is already set.
    pub async fn add(
        &self,
        guild_id: Snowflake,
        command: &str,
        level: AcLevel,
    ) -> DbResult<Option<AcDefault>> {
        let result = sqlx::query(
            r#"
            INSERT INTO pie_acl_default (guild_id, command, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, command) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(command)
        .bind(i64::from(level))
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then(|| AcDefault {
            guild_id,
            command: command.to_string(),
            level,
        }))
    }

    pub async fn get(&self, guild_id: Snowflake, command: &str) -> DbResult<Option<AcDefault>> {
        sqlx::query_as::<_, AcDefault>(
            "SELECT guild_id, command, level FROM pie_acl_default WHERE guild_id = $1 AND command = $2",
        )
        .bind(guild_id)
        .bind(command)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<AcDefault>> {
        sqlx::query_as::<_, AcDefault>(
            "SELECT guild_id, command, level FROM pie_acl_default WHERE guild_id = $1 ORDER BY command",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Remove the default level of a command. Returns `true` if there was one.
    pub async fn remove(&self, guild_id: Snowflake, command: &str) -> DbResult<bool> {
        Ok(self.delete(guild_id, command).await? > 0)
    }

    async fn delete(&self, guild_id: Snowflake, command: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_acl_default WHERE guild_id = $1 AND command = $2")
            .bind(guild_id)
            .bind(command)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<AcDefault> for AcDefaultRepo {
    type Key = (Snowflake, String);
    type Scope = Snowflake;

    async fn put(&self, record: &AcDefault) -> DbResult<AcDefault> {
        sqlx::query(
            r#"
            INSERT INTO pie_acl_default (guild_id, command, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, command) DO UPDATE SET level = excluded.level
            "#,
        )
        .bind(record.guild_id)
        .bind(&record.command)
        .bind(i64::from(record.level))
        .execute(&self.pool)
        .await?;
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, command): &Self::Key) -> DbResult<Option<AcDefault>> {
        AcDefaultRepo::get(self, *guild_id, command).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<AcDefault>> {
        AcDefaultRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, command): &Self::Key) -> DbResult<u64> {
        self.delete(*guild_id, command).await
    }
}

// ============================================================================
// Role overwrites
// ============================================================================

#[derive(Clone)]
pub struct RoleOverwriteRepo {
    pool: AnyPool,
}

impl RoleOverwriteRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        command: &str,
        allow: bool,
    ) -> DbResult<Option<RoleOverwrite>> {
        let result = sqlx::query(
            r#"
            INSERT INTO pie_acl_role_overwrite (guild_id, role_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, role_id, command) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(role_id)
        .bind(command)
        .bind(allow)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then(|| RoleOverwrite {
            guild_id,
            role_id,
            command: command.to_string(),
            allow,
        }))
    }

    pub async fn get(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        command: &str,
    ) -> DbResult<Option<RoleOverwrite>> {
        sqlx::query_as::<_, RoleOverwrite>(
            r#"
            SELECT guild_id, role_id, command, allow FROM pie_acl_role_overwrite
            WHERE guild_id = $1 AND role_id = $2 AND command = $3
            "#,
        )
        .bind(guild_id)
        .bind(role_id)
        .bind(command)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<RoleOverwrite>> {
        sqlx::query_as::<_, RoleOverwrite>(
            r#"
            SELECT guild_id, role_id, command, allow FROM pie_acl_role_overwrite
            WHERE guild_id = $1
            ORDER BY role_id, command
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, role_id: Snowflake, command: &str) -> DbResult<bool> {
        Ok(self.delete(guild_id, role_id, command).await? > 0)
    }

    async fn delete(&self, guild_id: Snowflake, role_id: Snowflake, command: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM pie_acl_role_overwrite WHERE guild_id = $1 AND role_id = $2 AND command = $3",
        )
        .bind(guild_id)
        .bind(role_id)
        .bind(command)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<RoleOverwrite> for RoleOverwriteRepo {
    type Key = (Snowflake, Snowflake, String);
    type Scope = Snowflake;

    async fn put(&self, record: &RoleOverwrite) -> DbResult<RoleOverwrite> {
        sqlx::query(
            r#"
            INSERT INTO pie_acl_role_overwrite (guild_id, role_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, role_id, command) DO UPDATE SET allow = excluded.allow
            "#,
        )
        .bind(record.guild_id)
        .bind(record.role_id)
        .bind(&record.command)
        .bind(record.allow)
        .execute(&self.pool)
        .await?;
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, role_id, command): &Self::Key) -> DbResult<Option<RoleOverwrite>> {
        RoleOverwriteRepo::get(self, *guild_id, *role_id, command).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<RoleOverwrite>> {
        RoleOverwriteRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, role_id, command): &Self::Key) -> DbResult<u64> {
        self.delete(*guild_id, *role_id, command).await
    }
}

// ============================================================================
// User overwrites
// ============================================================================

#[derive(Clone)]
pub struct UserOverwriteRepo {
    pool: AnyPool,
}

impl UserOverwriteRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        command: &str,
        allow: bool,
    ) -> DbResult<Option<UserOverwrite>> {
        let result = sqlx::query(
            r#"
            INSERT INTO pie_acl_user_overwrite (guild_id, user_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, user_id, command) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(command)
        .bind(allow)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then(|| UserOverwrite {
            guild_id,
            user_id,
            command: command.to_string(),
            allow,
        }))
    }

    pub async fn get(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        command: &str,
    ) -> DbResult<Option<UserOverwrite>> {
        sqlx::query_as::<_, UserOverwrite>(
            r#"
            SELECT guild_id, user_id, command, allow FROM pie_acl_user_overwrite
            WHERE guild_id = $1 AND user_id = $2 AND command = $3
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(command)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<UserOverwrite>> {
        sqlx::query_as::<_, UserOverwrite>(
            r#"
            SELECT guild_id, user_id, command, allow FROM pie_acl_user_overwrite
            WHERE guild_id = $1
            ORDER BY user_id, command
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, user_id: Snowflake, command: &str) -> DbResult<bool> {
        Ok(self.delete(guild_id, user_id, command).await? > 0)
    }

    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake, command: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM pie_acl_user_overwrite WHERE guild_id = $1 AND user_id = $2 AND command = $3",
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(command)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<UserOverwrite> for UserOverwriteRepo {
    type Key = (Snowflake, Snowflake, String);
    type Scope = Snowflake;

    async fn put(&self, record: &UserOverwrite) -> DbResult<UserOverwrite> {
        sqlx::query(
            r#"
            INSERT INTO pie_acl_user_overwrite (guild_id, user_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, user_id, command) DO UPDATE SET allow = excluded.allow
            "#,
        )
        .bind(record.guild_id)
        .bind(record.user_id)
        .bind(&record.command)
        .bind(record.allow)
        .execute(&self.pool)
        .await?;
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, user_id, command): &Self::Key) -> DbResult<Option<UserOverwrite>> {
        UserOverwriteRepo::get(self, *guild_id, *user_id, command).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<UserOverwrite>> {
        UserOverwriteRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, user_id, command): &Self::Key) -> DbResult<u64> {
        self.delete(*guild_id, *user_id, command).await
    }
}

// ============================================================================
// Channel overwrites
// ============================================================================

#[derive(Clone)]
pub struct ChannelOverwriteRepo {
    pool: AnyPool,
}

impl ChannelOverwriteRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
        command: &str,
        allow: bool,
    ) -> DbResult<Option<ChannelOverwrite>> {
        let result = sqlx::query(
            r#"
            INSERT INTO pie_acl_channel_overwrite (guild_id, channel_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, channel_id, command) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .bind(command)
        .bind(allow)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then(|| ChannelOverwrite {
            guild_id,
            channel_id,
            command: command.to_string(),
            allow,
        }))
    }

    pub async fn get(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
        command: &str,
    ) -> DbResult<Option<ChannelOverwrite>> {
        sqlx::query_as::<_, ChannelOverwrite>(
            r#"
            SELECT guild_id, channel_id, command, allow FROM pie_acl_channel_overwrite
            WHERE guild_id = $1 AND channel_id = $2 AND command = $3
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .bind(command)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<ChannelOverwrite>> {
        sqlx::query_as::<_, ChannelOverwrite>(
            r#"
            SELECT guild_id, channel_id, command, allow FROM pie_acl_channel_overwrite
            WHERE guild_id = $1
            ORDER BY channel_id, command
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, channel_id: Snowflake, command: &str) -> DbResult<bool> {
        Ok(self.delete(guild_id, channel_id, command).await? > 0)
    }

    async fn delete(&self, guild_id: Snowflake, channel_id: Snowflake, command: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM pie_acl_channel_overwrite WHERE guild_id = $1 AND channel_id = $2 AND command = $3",
        )
        .bind(guild_id)
        .bind(channel_id)
        .bind(command)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<ChannelOverwrite> for ChannelOverwriteRepo {
    type Key = (Snowflake, Snowflake, String);
    type Scope = Snowflake;

    async fn put(&self, record: &ChannelOverwrite) -> DbResult<ChannelOverwrite> {
        sqlx::query(
            r#"
            INSERT INTO pie_acl_channel_overwrite (guild_id, channel_id, command, allow)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guild_id, channel_id, command) DO UPDATE SET allow = excluded.allow
            "#,
        )
        .bind(record.guild_id)
        .bind(record.channel_id)
        .bind(&record.command)
        .bind(record.allow)
        .execute(&self.pool)
        .await?;
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, channel_id, command): &Self::Key) -> DbResult<Option<ChannelOverwrite>> {
        ChannelOverwriteRepo::get(self, *guild_id, *channel_id, command).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<ChannelOverwrite>> {
        ChannelOverwriteRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id, command): &Self::Key) -> DbResult<u64> {
        self.delete(*guild_id, *channel_id, command).await
    }
}

// ============================================================================
// Role → level mappings
// ============================================================================

#[derive(Clone)]
pub struct AcLevelMappingRepo {
    pool: AnyPool,
}

impl AcLevelMappingRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        level: AcLevel,
    ) -> DbResult<Option<AcLevelMapping>> {
        let result = sqlx::query(
            r#"
            INSERT INTO pie_acl_level_mapping (guild_id, role_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, role_id) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(role_id)
        .bind(i64::from(level))
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then_some(AcLevelMapping {
            guild_id,
            role_id,
            level,
        }))
    }

    pub async fn get(&self, guild_id: Snowflake, role_id: Snowflake) -> DbResult<Option<AcLevelMapping>> {
        sqlx::query_as::<_, AcLevelMapping>(
            "SELECT guild_id, role_id, level FROM pie_acl_level_mapping WHERE guild_id = $1 AND role_id = $2",
        )
        .bind(guild_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<AcLevelMapping>> {
        sqlx::query_as::<_, AcLevelMapping>(
            "SELECT guild_id, role_id, level FROM pie_acl_level_mapping WHERE guild_id = $1 ORDER BY role_id",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn remove(&self, guild_id: Snowflake, role_id: Snowflake) -> DbResult<bool> {
        Ok(self.delete(guild_id, role_id).await? > 0)
    }

    async fn delete(&self, guild_id: Snowflake, role_id: Snowflake) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_acl_level_mapping WHERE guild_id = $1 AND role_id = $2")
            .bind(guild_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<AcLevelMapping> for AcLevelMappingRepo {
    type Key = (Snowflake, Snowflake);
    type Scope = Snowflake;

    async fn put(&self, record: &AcLevelMapping) -> DbResult<AcLevelMapping> {
        sqlx::query(
            r#"
            INSERT INTO pie_acl_level_mapping (guild_id, role_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, role_id) DO UPDATE SET level = excluded.level
            "#,
        )
        .bind(record.guild_id)
        .bind(record.role_id)
        .bind(i64::from(record.level))
        .execute(&self.pool)
        .await?;
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, role_id): &Self::Key) -> DbResult<Option<AcLevelMapping>> {
        AcLevelMappingRepo::get(self, *guild_id, *role_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<AcLevelMapping>> {
        AcLevelMappingRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, role_id): &Self::Key) -> DbResult<u64> {
        self.delete(*guild_id, *role_id).await
    }
}
