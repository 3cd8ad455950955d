//! Language preference repositories.

use async_trait::async_trait;
use sqlx::AnyPool;

use pie_common::Snowflake;
use pie_common::models::language::{GuildLanguage, MemberLanguage};

use super::{DbResult, Repository};

// ============================================================================
// Guild preferences
// ============================================================================

#[derive(Clone)]
pub struct GuildLanguageRepo {
    pool: AnyPool,
}

impl GuildLanguageRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Set the guild language, replacing the previous preference.
    pub async fn add(&self, guild_id: Snowflake, language: &str) -> DbResult<GuildLanguage> {
        sqlx::query(
            r#"
            INSERT INTO pie_language_guilds (guild_id, language)
            VALUES ($1, $2)
            ON CONFLICT (guild_id) DO UPDATE SET language = excluded.language
            "#,
        )
        .bind(guild_id)
        .bind(language)
        .execute(&self.pool)
        .await?;

        Ok(GuildLanguage {
            guild_id,
            language: language.to_string(),
        })
    }

    pub async fn get(&self, guild_id: Snowflake) -> DbResult<Option<GuildLanguage>> {
        sqlx::query_as::<_, GuildLanguage>(
            "SELECT guild_id, language FROM pie_language_guilds WHERE guild_id = $1",
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Returns the number of deleted preferences, always 0 or 1.
    pub async fn remove(&self, guild_id: Snowflake) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_language_guilds WHERE guild_id = $1")
            .bind(guild_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<GuildLanguage> for GuildLanguageRepo {
    type Key = Snowflake;
    type Scope = ();

    async fn put(&self, record: &GuildLanguage) -> DbResult<GuildLanguage> {
        self.add(record.guild_id, &record.language).await
    }

    async fn get(&self, guild_id: &Snowflake) -> DbResult<Option<GuildLanguage>> {
        GuildLanguageRepo::get(self, *guild_id).await
    }

    async fn get_all(&self, _scope: &()) -> DbResult<Vec<GuildLanguage>> {
        sqlx::query_as::<_, GuildLanguage>(
            "SELECT guild_id, language FROM pie_language_guilds ORDER BY guild_id",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn remove(&self, guild_id: &Snowflake) -> DbResult<u64> {
        GuildLanguageRepo::remove(self, *guild_id).await
    }
}

// ============================================================================
// Member preferences
// ============================================================================

#[derive(Clone)]
pub struct MemberLanguageRepo {
    pool: AnyPool,
}

impl MemberLanguageRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Set the member's language in a guild, replacing the previous preference.
    pub async fn add(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        language: &str,
    ) -> DbResult<MemberLanguage> {
        sqlx::query(
            r#"
            INSERT INTO pie_language_members (guild_id, member_id, language)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, member_id) DO UPDATE SET language = excluded.language
            "#,
        )
        .bind(guild_id)
        .bind(member_id)
        .bind(language)
        .execute(&self.pool)
        .await?;

        Ok(MemberLanguage {
            guild_id,
            member_id,
            language: language.to_string(),
        })
    }

    pub async fn get(&self, guild_id: Snowflake, member_id: Snowflake) -> DbResult<Option<MemberLanguage>> {
        sqlx::query_as::<_, MemberLanguage>(
            r#"
            SELECT guild_id, member_id, language FROM pie_language_members
            WHERE guild_id = $1 AND member_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<MemberLanguage>> {
        sqlx::query_as::<_, MemberLanguage>(
            r#"
            SELECT guild_id, member_id, language FROM pie_language_members
            WHERE guild_id = $1
            ORDER BY member_id
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Returns the number of deleted preferences, always 0 or 1.
    pub async fn remove(&self, guild_id: Snowflake, member_id: Snowflake) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_language_members WHERE guild_id = $1 AND member_id = $2")
            .bind(guild_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<MemberLanguage> for MemberLanguageRepo {
    type Key = (Snowflake, Snowflake);
    type Scope = Snowflake;

    async fn put(&self, record: &MemberLanguage) -> DbResult<MemberLanguage> {
        self.add(record.guild_id, record.member_id, &record.language).await
    }

    async fn get(&self, (guild_id, member_id): &Self::Key) -> DbResult<Option<MemberLanguage>> {
        MemberLanguageRepo::get(self, *guild_id, *member_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<MemberLanguage>> {
        MemberLanguageRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, member_id): &Self::Key) -> DbResult<u64> {
        MemberLanguageRepo::remove(self, *guild_id, *member_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_guild_language_replaces_previous() {
        let repo = test_db().await.guild_languages();
        repo.add(1, "en").await.unwrap();
        let current = repo.add(1, "cs").await.unwrap();

        assert_eq!(repo.get(1).await.unwrap(), Some(current));
        assert_eq!(repo.get_all(&()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guild_language_remove() {
        let repo = test_db().await.guild_languages();
        repo.add(1, "sk").await.unwrap();
        assert_eq!(repo.remove(1).await.unwrap(), 1);
        assert_eq!(repo.remove(1).await.unwrap(), 0);
        assert_eq!(repo.get(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_member_language_is_per_guild() {
        let repo = test_db().await.member_languages();
        let first = repo.add(1, 50, "en").await.unwrap();
        let second = repo.add(2, 50, "cs").await.unwrap();

        assert_eq!(repo.get(1, 50).await.unwrap(), Some(first));
        assert_eq!(repo.get(2, 50).await.unwrap(), Some(second));

        let updated = repo.add(1, 50, "sk").await.unwrap();
        assert_eq!(repo.get_all(1).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_member_language_remove() {
        let repo = test_db().await.member_languages();
        repo.add(1, 50, "en").await.unwrap();
        assert_eq!(repo.remove(1, 50).await.unwrap(), 1);
        assert_eq!(repo.get(1, 50).await.unwrap(), None);
    }
}
