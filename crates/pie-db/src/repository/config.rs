//! Global configuration repository: a single row with id 1.

use async_trait::async_trait;
use sqlx::AnyPool;

use pie_common::models::config::BotConfig;

use super::{DbResult, Repository};

const CONFIG_ID: i64 = 1;

#[derive(Clone)]
pub struct ConfigRepo {
    pool: AnyPool,
}

impl ConfigRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Get the global settings, creating them with default values if there are none.
    pub async fn get(&self) -> DbResult<BotConfig> {
        if let Some(config) = self.find().await? {
            return Ok(config);
        }

        let defaults = BotConfig::default();
        sqlx::query(
            r#"
            INSERT INTO pie_config (id, prefix, language, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(CONFIG_ID)
        .bind(&defaults.prefix)
        .bind(&defaults.language)
        .bind(&defaults.status)
        .execute(&self.pool)
        .await?;

        self.find().await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Save the global settings.
    pub async fn save(&self, config: &BotConfig) -> DbResult<BotConfig> {
        sqlx::query(
            r#"
            INSERT INTO pie_config (id, prefix, language, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET prefix = excluded.prefix,
                language = excluded.language,
                status = excluded.status
            "#,
        )
        .bind(CONFIG_ID)
        .bind(&config.prefix)
        .bind(&config.language)
        .bind(&config.status)
        .execute(&self.pool)
        .await?;
        Ok(config.clone())
    }

    async fn find(&self) -> DbResult<Option<BotConfig>> {
        sqlx::query_as::<_, BotConfig>("SELECT prefix, language, status FROM pie_config WHERE id = $1")
            .bind(CONFIG_ID)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl Repository<BotConfig> for ConfigRepo {
    type Key = ();
    type Scope = ();

    async fn put(&self, record: &BotConfig) -> DbResult<BotConfig> {
        self.save(record).await
    }

    async fn get(&self, _key: &()) -> DbResult<Option<BotConfig>> {
        self.find().await
    }

    async fn get_all(&self, _scope: &()) -> DbResult<Vec<BotConfig>> {
        Ok(self.find().await?.into_iter().collect())
    }

    async fn remove(&self, _key: &()) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_config WHERE id = $1")
            .bind(CONFIG_ID)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
