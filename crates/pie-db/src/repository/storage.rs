//! Key/value storage repository, namespaced by module and guild.

use async_trait::async_trait;
use sqlx::AnyPool;

use pie_common::Snowflake;
use pie_common::models::storage::{StorageData, StorageValue};

use super::{DbResult, Repository};

#[derive(Clone)]
pub struct StorageRepo {
    pool: AnyPool,
}

impl StorageRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Store a value.
    ///
    /// Returns `None` without touching the stored value when the key already
    /// exists and `allow_overwrite` is false.
    pub async fn set(
        &self,
        module: &str,
        guild_id: Snowflake,
        key: &str,
        value: impl Into<StorageValue>,
        allow_overwrite: bool,
    ) -> DbResult<Option<StorageData>> {
        let data = StorageData::new(module, guild_id, key, &value.into());

        let sql = if allow_overwrite {
            r#"
            INSERT INTO pie_storage_data (module, guild_id, key, value, value_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (module, guild_id, key) DO UPDATE
            SET value = excluded.value, value_type = excluded.value_type
            "#
        } else {
            r#"
            INSERT INTO pie_storage_data (module, guild_id, key, value, value_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (module, guild_id, key) DO NOTHING
            "#
        };

        let result = sqlx::query(sql)
            .bind(&data.module)
            .bind(data.guild_id)
            .bind(&data.key)
            .bind(&data.value)
            .bind(&data.value_type)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub async fn get(&self, module: &str, guild_id: Snowflake, key: &str) -> DbResult<Option<StorageData>> {
        sqlx::query_as::<_, StorageData>(
            r#"
            SELECT module, guild_id, key, value, value_type FROM pie_storage_data
            WHERE module = $1 AND guild_id = $2 AND key = $3
            "#,
        )
        .bind(module)
        .bind(guild_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Every value a module stored for a guild.
    pub async fn get_all(&self, module: &str, guild_id: Snowflake) -> DbResult<Vec<StorageData>> {
        sqlx::query_as::<_, StorageData>(
            r#"
            SELECT module, guild_id, key, value, value_type FROM pie_storage_data
            WHERE module = $1 AND guild_id = $2
            ORDER BY key
            "#,
        )
        .bind(module)
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Delete a value. Returns `true` iff exactly one row was deleted.
    pub async fn remove(&self, module: &str, guild_id: Snowflake, key: &str) -> DbResult<bool> {
        Ok(self.delete(module, guild_id, key).await? == 1)
    }

    async fn delete(&self, module: &str, guild_id: Snowflake, key: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM pie_storage_data WHERE module = $1 AND guild_id = $2 AND key = $3",
        )
        .bind(module)
        .bind(guild_id)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<StorageData> for StorageRepo {
    type Key = (String, Snowflake, String);
    type Scope = (String, Snowflake);

    async fn put(&self, record: &StorageData) -> DbResult<StorageData> {
        let value = record.typed_value();
        self.set(&record.module, record.guild_id, &record.key, value, true)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn get(&self, (module, guild_id, key): &Self::Key) -> DbResult<Option<StorageData>> {
        StorageRepo::get(self, module, *guild_id, key).await
    }

    async fn get_all(&self, (module, guild_id): &Self::Scope) -> DbResult<Vec<StorageData>> {
        StorageRepo::get_all(self, module, *guild_id).await
    }

    async fn remove(&self, (module, guild_id, key): &Self::Key) -> DbResult<u64> {
        self.delete(module, *guild_id, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_set_and_get() {
        let repo = test_db().await.storage();
        let stored = repo.set("fun", 1, "counter", 3_i64, true).await.unwrap().unwrap();
        assert_eq!(stored.value, "3");
        assert_eq!(stored.value_type, "int");

        let fetched = repo.get("fun", 1, "counter").await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.typed_value(), StorageValue::Int(3));
    }

    #[tokio::test]
    async fn test_keys_are_scoped_by_module_and_guild() {
        let repo = test_db().await.storage();
        repo.set("fun", 1, "k", "a", true).await.unwrap();
        repo.set("fun", 2, "k", "b", true).await.unwrap();
        repo.set("boards", 1, "k", "c", true).await.unwrap();

        assert_eq!(repo.get("fun", 1, "k").await.unwrap().unwrap().value, "a");
        assert_eq!(repo.get("fun", 2, "k").await.unwrap().unwrap().value, "b");
        assert_eq!(repo.get("boards", 1, "k").await.unwrap().unwrap().value, "c");
        assert_eq!(repo.get_all("fun", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_rules() {
        let repo = test_db().await.storage();
        repo.set("fun", 1, "flag", true, true).await.unwrap();

        assert_eq!(repo.set("fun", 1, "flag", false, false).await.unwrap(), None);
        let kept = repo.get("fun", 1, "flag").await.unwrap().unwrap();
        assert_eq!(kept.typed_value(), StorageValue::Bool(true));

        let replaced = repo.set("fun", 1, "flag", 2.5, true).await.unwrap().unwrap();
        assert_eq!(replaced.value_type, "float");
        assert_eq!(repo.get("fun", 1, "flag").await.unwrap(), Some(replaced));
    }

    #[tokio::test]
    async fn test_remove_reports_single_deletion() {
        let repo = test_db().await.storage();
        repo.set("fun", 1, "k", "v", true).await.unwrap();

        assert!(repo.remove("fun", 1, "k").await.unwrap());
        assert!(!repo.remove("fun", 1, "k").await.unwrap());
        assert_eq!(repo.get("fun", 1, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_round_trip() {
        let repo = test_db().await.storage();
        let record = StorageData::new("fun", 7, "greeting", &StorageValue::from("hello"));
        repo.put(&record).await.unwrap();

        let key = ("fun".to_string(), 7, "greeting".to_string());
        assert_eq!(Repository::get(&repo, &key).await.unwrap(), Some(record));
        assert_eq!(Repository::remove(&repo, &key).await.unwrap(), 1);
    }
}
