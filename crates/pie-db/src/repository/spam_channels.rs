//! Spam channel repository.
//!
//! A guild may register any number of spam channels, at most one of which is
//! primary. The partial unique index `pie_spam_channels_one_primary` backs
//! this up at the storage level.

use async_trait::async_trait;
use sqlx::AnyPool;

use pie_common::Snowflake;
use pie_common::models::spam_channel::SpamChannel;

use super::{DbResult, Repository};

#[derive(Clone)]
pub struct SpamChannelRepo {
    pool: AnyPool,
}

impl SpamChannelRepo {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Register a spam channel. An already registered channel is kept as is,
    /// including its primary flag.
    pub async fn add(&self, guild_id: Snowflake, channel_id: Snowflake) -> DbResult<SpamChannel> {
        sqlx::query(
            r#"
            INSERT INTO pie_spam_channels (guild_id, channel_id, is_primary)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (guild_id, channel_id) DO NOTHING
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        self.get(guild_id, channel_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, guild_id: Snowflake, channel_id: Snowflake) -> DbResult<Option<SpamChannel>> {
        sqlx::query_as::<_, SpamChannel>(
            r#"
            SELECT guild_id, channel_id, is_primary FROM pie_spam_channels
            WHERE guild_id = $1 AND channel_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self, guild_id: Snowflake) -> DbResult<Vec<SpamChannel>> {
        sqlx::query_as::<_, SpamChannel>(
            r#"
            SELECT guild_id, channel_id, is_primary FROM pie_spam_channels
            WHERE guild_id = $1
            ORDER BY channel_id
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The guild's primary spam channel, if it has one.
    pub async fn get_primary(&self, guild_id: Snowflake) -> DbResult<Option<SpamChannel>> {
        sqlx::query_as::<_, SpamChannel>(
            r#"
            SELECT guild_id, channel_id, is_primary FROM pie_spam_channels
            WHERE guild_id = $1 AND is_primary = TRUE
            "#,
        )
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Make `channel_id` the guild's primary spam channel.
    ///
    /// The previous primary channel is demoted in the same transaction. Returns
    /// `None` when `channel_id` is not registered; the guild then has no
    /// primary channel.
    pub async fn set_primary(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> DbResult<Option<SpamChannel>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, SpamChannel>(
            r#"
            SELECT guild_id, channel_id, is_primary FROM pie_spam_channels
            WHERE guild_id = $1 AND is_primary = TRUE
            "#,
        )
        .bind(guild_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(current) = current {
            if current.channel_id == channel_id {
                tx.commit().await?;
                return Ok(Some(current));
            }
            sqlx::query(
                "UPDATE pie_spam_channels SET is_primary = FALSE WHERE guild_id = $1 AND is_primary = TRUE",
            )
            .bind(guild_id)
            .execute(&mut *tx)
            .await?;
        }

        let promoted = sqlx::query(
            "UPDATE pie_spam_channels SET is_primary = TRUE WHERE guild_id = $1 AND channel_id = $2",
        )
        .bind(guild_id)
        .bind(channel_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if promoted == 0 {
            tracing::debug!(guild_id, channel_id, "Primary spam channel target is not registered");
            return Ok(None);
        }
        Ok(Some(SpamChannel {
            guild_id,
            channel_id,
            primary: true,
        }))
    }

    /// Unregister a spam channel. Returns the number of deleted rows.
    pub async fn remove(&self, guild_id: Snowflake, channel_id: Snowflake) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM pie_spam_channels WHERE guild_id = $1 AND channel_id = $2")
            .bind(guild_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository<SpamChannel> for SpamChannelRepo {
    type Key = (Snowflake, Snowflake);
    type Scope = Snowflake;

    /// Stores the channel with its primary flag; promoting a channel this way
    /// demotes the guild's previous primary channel.
    async fn put(&self, record: &SpamChannel) -> DbResult<SpamChannel> {
        self.add(record.guild_id, record.channel_id).await?;
        if record.primary {
            self.set_primary(record.guild_id, record.channel_id).await?;
        } else {
            sqlx::query(
                "UPDATE pie_spam_channels SET is_primary = FALSE WHERE guild_id = $1 AND channel_id = $2",
            )
            .bind(record.guild_id)
            .bind(record.channel_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(record.clone())
    }

    async fn get(&self, (guild_id, channel_id): &Self::Key) -> DbResult<Option<SpamChannel>> {
        SpamChannelRepo::get(self, *guild_id, *channel_id).await
    }

    async fn get_all(&self, guild_id: &Snowflake) -> DbResult<Vec<SpamChannel>> {
        SpamChannelRepo::get_all(self, *guild_id).await
    }

    async fn remove(&self, (guild_id, channel_id): &Self::Key) -> DbResult<u64> {
        SpamChannelRepo::remove(self, *guild_id, *channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    async fn primaries(repo: &SpamChannelRepo, guild_id: Snowflake) -> Vec<Snowflake> {
        repo.get_all(guild_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.primary)
            .map(|c| c.channel_id)
            .collect()
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let repo = test_db().await.spam_channels();
        let added = repo.add(1, 100).await.unwrap();
        assert_eq!(added, SpamChannel::new(1, 100));
        assert_eq!(repo.get(1, 100).await.unwrap(), Some(added));
        assert_eq!(repo.get(2, 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_keeps_existing_primary() {
        let repo = test_db().await.spam_channels();
        repo.add(1, 100).await.unwrap();
        repo.set_primary(1, 100).await.unwrap();

        let again = repo.add(1, 100).await.unwrap();
        assert!(again.primary);
    }

    #[tokio::test]
    async fn test_set_primary_moves_the_flag() {
        let repo = test_db().await.spam_channels();
        for channel in [100, 200, 300] {
            repo.add(1, channel).await.unwrap();
        }
        repo.add(2, 900).await.unwrap();
        repo.set_primary(2, 900).await.unwrap();

        assert!(primaries(&repo, 1).await.is_empty());

        let primary = repo.set_primary(1, 200).await.unwrap().unwrap();
        assert!(primary.primary);
        assert_eq!(primaries(&repo, 1).await, vec![200]);

        repo.set_primary(1, 300).await.unwrap();
        assert_eq!(primaries(&repo, 1).await, vec![300]);
        assert_eq!(repo.get_primary(1).await.unwrap().map(|c| c.channel_id), Some(300));

        // Other guilds are untouched.
        assert_eq!(primaries(&repo, 2).await, vec![900]);
    }

    #[tokio::test]
    async fn test_set_primary_is_idempotent() {
        let repo = test_db().await.spam_channels();
        repo.add(1, 100).await.unwrap();
        repo.set_primary(1, 100).await.unwrap();

        let again = repo.set_primary(1, 100).await.unwrap().unwrap();
        assert!(again.primary);
        assert_eq!(primaries(&repo, 1).await, vec![100]);
    }

    #[tokio::test]
    async fn test_set_primary_unknown_channel() {
        let repo = test_db().await.spam_channels();
        repo.add(1, 100).await.unwrap();
        repo.set_primary(1, 100).await.unwrap();

        assert_eq!(repo.set_primary(1, 555).await.unwrap(), None);
        assert!(primaries(&repo, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_put_primary_demotes_previous() {
        let repo = test_db().await.spam_channels();
        repo.add(1, 100).await.unwrap();
        repo.set_primary(1, 100).await.unwrap();

        repo.put(&SpamChannel {
            guild_id: 1,
            channel_id: 200,
            primary: true,
        })
        .await
        .unwrap();
        assert_eq!(primaries(&repo, 1).await, vec![200]);

        repo.put(&SpamChannel::new(1, 200)).await.unwrap();
        assert!(primaries(&repo, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = test_db().await.spam_channels();
        repo.add(1, 100).await.unwrap();
        assert_eq!(repo.remove(1, 100).await.unwrap(), 1);
        assert_eq!(repo.remove(1, 100).await.unwrap(), 0);
        assert!(repo.get_all(1).await.unwrap().is_empty());
    }
}
