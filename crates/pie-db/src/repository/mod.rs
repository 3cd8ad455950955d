//! Repository layer: one data-access object per table.
//!
//! Every DAO implements [`Repository`] for its record type, which covers the
//! insert-or-replace/lookup/delete contract shared by all tables. Table-specific
//! behaviour (insert-only ACL entries, primary spam channel, storage without
//! overwrite) lives in inherent methods on each DAO.
//!
//! Errors are the underlying `sqlx::Error`, propagated unchanged.

pub mod acl;
pub mod config;
pub mod features;
pub mod languages;
pub mod spam_channels;
pub mod storage;

pub use acl::{
    AcDefaultRepo, AcLevelMappingRepo, ChannelOverwriteRepo, RoleOverwriteRepo, UserOverwriteRepo,
};
pub use config::ConfigRepo;
pub use features::{AdminModuleRepo, AutoThreadRepo, BookmarkRepo, UserPinRepo, UserThreadRepo};
pub use languages::{GuildLanguageRepo, MemberLanguageRepo};
pub use spam_channels::SpamChannelRepo;
pub use storage::StorageRepo;

use async_trait::async_trait;

pub type DbResult<T> = Result<T, sqlx::Error>;

/// CRUD contract shared by every table, parameterised over the record type.
#[async_trait]
pub trait Repository<T: Send + Sync>: Send + Sync {
    /// Natural key identifying one record.
    type Key: Send + Sync;
    /// What [`Repository::get_all`] filters by (a guild, or `()` for global tables).
    type Scope: Send + Sync;

    /// Insert the record, replacing any record stored under the same key.
    async fn put(&self, record: &T) -> DbResult<T>;

    /// Exact-match lookup by key.
    async fn get(&self, key: &Self::Key) -> DbResult<Option<T>>;

    /// All records in the scope, ordered by key.
    async fn get_all(&self, scope: &Self::Scope) -> DbResult<Vec<T>>;

    /// Delete by key, returning the number of rows removed.
    async fn remove(&self, key: &Self::Key) -> DbResult<u64>;
}
