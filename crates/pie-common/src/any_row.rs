//! Manual `sqlx::FromRow<'_, sqlx::any::AnyRow>` implementations for all
//! pie record types.
//!
//! `sqlx::AnyPool` only decodes primitive types natively (i64, f64, bool,
//! String, bytes), and SQLite reports `BOOLEAN` columns as integers once the
//! declared type is lost. Booleans, access levels and the "no channel"
//! sentinel are therefore decoded through the helpers below.

use sqlx::{Row, any::AnyRow};

use crate::Snowflake;
use crate::models::{
    acl::{AcDefault, AcLevel, AcLevelMapping, ChannelOverwrite, RoleOverwrite, UserOverwrite},
    config::BotConfig,
    features::{AdminModule, AutoThread, Bookmark, UserPin, UserThread},
    language::{GuildLanguage, MemberLanguage},
    spam_channel::SpamChannel,
    storage::StorageData,
};

/// Channel id stored for guild-wide preferences (Discord never issues snowflake 0).
pub const NO_CHANNEL: Snowflake = 0;

/// Map an optional channel to its stored key.
pub fn channel_key(channel_id: Option<Snowflake>) -> Snowflake {
    channel_id.unwrap_or(NO_CHANNEL)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn flag(row: &AnyRow, col: &str) -> Result<bool, sqlx::Error> {
    match row.try_get::<bool, _>(col) {
        Ok(v) => Ok(v),
        Err(_) => row.try_get::<i64, _>(col).map(|v| v != 0),
    }
}

fn level(row: &AnyRow, col: &str) -> Result<AcLevel, sqlx::Error> {
    let v: i64 = row.try_get(col)?;
    AcLevel::try_from(v).map_err(|e| sqlx::Error::Decode(e.into()))
}

fn opt_channel(row: &AnyRow, col: &str) -> Result<Option<Snowflake>, sqlx::Error> {
    let v: i64 = row.try_get(col)?;
    Ok((v != NO_CHANNEL).then_some(v))
}

// ── Config ────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for BotConfig {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(BotConfig {
            prefix: row.try_get("prefix")?,
            language: row.try_get("language")?,
            status: row.try_get("status")?,
        })
    }
}

// ── ACL ───────────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for AcDefault {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AcDefault {
            guild_id: row.try_get("guild_id")?,
            command: row.try_get("command")?,
            level: level(row, "level")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for RoleOverwrite {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(RoleOverwrite {
            guild_id: row.try_get("guild_id")?,
            role_id: row.try_get("role_id")?,
            command: row.try_get("command")?,
            allow: flag(row, "allow")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for UserOverwrite {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(UserOverwrite {
            guild_id: row.try_get("guild_id")?,
            user_id: row.try_get("user_id")?,
            command: row.try_get("command")?,
            allow: flag(row, "allow")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for ChannelOverwrite {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(ChannelOverwrite {
            guild_id: row.try_get("guild_id")?,
            channel_id: row.try_get("channel_id")?,
            command: row.try_get("command")?,
            allow: flag(row, "allow")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for AcLevelMapping {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AcLevelMapping {
            guild_id: row.try_get("guild_id")?,
            role_id: row.try_get("role_id")?,
            level: level(row, "level")?,
        })
    }
}

// ── Spam channels ─────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for SpamChannel {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(SpamChannel {
            guild_id: row.try_get("guild_id")?,
            channel_id: row.try_get("channel_id")?,
            primary: flag(row, "is_primary")?,
        })
    }
}

// ── Storage ───────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for StorageData {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(StorageData {
            module: row.try_get("module")?,
            guild_id: row.try_get("guild_id")?,
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            value_type: row.try_get("value_type")?,
        })
    }
}

// ── Languages ─────────────────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for GuildLanguage {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(GuildLanguage {
            guild_id: row.try_get("guild_id")?,
            language: row.try_get("language")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for MemberLanguage {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(MemberLanguage {
            guild_id: row.try_get("guild_id")?,
            member_id: row.try_get("member_id")?,
            language: row.try_get("language")?,
        })
    }
}

// ── Base module features ──────────────────────────────────────────────────────

impl<'r> sqlx::FromRow<'r, AnyRow> for AdminModule {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AdminModule {
            name: row.try_get("name")?,
            enabled: flag(row, "enabled")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for UserPin {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(UserPin {
            guild_id: row.try_get("guild_id")?,
            channel_id: opt_channel(row, "channel_id")?,
            limit: row.try_get("reaction_limit")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for UserThread {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(UserThread {
            guild_id: row.try_get("guild_id")?,
            channel_id: opt_channel(row, "channel_id")?,
            limit: row.try_get("reaction_limit")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for Bookmark {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Bookmark {
            guild_id: row.try_get("guild_id")?,
            channel_id: opt_channel(row, "channel_id")?,
            enabled: flag(row, "enabled")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, AnyRow> for AutoThread {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(AutoThread {
            guild_id: row.try_get("guild_id")?,
            channel_id: row.try_get("channel_id")?,
            duration: row.try_get("duration")?,
        })
    }
}
