//! Settings tables owned by the bundled `base` modules.
//!
//! `channel_id: None` on the per-channel preferences means the setting applies
//! to the whole guild.

use serde::{Deserialize, Serialize};

use crate::Snowflake;
use crate::text::TableRow;

/// Whether a loaded module is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminModule {
    pub name: String,
    pub enabled: bool,
}

/// How many reactions it takes for members to pin a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPin {
    pub guild_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub limit: i64,
}

/// How many reactions it takes for members to open a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserThread {
    pub guild_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub limit: i64,
}

/// Whether bookmarking messages by reaction is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub guild_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub enabled: bool,
}

/// Channel where every message gets a thread, archived after `duration` minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoThread {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub duration: i64,
}

fn channel_cell(channel_id: Option<Snowflake>) -> String {
    channel_id.map(|id| id.to_string()).unwrap_or_default()
}

impl TableRow for AdminModule {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "name" => Some(self.name.clone()),
            "enabled" => Some(self.enabled.to_string()),
            _ => None,
        }
    }
}

impl TableRow for UserPin {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(channel_cell(self.channel_id)),
            "limit" => Some(self.limit.to_string()),
            _ => None,
        }
    }
}

impl TableRow for UserThread {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(channel_cell(self.channel_id)),
            "limit" => Some(self.limit.to_string()),
            _ => None,
        }
    }
}

impl TableRow for Bookmark {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(channel_cell(self.channel_id)),
            "enabled" => Some(self.enabled.to_string()),
            _ => None,
        }
    }
}

impl TableRow for AutoThread {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(self.channel_id.to_string()),
            "duration" => Some(self.duration.to_string()),
            _ => None,
        }
    }
}
