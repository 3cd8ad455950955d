//! Spam channels: where a guild wants noisy command output to go.

use serde::{Deserialize, Serialize};

use crate::Snowflake;
use crate::text::TableRow;

/// A channel registered as a spam channel. At most one per guild is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamChannel {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub primary: bool,
}

impl SpamChannel {
    pub fn new(guild_id: Snowflake, channel_id: Snowflake) -> Self {
        Self {
            guild_id,
            channel_id,
            primary: false,
        }
    }
}

impl TableRow for SpamChannel {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(self.channel_id.to_string()),
            "primary" => Some(self.primary.to_string()),
            _ => None,
        }
    }
}
