//! Language preferences, per guild and per member.

use serde::{Deserialize, Serialize};

use crate::Snowflake;
use crate::text::TableRow;

/// Language preference of a guild. The value is not checked against the
/// supported languages here; callers are responsible for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildLanguage {
    pub guild_id: Snowflake,
    pub language: String,
}

/// Language preference of a member inside one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLanguage {
    pub guild_id: Snowflake,
    pub member_id: Snowflake,
    pub language: String,
}

impl TableRow for GuildLanguage {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "language" => Some(self.language.clone()),
            _ => None,
        }
    }
}

impl TableRow for MemberLanguage {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "member_id" => Some(self.member_id.to_string()),
            "language" => Some(self.language.clone()),
            _ => None,
        }
    }
}
