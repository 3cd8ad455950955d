//! Access-control records: default command levels and per-role/user/channel overwrites.
//!
//! A command is allowed when the invoker's [`AcLevel`] reaches the command's
//! level, unless an explicit overwrite says otherwise. Overwrites are keyed by
//! guild, target and command name; level mappings assign a level to a role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Snowflake;
use crate::text::TableRow;

/// Permission level, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i64)]
pub enum AcLevel {
    Everyone = 0,
    Member = 1,
    Submod = 2,
    Mod = 3,
    GuildOwner = 4,
    BotOwner = 5,
}

impl AcLevel {
    pub const ALL: [AcLevel; 6] = [
        AcLevel::Everyone,
        AcLevel::Member,
        AcLevel::Submod,
        AcLevel::Mod,
        AcLevel::GuildOwner,
        AcLevel::BotOwner,
    ];

    /// Name used in listings and the command line.
    pub fn name(self) -> &'static str {
        match self {
            AcLevel::Everyone => "EVERYONE",
            AcLevel::Member => "MEMBER",
            AcLevel::Submod => "SUBMOD",
            AcLevel::Mod => "MOD",
            AcLevel::GuildOwner => "GUILD_OWNER",
            AcLevel::BotOwner => "BOT_OWNER",
        }
    }
}

impl fmt::Display for AcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AcLevel> for i64 {
    fn from(level: AcLevel) -> Self {
        level as i64
    }
}

impl TryFrom<i64> for AcLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        AcLevel::ALL
            .into_iter()
            .find(|level| *level as i64 == value)
            .ok_or_else(|| format!("invalid access level {value}"))
    }
}

impl FromStr for AcLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        AcLevel::ALL
            .into_iter()
            .find(|level| level.name() == upper)
            .ok_or_else(|| format!("unknown access level '{s}'"))
    }
}

/// Default level required to run a command in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcDefault {
    pub guild_id: Snowflake,
    pub command: String,
    pub level: AcLevel,
}

/// Explicit allow/deny of a command for everyone holding a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOverwrite {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
    pub command: String,
    pub allow: bool,
}

/// Explicit allow/deny of a command for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverwrite {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub command: String,
    pub allow: bool,
}

/// Explicit allow/deny of a command inside a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverwrite {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub command: String,
    pub allow: bool,
}

/// Level granted to members of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcLevelMapping {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
    pub level: AcLevel,
}

impl TableRow for AcDefault {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "command" => Some(self.command.clone()),
            "level" => Some(self.level.to_string()),
            _ => None,
        }
    }
}

impl TableRow for RoleOverwrite {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "role_id" => Some(self.role_id.to_string()),
            "command" => Some(self.command.clone()),
            "allow" => Some(self.allow.to_string()),
            _ => None,
        }
    }
}

impl TableRow for UserOverwrite {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "user_id" => Some(self.user_id.to_string()),
            "command" => Some(self.command.clone()),
            "allow" => Some(self.allow.to_string()),
            _ => None,
        }
    }
}

impl TableRow for ChannelOverwrite {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "channel_id" => Some(self.channel_id.to_string()),
            "command" => Some(self.command.clone()),
            "allow" => Some(self.allow.to_string()),
            _ => None,
        }
    }
}

impl TableRow for AcLevelMapping {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "guild_id" => Some(self.guild_id.to_string()),
            "role_id" => Some(self.role_id.to_string()),
            "level" => Some(self.level.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(AcLevel::BotOwner > AcLevel::GuildOwner);
        assert!(AcLevel::Mod > AcLevel::Submod);
        assert!(AcLevel::Member > AcLevel::Everyone);
    }

    #[test]
    fn test_level_integer_conversion() {
        for level in AcLevel::ALL {
            assert_eq!(AcLevel::try_from(i64::from(level)), Ok(level));
        }
        assert!(AcLevel::try_from(6).is_err());
        assert!(AcLevel::try_from(-1).is_err());
    }

    #[test]
    fn test_level_names() {
        assert_eq!(AcLevel::GuildOwner.to_string(), "GUILD_OWNER");
        assert_eq!("submod".parse::<AcLevel>(), Ok(AcLevel::Submod));
        assert!("admin".parse::<AcLevel>().is_err());
    }

    #[test]
    fn test_level_serializes_by_name() {
        let json = serde_json::to_string(&AcLevel::BotOwner).unwrap();
        assert_eq!(json, "\"BOT_OWNER\"");
    }
}
