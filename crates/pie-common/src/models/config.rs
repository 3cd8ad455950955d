//! Global bot configuration: a single row shared by every guild.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::text::TableRow;

/// Global bot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Command prefix
    pub prefix: String,
    /// Default language for guilds without their own preference
    pub language: String,
    /// Presence shown by the bot (`online`, `idle`, `dnd`, `invisible`)
    pub status: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            language: "en".to_string(),
            status: "online".to_string(),
        }
    }
}

impl BotConfig {
    /// Apply a partial update; `None` fields are kept.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(prefix) = update.prefix {
            self.prefix = prefix;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

impl TableRow for BotConfig {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "prefix" => Some(self.prefix.clone()),
            "language" => Some(self.language.clone()),
            "status" => Some(self.status.clone()),
            _ => None,
        }
    }
}

/// Partial update of [`BotConfig`].
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConfigUpdate {
    #[validate(length(min = 1, max = 16, message = "Prefix must be 1-16 characters"))]
    pub prefix: Option<String>,

    #[validate(length(min = 2, max = 8, message = "Language must be 2-8 characters"))]
    pub language: Option<String>,

    #[validate(regex(
        path = *STATUS_REGEX,
        message = "Status must be one of online, idle, dnd, invisible"
    ))]
    pub status: Option<String>,
}

static STATUS_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^(online|idle|dnd|invisible)$").unwrap());
