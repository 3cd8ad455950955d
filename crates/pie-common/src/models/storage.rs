//! Generic key/value storage that modules use for small per-guild settings.
//!
//! Values are stored as text together with the name of their type so a typed
//! value can be recovered on read. Type names and text forms match what the
//! bot has always written (`str`, `int`, `float`, `bool` with `True`/`False`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Snowflake;
use crate::text::TableRow;

/// A typed value accepted by the storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl StorageValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            StorageValue::Bool(_) => "bool",
            StorageValue::Int(_) => "int",
            StorageValue::Float(_) => "float",
            StorageValue::Str(_) => "str",
        }
    }

    /// Rebuild a value from its stored text and type name.
    ///
    /// Unknown type names and unparsable text fall back to [`StorageValue::Str`].
    pub fn parse(value: &str, type_name: &str) -> Self {
        let parsed = match type_name {
            "bool" => match value {
                "True" | "true" => Some(StorageValue::Bool(true)),
                "False" | "false" => Some(StorageValue::Bool(false)),
                _ => None,
            },
            "int" => value.parse().ok().map(StorageValue::Int),
            "float" => value.parse().ok().map(StorageValue::Float),
            _ => None,
        };
        parsed.unwrap_or_else(|| StorageValue::Str(value.to_string()))
    }
}

impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageValue::Bool(true) => f.write_str("True"),
            StorageValue::Bool(false) => f.write_str("False"),
            StorageValue::Int(v) => write!(f, "{v}"),
            StorageValue::Float(v) => write!(f, "{v:?}"),
            StorageValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for StorageValue {
    fn from(v: bool) -> Self {
        StorageValue::Bool(v)
    }
}

impl From<i64> for StorageValue {
    fn from(v: i64) -> Self {
        StorageValue::Int(v)
    }
}

impl From<f64> for StorageValue {
    fn from(v: f64) -> Self {
        StorageValue::Float(v)
    }
}

impl From<String> for StorageValue {
    fn from(v: String) -> Self {
        StorageValue::Str(v)
    }
}

impl From<&str> for StorageValue {
    fn from(v: &str) -> Self {
        StorageValue::Str(v.to_string())
    }
}

/// One stored value, keyed by module, guild and key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    pub module: String,
    pub guild_id: Snowflake,
    pub key: String,
    pub value: String,
    pub value_type: String,
}

impl StorageData {
    pub fn new(
        module: impl Into<String>,
        guild_id: Snowflake,
        key: impl Into<String>,
        value: &StorageValue,
    ) -> Self {
        Self {
            module: module.into(),
            guild_id,
            key: key.into(),
            value: value.to_string(),
            value_type: value.type_name().to_string(),
        }
    }

    pub fn typed_value(&self) -> StorageValue {
        StorageValue::parse(&self.value, &self.value_type)
    }
}

impl TableRow for StorageData {
    fn cell(&self, column: &str) -> Option<String> {
        match column {
            "module" => Some(self.module.clone()),
            "guild_id" => Some(self.guild_id.to_string()),
            "key" => Some(self.key.clone()),
            "value" => Some(self.value.clone()),
            "type" => Some(self.value_type.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_forms() {
        assert_eq!(StorageValue::Bool(true).to_string(), "True");
        assert_eq!(StorageValue::Int(-3).to_string(), "-3");
        assert_eq!(StorageValue::Float(1.0).to_string(), "1.0");
        assert_eq!(StorageValue::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_typed_value_recovers_original() {
        for value in [
            StorageValue::Bool(false),
            StorageValue::Int(42),
            StorageValue::Float(2.5),
            StorageValue::Str("text".into()),
        ] {
            let data = StorageData::new("fun", 1, "k", &value);
            assert_eq!(data.value_type, value.type_name());
            assert_eq!(data.typed_value(), value);
        }
    }

    #[test]
    fn test_unparsable_falls_back_to_string() {
        assert_eq!(
            StorageValue::parse("nope", "int"),
            StorageValue::Str("nope".into())
        );
        assert_eq!(
            StorageValue::parse("7", "NoneType"),
            StorageValue::Str("7".into())
        );
    }
}
