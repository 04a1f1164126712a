//! Telegram identities
//!
//! Uploaders and viewers are Telegram numeric user ids, or `Unknown` when the
//! Mini App ran without a user context. On the wire an identity is either a
//! JSON number or the string `"unknown"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TelegramIdentity {
    User(i64),
    #[default]
    Unknown,
}

impl TelegramIdentity {
    /// Interpret a free-form value such as the `viewerId` query parameter.
    /// Anything that is not an integer is treated as unknown.
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok()).map_or(Self::Unknown, Self::User)
    }

    /// Column representation: `NULL` for unknown
    pub fn as_db(&self) -> Option<i64> {
        match self {
            Self::User(id) => Some(*id),
            Self::Unknown => None,
        }
    }

    pub fn from_db(value: Option<i64>) -> Self {
        value.map_or(Self::Unknown, Self::User)
    }
}

impl fmt::Display for TelegramIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{}", id),
            Self::Unknown => write!(f, "{}", UNKNOWN),
        }
    }
}

impl Serialize for TelegramIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::User(id) => serializer.serialize_i64(*id),
            Self::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl<'de> Deserialize<'de> for TelegramIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Self::User(id),
            Raw::Text(text) => Self::from_query(Some(&text)),
        })
    }
}
