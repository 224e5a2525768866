//! Type-safe session identifier.
//!
//! [`SessionId`] wraps a UUID v4 rendered in its 32-character simple form
//! so that it never contains the `_` separator used by private room names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ChatError;

/// Number of leading characters of a session id used as its alias.
pub const ALIAS_LEN: usize = 8;

/// Identifier of a single WebSocket chat session.
///
/// Generated once when the connection is accepted. Used as the key of
/// the connected-user table, as the author of messages, and as one half
/// of a private room name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Creates a new random `SessionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the default display alias: the first eight hex characters.
    #[must_use]
    pub fn alias(&self) -> String {
        self.to_string().chars().take(ALIAS_LEN).collect()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 32 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChatError::InvalidSessionId(s.to_string()));
        }
        uuid::Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| ChatError::InvalidSessionId(s.to_string()))
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn display_is_simple_hex() {
        let s = SessionId::new().to_string();
        assert_eq!(s.len(), 32);
        assert!(!s.contains('-'));
        assert!(!s.contains('_'));
    }

    #[test]
    fn alias_is_prefix() {
        let id = SessionId::new();
        let alias = id.alias();
        assert_eq!(alias.len(), ALIAS_LEN);
        assert!(id.to_string().starts_with(&alias));
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = SessionId::new();
        let Ok(parsed) = id.to_string().parse::<SessionId>() else {
            panic!("display form should parse");
        };
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_hyphenated_and_garbage() {
        let hyphenated = uuid::Uuid::new_v4().to_string();
        tokio_test::assert_err!(hyphenated.parse::<SessionId>());
        tokio_test::assert_err!("not-a-session".parse::<SessionId>());
        tokio_test::assert_err!("".parse::<SessionId>());
    }

    #[test]
    fn serde_uses_string_form() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{id}\""));
    }
}
