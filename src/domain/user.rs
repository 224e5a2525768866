//! Connected users and nickname rules.

use chrono::{DateTime, Utc};

use super::SessionId;

/// Longest nickname accepted, in characters.
pub const MAX_NICKNAME_CHARS: usize = 12;

/// Trims a requested nickname and caps it at [`MAX_NICKNAME_CHARS`].
///
/// An empty result means "no nickname"; the alias is shown instead.
#[must_use]
pub fn normalize_nickname(raw: &str) -> String {
    raw.trim().chars().take(MAX_NICKNAME_CHARS).collect()
}

/// Picks the label shown for a user: nickname when set, otherwise alias.
#[must_use]
pub fn display_name<'a>(nickname: &'a str, alias: &'a str) -> &'a str {
    if nickname.is_empty() { alias } else { nickname }
}

/// A live session as tracked by the server.
#[derive(Debug, Clone)]
pub struct ConnectedUser {
    /// Session identifier.
    pub sid: SessionId,
    /// Default label (sid prefix).
    pub alias: String,
    /// User-chosen nickname; empty when unset.
    pub nickname: String,
    /// When the session connected.
    pub connect_time: DateTime<Utc>,
    /// When the session last disconnected, if it ever did.
    pub last_disconnect_time: Option<DateTime<Utc>>,
    /// Client IP address as resolved from proxy headers or the peer.
    pub ip_address: String,
    /// Monotonic connect order, used to list users stably.
    pub seq: u64,
}

impl ConnectedUser {
    /// Creates a freshly connected user.
    #[must_use]
    pub fn new(sid: SessionId, ip_address: String, seq: u64) -> Self {
        Self {
            sid,
            alias: sid.alias(),
            nickname: String::new(),
            connect_time: Utc::now(),
            last_disconnect_time: None,
            ip_address,
            seq,
        }
    }

    /// Returns the nickname, or the alias when no nickname is set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        display_name(&self.nickname, &self.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_is_trimmed_and_capped() {
        assert_eq!(normalize_nickname("  bob  "), "bob");
        assert_eq!(normalize_nickname("abcdefghijklmnop"), "abcdefghijkl");
        assert_eq!(normalize_nickname("   "), "");
    }

    #[test]
    fn nickname_cap_counts_characters_not_bytes() {
        let long = "ж".repeat(20);
        assert_eq!(normalize_nickname(&long).chars().count(), MAX_NICKNAME_CHARS);
    }

    #[test]
    fn display_name_falls_back_to_alias() {
        let mut user = ConnectedUser::new(SessionId::new(), "127.0.0.1".to_string(), 0);
        assert_eq!(user.display_name(), user.alias);
        user.nickname = "neo".to_string();
        assert_eq!(user.display_name(), "neo");
    }
}
