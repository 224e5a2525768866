//! Room naming: the common room and private rooms scoped to a pair of
//! sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::SessionId;
use crate::error::ChatError;

/// Name of the room every session joins on connect.
pub const COMMON_ROOM: &str = "common_room";

/// Prefix shared by every private room name.
pub const PRIVATE_ROOM_PREFIX: &str = "private_room_";

/// A chat room identifier.
///
/// Private rooms are named `private_room_{a}_{b}` with `a <= b`, so both
/// participants derive the same name regardless of who opens the chat.
/// A session chatting with itself gets the personal room
/// `private_room_{sid}_{sid}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomName {
    /// The shared room.
    Common,
    /// A room between two sessions, stored in ascending order.
    Private(SessionId, SessionId),
}

impl RoomName {
    /// Returns the private room shared by `a` and `b`.
    #[must_use]
    pub fn private(a: SessionId, b: SessionId) -> Self {
        // Byte order of the UUID matches the order of its lower-hex form.
        if a <= b {
            Self::Private(a, b)
        } else {
            Self::Private(b, a)
        }
    }

    /// Returns the personal room of `sid`.
    #[must_use]
    pub const fn personal(sid: SessionId) -> Self {
        Self::Private(sid, sid)
    }

    /// Returns `true` for the common room.
    #[must_use]
    pub const fn is_common(&self) -> bool {
        matches!(self, Self::Common)
    }

    /// Returns `true` for private (including personal) rooms.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        matches!(self, Self::Private(..))
    }

    /// Returns `true` if `sid` may read and post in this room.
    #[must_use]
    pub fn admits(&self, sid: SessionId) -> bool {
        match self {
            Self::Common => true,
            Self::Private(a, b) => *a == sid || *b == sid,
        }
    }

    /// Returns the distinct participants of a private room.
    #[must_use]
    pub fn participants(&self) -> Vec<SessionId> {
        match self {
            Self::Common => Vec::new(),
            Self::Private(a, b) if a == b => vec![*a],
            Self::Private(a, b) => vec![*a, *b],
        }
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self::Common
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => f.write_str(COMMON_ROOM),
            Self::Private(a, b) => write!(f, "{PRIVATE_ROOM_PREFIX}{a}_{b}"),
        }
    }
}

impl FromStr for RoomName {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == COMMON_ROOM {
            return Ok(Self::Common);
        }
        let invalid = || ChatError::InvalidRoom(s.to_string());
        let rest = s.strip_prefix(PRIVATE_ROOM_PREFIX).ok_or_else(invalid)?;
        let (first, second) = rest.split_once('_').ok_or_else(invalid)?;
        let first: SessionId = first.parse().map_err(|_| invalid())?;
        let second: SessionId = second.parse().map_err(|_| invalid())?;
        Ok(Self::private(first, second))
    }
}

impl Serialize for RoomName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
