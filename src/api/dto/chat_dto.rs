//! Chat DTOs for the REST endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::views::UserSummary;

/// Largest history page served over REST.
pub const MAX_HISTORY_LIMIT: usize = 500;

/// Query parameters for `GET /api/v1/rooms/{room}/history`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum messages to return (1–500). Defaults to the server limit.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Only messages strictly newer than this RFC 3339 time.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    /// Returns the limit clamped to `1..=MAX_HISTORY_LIMIT`.
    #[must_use]
    pub fn clamped_limit(&self) -> Option<usize> {
        self.limit.map(|l| l.clamp(1, MAX_HISTORY_LIMIT))
    }
}

/// Response body for `GET /api/v1/users`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    /// Users on this page, in connect order.
    pub data: Vec<UserSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let query = HistoryQuery {
            limit: Some(10_000),
            since: None,
        };
        assert_eq!(query.clamped_limit(), Some(MAX_HISTORY_LIMIT));
        let query = HistoryQuery {
            limit: Some(0),
            since: None,
        };
        assert_eq!(query.clamped_limit(), Some(1));
        assert_eq!(HistoryQuery::default().clamped_limit(), None);
    }
}
