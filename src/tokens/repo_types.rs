use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Refresh token record in the database.
///
/// A stored row says nothing about validity; callers check `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,              // owning user, not enforced here
    pub refresh_token: String,      // the literal value handed to the client
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl RefreshToken {
    /// Unsaved token; `create` fills in the id and timestamps.
    pub fn new(user_id: Uuid, refresh_token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::nil(),
            user_id,
            refresh_token: refresh_token.into(),
            expires_at,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
