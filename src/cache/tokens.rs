use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::debug;

use crate::cache::CacheClient;
use crate::db::with_deadline;
use crate::error::{Entity, StoreError};
use crate::tokens::repo_types::RefreshToken;

/// Write-only cache of refresh token values keyed by token id.
///
/// Entries are populated explicitly by the caller and are not removed when
/// the row is deleted.
#[derive(Clone)]
pub struct TokenCache {
    cache: Arc<dyn CacheClient>,
    op_timeout: Option<Duration>,
}

impl TokenCache {
    pub fn new(cache: Arc<dyn CacheClient>) -> Self {
        Self {
            cache,
            op_timeout: None,
        }
    }

    pub fn with_op_timeout(mut self, limit: Duration) -> Self {
        self.op_timeout = Some(limit);
        self
    }

    /// Cache `token.refresh_token` under `token.id` until `token.expires_at`.
    ///
    /// A token that has already expired leaves no entry behind.
    pub async fn set(&self, token: &RefreshToken) -> Result<(), StoreError> {
        let key = token.id.to_string();

        match ttl_until(token.expires_at, OffsetDateTime::now_utc()) {
            Some(ttl) => {
                with_deadline(
                    self.op_timeout,
                    self.cache.set_with_ttl(&key, &token.refresh_token, ttl),
                )
                .await
                .map_err(|e| StoreError::cache("set", Entity::RefreshToken, e))?;
                debug!(token_id = %token.id, ttl_ms = ttl.as_millis() as u64, "refresh token cached");
            }
            None => {
                with_deadline(self.op_timeout, self.cache.delete(&key))
                    .await
                    .map_err(|e| StoreError::cache("set", Entity::RefreshToken, e))?;
                debug!(token_id = %token.id, "refresh token already expired; cache entry cleared");
            }
        }
        Ok(())
    }
}

/// Remaining lifetime at millisecond resolution, `None` once nothing is left.
fn ttl_until(expires_at: OffsetDateTime, now: OffsetDateTime) -> Option<Duration> {
    let millis = (expires_at - now).whole_milliseconds();
    if millis <= 0 {
        return None;
    }
    Some(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
}
