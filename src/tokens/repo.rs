use std::time::Duration;

use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::{now_utc, with_deadline};
use crate::error::{Entity, StoreError};
use crate::tokens::repo_types::RefreshToken;

/// Create, lookup and delete over the `refresh_tokens` table.
///
/// Tokens are never updated: rotation is a new `create` followed by `delete`
/// of the old id.
#[derive(Clone)]
pub struct RefreshTokenStore {
    db: PgPool,
    op_timeout: Option<Duration>,
}

impl RefreshTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            op_timeout: None,
        }
    }

    pub fn with_op_timeout(mut self, limit: Duration) -> Self {
        self.op_timeout = Some(limit);
        self
    }

    /// Insert a new token, assigning its id and timestamps in place.
    pub async fn create(&self, token: &mut RefreshToken) -> Result<(), StoreError> {
        let id = Uuid::new_v4();
        let now = now_utc();

        with_deadline(
            self.op_timeout,
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (id, user_id, refresh_token, expires_at, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(token.user_id)
            .bind(&token.refresh_token)
            .bind(token.expires_at)
            .bind(now)
            .bind(now)
            .execute(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("insert", Entity::RefreshToken, e))?;

        token.id = id;
        token.created_at = now;
        token.updated_at = now;
        debug!(token_id = %id, user_id = %token.user_id, "refresh token created");
        Ok(())
    }

    pub async fn read(&self, id: Uuid) -> Result<RefreshToken, StoreError> {
        with_deadline(
            self.op_timeout,
            sqlx::query_as::<_, RefreshToken>(
                r#"
                SELECT id, user_id, refresh_token, expires_at, created_at, updated_at
                FROM refresh_tokens
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("read", Entity::RefreshToken, e))?
        .ok_or(StoreError::NotFound(Entity::RefreshToken))
    }

    /// Look up a presented token by its literal value.
    pub async fn read_by_refresh_token(&self, value: &str) -> Result<RefreshToken, StoreError> {
        with_deadline(
            self.op_timeout,
            sqlx::query_as::<_, RefreshToken>(
                r#"
                SELECT id, user_id, refresh_token, expires_at, created_at, updated_at
                FROM refresh_tokens
                WHERE refresh_token = $1
                "#,
            )
            .bind(value)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("read", Entity::RefreshToken, e))?
        .ok_or(StoreError::NotFound(Entity::RefreshToken))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = with_deadline(
            self.op_timeout,
            sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
                .bind(id)
                .execute(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("delete", Entity::RefreshToken, e))?;

        if result.rows_affected() == 0 {
            warn!(token_id = %id, "delete matched no refresh token");
            return Err(StoreError::NotFound(Entity::RefreshToken));
        }

        debug!(token_id = %id, "refresh token deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pg_pool, unique, unreachable_pool};
    use time::OffsetDateTime;

    fn day_token(user_id: Uuid, value: &str) -> RefreshToken {
        RefreshToken::new(
            user_id,
            value,
            OffsetDateTime::now_utc() + time::Duration::hours(24),
        )
    }

    #[tokio::test]
    async fn create_then_read_by_value() {
        let Some(db) = pg_pool().await else { return };
        let store = RefreshTokenStore::new(db);

        let user_id = Uuid::new_v4();
        // the value column is not unique, so tag it per run
        let value = unique("example_refresh_token");
        let mut token = day_token(user_id, &value);
        let expires_at = token.expires_at;
        store.create(&mut token).await.expect("create token");
        assert!(!token.id.is_nil());
        assert_eq!(token.created_at, token.updated_at);

        let found = store.read_by_refresh_token(&value).await.expect("read by value");
        assert_eq!(found.id, token.id);
        assert_eq!(found.user_id, user_id);
        assert!((found.expires_at - expires_at).abs() < time::Duration::seconds(1));

        let by_id = store.read(token.id).await.expect("read by id");
        assert_eq!(by_id, found);
    }

    #[tokio::test]
    async fn expired_rows_are_still_returned() {
        let Some(db) = pg_pool().await else { return };
        let store = RefreshTokenStore::new(db);

        let mut token = RefreshToken::new(
            Uuid::new_v4(),
            unique("stale"),
            OffsetDateTime::now_utc() - time::Duration::hours(1),
        );
        store.create(&mut token).await.expect("create expired token");
        let found = store.read(token.id).await.expect("read expired token");
        assert!(found.is_expired_at(OffsetDateTime::now_utc()));
    }

    #[tokio::test]
    async fn rotation_replaces_old_token() {
        let Some(db) = pg_pool().await else { return };
        let store = RefreshTokenStore::new(db);

        let user_id = Uuid::new_v4();
        let mut old = day_token(user_id, &unique("old"));
        store.create(&mut old).await.expect("create old");
        let mut new = day_token(user_id, &unique("new"));
        store.create(&mut new).await.expect("create new");
        store.delete(old.id).await.expect("delete old");

        assert!(store.read(old.id).await.unwrap_err().is_not_found());
        assert!(store
            .read_by_refresh_token(&old.refresh_token)
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(store.read(new.id).await.expect("read new").user_id, user_id);
    }

    #[tokio::test]
    async fn missing_token_is_not_found() {
        let Some(db) = pg_pool().await else { return };
        let store = RefreshTokenStore::new(db);

        let err = store.read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Entity::RefreshToken)));
        assert!(store.delete(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn deadline_or_connect_failure_is_a_persistence_error() {
        let store =
            RefreshTokenStore::new(unreachable_pool()).with_op_timeout(Duration::from_millis(50));

        let err = store.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persistence {
                op: "delete",
                entity: Entity::RefreshToken,
                ..
            }
        ));
    }
}
