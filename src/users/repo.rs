use std::time::Duration;

use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::{now_utc, with_deadline};
use crate::error::{Entity, StoreError};
use crate::users::repo_types::User;

/// CRUD over the `users` table.
#[derive(Clone)]
pub struct UserStore {
    db: PgPool,
    op_timeout: Option<Duration>,
}

impl UserStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            op_timeout: None,
        }
    }

    /// Fail any single operation that runs longer than `limit`.
    pub fn with_op_timeout(mut self, limit: Duration) -> Self {
        self.op_timeout = Some(limit);
        self
    }

    /// Insert a new user, assigning its id and timestamps in place.
    pub async fn create(&self, user: &mut User) -> Result<(), StoreError> {
        let id = Uuid::new_v4();
        let now = now_utc();

        with_deadline(
            self.op_timeout,
            sqlx::query(
                r#"
                INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .bind(now)
            .execute(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("insert", Entity::User, e))?;

        user.id = id;
        user.created_at = now;
        user.updated_at = now;
        debug!(user_id = %id, "user created");
        Ok(())
    }

    /// Find a user by id.
    pub async fn read(&self, id: Uuid) -> Result<User, StoreError> {
        with_deadline(
            self.op_timeout,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("read", Entity::User, e))?
        .ok_or(StoreError::NotFound(Entity::User))
    }

    /// Find a user by email.
    pub async fn read_by_email(&self, email: &str) -> Result<User, StoreError> {
        with_deadline(
            self.op_timeout,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("read", Entity::User, e))?
        .ok_or(StoreError::NotFound(Entity::User))
    }

    /// Overwrite name, email and password hash; `updated_at` is refreshed on success.
    pub async fn update(&self, user: &mut User) -> Result<(), StoreError> {
        let now = now_utc();

        let result = with_deadline(
            self.op_timeout,
            sqlx::query(
                r#"
                UPDATE users
                   SET name = $1, email = $2, password_hash = $3, updated_at = $4
                 WHERE id = $5
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .bind(user.id)
            .execute(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("update", Entity::User, e))?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "update matched no user");
            return Err(StoreError::NotFound(Entity::User));
        }

        user.updated_at = now;
        debug!(user_id = %user.id, "user updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = with_deadline(
            self.op_timeout,
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.db),
        )
        .await
        .map_err(|e| StoreError::persistence("delete", Entity::User, e))?;

        if result.rows_affected() == 0 {
            warn!(user_id = %id, "delete matched no user");
            return Err(StoreError::NotFound(Entity::User));
        }

        debug!(user_id = %id, "user deleted");
        Ok(())
    }
}
