use std::fmt;

/// Boxed cause carried by persistence and cache failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The record kind an operation was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    RefreshToken,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::RefreshToken => f.write_str("refresh token"),
        }
    }
}

/// Failure returned by every store and cache operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the targeted id, email or token value.
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("failed to {op} {entity}")]
    Persistence {
        op: &'static str,
        entity: Entity,
        #[source]
        source: BoxError,
    },

    #[error("failed to {op} {entity} in cache")]
    Cache {
        op: &'static str,
        entity: Entity,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub(crate) fn persistence(op: &'static str, entity: Entity, source: BoxError) -> Self {
        tracing::error!(op, %entity, error = %source, "database operation failed");
        StoreError::Persistence { op, entity, source }
    }

    pub(crate) fn cache(op: &'static str, entity: Entity, source: BoxError) -> Self {
        tracing::error!(op, %entity, error = %source, "cache operation failed");
        StoreError::Cache { op, entity, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
