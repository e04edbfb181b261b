//! Persistence for an authentication service: PostgreSQL-backed user and
//! refresh-token stores plus a Redis cache of refresh token values.
//!
//! Every handle (`PgPool`, `ConnectionManager`) is opened and owned by the
//! caller and injected through the constructors.

pub mod cache;
pub mod config;
mod db;
pub mod error;
pub mod logging;
pub mod tokens;
pub mod users;

#[cfg(test)]
mod testing;

pub use cache::{CacheClient, RedisCache, TokenCache};
pub use config::AppConfig;
pub use error::{Entity, StoreError};
pub use tokens::{RefreshToken, RefreshTokenStore};
pub use users::{User, UserStore};
