pub mod repo;
pub mod repo_types;

pub use repo::RefreshTokenStore;
pub use repo_types::RefreshToken;
