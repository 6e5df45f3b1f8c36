//! Credential store adapters.

pub mod sqlite;
pub mod static_token;

pub use sqlite::SqliteCredentialStore;
pub use static_token::StaticCredentialStore;
