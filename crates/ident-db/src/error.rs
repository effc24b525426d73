//! User store errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Connection or query failure reported by sqlx
    #[error("User store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("CPF already registered")]
    DuplicateCpf,

    /// The users table could not be created
    #[error("Schema bootstrap failed: {0}")]
    Schema(String),
}
