//! Ident credential core
//!
//! This crate provides Argon2id password hashing, JWT access/refresh token
//! issuance and validation, and the bearer-token middleware used by the API.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::CredentialError;
pub use jwt::{AccessClaims, Claims, RefreshClaims, TokenLifetimes, TokenManager, TokenPair};
pub use middleware::{AuthUser, auth_middleware};
pub use password::{HasherParams, PasswordHasher};
