//! Ident REST API
//!
//! This crate provides the credential service and the Axum-based HTTP API
//! for sign-up, sign-in, token refresh and user lookup.

pub mod error;
pub mod routes;
pub mod service;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use service::{CredentialService, NewAccount, SignInOutcome};
pub use state::{AppState, MetricsHandle};
