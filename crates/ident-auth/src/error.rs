//! Credential error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Randomness source failure: {0}")]
    Randomness(String),

    #[error("Malformed credential: {0}")]
    Format(String),

    #[error("Token signature invalid")]
    SignatureInvalid,

    #[error("Token signing algorithm mismatch")]
    AlgorithmMismatch,

    #[error("Token claim type mismatch")]
    ClaimTypeMismatch,

    #[error("Token expired")]
    Expired,

    #[error("Token issuer mismatch")]
    InvalidIssuer,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Token lifetime out of range: {0}")]
    LifetimeOutOfRange(String),
}

impl CredentialError {
    /// Whether this error means "the presented credential is not acceptable"
    /// as opposed to an internal fault.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CredentialError::Format(_)
                | CredentialError::SignatureInvalid
                | CredentialError::AlgorithmMismatch
                | CredentialError::ClaimTypeMismatch
                | CredentialError::Expired
                | CredentialError::InvalidIssuer
        )
    }
}

impl IntoResponse for CredentialError {
    /// Renders the same `{"error": {"code", "message"}}` envelope as the API
    /// handlers, so middleware rejections look like any other 401.
    fn into_response(self) -> Response {
        let (status, code, message) = if self.is_verification_failure() {
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid credential")
        } else {
            error!("Credential subsystem failure: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal error",
            )
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
