//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::CredentialError;
use crate::jwt::TokenManager;

/// Authenticated user information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Result<&str, CredentialError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CredentialError::Format("invalid authorization header".to_string()))
}

/// Authentication middleware
///
/// Requires an access token in the Authorization header and adds the
/// resulting [`AuthUser`] to request extensions. Refresh tokens are rejected.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, CredentialError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| CredentialError::Format("missing authorization header".to_string()))?;

    let token = extract_bearer_token(header)?;
    let id = tokens.verify_access(token)?;

    debug!("Authenticated user: {}", id);

    request.extensions_mut().insert(AuthUser { id });

    Ok(next.run(request).await)
}
