//! Request/Response DTOs

use ident_auth::TokenPair;
use ident_db::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==================== Auth Types ====================

/// Sign-up request
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub cpf: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Sign-in request
#[derive(Deserialize)]
pub struct SignInRequest {
    pub cpf: String,
    pub password: String,
}

/// Refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Issued bearer credentials
#[derive(Serialize)]
pub struct KeyResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

impl From<TokenPair> for KeyResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.access_expires_in,
            refresh_expires_in: pair.refresh_expires_in,
        }
    }
}

/// Sign-in response
#[derive(Serialize)]
pub struct SignInResponse {
    pub user: UserResponse,
    pub key: KeyResponse,
}

// ==================== User Types ====================

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub cpf: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            cpf: u.cpf,
            first_name: u.first_name,
            last_name: u.last_name,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

/// Pagination for user listing
#[derive(Deserialize, Default)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Password change request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account deletion request
#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}
