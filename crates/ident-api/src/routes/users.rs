//! User routes (access token required)

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, put},
};
use ident_auth::{AuthUser, TokenManager, auth_middleware};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    ChangePasswordRequest, DeleteAccountRequest, ListUsersQuery, UserResponse,
};
use super::validation::{validate_new_password, validate_presented_password};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// GET /users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let limit = match query.limit {
        Some(l) if l > 0 => l.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    };
    let offset = query.offset.filter(|o| *o >= 0).unwrap_or(0);

    let users = state.service.list_users(limit, offset).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    let user = state
        .service
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// PUT /users/me/password
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_presented_password(&request.current_password)?;
    validate_new_password(&request.new_password)?;

    state
        .service
        .change_password(user.id, &request.current_password, request.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/me
async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<StatusCode, ApiError> {
    validate_presented_password(&request.password)?;

    state.service.delete_account(user.id, &request.password).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Create user routes guarded by access-token authentication
pub fn routes(tokens: Arc<TokenManager>) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", delete(delete_account))
        .route("/users/me/password", put(change_password))
        .route("/users/{id}", get(get_user))
        .route_layer(from_fn_with_state(tokens, auth_middleware))
}
