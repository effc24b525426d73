//! Sign-up, sign-in and refresh routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tracing::debug;

use crate::error::ApiError;
use crate::service::NewAccount;
use crate::state::AppState;

use super::types::{
    KeyResponse, RefreshRequest, SignInRequest, SignInResponse, SignUpRequest, UserResponse,
};
use super::validation::{
    validate_cpf, validate_name, validate_new_password, validate_presented_password,
};

/// POST /sign-up
async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let cpf = validate_cpf(&request.cpf)?;
    validate_name("first_name", &request.first_name)?;
    validate_name("last_name", &request.last_name)?;
    validate_new_password(&request.password)?;

    let user = state
        .service
        .sign_up(NewAccount {
            cpf,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /sign-in
async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let cpf = validate_cpf(&request.cpf)?;
    validate_presented_password(&request.password)?;

    debug!("Sign-in attempt");

    let outcome = state.service.sign_in(&cpf, &request.password).await?;

    Ok(Json(SignInResponse {
        user: outcome.user.into(),
        key: outcome.tokens.into(),
    }))
}

/// POST /refresh
async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("refresh_token is required".to_string()));
    }

    let pair = state.service.refresh(&request.refresh_token).await?;
    Ok(Json(pair.into()))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/refresh", post(refresh))
}
