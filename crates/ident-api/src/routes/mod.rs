//! API routes

mod auth;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod validation;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Request bodies here are small JSON documents
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let tokens = state.service.tokens().clone();
    let service = state.service.clone();

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes(tokens))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle, service));
    }

    router
}
