//! Prometheus scrape endpoint

use axum::{
    Router,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::service::CredentialService;
use crate::state::MetricsHandle;

/// Prometheus text exposition format
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
struct ScrapeState {
    handle: Arc<MetricsHandle>,
    service: Arc<CredentialService>,
}

/// Build the `/metrics` route. Each scrape refreshes the registered-user gauge.
pub fn routes(handle: Arc<MetricsHandle>, service: Arc<CredentialService>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(ScrapeState { handle, service })
}

async fn scrape(State(state): State<ScrapeState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.service.count_users().await?;
    metrics::gauge!("ident_registered_users").set(users as f64);

    Ok(([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], state.handle.render()))
}
