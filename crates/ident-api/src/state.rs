//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::service::CredentialService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CredentialService>,
}

impl AppState {
    pub fn new(service: Arc<CredentialService>) -> Self {
        Self { service }
    }
}

/// Handle to the installed Prometheus recorder
pub struct MetricsHandle(PrometheusHandle);

impl MetricsHandle {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self(handle)
    }

    /// Render the current metrics in Prometheus text format
    pub fn render(&self) -> String {
        self.0.render()
    }
}
