use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_gateway_controller::Dispatcher;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::GatewayConfig;
use crate::rate_limit::RateLimiter;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics: Option<PrometheusHandle>,
    data_dir: Arc<PathBuf>,
    allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, config: &GatewayConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            rate_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
            metrics: None,
            data_dir: Arc::new(config.data_dir.clone()),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
        }
    }

    /// Expose `/metrics` through an installed Prometheus recorder.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }
}
