//! Per-client sliding window rate limiting for the API routes.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::ApiError;
use crate::state::AppState;

/// Window used for the per-minute limit.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Counts request timestamps per client within a sliding window.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// `limit` requests per `window`; a limit of zero admits everything.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: DashMap::new(),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, WINDOW)
    }

    /// Record a request and report whether it is admitted.
    pub fn check(&self, client: &str) -> bool {
        if self.limit == 0 {
            return true;
        }

        let now = Instant::now();
        let mut hits = self.hits.entry(client.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.limit as usize {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Drop clients with no requests inside the window.
    pub fn purge_idle(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|t| now.duration_since(*t) < self.window)
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

/// Middleware rejecting clients over the limit with 429.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check(&client) {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        metrics::counter!("http_requests_rate_limited_total").increment(1);
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}
