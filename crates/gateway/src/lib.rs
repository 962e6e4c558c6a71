//! HTTP surface of the agent gateway.
//!
//! Routes:
//! - `GET  /api/agents`: agent summaries
//! - `GET  /api/agents/:id/options`: option declarations of one agent
//! - `POST /api/execute`: run an agent
//! - `GET  /files/*path`: download a generated artifact
//! - `GET  /health`, `GET /metrics`

pub mod config;
pub mod error;
pub mod files;
pub mod rate_limit;
pub mod request_id;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::{
        predicate::{NotForContentType, Predicate, SizeAbove},
        CompressionLayer,
    },
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use state::AppState;

const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Responses smaller than this are sent uncompressed.
const COMPRESSION_MIN_BYTES: u16 = 1000;

/// Build the gateway router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/agents", get(routes::list_agents))
        .route("/api/agents/:id/options", get(routes::describe_options))
        .route("/api/execute", post(routes::execute))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .merge(api)
        .route("/files/*path", get(files::download))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .layer(compression_layer())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::propagate))
        .layer(cors_layer(state.allowed_origins()))
        .with_state(state)
}

fn compression_layer() -> CompressionLayer<impl Predicate> {
    let predicate = SizeAbove::new(COMPRESSION_MIN_BYTES)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE);
    CompressionLayer::new().gzip(true).compress_when(predicate)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &GatewayConfig, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    serve_with_listener(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(address = %listener.local_addr()?, "Agent gateway listening");

    let limiter = state.rate_limiter.clone();
    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            limiter.purge_idle();
        }
    });

    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    purge.abort();
    tracing::info!("Agent gateway stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
