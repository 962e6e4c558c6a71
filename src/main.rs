use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{prelude::*, EnvFilter};

use agent_gateway_controller::{AgentRegistry, Dispatcher, DispatcherConfig};
use agent_gateway_http::{serve, AppState, GatewayConfig};
use agent_gateway_model_gateway::{GeminiClient, GeminiConfig};
use agent_gateway_skills::{register_prompt_agents, ArtifactWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up API keys from `.env` during local development.
    dotenv::dotenv().ok();

    let config = GatewayConfig::from_env()?;
    init_tracing(config.production);

    let registry = match &config.registry_path {
        Some(path) => AgentRegistry::from_path(path)
            .with_context(|| format!("loading agent registry from {}", path.display()))?,
        None => AgentRegistry::builtin()?,
    };
    tracing::info!(agents = registry.len(), "Agent registry loaded");

    let writer = Arc::new(ArtifactWriter::new(&config.data_dir));
    writer
        .init_directories()
        .await
        .with_context(|| format!("creating data directories under {}", config.data_dir.display()))?;

    let llm = GeminiClient::new(GeminiConfig {
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
        base_url: config.llm_base_url.clone(),
        max_concurrency: config.llm_max_concurrency,
        ..GeminiConfig::default()
    })?;
    if !llm.is_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; model-backed agents will fail");
    }

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        DispatcherConfig {
            execution_timeout: config.execution_timeout,
            cache_ttl: config.cache_ttl,
            cache_capacity: config.cache_capacity,
        },
    );
    let dispatcher = register_prompt_agents(dispatcher, Arc::new(llm), writer)?;

    let mut state = AppState::new(dispatcher, &config);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }

    tracing::info!(
        data_dir = %config.data_dir.display(),
        model = %config.llm_model,
        rate_limit = config.rate_limit_per_minute,
        "Starting agent gateway"
    );
    serve(&config, state).await?;
    Ok(())
}

fn init_tracing(production: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if production {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
