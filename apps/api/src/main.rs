mod completion;
mod config;
mod errors;
mod evaluation;
mod pipeline;
mod routes;
mod state;
mod tools;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::completion::gemini::GeminiCompletion;
use crate::completion::openai::OpenAiCompletion;
use crate::completion::Backends;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vetta API v{}", env!("CARGO_PKG_VERSION"));

    // The artifact root must exist before the first run writes into it.
    tokio::fs::create_dir_all(&config.output_dir).await?;

    // Initialize completion backends
    let backends = Backends {
        openai: Arc::new(OpenAiCompletion::new(config.openai_api_key.clone())),
        gemini: Arc::new(GeminiCompletion::new(config.gemini_api_key.clone())),
    };
    info!(
        "Completion backends initialized (openai: {}, gemini: {})",
        completion::openai::MODEL,
        completion::gemini::MODEL
    );

    let cors = build_cors(&config)?;

    // Build app state
    let state = AppState {
        config: config.clone(),
        backends,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(config: &Config) -> Result<CorsLayer> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin `{origin}`: {e}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
