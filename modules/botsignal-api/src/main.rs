use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use botsignal_common::Config;
use botsignal_scout::PipelineOrchestrator;
use botsignal_store::Store;
use reddit_client::RedditClient;

mod rest;

pub struct AppState {
    pub pipeline: PipelineOrchestrator,
    pub store: Store,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("botsignal=info".parse()?))
        .init();

    let config = Config::from_env();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    let client = RedditClient::new(
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
        config.reddit_user_agent.clone(),
    );

    let pipeline = PipelineOrchestrator::new(
        Arc::new(client),
        Arc::new(store.clone()),
        config.fetch_delay_ms,
        config.extraction_limit,
    );

    let state = Arc::new(AppState { pipeline, store });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Sessions
        .route(
            "/api/sessions",
            post(rest::create_session).get(rest::list_sessions),
        )
        .route(
            "/api/sessions/{id}",
            get(rest::get_session).delete(rest::delete_session),
        )
        .route("/api/sessions/{id}/run", post(rest::run_pipeline))
        // Verdicts
        .route("/api/verdicts", get(rest::list_verdicts))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!(addr = addr.as_str(), "botsignal API listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
