use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use rostra_engine::DebateOrchestrator;
use rostra_store::{ChangeFeed, Database};

use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8787,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub feed: ChangeFeed,
    pub orchestrator: DebateOrchestrator,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/debates", post(handlers::create_debate).get(handlers::list_debates))
        .route("/debates/{id}", get(handlers::get_debate))
        .route("/debates/{id}/turns", get(handlers::list_turns))
        .route("/debates/{id}/verdicts", get(handlers::list_verdicts))
        .route("/debates/{id}/alerts", get(handlers::list_alerts))
        .route("/debates/{id}/summary", get(handlers::get_summary))
        .route("/debates/{id}/votes", post(handlers::submit_vote))
        .route("/debates/{id}/events", get(handlers::debate_events))
        .route("/media/{id}", get(handlers::get_media))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle that keeps it alive.
pub async fn start(
    config: ServerConfig,
    db: Database,
    feed: ChangeFeed,
    orchestrator: DebateOrchestrator,
) -> Result<ServerHandle, std::io::Error> {
    let state = AppState { db, feed, orchestrator };
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "rostra server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by `start()` — dropping it does not stop the server,
/// but keeps the task join handle reachable.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}
