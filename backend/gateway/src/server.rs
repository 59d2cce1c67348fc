//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{http::Method, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use neonchat_matchmaker::{Matchmaker, MatchingLimits};

use crate::client_ui;
use crate::health_api;
use crate::session_registry::ClientRegistry;
use crate::ws_server;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub matchmaker: Arc<Matchmaker<ClientRegistry>>,
    pub clients: ClientRegistry,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(limits: MatchingLimits) -> Self {
        let clients = ClientRegistry::new();
        let matchmaker = Arc::new(Matchmaker::new(Arc::new(clients.clone()), limits));
        Self {
            matchmaker,
            clients,
            started_at: Instant::now(),
        }
    }
}

/// Build the router: session socket, health, and optional client hosting.
pub fn build_router(state: GatewayState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    let mut app = Router::new()
        .route("/ws", get(ws_server::ws_handler))
        .route("/api/health", get(health_api::get_health))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(client_ui::client_service(dir));
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState, static_dir: Option<&Path>) -> Result<()> {
    let app = build_router(state, static_dir);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
