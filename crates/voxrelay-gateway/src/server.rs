//! Axum-based voice relay server.

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::connection::handle_voice_connection;
use crate::state::GatewayState;

/// Start the relay server and block until shutdown.
pub async fn start_gateway(state: Arc<GatewayState>, port: u16) -> anyhow::Result<()> {
    let bind_addr = state.config.gateway_bind();

    // /ws/voice and /health are registered first so they take priority
    // over the UI catch-all
    let mut app = Router::new()
        .route("/ws/voice", get(ws_handler))
        .route("/health", get(health_handler));

    if state.config.diagnostics_enabled() {
        warn!("Diagnostics endpoint enabled at /debug/env");
        app = app.route("/debug/env", get(debug_env_handler));
    }

    let app = app
        .with_state(state)
        .merge(voxrelay_web::ui_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Voice relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_voice_connection(state, socket))
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "documents": state.knowledge.len(),
    }))
}

/// Diagnostics: report which provider credentials resolved, with only a
/// short prefix of each key. Off by default; enabled via config.
async fn debug_env_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    axum::Json(json!({
        "transcription_key": mask(state.config.transcription().resolve_api_key()),
        "generation_key": mask(state.config.generation().resolve_api_key()),
        "synthesis_key": mask(state.config.synthesis().resolve_api_key()),
        "voice_id": state.config.synthesis().resolve_voice_id(),
    }))
}

fn mask(key: Option<String>) -> String {
    match key {
        Some(k) if !k.is_empty() => format!("{}...", k.chars().take(4).collect::<String>()),
        _ => "NOT SET".to_string(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(%e, "Failed to install CTRL+C handler");
        return;
    }
    info!("Shutdown signal received");
}
