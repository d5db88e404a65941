use crate::config::ServerConfig;
use crate::room::RoomManager;
use crate::signaling::{SignalingService, ws_handler};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state handed to every socket.
#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub rooms: RoomManager,
}

impl AppState {
    /// Builds the relay and spawns its membership actor.
    pub fn new(config: &ServerConfig) -> Self {
        let signaling = SignalingService::new(config.ice_servers.clone());
        let rooms = RoomManager::spawn(Arc::new(signaling.clone()), config.command_buffer);

        Self { signaling, rooms }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
