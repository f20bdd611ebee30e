pub mod debug_handler;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use handcraft_activity::ActivityEmitter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// AppState はハンドラー間で共有するアプリケーション状態。
#[derive(Clone)]
pub struct AppState {
    pub emitter: Arc<dyn ActivityEmitter>,
}

/// ルーターを組み立てる。
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz/activity", get(health::activity_readiness))
        .route("/debug/emit-event", post(debug_handler::emit_event))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
