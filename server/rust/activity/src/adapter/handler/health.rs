use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use super::AppState;

/// プロセスの生存確認。ブローカーの状態には依存しない。
pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "activity"}))
}

/// イベント発行パイプラインの準備状態と送信カウンター。
pub async fn activity_readiness(State(state): State<AppState>) -> impl IntoResponse {
    let emitter = &state.emitter;
    Json(serde_json::json!({
        "ready": emitter.is_ready(),
        "state": emitter.state(),
        "stats": emitter.stats(),
    }))
}
