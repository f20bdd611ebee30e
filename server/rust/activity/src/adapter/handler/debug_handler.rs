use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use handcraft_activity::{ActivityEvent, ActivityType};
use serde::Deserialize;

use super::AppState;

const DEFAULT_USER_ID: &str = "debug-user";

/// POST /debug/emit-event のリクエストボディ。すべて省略可能。
#[derive(Debug, Default, Deserialize)]
pub struct DebugEmitRequest {
    pub user_id: Option<String>,
    pub activity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// テスト用のイベントを 1 件発行する。
///
/// 発行は fire-and-forget で、パイプラインが未準備でも 200 を返す。
pub async fn emit_event(State(state): State<AppState>, body: Bytes) -> Response {
    let req = if body.is_empty() {
        DebugEmitRequest::default()
    } else {
        match serde_json::from_slice::<DebugEmitRequest>(&body) {
            Ok(req) => req,
            Err(e) => return bad_request(&format!("invalid request body: {e}")),
        }
    };

    let activity_type = match req.activity_type.as_deref() {
        None | Some("") => ActivityType::ProjectViewed,
        Some(tag) => match tag.parse::<ActivityType>() {
            Ok(t) => t,
            Err(e) => return bad_request(&e.to_string()),
        },
    };
    let user_id = req
        .user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    let mut event = ActivityEvent::new(user_id, activity_type);
    if let Some(entity_id) = req.entity_id {
        event = event.with_entity_id(entity_id);
    }
    if let Some(metadata) = &req.metadata {
        event = event.with_metadata(metadata);
    }

    state.emitter.emit(&event);
    tracing::info!(
        event_id = %event.event_id,
        activity_type = %event.activity_type,
        ready = state.emitter.is_ready(),
        "debug event submitted"
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({"ok": true, "sent": event})),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"ok": false, "error": message})),
    )
        .into_response()
}
