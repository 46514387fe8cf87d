//! WebSocket upgrade handler.
//!
//! Responsibilities:
//! - Gate the upgrade on the origin policy (403) and the token (401)
//! - Cap inbound frame/message size before any decode
//! - Hand the upgraded socket to a connection actor bound to the hub

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use cuproom_core::error::{ClientCode, CupRoomError};

use crate::app_state::AppState;
use crate::transport::client::Client;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: String,
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = match headers.get(ORIGIN).map(|v| v.to_str()) {
        None => None,
        Some(Ok(s)) => Some(s),
        Some(Err(_)) => return reject(CupRoomError::OriginRejected("non-ascii origin".into())),
    };
    if let Err(e) = app.origin_policy().check(origin) {
        tracing::warn!(error = %e, "upgrade rejected");
        return reject(e);
    }

    let identity = match app.resolve_identity(&q.token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(error = %e, "upgrade rejected");
            return reject(e);
        }
    };

    let gw = &app.cfg().gateway;
    let client = Client::new(identity, app.hub(), app.dispatcher(), gw);

    ws.max_message_size(gw.max_frame_bytes)
        .max_frame_size(gw.max_frame_bytes)
        .on_upgrade(move |socket| client.serve(socket))
}

/// HTTP rejection before upgrade: `{"error": CODE, "message": ...}`.
fn reject(e: CupRoomError) -> Response {
    let code = e.client_code();
    let status = match code {
        ClientCode::OriginRejected => StatusCode::FORBIDDEN,
        ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
        ClientCode::HubClosed => StatusCode::SERVICE_UNAVAILABLE,
        ClientCode::Internal | ClientCode::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = Json(json!({
        "error": code.as_str(),
        "message": e.to_string(),
    }));
    (status, body).into_response()
}
