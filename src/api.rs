//! HTTP control surface: QR pairing, session status, logout, outbound send.
//!
//! Spawned as a background task in the gateway. `/qr` and `/send` require the
//! `x-api-key` header; `/status` and `/logout` are open.

use crate::gateway::auth::{ApiKeyGuard, Authorization, API_KEY_HEADER};
use crate::gateway::session::ConnectionStore;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use kasbot_core::{
    config::ApiConfig,
    error::KasbotError,
    message::{contact_chat_id, OutgoingMessage},
    traits::Platform,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    platform: Arc<dyn Platform>,
    session: Arc<ConnectionStore>,
    guard: ApiKeyGuard,
}

impl ApiState {
    pub fn new(
        platform: Arc<dyn Platform>,
        session: Arc<ConnectionStore>,
        guard: ApiKeyGuard,
    ) -> Self {
        Self {
            platform,
            session,
            guard,
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

/// `POST /send` body. Fields are optional so missing ones become a 400, not a
/// framework rejection.
#[derive(Debug, Deserialize)]
struct SendRequest {
    number: Option<String>,
    message: Option<String>,
}

/// Map a failure to a status code and JSON body.
fn reject(err: KasbotError) -> ApiError {
    match err {
        KasbotError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized: invalid API key"})),
        ),
        KasbotError::Validation(msg) | KasbotError::Unavailable(msg) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": msg})))
        }
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "platform request failed", "details": other.to_string()})),
        ),
    }
}

/// Like [`reject`] for platform failures, with a caller-specific message.
fn platform_failure(context: &str, err: KasbotError) -> ApiError {
    error!("api: {context}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": context, "details": err.to_string()})),
    )
}

fn check_auth(headers: &HeaderMap, guard: &ApiKeyGuard) -> Result<(), ApiError> {
    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    match guard.check(presented) {
        Authorization::Authorized => Ok(()),
        Authorization::Unauthorized => {
            warn!("api: rejected request with missing or invalid API key");
            Err(reject(KasbotError::Unauthorized))
        }
    }
}

/// `GET /qr`: the pending pairing QR as a data URL.
async fn qr(headers: HeaderMap, State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    check_auth(&headers, &state.guard)?;

    let qr = state.session.pending_qr().ok_or_else(|| {
        reject(KasbotError::Unavailable(
            "QR code not available yet or already expired".to_string(),
        ))
    })?;
    Ok(Json(json!({ "qr": qr })))
}

/// `GET /status`: current connection state.
async fn status(State(state): State<ApiState>) -> Json<Value> {
    let snap = state.session.snapshot();
    Json(json!({
        "whatsapp": {
            "status": snap.status,
            "number": snap.account_id,
            "from": snap.ready_since,
        }
    }))
}

/// `GET /logout`: end the platform session. State resets on the disconnect event.
async fn logout(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    state
        .platform
        .logout()
        .await
        .map_err(|e| platform_failure("logout failed", e))?;
    info!("api: logout requested");
    Ok(Json(json!({ "status": "Logged out successfully" })))
}

/// `POST /send`: send a text message to a contact.
async fn send(
    headers: HeaderMap,
    State(state): State<ApiState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    check_auth(&headers, &state.guard)?;

    let Json(body) = payload.map_err(|e| {
        reject(KasbotError::Validation(format!(
            "invalid request body: {}",
            e.body_text()
        )))
    })?;

    let (number, message) = match (body.number, body.message) {
        (Some(n), Some(m)) if !n.is_empty() && !m.is_empty() => (n, m),
        _ => {
            return Err(reject(KasbotError::Validation(
                "number and message are required".to_string(),
            )))
        }
    };

    let chat_id = contact_chat_id(&number);
    state
        .platform
        .send(OutgoingMessage::to(chat_id.clone(), message))
        .await
        .map_err(|e| platform_failure("failed to send message", e))?;

    info!("api: message sent to {chat_id}");
    Ok(Json(json!({ "success": true, "message": "Message sent" })))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/qr", get(qr))
        .route("/status", get(status))
        .route("/logout", get(logout))
        .route("/send", post(send))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .with_state(state)
}

/// Start the API server. Called from `Gateway::run()`.
pub async fn serve(config: ApiConfig, state: ApiState) {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
