//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AcceptedResponse, ErrorResponse, QuickReplyRequest, SubmitMessageRequest,
    SwitchScreenRequest,
};
use super::AppState;
use crate::config::LandingMenu;
use crate::runtime::SessionError;
use crate::state_machine::Snapshot;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Current view
        .route("/api/session", get(get_session))
        // SSE streaming
        .route("/api/session/stream", get(stream_session))
        // Renderer intents
        .route("/api/session/messages", post(submit_message))
        .route("/api/session/quick-reply", post(select_quick_reply))
        .route("/api/session/direct", post(open_direct_channel))
        .route("/api/session/screen", post(switch_screen))
        // Landing copy
        .route("/api/menu", get(get_menu))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session View
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so no change slips between them
    let broadcast_rx = state.session.subscribe();
    sse_stream(state.session.snapshot(), broadcast_rx)
}

async fn get_menu(State(state): State<AppState>) -> Json<LandingMenu> {
    Json(state.menu.as_ref().clone())
}

// ============================================================
// Intents
// ============================================================

async fn submit_message(
    State(state): State<AppState>,
    payload: Result<Json<SubmitMessageRequest>, JsonRejection>,
) -> Result<Json<AcceptedResponse>, AppError> {
    let Json(req) = payload?;
    let accepted = !req.text.trim().is_empty();

    state.session.submit_user_message(req.text).await?;

    Ok(Json(AcceptedResponse { accepted }))
}

async fn select_quick_reply(
    State(state): State<AppState>,
    payload: Result<Json<QuickReplyRequest>, JsonRejection>,
) -> Result<Json<AcceptedResponse>, AppError> {
    let Json(req) = payload?;
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("Quick reply prompt is empty".to_string()));
    }

    state.session.select_quick_reply(req.prompt).await?;

    Ok(Json(AcceptedResponse { accepted: true }))
}

async fn open_direct_channel(
    State(state): State<AppState>,
) -> Result<Json<AcceptedResponse>, AppError> {
    state.session.open_direct_channel().await?;
    Ok(Json(AcceptedResponse { accepted: true }))
}

async fn switch_screen(
    State(state): State<AppState>,
    payload: Result<Json<SwitchScreenRequest>, JsonRejection>,
) -> Result<Json<AcceptedResponse>, AppError> {
    let Json(req) = payload?;
    state.session.switch_screen(req.screen).await?;
    Ok(Json(AcceptedResponse { accepted: true }))
}

async fn get_version() -> &'static str {
    concat!("chat-widget ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        tracing::error!(error = %e, "Session unavailable");
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
