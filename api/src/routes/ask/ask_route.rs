//! POST /ask: answers a question about the session's PDF.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use contextor::NoopProgress;
use tracing::debug;

use crate::{
    core::{app_state::AppState, chat_service, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::{ask::ask_request::AskRequest, current_session},
};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8501/ask \
///   -H 'content-type: application/json' \
///   -H 'x-session-id: demo' \
///   -d '{"question":"What is the termination notice period?"}'
/// ```
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AskRequest>,
) -> AppResult<Response> {
    let session = current_session(&state, &headers).await;
    debug!(chars = body.question.len(), "ask_route: start");

    let out = chat_service::ask(&state, &session, &body.question, &NoopProgress).await?;
    Ok(ApiResponse::ok(out))
}
