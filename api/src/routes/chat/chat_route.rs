//! GET /chat returns the transcript, DELETE /chat clears it.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::Response};
use serde::Serialize;

use crate::{
    core::{
        app_state::AppState,
        chat_service,
        http::response_envelope::ApiResponse,
        session::ChatTurn,
    },
    routes::existing_session,
};

#[derive(Serialize)]
struct ChatCleared {
    cleared: bool,
}

pub async fn get_chat_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = existing_session(&state, &headers).await;
    let turns: Vec<ChatTurn> = chat_service::transcript(&session).await;
    ApiResponse::ok(turns)
}

pub async fn clear_chat_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = existing_session(&state, &headers).await;
    chat_service::clear_chat(&session).await;
    ApiResponse::ok(ChatCleared { cleared: true })
}
