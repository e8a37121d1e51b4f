//! GET /settings, PUT /settings: per-session model choices.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::Response};

use crate::{
    core::{
        app_state::AppState,
        chat_service::{self, SettingsPatch},
        http::response_envelope::ApiResponse,
    },
    error_handler::AppResult,
    routes::{current_session, existing_session},
};

pub async fn get_settings_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let session = existing_session(&state, &headers).await;
    ApiResponse::ok(chat_service::settings_view(&state, &session).await)
}

/// Handler: PUT /settings
///
/// # Example
/// ```bash
/// curl -X PUT http://127.0.0.1:8501/settings \
///   -H 'content-type: application/json' \
///   -H 'x-session-id: demo' \
///   -d '{"chat_model":"phi","temperature":0.35}'
/// ```
pub async fn put_settings_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Response> {
    let session = current_session(&state, &headers).await;
    chat_service::update_settings(&state, &session, patch).await?;
    Ok(ApiResponse::ok(chat_service::settings_view(&state, &session).await))
}
