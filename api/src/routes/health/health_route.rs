use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::Response};
use tracing::warn;

use crate::{
    core::{app_state::AppState, chat_service, http::response_envelope::ApiResponse},
    routes::existing_session,
};

/// GET /health: checks the runtime for the session's models. Always 200;
/// `data.ok` tells whether every model is available.
pub async fn health_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = existing_session(&state, &headers).await;
    let report = chat_service::health(&state, &session).await;
    if !report.ok {
        warn!(models = report.models.len(), "health_route: runtime not ready");
    }
    ApiResponse::ok(report)
}
