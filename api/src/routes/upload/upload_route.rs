//! POST /upload: stores and indexes a PDF (multipart field `file`).

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::Response,
};
use tracing::debug;

use crate::{
    core::{app_state::AppState, chat_service, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::current_session,
};

const FILE_FIELD: &str = "file";

/// Handler: POST /upload
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8501/upload \
///   -H 'x-session-id: demo' \
///   -F 'file=@contract.pdf'
/// ```
pub async fn upload_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let data = field.bytes().await?;
        debug!(file = %file_name, bytes = data.len(), "upload_route: field received");
        upload = Some((file_name, data.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::BadRequest(format!(
            "multipart field `{FILE_FIELD}` is missing"
        )));
    };
    if file_name.is_empty() {
        return Err(AppError::BadRequest("uploaded file has no name".into()));
    }

    let session = current_session(&state, &headers).await;
    let out = chat_service::upload(&state, &session, &file_name, bytes).await?;
    Ok(ApiResponse::ok(out))
}
