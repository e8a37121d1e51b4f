use std::{io::ErrorKind, path::Path, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

/// GET /background: the optional page background. `404` when the configured
/// image does not exist; the page then keeps its plain colour.
pub async fn background_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let path = &state.config.background_image;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no background image");
            return Err(AppError::Http {
                status: StatusCode::NOT_FOUND,
                code: "NOT_FOUND",
                message: "no background image configured".into(),
            });
        }
        Err(e) => {
            return Err(AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "IO_ERROR",
                message: format!("cannot read background image: {e}"),
            });
        }
    };

    let mut res = bytes.into_response();
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(image_mime(path)));
    Ok(res)
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
