use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::session::SESSION_HEADER;

/// Session id carried by the request, if any.
pub fn session_id_of(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Makes sure every request has an `X-Session-Id`, generating a UUIDv4 when
/// the client sent none, and echoes it on the response.
pub async fn ensure_session_id(mut req: Request<Body>, next: Next) -> Response {
    let id = match session_id_of(req.headers()) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            debug!(session = %id, "new session id issued");
            id
        }
    };

    let value = HeaderValue::from_str(&id).ok();
    if let Some(v) = &value {
        req.headers_mut().insert(SESSION_HEADER, v.clone());
    }

    let mut res = next.run(req).await;
    if let Some(v) = value {
        res.headers_mut().insert(SESSION_HEADER, v);
    }
    res
}
