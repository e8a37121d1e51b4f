pub mod ask;
pub mod background;
pub mod chat;
pub mod health;
pub mod index_page;
pub mod settings;
pub mod upload;

use axum::http::HeaderMap;

use crate::{
    core::{app_state::AppState, session::SharedSession},
    middleware_layer::session_id::session_id_of,
};

/// Used only when a route is mounted without the session middleware.
const FALLBACK_SESSION: &str = "default";

fn request_session_id(headers: &HeaderMap) -> String {
    session_id_of(headers).unwrap_or_else(|| FALLBACK_SESSION.to_string())
}

/// Session of the current request, created on first use. For routes that
/// change session state.
pub(crate) async fn current_session(state: &AppState, headers: &HeaderMap) -> SharedSession {
    state.sessions.get_or_create(&request_session_id(headers)).await
}

/// Session of the current request if it exists, otherwise a throwaway one
/// with default settings. Read-only routes use this so polling clients do
/// not fill the store.
pub(crate) async fn existing_session(state: &AppState, headers: &HeaderMap) -> SharedSession {
    match state.sessions.get(&request_session_id(headers)).await {
        Some(session) => session,
        None => state.sessions.detached(),
    }
}
