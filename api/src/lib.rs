//! HTTP shell of Ask Your PDF: upload a PDF, pick models, ask questions.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info, warn};

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::core::app_state::{ApiConfig, AppState, ConfigError};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::{json_extractor::json_error_mapper, session_id::ensure_session_id},
    routes::{
        ask::ask_route::ask_route,
        background::background_route,
        chat::chat_route::{clear_chat_route, get_chat_route},
        health::health_route::health_route,
        index_page::index_page,
        settings::settings_route::{get_settings_route, put_settings_route},
        upload::upload_route::upload_route,
    },
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(index_page))
        .route("/background", get(background_route))
        .route("/health", get(health_route))
        .route("/settings", get(get_settings_route).put(put_settings_route))
        .route("/upload", post(upload_route))
        .route("/ask", post(ask_route))
        .route("/chat", get(get_chat_route).delete(clear_chat_route))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(ensure_session_id))
        .with_state(state)
}

/// Reads configuration from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let state = Arc::new(AppState::from_env()?);
    let address = state.config.address.clone();

    info!(
        %address,
        data_dir = %state.config.data_dir.display(),
        endpoint = %state.catalog().endpoint,
        reindex_policy = %state.config.reindex_policy,
        "starting Ask Your PDF"
    );

    check_runtime(&state).await;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// One health check before serving, with a spinner on interactive terminals.
/// A missing runtime is logged, not fatal: the page still works and model
/// calls answer with `LLM_UNAVAILABLE` until Ollama is up.
async fn check_runtime(state: &AppState) {
    let progress = contextor::for_terminal();
    progress.step("checking Ollama models");
    let report = crate::core::chat_service::default_health(state).await;

    if report.ok {
        progress.finish("Ollama ready");
        info!(models = report.models.len(), "runtime ready");
    } else {
        progress.finish("Ollama not ready");
        for m in report.models.iter().filter(|m| !m.ok) {
            warn!(
                model = m.model.as_deref().unwrap_or_default(),
                reason = %m.message,
                "model unavailable"
            );
        }
    }
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::core::{
        app_state::ApiConfig,
        session::ReindexPolicy,
        test_support::{FakePipeline, test_state},
    };

    const BOUNDARY: &str = "ask-pdf-test-boundary";

    fn upload_request(session: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload")
            .header("x-session-id", session)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, session: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-session-id", session)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_page_is_served() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("Ask Your PDF"));
    }

    #[tokio::test]
    async fn session_id_is_issued_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(Request::get("/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = res.headers().get("x-session-id").unwrap().to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn read_only_requests_do_not_store_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);
        let app = build_router(state.clone());

        for _ in 0..200 {
            let res = app
                .clone()
                .oneshot(Request::get("/settings").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
        for uri in ["/chat", "/settings"] {
            app.clone()
                .oneshot(
                    Request::get(uri)
                        .header("x-session-id", "polling")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
        }
        assert_eq!(state.sessions.count().await, 0);

        app.oneshot(json_request("POST", "/ask", "s1", json!({ "question": "Hi?" })))
            .await
            .unwrap();
        assert_eq!(state.sessions.count().await, 1);
    }

    #[tokio::test]
    async fn background_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(Request::get("/background").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn background_image_is_served() {
        let tmp = tempfile::tempdir().unwrap();
        let image = tmp.path().join("background1.png");
        std::fs::write(&image, b"\x89PNG fake").unwrap();

        let llm = Arc::new(
            ai_llm_service::LlmServiceProfiles::new(ai_llm_service::ModelCatalog::default(), Some(1))
                .unwrap(),
        );
        let config = ApiConfig {
            data_dir: tmp.path().join("data"),
            background_image: image,
            ..ApiConfig::default()
        };
        let state = Arc::new(AppState::new(config, llm, Arc::new(FakePipeline::default())));

        let res = build_router(state)
            .oneshot(Request::get("/background").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"\x89PNG fake");
    }

    #[tokio::test]
    async fn ask_before_upload_is_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, fake) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(json_request("POST", "/ask", "s1", json!({ "question": "Hi?" })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("x-session-id").unwrap(), "s1");
        let v = body_json(res).await;
        assert_eq!(v["data"]["kind"], "warning");
        assert_eq!(v["data"]["message"], "Please upload a PDF first.");
        assert_eq!(fake.chat_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_ask_body_is_wrapped_in_envelope() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(json_request("POST", "/ask", "s1", json!({ "q": "typo" })))
            .await
            .unwrap();

        assert!(res.status().is_client_error());
        let v = body_json(res).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["details"][0]["path"], "question");
    }

    #[tokio::test]
    async fn blank_question_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(json_request("POST", "/ask", "s1", json!({ "question": "   " })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);

        let res = build_router(state)
            .oneshot(upload_request("s1", "notes.txt", b"plain text"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let v = body_json(res).await;
        assert_eq!(v["error"]["code"], "UNSUPPORTED_FILE_TYPE");
        assert_eq!(v["error"]["details"][0]["path"], "file");
    }

    #[tokio::test]
    async fn upload_ask_and_clear_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, fake) = test_state(tmp.path(), ReindexPolicy::FileName);
        let app = build_router(state);

        let res = app
            .clone()
            .oneshot(upload_request("s1", "contract.pdf", b"%PDF-1.7 Notice period is 90 days."))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = body_json(res).await;
        assert_eq!(v["data"]["indexed"], true);
        assert_eq!(v["data"]["message"], "Indexed: contract.pdf");

        let res = app
            .clone()
            .oneshot(upload_request("s1", "contract.pdf", b"%PDF-1.7 changed"))
            .await
            .unwrap();
        assert_eq!(body_json(res).await["data"]["indexed"], false);
        assert_eq!(fake.index_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        let res = app
            .clone()
            .oneshot(json_request("POST", "/ask", "s1", json!({ "question": "Notice?" })))
            .await
            .unwrap();
        let v = body_json(res).await;
        assert_eq!(v["data"]["kind"], "answer");
        assert_eq!(v["data"]["message"], "tinyllama says: Notice period is 90 days.");
        assert_eq!(v["data"]["sources"][0]["page_label"], "1");

        let res = app
            .clone()
            .oneshot(
                Request::get("/chat")
                    .header("x-session-id", "s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let v = body_json(res).await;
        assert_eq!(v["data"][0], json!({ "role": "user", "content": "Notice?" }));
        assert_eq!(v["data"][1]["role"], "assistant");

        let res = app
            .clone()
            .oneshot(
                Request::delete("/chat")
                    .header("x-session-id", "s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        // other sessions are untouched by s1's upload
        let res = app
            .oneshot(json_request("POST", "/ask", "s2", json!({ "question": "Notice?" })))
            .await
            .unwrap();
        assert_eq!(body_json(res).await["data"]["kind"], "warning");
    }

    #[tokio::test]
    async fn settings_round_trip_and_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let (state, _) = test_state(tmp.path(), ReindexPolicy::FileName);
        let app = build_router(state);

        let res = app
            .clone()
            .oneshot(
                Request::get("/settings")
                    .header("x-session-id", "s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let v = body_json(res).await;
        assert_eq!(v["data"]["settings"]["chat_model"], "tinyllama");
        assert_eq!(v["data"]["choices"]["embedding_models"], json!(["nomic-embed-text", "bge-m3"]));

        let res = app
            .clone()
            .oneshot(json_request("PUT", "/settings", "s1", json!({ "chat_model": "phi" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["settings"]["chat_model"], "phi");

        let res = app
            .oneshot(json_request("PUT", "/settings", "s1", json!({ "temperature": 2.0 })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"]["code"], "INVALID_SETTINGS");
    }
}
