use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ai_llm_service::AiLlmError;
use contextor::ContextorError;
use rag_store::RagError;
use thiserror::Error;
use tracing::warn;
use upload_store::UploadError;

use crate::core::{
    app_state::ConfigError,
    http::response_envelope::{ApiErrorDetail, ApiResponse},
};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{0}")]
    BadRequest(String),

    #[error("only PDF files are accepted, got `{0}`")]
    UnsupportedFileType(String),

    #[error("upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Http { status, .. } => *status,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            AppError::Http { code, .. } => code,
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::UnsupportedFileType(_) => vec![ApiErrorDetail::field(
                "file",
                "Upload a document with a .pdf extension.",
            )],
            AppError::Http { code: "LLM_UNAVAILABLE", .. } => vec![ApiErrorDetail::hint(
                "Start the local model runtime (`ollama serve`) and pull the selected models.",
            )],
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Http {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                code: "PAYLOAD_TOO_LARGE",
                message: err.body_text(),
            }
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<AiLlmError> for AppError {
    fn from(err: AiLlmError) -> Self {
        match err {
            AiLlmError::Config(e) => AppError::Http {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_SETTINGS",
                message: e.to_string(),
            },
            e if e.is_unavailable() => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "LLM_UNAVAILABLE",
                message: format!("The local model runtime is not reachable: {e}"),
            },
            e => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "LLM_ERROR",
                message: e.to_string(),
            },
        }
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Pdf { .. } | RagError::NoDocuments(_) => AppError::Http {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                code: "DOCUMENT_UNREADABLE",
                message: format!("Could not read the document: {err}"),
            },
            RagError::Llm(e) => e.into(),
            RagError::Embedding(_) | RagError::VectorSizeMismatch { .. } => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "LLM_ERROR",
                message: err.to_string(),
            },
            RagError::Io(e) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "IO_ERROR",
                message: format!("Filesystem error while reading the upload: {e}"),
            },
            RagError::Config(msg) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "CONFIG_ERROR",
                message: msg,
            },
        }
    }
}

impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        match err {
            ContextorError::Rag(e) => e.into(),
            ContextorError::Llm(e) => e.into(),
            ContextorError::Config(msg) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "CONFIG_ERROR",
                message: msg,
            },
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "IO_ERROR",
                message: format!("Failed to store the upload: {e}"),
            },
            UploadError::Join(e) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "JOIN_ERROR",
                message: format!("Background task failed to complete: {e}"),
            },
        }
    }
}
