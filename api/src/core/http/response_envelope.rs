use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Universal response envelope for both success and error (simplified).
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Serialize)]
pub struct ApiError {
    /// Stable, machine-readable error code (e.g. "BAD_REQUEST").
    pub code: &'static str,
    /// Human-friendly error message.
    pub message: String,
    /// Optional fine-grained error details (per-field, hints, etc.).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Serialize)]
pub struct ApiErrorDetail {
    /// Field path like `question` or `file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Optional hint to help the client fix the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    /// Detail attached to a request field.
    pub fn field(path: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            hint: Some(hint.into()),
        }
    }

    /// Free-standing hint.
    pub fn hint(hint: impl Into<String>) -> Self {
        Self {
            path: None,
            hint: Some(hint.into()),
        }
    }
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Build a success envelope.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Build an error envelope.
    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        details: Vec<ApiErrorDetail>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details,
            }),
        }
    }

    /// Convert to axum Response.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    /// `200 OK` with a success envelope.
    pub fn ok(data: T) -> Response {
        Self::success(data).into_response_with_status(StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_error() {
        let v = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(v, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn error_keeps_code_and_details() {
        let env = ApiResponse::<()>::error(
            "BAD_REQUEST",
            "question must not be empty",
            vec![ApiErrorDetail::field("question", "Type a question first.")],
        );
        let v = serde_json::to_value(env).unwrap();
        assert_eq!(v["success"], false);
        assert!(v.get("data").is_none());
        assert_eq!(v["error"]["code"], "BAD_REQUEST");
        assert_eq!(v["error"]["details"][0]["path"], "question");
    }

    #[test]
    fn empty_details_are_skipped() {
        let v = serde_json::to_value(ApiResponse::<()>::error("X", "m", Vec::new())).unwrap();
        assert!(v["error"].get("details").is_none());
    }
}
