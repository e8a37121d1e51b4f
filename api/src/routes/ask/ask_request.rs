use serde::Deserialize;

/// Request payload for `POST /ask`.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question about the uploaded PDF.
    pub question: String,
}
