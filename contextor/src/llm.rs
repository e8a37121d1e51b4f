//! Chat model seam used by the query engine.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{ChatMessage, LlmModelConfig, LlmServiceProfiles};
use tracing::{Instrument, debug, info_span};

use crate::error::ContextorError;

/// Boxed future returned by [`AnswerModel`].
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ContextorError>> + Send + 'a>>;

/// Anything that turns a `(system, user)` prompt pair into text.
pub trait AnswerModel: Send + Sync {
    fn model_name(&self) -> &str;

    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a, String>;
}

/// Ollama chat model resolved through the shared [`LlmServiceProfiles`].
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::{LlmServiceProfiles, ModelCatalog};
/// # use contextor::{AnswerModel, OllamaChat};
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let svc = Arc::new(LlmServiceProfiles::new(ModelCatalog::default(), None)?);
/// let chat = OllamaChat::new(svc, "tinyllama", 0.2);
/// let out = chat.complete("You are terse.", "Hello!").await?;
/// println!("{out}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct OllamaChat {
    svc: Arc<LlmServiceProfiles>,
    cfg: LlmModelConfig,
}

impl OllamaChat {
    pub fn new(svc: Arc<LlmServiceProfiles>, model: &str, temperature: f32) -> Self {
        let cfg = svc.catalog().chat_config(model, temperature);
        Self { svc, cfg }
    }
}

impl AnswerModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a, String> {
        let span = info_span!(
            "chat",
            model = %self.cfg.model,
            temperature = ?self.cfg.temperature,
            prompt_chars = user.len());
        Box::pin(
            async move {
                let messages = [ChatMessage::system(system), ChatMessage::user(user)];
                let out = self.svc.chat(&self.cfg, &messages).await?;
                debug!(answer_chars = out.len(), "chat completed");
                Ok(out)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::ModelCatalog;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_system_and_user_with_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "phi",
                "stream": false,
                "options": { "temperature": 0.5 },
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "question" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "answer" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = ModelCatalog {
            endpoint: server.uri(),
            ..ModelCatalog::default()
        };
        let svc = Arc::new(LlmServiceProfiles::new(catalog, Some(1)).unwrap());
        let chat = OllamaChat::new(svc, "phi", 0.5);

        assert_eq!(chat.complete("sys", "question").await.unwrap(), "answer");
    }
}
