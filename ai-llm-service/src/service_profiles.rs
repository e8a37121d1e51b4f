//! Shared model service over the [`ModelCatalog`].
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+temperature+timeout),
//!   so sessions switching between catalog models reuse connections.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{ChatMessage, LlmServiceProfiles, ModelCatalog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ModelCatalog::from_env()?;
//!     let svc = Arc::new(LlmServiceProfiles::new(catalog, Some(10))?);
//!
//!     let chat = svc.catalog().chat_config("tinyllama", 0.2);
//!     let txt = svc.chat(&chat, &[ChatMessage::user("Hello")]).await?;
//!     println!("{txt}");
//!
//!     let emb = svc.catalog().embedding_config("nomic-embed-text");
//!     let vecs = svc.embed(&emb, &["Ferris".to_string()]).await?;
//!     println!("dim = {}", vecs[0].len());
//!     Ok(())
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{default_config::ModelCatalog, llm_model_config::LlmModelConfig},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::ollama_service::{ChatMessage, OllamaService},
};

/// Shared service that resolves chat and embedding calls against the catalog.
pub struct LlmServiceProfiles {
    catalog: ModelCatalog,
    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    health: HealthService,
}

impl std::fmt::Debug for LlmServiceProfiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServiceProfiles")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// - `catalog`: allowed models and shared runtime settings.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(catalog: ModelCatalog, health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        Ok(Self {
            catalog,
            ollama: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// The catalog this service was built with.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Runs a chat completion with the given model config.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn chat(
        &self,
        cfg: &LlmModelConfig,
        messages: &[ChatMessage],
    ) -> Result<String, AiLlmError> {
        let cli = self.get_or_init_ollama(cfg).await?;
        Ok(cli.chat(messages).await?)
    }

    /// Computes embeddings for a batch of inputs with the given model config.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn embed(
        &self,
        cfg: &LlmModelConfig,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let cli = self.get_or_init_ollama(cfg).await?;
        Ok(cli.embeddings(inputs).await?)
    }

    /// Runs health checks for the given configs.
    pub async fn health(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        self.health.check_many(configs).await
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }

        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, endpoint = %cfg.endpoint, "creating Ollama client");
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
///
/// Floats are keyed by their bit pattern.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    endpoint: String,
    model: String,
    temperature: Option<u32>,
    top_p: Option<u32>,
    max_tokens: Option<u32>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature.map(f32::to_bits),
            top_p: cfg.top_p.map(f32::to_bits),
            max_tokens: cfg.max_tokens,
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn catalog(endpoint: &str) -> ModelCatalog {
        ModelCatalog {
            endpoint: endpoint.to_string(),
            ..ModelCatalog::default()
        }
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let svc = LlmServiceProfiles::new(catalog("http://127.0.0.1:9"), Some(1)).unwrap();
        let a = svc.catalog().chat_config("tinyllama", 0.2);
        let b = svc.catalog().chat_config("tinyllama", 0.25);

        let a1 = svc.get_or_init_ollama(&a).await.unwrap();
        let a2 = svc.get_or_init_ollama(&a).await.unwrap();
        let b1 = svc.get_or_init_ollama(&b).await.unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b1));
    }

    #[tokio::test]
    async fn embed_routes_to_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[0.5, 0.5, 0.0]]
            })))
            .mount(&server)
            .await;

        let svc = LlmServiceProfiles::new(catalog(&server.uri()), Some(1)).unwrap();
        let cfg = svc.catalog().embedding_config("nomic-embed-text");
        let out = svc.embed(&cfg, &["hello".to_string()]).await.unwrap();
        assert_eq!(out[0].len(), 3);
    }

    #[tokio::test]
    async fn unreachable_runtime_is_unavailable() {
        let svc = LlmServiceProfiles::new(catalog("http://127.0.0.1:9"), Some(1)).unwrap();
        let mut cfg = svc.catalog().chat_config("tinyllama", 0.2);
        cfg.timeout_secs = Some(1);
        let err = svc
            .chat(&cfg, &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
