//! Client for the local model runtime (Ollama).
//!
//! - [`services::ollama_service::OllamaService`]: chat and embeddings over HTTP.
//! - [`service_profiles::LlmServiceProfiles`]: shared, cached clients keyed by model config.
//! - [`health_service::HealthService`]: `/api/tags` checks for a `/health` endpoint.
//! - [`config::default_config::ModelCatalog`]: env-driven model choices and defaults.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::default_config::ModelCatalog;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::{ChatMessage, OllamaError, OllamaService};
