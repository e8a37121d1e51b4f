use std::{path::PathBuf, sync::Arc, time::Duration};

use ai_llm_service::{
    AiLlmError, LlmServiceProfiles, ModelCatalog,
    error_handler::{env_opt, env_opt_u64, env_opt_usize},
};
use contextor::{ContextorConfig, ContextorError};
use rag_store::{RagConfig, RagError};
use thiserror::Error;
use upload_store::{DEFAULT_DATA_DIR, UploadStore};

use crate::core::{
    pipeline::{DocumentPipeline, OllamaPipeline},
    session::{DEFAULT_SESSION_IDLE, ModelSettings, ReindexPolicy, SessionStore},
};

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8501";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_BACKGROUND_IMAGE: &str = "assets/background1.png";
const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Contextor(#[from] ContextorError),

    #[error("REINDEX_POLICY: {0}")]
    ReindexPolicy(String),

    #[error("MAX_UPLOAD_BYTES must be > 0")]
    ZeroUploadLimit,
}

/// Server settings read once at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub address: String,
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub reindex_policy: ReindexPolicy,
    /// Sessions idle for longer than this are dropped.
    pub session_idle: Duration,
    /// Optional page background; missing file means none.
    pub background_image: PathBuf,
    pub rag: RagConfig,
    pub contextor: ContextorConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_API_ADDRESS.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            reindex_policy: ReindexPolicy::default(),
            session_idle: DEFAULT_SESSION_IDLE,
            background_image: PathBuf::from(DEFAULT_BACKGROUND_IMAGE),
            rag: RagConfig::default(),
            contextor: ContextorConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Reads `API_ADDRESS`, `DATA_DIR`, `MAX_UPLOAD_BYTES`, `REINDEX_POLICY`,
    /// `SESSION_IDLE_SECS`, `BACKGROUND_IMAGE` plus the RAG and query engine knobs.
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let reindex_policy = match env_opt("REINDEX_POLICY") {
            Some(v) => v.parse::<ReindexPolicy>().map_err(ConfigError::ReindexPolicy)?,
            None => d.reindex_policy,
        };
        let max_upload_bytes = env_opt_usize("MAX_UPLOAD_BYTES")?.unwrap_or(d.max_upload_bytes);
        if max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        Ok(Self {
            address: env_opt("API_ADDRESS").unwrap_or(d.address),
            data_dir: env_opt("DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),
            max_upload_bytes,
            reindex_policy,
            session_idle: env_opt_u64("SESSION_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.session_idle),
            background_image: env_opt("BACKGROUND_IMAGE")
                .map(PathBuf::from)
                .unwrap_or(d.background_image),
            rag: RagConfig::from_env()?,
            contextor: ContextorConfig::from_env()?,
        })
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub config: ApiConfig,
    pub llm: Arc<LlmServiceProfiles>,
    pub uploads: UploadStore,
    pub sessions: SessionStore,
    pub pipeline: Arc<dyn DocumentPipeline>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        llm: Arc<LlmServiceProfiles>,
        pipeline: Arc<dyn DocumentPipeline>,
    ) -> Self {
        let catalog = llm.catalog();
        let defaults = ModelSettings {
            chat_model: catalog.default_chat_model().to_string(),
            temperature: catalog.temperature,
            embed_model: catalog.default_embedding_model().to_string(),
        };
        Self {
            uploads: UploadStore::new(config.data_dir.clone()),
            sessions: SessionStore::new(defaults, config.session_idle),
            config,
            llm,
            pipeline,
        }
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog = ModelCatalog::from_env()?;
        let config = ApiConfig::from_env()?;
        let llm = Arc::new(LlmServiceProfiles::new(catalog, Some(HEALTH_TIMEOUT_SECS))?);
        let pipeline = Arc::new(OllamaPipeline::new(
            llm.clone(),
            config.rag.clone(),
            config.contextor.clone(),
            config.max_upload_bytes as u64,
        ));
        Ok(Self::new(config, llm, pipeline))
    }

    pub fn catalog(&self) -> &ModelCatalog {
        self.llm.catalog()
    }
}
