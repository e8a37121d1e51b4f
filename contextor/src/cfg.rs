//! Runtime configuration loaded from environment variables.

use ai_llm_service::error_handler::env_opt_usize;

use crate::error::ContextorError;

pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_MAX_CTX_CHARS: usize = 8000;

/// Query engine knobs. All fields have defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextorConfig {
    /// Nodes retrieved per question.
    pub similarity_top_k: usize,
    /// Character budget of one packed context block.
    pub max_ctx_chars: usize,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            similarity_top_k: DEFAULT_TOP_K,
            max_ctx_chars: DEFAULT_MAX_CTX_CHARS,
        }
    }
}

impl ContextorConfig {
    /// Build from `RAG_TOP_K` and `MAX_CTX_CHARS`, falling back to defaults.
    ///
    /// # Example
    /// ```
    /// # use contextor::ContextorConfig;
    /// let cfg = ContextorConfig::from_env().unwrap();
    /// assert!(cfg.similarity_top_k >= 1);
    /// ```
    pub fn from_env() -> Result<Self, ContextorError> {
        let d = Self::default();
        let cfg = Self {
            similarity_top_k: env_opt_usize("RAG_TOP_K")?.unwrap_or(d.similarity_top_k),
            max_ctx_chars: env_opt_usize("MAX_CTX_CHARS")?.unwrap_or(d.max_ctx_chars),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.similarity_top_k == 0 {
            return Err(ContextorError::Config("similarity_top_k must be > 0".into()));
        }
        if self.max_ctx_chars == 0 {
            return Err(ContextorError::Config("max_ctx_chars must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_rejected() {
        let cfg = ContextorConfig {
            max_ctx_chars: 0,
            ..ContextorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ContextorError::Config(_))));
    }
}
