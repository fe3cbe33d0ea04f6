//! Embedding configuration loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

use crate::hashing::DEFAULT_HASHING_DIMENSION;

/// Which embedding backend the worker binds to its collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Local [`crate::HashingEmbedding`]; no network access.
    Hashing,
    /// OpenAI-compatible embeddings API.
    OpenAI,
}

impl EmbeddingProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "hashing" | "local" => Ok(Self::Hashing),
            "openai" => Ok(Self::OpenAI),
            other => anyhow::bail!(
                "unknown EMBEDDING_PROVIDER '{}', expected 'hashing' or 'openai'",
                other
            ),
        }
    }
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Model name for remote providers (EMBEDDING_MODEL).
    pub model: Option<String>,
    /// Vector length for the hashing provider (EMBEDDING_DIMENSION).
    pub dimension: usize,
    pub openai_api_key: String,
    /// Optional base URL for OpenAI-compatible endpoints (OPENAI_BASE_URL).
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let provider = EmbeddingProvider::parse(
            &env::var("EMBEDDING_PROVIDER").unwrap_or_default(),
        )?;
        let model = env::var("EMBEDDING_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let dimension = match env::var("EMBEDDING_DIMENSION") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("EMBEDDING_DIMENSION is not a number: '{}'", raw))?,
            Err(_) => DEFAULT_HASHING_DIMENSION,
        };
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            provider,
            model,
            dimension,
            openai_api_key,
            openai_base_url,
        })
    }

    /// Validate config (e.g. openai requires OPENAI_API_KEY).
    pub fn validate(&self) -> Result<()> {
        if self.provider == EmbeddingProvider::OpenAI && self.openai_api_key.is_empty() {
            anyhow::bail!("EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY to be set");
        }
        if self.dimension == 0 {
            anyhow::bail!("EMBEDDING_DIMENSION must be greater than zero");
        }
        Ok(())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: None,
            dimension: DEFAULT_HASHING_DIMENSION,
            openai_api_key: String::new(),
            openai_base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "EMBEDDING_PROVIDER",
            "EMBEDDING_MODEL",
            "EMBEDDING_DIMENSION",
            "OPENAI_API_KEY",
            "OPENAI_BASE_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_to_hashing() {
        clear_env();
        let config = EmbeddingConfig::from_env().unwrap();
        assert_eq!(config.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.dimension, DEFAULT_HASHING_DIMENSION);
        assert!(config.model.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_openai_requires_key() {
        clear_env();
        env::set_var("EMBEDDING_PROVIDER", "OpenAI");
        env::set_var("OPENAI_BASE_URL", "  ");
        let config = EmbeddingConfig::from_env().unwrap();
        assert_eq!(config.provider, EmbeddingProvider::OpenAI);
        assert!(config.openai_base_url.is_none());
        assert!(config.validate().is_err());

        env::set_var("OPENAI_API_KEY", "sk-test");
        let config = EmbeddingConfig::from_env().unwrap();
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_provider_and_bad_dimension() {
        clear_env();
        env::set_var("EMBEDDING_PROVIDER", "word2vec");
        assert!(EmbeddingConfig::from_env().is_err());

        env::remove_var("EMBEDDING_PROVIDER");
        env::set_var("EMBEDDING_DIMENSION", "many");
        assert!(EmbeddingConfig::from_env().is_err());
        clear_env();
    }
}
