//! # OpenAI Embedding Service
//!
//! [`OpenAIEmbedding`] implements [`EmbeddingService`] against the OpenAI embeddings
//! API or any OpenAI-compatible endpoint (`OPENAI_BASE_URL`).
//!
//! Returned vectors are re-normalized to unit length so that cosine scores from
//! this provider and from the local hashing embedder have the same range.
//!
//! ```rust,no_run
//! use embedding::EmbeddingService;
//! use openai_embedding::OpenAIEmbedding;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let service = OpenAIEmbedding::new("sk-...".to_string(), "text-embedding-3-small".to_string());
//!     let vectors = service.embed_batch(&["chapter one".to_string()]).await?;
//!     assert_eq!(vectors.len(), 1);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{normalize, EmbeddingService};
use tracing::{debug, info, instrument, warn};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Upper bound for one embeddings request, connect to last byte.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI embedding service. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a service for `model` using `api_key`. An empty key falls back to
    /// the OPENAI_API_KEY environment variable.
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// Same as [`OpenAIEmbedding::new`], sending requests to `base_url` when given.
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let api_key = if api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            api_key
        };

        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            config = config.with_api_base(url);
        }

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Returns the embedding model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, inputs: Vec<&str>) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let expected = inputs.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(inputs)
            .build()?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(REQUEST_TIMEOUT, embeddings.create(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, model = %self.model, "embeddings request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = REQUEST_TIMEOUT.as_secs(), "embeddings request timed out");
                anyhow::bail!(
                    "embeddings request timed out after {} seconds",
                    REQUEST_TIMEOUT.as_secs()
                );
            }
        };

        let mut data = response.data;
        // The API tags every vector with its input position; order by it rather than trusting list order.
        data.sort_by_key(|item| item.index);
        let vectors: Vec<Vec<f32>> = data
            .into_iter()
            .map(|item| {
                let mut vector = item.embedding;
                normalize(&mut vector);
                vector
            })
            .collect();

        if vectors.len() != expected {
            anyhow::bail!("expected {} embeddings, got {}", expected, vectors.len());
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        let mut vectors = self.request(vec![text]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no embedding in response"))
    }

    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            debug!("embed_batch: empty input");
            return Ok(vec![]);
        }
        let vectors = self.request(texts.iter().map(String::as_str).collect()).await?;
        info!(
            count = vectors.len(),
            dimension = vectors.first().map(Vec::len).unwrap_or(0),
            "embed_batch done"
        );
        Ok(vectors)
    }
}
