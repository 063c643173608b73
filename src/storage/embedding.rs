use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::{EmbeddingConfig, EmbeddingProvider, OpenAiConfig, RequestConfig};
use crate::error::{StorageError, StorageResult};

/// Turns text into a vector for similarity ranking.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one piece of text.
    async fn embed(&self, text: &str) -> StorageResult<Vec<f32>>;
}

/// Build the embedder selected by configuration.
pub fn embedder_from_config(
    embedding: &EmbeddingConfig,
    openai: &OpenAiConfig,
    request: &RequestConfig,
) -> StorageResult<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match embedding.provider {
        EmbeddingProvider::OpenAi => {
            Arc::new(OpenAiEmbedder::new(openai, &embedding.model, request)?)
        }
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(embedding.dimensions)),
    };
    Ok(embedder)
}

/// Client for the OpenAI embeddings endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    /// Create a new embedding client
    pub fn new(config: &OpenAiConfig, model: &str, request: &RequestConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request.timeout_ms))
            .build()
            .map_err(|e| StorageError::Embedding {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> StorageResult<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| StorageError::Embedding {
                message: format!("Embedding request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Embedding {
                message: format!("Embedding API error ({}): {}", status.as_u16(), body),
            });
        }

        let response: EmbeddingResponse =
            response.json().await.map_err(|e| StorageError::Embedding {
                message: format!("Failed to parse embedding response: {}", e),
            })?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::Embedding {
                message: "No embedding data in response".to_string(),
            })?
            .embedding;

        debug!(dimensions = embedding.len(), "Embedding received");
        Ok(embedding)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Offline embedder: a feature-hashed bag of lowercase words, L2-normalized.
///
/// Deterministic across runs and platforms, so stored vectors stay valid
/// after a restart. Ranking is lexical rather than semantic.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` components
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let index = (hash % self.dimensions as u64) as usize;
            // Signed feature hashing
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> StorageResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cosine_similarity;

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_text("Rust async runtime");
        let b = embedder.embed_text("rust ASYNC runtime");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_ranks_shared_words_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed_text("rust programming");
        let close = embedder.embed_text("The Rust programming language");
        let far = embedder.embed_text("Banana bread recipe");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed_text("  ...  ").iter().all(|v| *v == 0.0));
    }
}
