//! Embedding provider trait and the HTTP implementation.

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector.
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a result from raw vectors; dimension is inferred from the
    /// first vector (0 when empty).
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Capability trait for mapping text to vectors.
///
/// One provider instance always produces vectors of a single fixed
/// dimension; callers may rely on that when comparing vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts in one batched call.
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// The dimension of embeddings produced by this provider.
    fn dimension(&self) -> usize;

    /// Name/identifier of this provider, for logs and diagnostics.
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Embedding provider backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedProvider {
    config: EmbedConfig,
    client: reqwest::Client,
}

impl HttpEmbedProvider {
    /// Build a provider from a configuration.
    pub fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider after validating its configuration.
    pub fn create(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut request = self
            .client
            .post(self.config.embeddings_url())
            .timeout(self.config.timeout)
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(parsed) => parsed.error.message,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(EmbedError::api(format!("{status}: {message}")));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::api(format!("malformed response: {e}")))?;

        // Responses are not guaranteed to preserve input order; the index
        // field is authoritative.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn check_shape(&self, texts: &[String], embeddings: &[Vec<f32>]) -> Result<()> {
        if embeddings.len() != texts.len() {
            return Err(EmbedError::api(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != self.config.dimension {
                return Err(EmbedError::api(format!(
                    "embedding {} has dimension {}, expected {}",
                    i,
                    embedding.len(),
                    self.config.dimension
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::api("no embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        tracing::debug!(count = texts.len(), model = %self.config.model, "requesting embeddings");

        let embeddings = self.request_embeddings(texts).await?;
        self.check_shape(texts, &embeddings)?;

        tracing::debug!(count = embeddings.len(), "embeddings received");
        Ok(EmbeddingResult::new(embeddings))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn provider_name(&self) -> &str {
        "openai-compatible-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider_for(server: &MockServer, dimension: usize) -> HttpEmbedProvider {
        HttpEmbedProvider::new(EmbedConfig::new(
            server.url("/v1"),
            "test-model",
            dimension,
        ))
    }

    #[test]
    fn test_embedding_result_shape() {
        let result = EmbeddingResult::new(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.dimension, 3);
        assert!(!result.is_empty());

        let empty = EmbeddingResult::new(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.dimension, 0);
    }

    #[tokio::test]
    async fn test_batched_request_and_response_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .json_body_partial(r#"{"model": "test-model"}"#);
                // Out-of-order data entries; the index field wins.
                then.status(200).json_body(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0] },
                        { "index": 0, "embedding": [1.0, 0.0] },
                    ]
                }));
            })
            .await;

        let provider = provider_for(&server, 2);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let result = provider.embed_texts(&texts).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.len(), 2);
        assert_eq!(result.embeddings[0], vec![1.0, 0.0]);
        assert_eq!(result.embeddings[1], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(429)
                    .json_body(json!({ "error": { "message": "rate limited" } }));
            })
            .await;

        let provider = provider_for(&server, 2);
        let err = provider
            .embed_texts(&["text".to_string()])
            .await
            .unwrap_err();

        match err {
            EmbedError::Api { message } => assert!(message.contains("rate limited")),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({
                    "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3] }]
                }));
            })
            .await;

        // Provider expects dimension 2 but the service returned 3.
        let provider = provider_for(&server, 2);
        let err = provider
            .embed_texts(&["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Api { .. }));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let provider = provider_for(&server, 2);
        let result = provider.embed_texts(&[]).await.unwrap();

        assert!(result.is_empty());
        mock.assert_hits_async(0).await;
    }
}
