//! Query-time retrieval: embed the query, rank stored chunks.

use crate::error::{RagError, Result};
use crate::storage::{ScoredChunk, VectorStore};
use loam_embed::EmbeddingProvider;
use std::sync::Arc;

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 10;

/// Embeds queries and ranks stored chunks by cosine similarity.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, provider }
    }

    /// Return up to `k` chunks most similar to `query`, best first.
    ///
    /// An empty or whitespace-only query fails with
    /// [`RagError::InvalidQuery`] before any embedding call is made. An
    /// empty store yields an empty result, not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery);
        }

        let embedding = self.provider.embed_text(query).await?;
        let results = self.store.query(&embedding, k).await?;

        tracing::debug!(k, returned = results.len(), "retrieved chunks");
        Ok(results)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_store::MemoryVectorStore;
    use crate::storage::{ChunkRecord, SourceType};
    use async_trait::async_trait;
    use loam_embed::EmbeddingResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps known words to fixed unit vectors.
    struct WordProvider {
        calls: AtomicUsize,
    }

    impl WordProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            if text.contains("ocean") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for WordProvider {
        async fn embed_text(&self, text: &str) -> loam_embed::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::vector_for(text))
        }

        async fn embed_texts(&self, texts: &[String]) -> loam_embed::Result<EmbeddingResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbeddingResult {
                embeddings: texts.iter().map(|t| Self::vector_for(t)).collect(),
                dimension: 2,
            })
        }

        fn dimension(&self) -> usize {
            2
        }

        fn provider_name(&self) -> &str {
            "word"
        }
    }

    fn chunk(key: &str, content: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            source_key: key.to_string(),
            source_type: SourceType::Text,
            chunk_index: 0,
            content: content.to_string(),
            metadata: HashMap::new(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_retrieve_ranks_matching_content_first() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(vec![
                chunk("sea", "the ocean is deep", vec![1.0, 0.0]),
                chunk("sky", "the sky is high", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let retriever = Retriever::new(store, Arc::new(WordProvider::new()));
        let results = retriever.retrieve("tell me about the ocean", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source_key, "sea");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_embedding() {
        let store = Arc::new(MemoryVectorStore::new());
        let provider = Arc::new(WordProvider::new());
        let retriever = Retriever::new(store, provider.clone());

        for query in ["", "   ", "\n\t"] {
            let err = retriever.retrieve(query, 5).await.unwrap_err();
            assert!(matches!(err, RagError::InvalidQuery));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_not_error() {
        let store = Arc::new(MemoryVectorStore::new());
        let retriever = Retriever::new(store, Arc::new(WordProvider::new()));

        let results = retriever.retrieve("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_k_caps_result_count() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(vec![
                chunk("a", "ocean a", vec![1.0, 0.0]),
                chunk("b", "ocean b", vec![0.9, 0.1]),
                chunk("c", "ocean c", vec![0.8, 0.2]),
            ])
            .await
            .unwrap();

        let retriever = Retriever::new(store, Arc::new(WordProvider::new()));
        let results = retriever.retrieve("ocean", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
