//! Exact in-memory vector store.
//!
//! The fallback backend for deployments and tests without a persistent
//! vector database. It is an explicit object passed to whatever needs it
//! (create one at startup, share via `Arc`), with a [`clear`] call for
//! test/reset lifecycles; there is no hidden module-level state.
//!
//! [`clear`]: MemoryVectorStore::clear

use super::{ChunkRecord, ScoredChunk, SourceKeyInfo, SourceType, VectorStore, cosine_similarity};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory [`VectorStore`] using exact cosine ranking.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    chunks: RwLock<Vec<ChunkRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored chunk. Intended for tests and explicit resets.
    pub async fn clear(&self) {
        self.chunks.write().await.clear();
    }

    /// Number of chunks currently stored.
    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, incoming: Vec<ChunkRecord>) -> Result<()> {
        let mut chunks = self.chunks.write().await;
        for record in incoming {
            // Replace in place on (source_key, chunk_index) so re-ingestion
            // does not duplicate; otherwise append in insertion order.
            match chunks
                .iter_mut()
                .find(|c| c.source_key == record.source_key && c.chunk_index == record.chunk_index)
            {
                Some(existing) => *existing = record,
                None => chunks.push(record),
            }
        }
        Ok(())
    }

    async fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let chunks = self.chunks.read().await;

        let mut scored = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter() {
            let score = cosine_similarity(query, &chunk.embedding)?;
            scored.push(ScoredChunk {
                chunk: chunk.clone(),
                score,
            });
        }

        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete_by_key(&self, source_key: &str) -> Result<bool> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|c| c.source_key != source_key);
        Ok(chunks.len() != before)
    }

    async fn list_source_keys(&self) -> Result<Vec<SourceKeyInfo>> {
        let chunks = self.chunks.read().await;

        let mut grouped: Vec<(String, Option<SourceType>, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for chunk in chunks.iter() {
            match index.get(chunk.source_key.as_str()) {
                Some(&i) => grouped[i].2 += 1,
                None => {
                    index.insert(chunk.source_key.as_str(), grouped.len());
                    grouped.push((chunk.source_key.clone(), Some(chunk.source_type), 1));
                }
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(source_key, source_type, chunk_count)| SourceKeyInfo {
                source_key,
                source_type,
                chunk_count,
            })
            .collect())
    }
}
