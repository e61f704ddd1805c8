//! Registry of ingested sources.
//!
//! The vector store is the ground truth for which sources exist (a source
//! exists iff it has chunks). The registry is a reconciling view over that
//! truth: it remembers the display metadata the pipeline attached at
//! ingestion time (id, human name, timestamp) and re-derives the list of
//! sources from the store on every read, so entries appear and disappear
//! with their chunks rather than drifting out of sync.

use crate::error::Result;
use crate::storage::{SourceType, VectorStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One ingested source as reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    /// Stable opaque id, assigned at registration.
    pub id: String,
    pub source_type: SourceType,
    /// Human-facing name: filename, URL, or a label for pasted text.
    pub name: String,
    /// Dedup identity shared with the chunks in the store.
    pub source_key: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata the registry remembers per source key.
#[derive(Debug, Clone)]
struct RegisteredMeta {
    id: String,
    name: String,
    source_type: SourceType,
    created_at: DateTime<Utc>,
}

/// Reconciling view of sources present in a [`VectorStore`].
pub struct SourceRegistry {
    store: Arc<dyn VectorStore>,
    meta: RwLock<HashMap<String, RegisteredMeta>>,
}

impl SourceRegistry {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            meta: RwLock::new(HashMap::new()),
        }
    }

    /// Record display metadata for a source key after its chunks landed in
    /// the store. Re-registering a key replaces its metadata but keeps the
    /// original id and timestamp, so re-ingestion is not a new source.
    pub async fn register(
        &self,
        source_key: &str,
        name: &str,
        source_type: SourceType,
    ) -> String {
        let mut meta = self.meta.write().await;
        match meta.get_mut(source_key) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.source_type = source_type;
                existing.id.clone()
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                meta.insert(
                    source_key.to_string(),
                    RegisteredMeta {
                        id: id.clone(),
                        name: name.to_string(),
                        source_type,
                        created_at: Utc::now(),
                    },
                );
                id
            }
        }
    }

    /// Every source currently backed by chunks in the store.
    ///
    /// Keys the registry never saw (for example, rows written by an earlier
    /// process) still show up, with their type taken from stored chunk
    /// metadata or inferred from the key shape.
    pub async fn list(&self) -> Result<Vec<Source>> {
        let keys = self.store.list_source_keys().await?;
        let meta = self.meta.read().await;

        Ok(keys
            .into_iter()
            .map(|info| match meta.get(&info.source_key) {
                Some(m) => Source {
                    id: m.id.clone(),
                    source_type: m.source_type,
                    name: m.name.clone(),
                    source_key: info.source_key,
                    created_at: m.created_at,
                },
                None => Source {
                    id: info.source_key.clone(),
                    source_type: info
                        .source_type
                        .unwrap_or_else(|| SourceType::infer_from_key(&info.source_key)),
                    name: info.source_key.clone(),
                    source_key: info.source_key,
                    created_at: Utc::now(),
                },
            })
            .collect())
    }

    /// Remove a source by id or by source key, cascading to its chunks.
    ///
    /// Returns `false` when nothing matched; idempotent.
    pub async fn remove(&self, id_or_key: &str) -> Result<bool> {
        let source_key = {
            let meta = self.meta.read().await;
            meta.iter()
                .find(|(_, m)| m.id == id_or_key)
                .map(|(key, _)| key.clone())
                .unwrap_or_else(|| id_or_key.to_string())
        };

        let removed = self.store.delete_by_key(&source_key).await?;
        self.meta.write().await.remove(&source_key);

        if removed {
            tracing::info!(source_key = %source_key, "removed source");
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry").finish_non_exhaustive()
    }
}
