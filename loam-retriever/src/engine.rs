//! Engine facade wiring the ingestion and retrieval components together.

use crate::error::Result;
use crate::ingest::{IngestOrigin, IngestReport, IngestionPipeline, Job, JobCoordinator};
use crate::registry::{Source, SourceRegistry};
use crate::retriever::{DEFAULT_TOP_K, Retriever};
use crate::storage::sqlite_store::SqliteVectorStore;
use crate::storage::{ScoredChunk, VectorStore};
use loam_embed::EmbeddingProvider;
use std::path::Path;
use std::sync::Arc;

/// One object owning the whole pipeline: store, registry, ingestion,
/// background jobs, and retrieval.
///
/// The embedding provider is injected so callers can wire the HTTP
/// provider in production and a deterministic stub in tests.
pub struct RagEngine {
    registry: Arc<SourceRegistry>,
    pipeline: Arc<IngestionPipeline>,
    coordinator: JobCoordinator,
    retriever: Retriever,
}

impl RagEngine {
    /// Engine backed by a SQLite database at `db_path`.
    pub async fn new(db_path: &Path, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let store = Arc::new(SqliteVectorStore::open(db_path).await?);
        Ok(Self::with_store(store, provider))
    }

    /// Engine backed by the in-memory store; nothing survives the process.
    pub fn new_memory(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let store = Arc::new(crate::storage::memory_store::MemoryVectorStore::new());
        Self::with_store(store, provider)
    }

    /// Engine over any [`VectorStore`] implementation.
    pub fn with_store(store: Arc<dyn VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let registry = Arc::new(SourceRegistry::new(store.clone()));
        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            provider.clone(),
            registry.clone(),
        ));
        let coordinator = JobCoordinator::new(pipeline.clone());
        let retriever = Retriever::new(store, provider);

        Self {
            registry,
            pipeline,
            coordinator,
            retriever,
        }
    }

    /// Ingest a single origin synchronously.
    pub async fn ingest(&self, origin: IngestOrigin) -> Result<IngestReport> {
        self.pipeline.ingest(origin).await
    }

    /// Queue a batch of origins; returns the job id to poll.
    pub async fn ingest_batch(&self, origins: Vec<IngestOrigin>) -> Result<String> {
        self.coordinator.submit(origins).await
    }

    /// Top-`k` chunks most similar to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.retriever.retrieve(query, k).await
    }

    /// Top chunks with the default `k`.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retriever.retrieve(query, DEFAULT_TOP_K).await
    }

    /// Every source currently present in the store.
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        self.registry.list().await
    }

    /// Remove a source (by id or source key) and all its chunks.
    pub async fn delete_source(&self, id_or_key: &str) -> Result<bool> {
        self.registry.remove(id_or_key).await
    }

    /// Poll one job by id.
    pub async fn job_status(&self, id: &str) -> Option<Job> {
        self.coordinator.get_status(id).await
    }

    /// Every known job, newest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.coordinator.list_jobs().await
    }

    /// Stop the job worker after draining queued jobs.
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
    }
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine").finish_non_exhaustive()
    }
}
