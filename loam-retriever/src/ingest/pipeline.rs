//! Single-origin ingestion pipeline.
//!
//! One origin flows through: resolve raw text → reject empty → chunk with
//! a type-appropriate config → embed the whole batch in one call → upsert
//! into the vector store → register the source. A failure at any step
//! aborts the remaining steps for that origin, so a success report always
//! means the chunks are embedded and stored.

use crate::error::{RagError, Result};
use crate::registry::SourceRegistry;
use crate::storage::{ChunkRecord, SourceType, VectorStore};
use loam_chunk::{ChunkConfig, GENERIC_CHUNKING, SUBTITLE_CHUNKING, parse_vtt, split_text};
use loam_embed::EmbeddingProvider;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Disambiguates text keys generated within the same millisecond.
static TEXT_KEY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Something to ingest.
#[derive(Debug, Clone)]
pub enum IngestOrigin {
    /// Directly supplied text, with an optional display name.
    Text {
        content: String,
        name: Option<String>,
    },
    /// A local file; the extension picks the loader.
    File { path: PathBuf },
    /// A web page fetched over HTTP.
    Url { url: String },
}

impl IngestOrigin {
    /// Dedup identity: file name for files, URL for websites, a
    /// millisecond-stamped id for pasted text. The sequence suffix keeps
    /// keys distinct when two texts arrive within one millisecond.
    fn source_key(&self) -> String {
        match self {
            Self::Text { .. } => format!(
                "text-{}-{}",
                chrono::Utc::now().timestamp_millis(),
                TEXT_KEY_SEQ.fetch_add(1, Ordering::Relaxed)
            ),
            Self::File { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            Self::Url { url } => url.clone(),
        }
    }

    fn display_name(&self, source_key: &str) -> String {
        match self {
            Self::Text { name, .. } => name.clone().unwrap_or_else(|| source_key.to_string()),
            _ => source_key.to_string(),
        }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestReport {
    pub source_key: String,
    pub source_type: SourceType,
    pub chunks_written: usize,
}

/// Removes its key from the in-flight set when dropped, so the guard
/// releases on every exit path including errors.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    source_key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.source_key);
        }
    }
}

/// Runs origins through resolve → chunk → embed → store → register.
pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    registry: Arc<SourceRegistry>,
    http: reqwest::Client,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn EmbeddingProvider>,
        registry: Arc<SourceRegistry>,
    ) -> Self {
        Self {
            store,
            provider,
            registry,
            http: reqwest::Client::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Ingest one origin end to end.
    ///
    /// A second call for a source key still being processed fails with
    /// [`RagError::DuplicateInFlight`] rather than racing the first.
    pub async fn ingest(&self, origin: IngestOrigin) -> Result<IngestReport> {
        let source_key = origin.source_key();

        let _guard = {
            let mut set = self
                .in_flight
                .lock()
                .map_err(|_| RagError::job_fault("in-flight set poisoned"))?;
            if !set.insert(source_key.clone()) {
                return Err(RagError::DuplicateInFlight {
                    source_key: source_key.clone(),
                });
            }
            InFlightGuard {
                in_flight: self.in_flight.clone(),
                source_key: source_key.clone(),
            }
        };

        let (text, source_type, config) = self.resolve(&origin, &source_key).await?;

        if text.trim().is_empty() {
            return Err(RagError::no_extractable_content(&source_key));
        }

        let chunks = split_text(&text, &config)?;
        tracing::debug!(
            source_key = %source_key,
            source_type = %source_type,
            chunks = chunks.len(),
            "chunked source"
        );

        let result = self.provider.embed_texts(&chunks).await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(result.embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| ChunkRecord {
                source_key: source_key.clone(),
                source_type,
                chunk_index: index,
                content,
                metadata: HashMap::from([
                    ("source".to_string(), source_key.clone()),
                    ("type".to_string(), source_type.as_str().to_string()),
                    ("index".to_string(), index.to_string()),
                ]),
                embedding,
            })
            .collect();
        let chunks_written = records.len();

        self.store.upsert(records).await?;
        self.registry
            .register(&source_key, &origin.display_name(&source_key), source_type)
            .await;

        tracing::info!(
            source_key = %source_key,
            chunks = chunks_written,
            "ingested source"
        );

        Ok(IngestReport {
            source_key,
            source_type,
            chunks_written,
        })
    }

    /// Resolve an origin to raw text plus the chunking config to use.
    async fn resolve(
        &self,
        origin: &IngestOrigin,
        source_key: &str,
    ) -> Result<(String, SourceType, ChunkConfig)> {
        match origin {
            IngestOrigin::Text { content, .. } => {
                Ok((content.clone(), SourceType::Text, GENERIC_CHUNKING))
            }
            IngestOrigin::File { path } => self.resolve_file(path, source_key).await,
            IngestOrigin::Url { url } => {
                let body = self.fetch_url(url).await?;
                Ok((body, SourceType::Website, GENERIC_CHUNKING))
            }
        }
    }

    async fn resolve_file(
        &self,
        path: &Path,
        source_key: &str,
    ) -> Result<(String, SourceType, ChunkConfig)> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "vtt" => {
                let raw = read_file(path, source_key).await?;
                Ok((parse_vtt(&raw), SourceType::Vtt, SUBTITLE_CHUNKING))
            }
            "txt" | "md" | "markdown" | "csv" => {
                let raw = read_file(path, source_key).await?;
                Ok((raw, SourceType::File, GENERIC_CHUNKING))
            }
            _ => Err(RagError::UnsupportedFileType { extension }),
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RagError::content_unavailable(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(RagError::content_unavailable(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| RagError::content_unavailable(url, e.to_string()))
    }
}

async fn read_file(path: &Path, source_key: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::content_unavailable(source_key, e.to_string()))
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline").finish_non_exhaustive()
    }
}
