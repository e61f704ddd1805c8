//! Ingestion and retrieval core for retrieval-augmented generation.
//!
//! Text, files, subtitle tracks, and web pages are chunked, embedded, and
//! stored in a vector store; queries are embedded the same way and answered
//! with the most similar chunks. The pieces compose bottom-up:
//!
//! - [`storage`]: the [`VectorStore`](storage::VectorStore) trait with
//!   SQLite and in-memory backends, plus cosine ranking.
//! - [`registry`]: which sources exist, reconciled from the store.
//! - [`ingest`]: the per-origin pipeline and the background batch job
//!   coordinator.
//! - [`retriever`]: query embedding and similarity search.
//! - [`engine`]: the [`RagEngine`](engine::RagEngine) facade over all of
//!   the above.
//!
//! Chunking and subtitle parsing live in `loam-chunk`; talking to the
//! embedding service lives in `loam-embed`.

pub mod engine;
pub mod error;
pub mod ingest;
pub mod registry;
pub mod retriever;
pub mod storage;

pub use engine::RagEngine;
pub use error::{RagError, Result};
pub use ingest::{
    BatchSummary, IngestOrigin, IngestReport, IngestionPipeline, InputOutcome, Job,
    JobCoordinator, JobStatus,
};
pub use registry::{Source, SourceRegistry};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use storage::{ChunkRecord, ScoredChunk, SourceKeyInfo, SourceType, VectorStore};
