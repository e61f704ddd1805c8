//! Error types for ingestion, storage, and retrieval.

use loam_chunk::ChunkError;
use loam_embed::EmbedError;

/// Result type used throughout the retriever crate.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors from the ingestion/retrieval core.
///
/// Per-origin ingestion failures are all expressible here; inside a batch
/// job they are captured into that input's outcome record instead of
/// propagating to sibling inputs or to the job itself.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// The origin resolved to empty or whitespace-only text, so there is
    /// nothing to chunk or embed.
    #[error("no extractable content in {origin}")]
    NoExtractableContent { origin: String },

    /// The raw content could not be obtained (file read or URL fetch).
    #[error("content unavailable for {origin}: {message}")]
    ContentUnavailable { origin: String, message: String },

    /// The origin's file type has no registered loader.
    #[error("unsupported file type: {extension}")]
    UnsupportedFileType { extension: String },

    /// Another ingestion of the same source key is currently in flight.
    #[error("source {source_key} is already being ingested")]
    DuplicateInFlight { source_key: String },

    /// A query vector and a stored vector disagree on length.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The retrieval query was empty or whitespace-only; rejected before
    /// any embedding call is spent on it.
    #[error("query must not be empty")]
    InvalidQuery,

    /// Chunker rejected its parameters.
    #[error(transparent)]
    Chunking(#[from] ChunkError),

    /// The embedding gateway failed.
    #[error(transparent)]
    Embedding(#[from] EmbedError),

    /// The SQLite vector store backend failed.
    #[error("vector store error: {source}")]
    Store {
        #[from]
        source: sqlx::Error,
    },

    /// A coordinator-level fault while running a batch job.
    #[error("job fault: {message}")]
    JobFault { message: String },
}

impl RagError {
    pub fn content_unavailable<O: Into<String>, M: Into<String>>(origin: O, message: M) -> Self {
        Self::ContentUnavailable {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn no_extractable_content<O: Into<String>>(origin: O) -> Self {
        Self::NoExtractableContent {
            origin: origin.into(),
        }
    }

    pub fn job_fault<M: Into<String>>(message: M) -> Self {
        Self::JobFault {
            message: message.into(),
        }
    }
}
