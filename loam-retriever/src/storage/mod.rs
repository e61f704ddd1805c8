//! Vector storage abstraction for embedded chunks.
//!
//! Two interchangeable backends sit behind the [`VectorStore`] trait:
//!
//! - [`sqlite_store::SqliteVectorStore`]: persistent SQLite storage, the
//!   stand-in for an external vector database.
//! - [`memory_store::MemoryVectorStore`]: exact in-memory fallback for
//!   deployments and tests without a persistent backend.
//!
//! Both rank query results by cosine similarity, descending, and both
//! enforce that compared vectors have equal length.

use crate::error::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod memory_store;
pub mod sqlite_store;

/// The kind of origin a chunk was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Pasted or directly supplied text.
    Text,
    /// An uploaded or local file.
    File,
    /// A fetched web page.
    Website,
    /// A WebVTT caption track.
    Vtt,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Website => "website",
            Self::Vtt => "vtt",
        }
    }

    /// Parse a stored metadata value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "file" => Some(Self::File),
            "website" => Some(Self::Website),
            "vtt" => Some(Self::Vtt),
            _ => None,
        }
    }

    /// Best-effort inference from the shape of a source key.
    ///
    /// This is a fallback for chunks whose stored metadata is missing a
    /// type; stored metadata always wins when present. URL-shaped keys are
    /// websites, keys with a known file extension are files (or caption
    /// tracks), anything else is treated as pasted text.
    pub fn infer_from_key(source_key: &str) -> Self {
        if source_key.starts_with("http://") || source_key.starts_with("https://") {
            return Self::Website;
        }
        match source_key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "vtt" => Self::Vtt,
            Some(ext)
                if matches!(ext.as_str(), "txt" | "md" | "markdown" | "csv" | "pdf" | "html") =>
            {
                Self::File
            }
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded chunk as persisted in a vector store.
///
/// Immutable once created: the ingestion pipeline builds records and hands
/// them to the store, nothing mutates them afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Dedup identity of the origin: filename, URL, or generated text id.
    pub source_key: String,
    /// Kind of origin this chunk came from.
    pub source_type: SourceType,
    /// Position of this chunk within its source, 0-indexed.
    pub chunk_index: usize,
    /// The chunk text.
    pub content: String,
    /// Extra metadata attached at ingestion time.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// The embedding vector for this chunk.
    pub embedding: Vec<f32>,
}

/// A chunk with its similarity score against some query vector.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    pub score: f32,
}

/// One source key as observed in the store, with whatever type metadata
/// the stored chunks carry.
#[derive(Debug, Clone, Serialize)]
pub struct SourceKeyInfo {
    pub source_key: String,
    /// Type from stored metadata; `None` when the metadata is absent and
    /// the caller should fall back to [`SourceType::infer_from_key`].
    pub source_type: Option<SourceType>,
    pub chunk_count: usize,
}

/// Persistence and nearest-neighbor search for embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks, keyed by `(source_key, chunk_index)`.
    async fn upsert(&self, chunks: Vec<ChunkRecord>) -> Result<()>;

    /// Return up to `k` chunks ranked by cosine similarity to `query`,
    /// descending. Fewer than `k` stored chunks is not an error; an empty
    /// store yields an empty result.
    async fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Remove every chunk carrying `source_key`. Returns `false` when the
    /// key was already absent; idempotent.
    async fn delete_by_key(&self, source_key: &str) -> Result<bool>;

    /// Distinct source keys currently stored, grouped from chunk metadata.
    async fn list_source_keys(&self) -> Result<Vec<SourceKeyInfo>>;
}

/// Cosine similarity between two vectors: `dot(a,b) / (|a| * |b|)`.
///
/// Comparing vectors of unequal length is an invariant violation and
/// fails fast rather than scoring garbage.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-2.0, 0.5, 1.5];
        assert_eq!(
            cosine_similarity(&a, &b).unwrap(),
            cosine_similarity(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let x = vec![1.0, 0.0];
        let y = vec![0.0, 1.0];
        let neg_x = vec![-1.0, 0.0];

        assert!((cosine_similarity(&x, &y).unwrap()).abs() < 1e-6);
        assert!((cosine_similarity(&x, &neg_x).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_rejects_unequal_lengths() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_source_type_round_trip() {
        for ty in [
            SourceType::Text,
            SourceType::File,
            SourceType::Website,
            SourceType::Vtt,
        ] {
            assert_eq!(SourceType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(SourceType::parse("bogus"), None);
    }

    #[test]
    fn test_infer_from_key_shapes() {
        assert_eq!(
            SourceType::infer_from_key("https://example.com/page"),
            SourceType::Website
        );
        assert_eq!(SourceType::infer_from_key("notes.txt"), SourceType::File);
        assert_eq!(SourceType::infer_from_key("talk.vtt"), SourceType::Vtt);
        assert_eq!(
            SourceType::infer_from_key("text-1700000000000"),
            SourceType::Text
        );
    }
}
