//! Deterministic text chunking for RAG ingestion.
//!
//! This crate covers the two leaf concerns of the ingestion pipeline:
//!
//! - [`split`]: fixed-size overlapping character windows over normalized
//!   text, the unit of embedding and retrieval.
//! - [`vtt`]: a WebVTT subtitle parser that flattens a caption track into a
//!   single timestamped text document suitable for chunking.
//!
//! Both are pure functions of their input: the same text and parameters
//! always produce the same output, which keeps re-ingestion idempotent.
//!
//! ```
//! use loam_chunk::{ChunkConfig, split_text};
//!
//! let config = ChunkConfig::new(1000, 200).unwrap();
//! let chunks = split_text("some document text", &config).unwrap();
//! assert_eq!(chunks, vec!["some document text".to_string()]);
//! ```

pub mod split;
pub mod vtt;

pub use split::{
    ChunkConfig, ChunkError, GENERIC_CHUNKING, Result, SUBTITLE_CHUNKING, normalize_line_endings,
    split_text,
};
pub use vtt::parse_vtt;
