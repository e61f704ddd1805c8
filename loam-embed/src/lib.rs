//! # loam-embed
//!
//! Embedding gateway for the loam retrieval system. The embedding model is
//! an external collaborator reached over HTTP: this crate defines the
//! [`EmbeddingProvider`] capability trait and ships one implementation,
//! [`HttpEmbedProvider`], which talks to any OpenAI-compatible
//! `/embeddings` endpoint.
//!
//! ## Quick start
//!
//! ```no_run
//! use loam_embed::{EmbedConfig, EmbeddingProvider, HttpEmbedProvider};
//!
//! # async fn example() -> loam_embed::Result<()> {
//! let provider = HttpEmbedProvider::new(
//!     EmbedConfig::new("https://api.openai.com/v1", "text-embedding-3-large", 3072)
//!         .with_api_key("sk-..."),
//! );
//!
//! let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.dimension, 3072);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! Every vector returned by one provider instance has the same length
//! (the configured dimension); a response that disagrees is rejected as
//! [`EmbedError::Api`] rather than handed to callers, so downstream
//! similarity math never sees mixed dimensions. Transport and quota
//! failures surface as [`EmbedError::Http`] / [`EmbedError::Api`] verbatim;
//! retry policy belongs to the caller or the remote client, not this crate.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, HttpEmbedProvider};
