//! Fixed-size overlapping window chunker.
//!
//! The splitter walks the normalized text in windows of `chunk_size`
//! characters; each window after the first starts `overlap` characters
//! before the previous window's end, so neighboring chunks share a suffix
//! and no sentence is lost at a boundary. Windows are counted in Unicode
//! scalar values, not bytes, so multi-byte text never splits mid-character.

use serde::{Deserialize, Serialize};

/// Result type for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors from the chunker.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Caller supplied parameters that cannot produce a terminating walk,
    /// e.g. `overlap >= chunk_size` or a zero-sized window.
    #[error("invalid chunker configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ChunkError {
    pub fn invalid_configuration<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Default window for generic text: roughly 1k characters with a 200
/// character overlap, consistent across files, pasted text, and websites.
pub const GENERIC_CHUNKING: ChunkConfig = ChunkConfig {
    chunk_size: 1000,
    overlap: 200,
};

/// Default window for subtitle-derived text. Caption lines are short and
/// timestamp-laden, so smaller windows keep each chunk topically tight.
pub const SUBTITLE_CHUNKING: ChunkConfig = ChunkConfig {
    chunk_size: 500,
    overlap: 50,
};

/// Window size and overlap for [`split_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk. Must be greater than zero.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks. Must be strictly less
    /// than `chunk_size`.
    pub overlap: usize,
}

impl ChunkConfig {
    /// Create a validated configuration.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the window parameters describe a terminating walk.
    ///
    /// `overlap >= chunk_size` would move the window start backwards or
    /// hold it in place forever, so it is rejected up front rather than
    /// looping.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkError::invalid_configuration("chunk_size must be > 0"));
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkError::invalid_configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        GENERIC_CHUNKING
    }
}

/// Normalize `\r\n` and bare `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split `text` into overlapping chunks.
///
/// Line endings are normalized first so the output is identical regardless
/// of the platform the source was authored on. Each window is trimmed and
/// empty windows (all whitespace) are dropped. The walk stops as soon as a
/// window reaches the end of the text, so no trailing empty window is ever
/// emitted.
///
/// The output is deterministic: two calls with identical input and
/// configuration return identical chunk sequences.
pub fn split_text(text: &str, config: &ChunkConfig) -> Result<Vec<String>> {
    config.validate()?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let normalized = normalize_line_endings(text);
    let chars: Vec<char> = normalized.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        // overlap < chunk_size guarantees forward progress here
        start = end - config.overlap;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk_size() {
        assert!(ChunkConfig::new(100, 100).is_err());
        assert!(ChunkConfig::new(100, 150).is_err());
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(100, 99).is_ok());
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = (0..50).map(|i| format!("sentence {i}. ")).collect::<String>();
        let config = ChunkConfig::new(120, 30).unwrap();

        let first = split_text(&text, &config).unwrap();
        let second = split_text(&text, &config).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_window_offsets_and_lengths() {
        // 2500 chars at 1000/200: windows start at 0, 800, 1600.
        let text = "A".repeat(2500);
        let chunks = split_text(&text, &GENERIC_CHUNKING).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        assert_eq!(chunks[2].len(), 900);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let chunks = split_text(&text, &GENERIC_CHUNKING).unwrap();

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count() - 200).collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_overlap_round_trip_recovers_input() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let chunks = split_text(&text, &GENERIC_CHUNKING).unwrap();

        // Concatenating chunks with the overlapping prefix removed from each
        // chunk after the first recovers the normalized input.
        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(GENERIC_CHUNKING.overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_never_emits_empty_chunks() {
        let text = format!("{}{}", "x".repeat(600), " ".repeat(900));
        let chunks = split_text(&text, &GENERIC_CHUNKING).unwrap();

        assert!(chunks.iter().all(|c| !c.is_empty()));
        // The all-whitespace trailing window is dropped entirely.
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_text("", &GENERIC_CHUNKING).unwrap().is_empty());
        assert!(split_text("   \n\t  ", &GENERIC_CHUNKING).unwrap().is_empty());
    }

    #[test]
    fn test_line_endings_normalized_before_windowing() {
        let crlf = "line one\r\nline two\r\nline three";
        let lf = "line one\nline two\nline three";
        let config = ChunkConfig::new(12, 4).unwrap();

        assert_eq!(
            split_text(crlf, &config).unwrap(),
            split_text(lf, &config).unwrap()
        );
    }

    #[test]
    fn test_multibyte_text_splits_on_character_boundaries() {
        let text = "é".repeat(1500);
        let chunks = split_text(&text, &GENERIC_CHUNKING).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 700);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_text("just a short note", &GENERIC_CHUNKING).unwrap();
        assert_eq!(chunks, vec!["just a short note".to_string()]);
    }

    #[test]
    fn test_subtitle_defaults() {
        assert_eq!(SUBTITLE_CHUNKING.chunk_size, 500);
        assert_eq!(SUBTITLE_CHUNKING.overlap, 50);
        assert!(SUBTITLE_CHUNKING.validate().is_ok());
    }
}
