//! SQLite-backed vector store.
//!
//! Persistent backend standing in for an external vector database. One
//! logical collection per database file: a single `chunks` table keyed by
//! `(source_key, chunk_index)`, with the embedding stored as a BLOB of
//! little-endian f32s and the extra chunk metadata as JSON.
//!
//! Similarity search is an exact brute-force scan scored in Rust; for the
//! corpus sizes this system targets that is simpler and predictable, and a
//! real ANN backend can be swapped in behind the same [`VectorStore`]
//! trait.

use super::{ChunkRecord, ScoredChunk, SourceKeyInfo, SourceType, VectorStore, cosine_similarity};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;

/// SQLite [`VectorStore`] implementation.
#[derive(Clone, Debug)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Open (or create) a persistent store at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .foreign_keys(true)
                .create_if_missing(true)
                .page_size(1 << 16),
        )
        .await?;
        Self::new_with_pool(pool).await
    }

    /// Open an in-memory store, for tests and throwaway sessions.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_key TEXT NOT NULL,
                source_type TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT unique_chunk UNIQUE(source_key, chunk_index)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source_key ON chunks(source_key)")
            .execute(pool)
            .await?;

        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ChunkRecord {
        let source_key: String = row.get("source_key");
        let source_type: String = row.get("source_type");
        let chunk_index: i64 = row.get("chunk_index");
        let content: String = row.get("content");
        let metadata_json: String = row.get("metadata_json");
        let embedding_bytes: Vec<u8> = row.get("embedding");

        let metadata: HashMap<String, String> =
            serde_json::from_str(&metadata_json).unwrap_or_default();

        ChunkRecord {
            source_type: SourceType::parse(&source_type).unwrap_or_else(|| {
                // Legacy rows with unknown type strings fall back to key-shape
                // inference; stored metadata wins everywhere else.
                SourceType::infer_from_key(&source_key)
            }),
            source_key,
            chunk_index: chunk_index as usize,
            content,
            metadata,
            embedding: bytemuck::pod_collect_to_vec::<u8, f32>(&embedding_bytes),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, chunks: Vec<ChunkRecord>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for chunk in &chunks {
            let metadata_json =
                serde_json::to_string(&chunk.metadata).unwrap_or_else(|_| "{}".to_string());
            let embedding_bytes = bytemuck::cast_slice::<f32, u8>(&chunk.embedding);

            sqlx::query(
                r#"
                INSERT INTO chunks (source_key, source_type, chunk_index, content, metadata_json, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(source_key, chunk_index) DO UPDATE SET
                    source_type = excluded.source_type,
                    content = excluded.content,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&chunk.source_key)
            .bind(chunk.source_type.as_str())
            .bind(chunk.chunk_index as i64)
            .bind(&chunk.content)
            .bind(metadata_json)
            .bind(embedding_bytes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(count = chunks.len(), "upserted chunks");
        Ok(())
    }

    async fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        // Ordered by id so score ties resolve to insertion order after the
        // stable sort below.
        let rows = sqlx::query("SELECT * FROM chunks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let chunk = Self::row_to_record(row);
            let score = cosine_similarity(query, &chunk.embedding)?;
            scored.push(ScoredChunk { chunk, score });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete_by_key(&self, source_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chunks WHERE source_key = ?1")
            .bind(source_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_source_keys(&self) -> Result<Vec<SourceKeyInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT source_key, MIN(source_type) AS source_type, COUNT(*) AS chunk_count
            FROM chunks GROUP BY source_key ORDER BY MIN(id)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let source_key: String = row.get("source_key");
                let source_type: String = row.get("source_type");
                let chunk_count: i64 = row.get("chunk_count");
                SourceKeyInfo {
                    source_key,
                    source_type: SourceType::parse(&source_type),
                    chunk_count: chunk_count as usize,
                }
            })
            .collect())
    }
}
