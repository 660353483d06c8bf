//! SQLite-backed vector index for passages.
//!
//! Embeddings are stored as little-endian `f32` blobs and searched by brute
//! force cosine similarity, which is plenty for a KorQuAD-sized corpus.

use crate::quality::{Candidate, Metadata};
use korqa_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A passage ready to be written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPassage {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug)]
pub struct PassageIndex {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl PassageIndex {
    /// Open (or create) the index database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;
        let index = Self::init(conn, Some(db_path.to_path_buf()))?;

        tracing::debug!("Initialized SQLite index at {:?}", db_path);
        Ok(index)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS passages (
                id TEXT PRIMARY KEY,
                title TEXT,
                body TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index connection lock poisoned".to_string()))
    }

    /// Insert or replace a batch of passages in one transaction.
    pub fn insert_batch(&self, passages: &[IndexedPassage]) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO passages (id, title, body, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for passage in passages {
                let metadata_json = serde_json::to_string(&passage.metadata).map_err(|e| {
                    AppError::Knowledge(format!("Failed to serialize metadata: {}", e))
                })?;

                stmt.execute(params![
                    passage.id,
                    passage.title,
                    passage.body,
                    metadata_json,
                    embedding_to_bytes(&passage.embedding),
                ])
                .map_err(|e| AppError::Knowledge(format!("Failed to insert passage: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit passages: {}", e)))?;
        Ok(())
    }

    /// Top-`limit` passages by cosine similarity to `query_embedding`,
    /// highest first. Similarity is clamped to [0, 1].
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, title, body, metadata, embedding FROM passages")
            .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let title: Option<String> = row.get(1)?;
                let body: String = row.get(2)?;
                let metadata_json: String = row.get(3)?;
                let embedding_bytes: Vec<u8> = row.get(4)?;
                Ok((id, title, body, metadata_json, embedding_bytes))
            })
            .map_err(|e| AppError::Retrieval(format!("Failed to query passages: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, title, body, metadata_json, embedding_bytes) =
                row.map_err(|e| AppError::Retrieval(format!("Failed to read passage: {}", e)))?;

            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let metadata: Metadata = serde_json::from_str(&metadata_json).map_err(|e| {
                AppError::Retrieval(format!("Invalid metadata for passage '{}': {}", id, e))
            })?;

            let similarity = cosine_similarity(query_embedding, &embedding).clamp(0.0, 1.0);
            let mut candidate = Candidate::new(id, body, similarity as f64).with_metadata(metadata);
            candidate.title = title;
            results.push(candidate);
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);

        tracing::debug!("Retrieved {} passages (requested top-{})", results.len(), limit);
        Ok(results)
    }

    pub fn count(&self) -> AppResult<u64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM passages", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u64)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count passages: {}", e)))
    }

    /// Delete all passages and index metadata.
    pub fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM passages; DELETE FROM index_meta;")
            .map_err(|e| AppError::Knowledge(format!("Failed to reset index: {}", e)))?;

        tracing::info!("Reset passage index");
        Ok(())
    }

    pub fn set_meta(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to write index metadata: {}", e)))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM index_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| AppError::Knowledge(format!("Failed to read index metadata: {}", e)))
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Retrieval(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn passage(id: &str, title: &str, embedding: Vec<f32>) -> IndexedPassage {
        let mut metadata = Metadata::new();
        metadata.insert("original_id".to_string(), serde_json::json!(format!("{}-orig", id)));
        IndexedPassage {
            id: id.to_string(),
            title: Some(title.to_string()),
            body: format!("{} 본문", title),
            metadata,
            embedding,
        }
    }

    #[test]
    fn test_open_creates_tables() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index.sqlite");
        let index = PassageIndex::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(index.path(), Some(path.as_path()));
        assert_eq!(index.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_search() {
        let index = PassageIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[
                passage("a", "서울", vec![1.0, 0.0, 0.0]),
                passage("b", "부산", vec![0.6, 0.8, 0.0]),
                passage("c", "대구", vec![0.0, 0.0, 1.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].title.as_deref(), Some("서울"));
        assert_eq!(results[0].metadata_str("original_id"), Some("a-orig"));
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(results[1].id, "b");
        assert!((results[1].similarity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_negative_similarity_clamped() {
        let index = PassageIndex::open_in_memory().unwrap();
        index
            .insert_batch(&[passage("opposite", "반대", vec![-1.0, 0.0])])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(results[0].similarity, 0.0);
    }

    #[test]
    fn test_zero_limit() {
        let index = PassageIndex::open_in_memory().unwrap();
        index.insert_batch(&[passage("a", "서울", vec![1.0])]).unwrap();
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let index = PassageIndex::open_in_memory().unwrap();
        index.insert_batch(&[passage("a", "서울", vec![1.0])]).unwrap();
        index.insert_batch(&[passage("a", "서울특별시", vec![1.0])]).unwrap();

        assert_eq!(index.count().unwrap(), 1);
        let results = index.search(&[1.0], 1).unwrap();
        assert_eq!(results[0].title.as_deref(), Some("서울특별시"));
    }

    #[test]
    fn test_reset_and_meta() {
        let index = PassageIndex::open_in_memory().unwrap();
        index.insert_batch(&[passage("a", "서울", vec![1.0])]).unwrap();
        index.set_meta("embedding", "ngram:char-ngram-v1:384").unwrap();
        assert_eq!(
            index.get_meta("embedding").unwrap().as_deref(),
            Some("ngram:char-ngram-v1:384")
        );

        index.reset().unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.get_meta("embedding").unwrap().is_none());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let embedding = vec![0.25, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&embedding)).unwrap(), embedding);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
