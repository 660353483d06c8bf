//! Corpus loading as an observable state machine.
//!
//! `Idle -> Loading -> Ready | Failed`. A failed loader can be initialized
//! again; a ready loader returns immediately unless asked to reset.

use crate::corpus::{chunk_quality, load_korquad};
use crate::embeddings::EmbeddingProvider;
use crate::index::{IndexedPassage, PassageIndex};
use crate::progress::ProgressReporter;
use crate::types::{KnowledgeBaseConfig, LoadStats};
use chrono::{DateTime, Utc};
use korqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Index metadata key holding the embedding fingerprint.
pub const META_EMBEDDING: &str = "embedding";

/// Index metadata key holding the RFC 3339 time of the last completed load.
pub const META_LOADED_AT: &str = "loaded_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Point-in-time view of a [`DataLoader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStatus {
    pub state: LoaderState,
    pub is_loading: bool,
    pub is_ready: bool,
    /// Fraction complete in [0, 1]
    pub progress: f64,
    pub message: String,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: Option<f64>,
    pub stats: Option<LoadStats>,
}

#[derive(Debug)]
struct LoaderInner {
    state: LoaderState,
    progress: f64,
    message: String,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    stats: Option<LoadStats>,
}

impl Default for LoaderInner {
    fn default() -> Self {
        Self {
            state: LoaderState::Idle,
            progress: 0.0,
            message: "Waiting".to_string(),
            error: None,
            started_at: None,
            started: None,
            stats: None,
        }
    }
}

/// Fills a [`PassageIndex`] from a KorQuAD file.
#[derive(Debug)]
pub struct DataLoader {
    index: Arc<PassageIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: KnowledgeBaseConfig,
    reporter: ProgressReporter,
    inner: Mutex<LoaderInner>,
}

impl DataLoader {
    pub fn new(
        index: Arc<PassageIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: KnowledgeBaseConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
            reporter: ProgressReporter::noop(),
            inner: Mutex::new(LoaderInner::default()),
        }
    }

    pub fn with_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn index(&self) -> &Arc<PassageIndex> {
        &self.index
    }

    fn lock(&self) -> MutexGuard<'_, LoaderInner> {
        // The guarded data is plain status fields, always left consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> LoaderState {
        self.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LoaderState::Ready
    }

    pub fn status(&self) -> LoadStatus {
        let inner = self.lock();
        LoadStatus {
            state: inner.state,
            is_loading: inner.state == LoaderState::Loading,
            is_ready: inner.state == LoaderState::Ready,
            progress: inner.progress,
            message: inner.message.clone(),
            error: inner.error.clone(),
            started_at: inner.started_at,
            elapsed_secs: inner.started.map(|s| s.elapsed().as_secs_f64()),
            stats: inner.stats.clone(),
        }
    }

    fn update(&self, message: &str, progress: f64) {
        {
            let mut inner = self.lock();
            inner.message = message.to_string();
            inner.progress = progress;
        }
        tracing::info!("[{:.1}%] {}", progress * 100.0, message);
    }

    /// Bring the index to the ready state.
    ///
    /// Returns `Ok(false)` when another initialization is already running and
    /// `Ok(true)` once the index is ready. A non-empty index is reused without
    /// reading `data_path` unless `reset` is set. Failures move the loader to
    /// [`LoaderState::Failed`] and are also returned.
    pub async fn initialize(&self, data_path: Option<&Path>, reset: bool) -> AppResult<bool> {
        {
            let mut inner = self.lock();
            match inner.state {
                LoaderState::Loading => {
                    tracing::warn!("Initialization already in progress");
                    return Ok(false);
                }
                LoaderState::Ready if !reset => {
                    tracing::info!("Index already initialized");
                    return Ok(true);
                }
                _ => {}
            }

            inner.state = LoaderState::Loading;
            inner.progress = 0.0;
            inner.message = "Starting".to_string();
            inner.error = None;
            inner.started_at = Some(Utc::now());
            inner.started = Some(Instant::now());
        }

        let result = self.load(data_path, reset).await;

        let mut inner = self.lock();
        match result {
            Ok(stats) => {
                inner.state = LoaderState::Ready;
                inner.progress = 1.0;
                inner.message = "Ready".to_string();
                inner.stats = Some(stats);
                drop(inner);
                tracing::info!("Index ready");
                Ok(true)
            }
            Err(e) => {
                inner.state = LoaderState::Failed;
                inner.message = "Failed".to_string();
                inner.error = Some(e.to_string());
                drop(inner);
                tracing::error!("Data initialization failed: {}", e);
                Err(e)
            }
        }
    }

    /// Run [`initialize`](Self::initialize) on the tokio runtime and return
    /// immediately; poll [`status`](Self::status) for progress.
    pub fn spawn(
        self: Arc<Self>,
        data_path: Option<PathBuf>,
    ) -> tokio::task::JoinHandle<AppResult<bool>> {
        tokio::spawn(async move { self.initialize(data_path.as_deref(), false).await })
    }

    async fn load(&self, data_path: Option<&Path>, reset: bool) -> AppResult<LoadStats> {
        let start = Instant::now();
        self.update("Opening index", 0.1);

        if reset {
            self.index.reset()?;
        }

        let mut existing = self.index.count()?;
        if existing > 0 && self.index.get_meta(META_LOADED_AT)?.is_none() {
            tracing::warn!(
                "Index holds {} passages from an unfinished load; rebuilding",
                existing
            );
            self.index.reset()?;
            existing = 0;
        }

        if existing > 0 {
            self.check_embedding_fingerprint()?;
            self.update("Using existing index", 0.3);
            self.reporter.open(existing);
            tracing::info!("Found existing index with {} passages", existing);
            return Ok(LoadStats {
                passages: existing as usize,
                duration_secs: start.elapsed().as_secs_f64(),
                ..Default::default()
            });
        }

        let path = data_path
            .filter(|p| p.exists())
            .ok_or_else(|| AppError::Knowledge("Data file not found".to_string()))?;

        self.update("Parsing corpus", 0.2);
        self.reporter.parse(&path.display().to_string());
        let corpus = load_korquad(path, self.config.chunk_size, self.config.chunk_overlap)?;
        if corpus.passages.is_empty() {
            return Err(AppError::Knowledge("No passages found in corpus".to_string()));
        }

        self.update("Checking chunk quality", 0.4);
        let quality = chunk_quality(&corpus.passages);
        self.reporter.verify(quality.total as u64, quality.quality_score);
        tracing::info!(
            "Chunk quality: {:.1}% ({} short of {})",
            quality.quality_score,
            quality.short_chunks,
            quality.total
        );

        self.update("Embedding passages", 0.5);
        self.index
            .set_meta(META_EMBEDDING, &self.config.embedding.fingerprint())?;

        let total = corpus.passages.len();
        let batch_size = self.config.embedding.batch_size.max(1);
        let mut done = 0usize;

        for batch in corpus.passages.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.body.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Embedding provider returned {} vectors for {} passages",
                    embeddings.len(),
                    batch.len()
                )));
            }

            let indexed: Vec<IndexedPassage> = batch
                .iter()
                .zip(embeddings)
                .map(|(passage, embedding)| IndexedPassage {
                    id: passage.id.clone(),
                    title: passage.title.clone(),
                    body: passage.body.clone(),
                    metadata: passage.metadata.clone(),
                    embedding,
                })
                .collect();
            self.index.insert_batch(&indexed)?;

            done += batch.len();
            let progress = 0.7 + (done as f64 / total as f64) * 0.2;
            self.update(&format!("Embedding passages ({}/{})", done, total), progress);
            self.reporter
                .embed(done as u64, total as u64, self.embedder.model_name());

            tokio::task::yield_now().await;
        }

        self.update("Verifying index", 0.95);
        let count = self.index.count()?;
        self.reporter.index(count);
        self.index.set_meta(META_LOADED_AT, &Utc::now().to_rfc3339())?;

        tracing::info!(
            "Loaded {} passages from {} articles in {:.2}s",
            count,
            corpus.articles,
            start.elapsed().as_secs_f64()
        );

        Ok(LoadStats {
            articles: corpus.articles,
            paragraphs: corpus.paragraphs,
            passages: count as usize,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn check_embedding_fingerprint(&self) -> AppResult<()> {
        let expected = self.config.embedding.fingerprint();
        match self.index.get_meta(META_EMBEDDING)? {
            Some(stored) if stored != expected => Err(AppError::Config(format!(
                "Index was built with embedding '{}' but the config uses '{}'. Reload with --reset.",
                stored, expected
            ))),
            _ => Ok(()),
        }
    }
}
