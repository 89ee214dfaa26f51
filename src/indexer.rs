//! Incremental indexing of vault notes.
//!
//! [`NoteIndexer`] owns the full index state: the full-text chunk
//! index, the embedding store, and the modification-time ledger. It is
//! the only writer; the query engine in [`crate::query`] reads through
//! `&self`. Hosts that need to share it across tasks wrap it in
//! `Arc<tokio::sync::RwLock<_>>`.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    chunking::chunk_note,
    config::{EmbeddingConfig, SearchConfig},
    embedding::{EmbedKind, Embedder, EmbeddingClient},
    embedding_store::EmbeddingStore,
    error::{Error, Result},
    persistence::INDEX_FILE_NAME,
    text_index::ChunkIndex,
    vault::{NoteMeta, Vault, extract_title},
};

/// Operational state surfaced to the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Uninitialized,
    Initializing,
    Indexing { indexed: usize, skipped: usize },
    Ready,
    Failed { message: String },
}

/// What `index_file` did with one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The note was (re)chunked and inserted.
    Indexed,
    /// Nothing to do: unchanged mtime, or the indexer has halted.
    Skipped,
}

/// Counters from a full vault scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub indexed: usize,
    pub skipped: usize,
}

/// The incremental indexer. One instance exclusively owns the index
/// state for its vault; there are no concurrent writers.
pub struct NoteIndexer {
    pub(crate) vault: Box<dyn Vault>,
    pub(crate) config: SearchConfig,
    pub(crate) embedder: Option<Arc<dyn Embedder>>,
    pub(crate) chunks: ChunkIndex,
    pub(crate) embeddings: EmbeddingStore,
    pub(crate) mtimes: BTreeMap<String, u64>,
    pub(crate) status: IndexStatus,
    pub(crate) dirty_since: Option<Instant>,
    pub(crate) sidecar_path: PathBuf,
}

impl NoteIndexer {
    /// Create an indexer over a vault with an empty index.
    pub fn new(vault: Box<dyn Vault>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let sidecar_path = vault.config_dir().join(INDEX_FILE_NAME);
        Ok(Self {
            vault,
            config,
            embedder: None,
            chunks: ChunkIndex::new()?,
            embeddings: EmbeddingStore::new(),
            mtimes: BTreeMap::new(),
            status: IndexStatus::Uninitialized,
            dirty_since: None,
            sidecar_path,
        })
    }

    pub fn status(&self) -> IndexStatus {
        self.status.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Timestamp of the first unsaved mutation, if any.
    pub fn dirty_since(&self) -> Option<Instant> {
        self.dirty_since
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty_since = Some(Instant::now());
    }

    /// Swap in an embedding backend. Production hosts go through
    /// [`NoteIndexer::update_embedding_config`]; tests inject fakes.
    pub fn set_embedder(&mut self, embedder: Arc<dyn Embedder>) {
        self.embedder = Some(embedder);
    }

    /// Point the indexer at a (new) embedding provider.
    pub fn update_embedding_config(&mut self, config: EmbeddingConfig) {
        self.embedder = Some(Arc::new(EmbeddingClient::new(config)));
    }

    /// Change chunking geometry. Takes effect for subsequently indexed
    /// files; existing chunks are untouched until their notes change.
    pub fn update_chunking_options(
        &mut self,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<()> {
        let candidate = SearchConfig {
            chunk_size,
            chunk_overlap,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn update_max_search_results(
        &mut self,
        max_search_results: usize,
    ) -> Result<()> {
        let candidate = SearchConfig {
            max_search_results,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// Bring the index up. Restores persisted state when possible, then
    /// re-scans the vault for drift; otherwise builds from scratch.
    ///
    /// Re-entrant calls while initialization is already underway are
    /// no-ops. Any failure leaves the indexer in `Failed` and
    /// propagates so the host can notify the user.
    pub async fn initialize(&mut self) -> Result<()> {
        if matches!(self.status, IndexStatus::Initializing) {
            return Ok(());
        }
        self.status = IndexStatus::Initializing;

        match self.initialize_inner().await {
            Ok(summary) => {
                self.status = IndexStatus::Ready;
                info!(
                    indexed = summary.indexed,
                    skipped = summary.skipped,
                    "index initialized"
                );
                Ok(())
            }
            Err(e) => {
                self.status = IndexStatus::Failed {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn initialize_inner(&mut self) -> Result<ScanSummary> {
        if self.load() {
            debug!(chunks = self.chunks.len(), "restored persisted index");
        } else {
            self.reset_state()?;
        }
        // Restored or fresh, scan for files created or edited since the
        // last persist.
        let summary = self.index_vault().await?;
        self.save()?;
        Ok(summary)
    }

    /// Index one note, incrementally.
    ///
    /// Skips outright when the ledger already records the note's
    /// current mtime; the stale-chunk lookup is bypassed entirely in
    /// that case. Otherwise stale chunks are deleted, the new content
    /// is chunked and (when vector search is on) embedded, and only
    /// then inserted; the ledger entry is written last.
    ///
    /// Any error flips the indexer to `Failed`, halting all further
    /// incremental indexing until an explicit [`NoteIndexer::reindex_all`].
    pub async fn index_file(&mut self, meta: &NoteMeta) -> Result<FileOutcome> {
        if matches!(self.status, IndexStatus::Failed { .. }) {
            return Ok(FileOutcome::Skipped);
        }

        match self.index_file_inner(meta).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.status = IndexStatus::Failed {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn index_file_inner(&mut self, meta: &NoteMeta) -> Result<FileOutcome> {
        if self.mtimes.get(&meta.path) == Some(&meta.mtime) {
            return Ok(FileOutcome::Skipped);
        }

        let stale = self.chunks.ids_for_path(&meta.path);
        if !stale.is_empty() {
            self.chunks.delete_many(&stale)?;
            for id in &stale {
                self.embeddings.remove(id);
            }
        }

        let content = self.vault.read_note(&meta.path)?;
        let title = extract_title(&content, &meta.title);
        let new_chunks = chunk_note(
            &meta.path,
            &title,
            &content,
            self.config.chunk_size,
            self.config.chunk_overlap,
        );

        if self.config.use_vector_search
            && let Some(embedder) = self.embedder.clone()
        {
            let mut vectors = Vec::with_capacity(new_chunks.len());
            for chunk in &new_chunks {
                let vector =
                    embedder.embed(&chunk.content, EmbedKind::Passage).await?;
                vectors.push((chunk.id.clone(), vector));
            }
            // All chunks embedded; only now does any of them land in
            // the store, ahead of full-text insertion.
            for (id, vector) in vectors {
                self.embeddings.insert(id, vector);
            }
        }

        debug!(path = %meta.path, chunks = new_chunks.len(), "indexing note");
        self.chunks.insert_many(new_chunks)?;
        self.mtimes.insert(meta.path.clone(), meta.mtime);
        self.mark_dirty();
        Ok(FileOutcome::Indexed)
    }

    /// Scan every note in the vault through [`NoteIndexer::index_file`].
    ///
    /// One bad file halts the whole batch: a partially embedded index
    /// would silently degrade hybrid search, so the scan fails loud and
    /// leaves recovery to an explicit full reindex.
    pub async fn index_vault(&mut self) -> Result<ScanSummary> {
        let notes = self.vault.list_notes()?;
        let mut summary = ScanSummary::default();

        for meta in &notes {
            if let IndexStatus::Failed { message } = &self.status {
                return Err(Error::IndexingFailed(message.clone()));
            }
            self.status = IndexStatus::Indexing {
                indexed: summary.indexed,
                skipped: summary.skipped,
            };
            match self.index_file(meta).await? {
                FileOutcome::Indexed => summary.indexed += 1,
                FileOutcome::Skipped => summary.skipped += 1,
            }
        }

        self.status = IndexStatus::Ready;
        Ok(summary)
    }

    /// Drop a deleted note's chunks from the index and embedding store.
    /// The ledger entry stays; it is only cleared by a full reindex.
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let ids = self.chunks.ids_for_path(path);
        if ids.is_empty() {
            return Ok(());
        }
        self.chunks.delete_many(&ids)?;
        for id in &ids {
            self.embeddings.remove(id);
        }
        self.mark_dirty();
        debug!(path, removed = ids.len(), "removed note from index");
        Ok(())
    }

    /// Discard all index state and rebuild from the vault. This is the
    /// recovery path out of `Failed`.
    pub async fn reindex_all(&mut self) -> Result<ScanSummary> {
        self.reset_state()?;
        self.status = IndexStatus::Initializing;
        let summary = self.index_vault().await?;
        self.save()?;
        info!(
            indexed = summary.indexed,
            "full reindex complete"
        );
        Ok(summary)
    }

    fn reset_state(&mut self) -> Result<()> {
        self.chunks = ChunkIndex::new()?;
        self.embeddings.clear();
        self.mtimes.clear();
        self.mark_dirty();
        Ok(())
    }

    /// Number of chunks currently indexed.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of notes with a ledger entry.
    pub fn tracked_note_count(&self) -> usize {
        self.mtimes.len()
    }

    /// Number of stored embedding vectors.
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }
}

impl std::fmt::Debug for NoteIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteIndexer")
            .field("status", &self.status)
            .field("chunks", &self.chunks.len())
            .field("embeddings", &self.embeddings.len())
            .finish_non_exhaustive()
    }
}
