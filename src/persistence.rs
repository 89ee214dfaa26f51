//! Index sidecar persistence and the debounced auto-save task.
//!
//! The whole index state persists as one JSON sidecar inside the
//! vault's private configuration directory, with exactly three
//! top-level fields: `serializedIndex` (the full-text index's own
//! transportable string form), `fileModificationTimes` (path -> last
//! indexed mtime), and `documentEmbeddings` (chunk id -> vector, empty
//! when vector search is off).

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    embedding_store::EmbeddingStore,
    error::{Error, Result},
    indexer::{IndexStatus, NoteIndexer},
    text_index::ChunkIndex,
};

/// Sidecar filename inside the vault's config directory.
pub const INDEX_FILE_NAME: &str = "search-index.json";

/// How often the auto-save task checks the dirty flag.
pub const AUTOSAVE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// How long the index must stay dirty before an auto-save fires. New
/// mutations push the deadline out, batching bursts of edits into one
/// disk write.
pub const AUTOSAVE_DIRTY_THRESHOLD: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize)]
struct IndexSidecar {
    #[serde(rename = "serializedIndex")]
    serialized_index: String,
    #[serde(rename = "fileModificationTimes")]
    file_modification_times: BTreeMap<String, u64>,
    #[serde(rename = "documentEmbeddings")]
    document_embeddings: BTreeMap<String, Vec<f32>>,
}

impl NoteIndexer {
    /// Persist the full index state to the sidecar file.
    ///
    /// Fails when the index is not ready. Clears the dirty flag on
    /// success.
    pub fn save(&mut self) -> Result<()> {
        if !matches!(
            self.status,
            IndexStatus::Ready | IndexStatus::Indexing { .. }
        ) {
            return Err(Error::IndexNotReady);
        }

        let sidecar = IndexSidecar {
            serialized_index: self.chunks.to_serialized()?,
            file_modification_times: self.mtimes.clone(),
            document_embeddings: if self.config.use_vector_search {
                self.embeddings.snapshot()
            } else {
                BTreeMap::new()
            },
        };

        if let Some(parent) = self.sidecar_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.sidecar_path, serde_json::to_string(&sidecar)?)?;

        self.dirty_since = None;
        debug!(
            path = %self.sidecar_path.display(),
            chunks = self.chunks.len(),
            "index saved"
        );
        Ok(())
    }

    /// Restore persisted state from the sidecar.
    ///
    /// Returns `false` when no sidecar exists or when it cannot be
    /// read or parsed; corruption is recoverable and the caller falls
    /// back to a full rebuild. Returns `true` and marks the index
    /// ready on success.
    pub fn load(&mut self) -> bool {
        match self.try_load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "discarding unreadable index sidecar");
                false
            }
        }
    }

    fn try_load(&mut self) -> Result<bool> {
        if !self.sidecar_path.exists() {
            return Ok(false);
        }

        let raw = std::fs::read_to_string(&self.sidecar_path)?;
        let sidecar: IndexSidecar = serde_json::from_str(&raw)?;

        self.chunks = ChunkIndex::from_serialized(&sidecar.serialized_index)?;
        self.mtimes = sidecar.file_modification_times;
        self.embeddings =
            EmbeddingStore::from_inner(sidecar.document_embeddings);
        self.status = IndexStatus::Ready;
        self.dirty_since = None;
        Ok(true)
    }
}

/// Handle to the background auto-save task.
pub struct AutosaveTask {
    handle: tokio::task::JoinHandle<()>,
}

impl AutosaveTask {
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for AutosaveTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the recurring dirty check.
///
/// Once the index has been continuously dirty for
/// [`AUTOSAVE_DIRTY_THRESHOLD`], the task saves it. A not-yet-ready
/// index is simply checked again on the next tick. Save failures here
/// are logged and swallowed; the periodic save is best effort.
pub fn spawn_autosave(indexer: Arc<RwLock<NoteIndexer>>) -> AutosaveTask {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(AUTOSAVE_CHECK_INTERVAL);
        ticker.set_missed_tick_behavior(
            tokio::time::MissedTickBehavior::Delay,
        );
        loop {
            ticker.tick().await;

            let mut guard = indexer.write().await;
            let due = guard
                .dirty_since()
                .is_some_and(|t| t.elapsed() >= AUTOSAVE_DIRTY_THRESHOLD);
            if !due {
                continue;
            }
            if !matches!(guard.status(), IndexStatus::Ready) {
                continue;
            }
            if let Err(e) = guard.save() {
                warn!(error = %e, "periodic index save failed");
            }
        }
    });
    AutosaveTask { handle }
}

/// Shut the persistence layer down: cancel the auto-save task and, if
/// there are unsaved mutations, make one best-effort final save.
pub async fn cleanup(task: AutosaveTask, indexer: &Arc<RwLock<NoteIndexer>>) {
    task.cancel();
    let mut guard = indexer.write().await;
    if guard.dirty_since().is_some() {
        if let Err(e) = guard.save() {
            warn!(error = %e, "final index save failed");
        }
    }
}
