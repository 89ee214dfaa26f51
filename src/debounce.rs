//! Debounced change notifications for the indexer.
//!
//! Editors save constantly; re-chunking and re-embedding a note on
//! every keystroke-save would thrash the embedding provider. Each
//! changed path gets its own cooldown timer, reset on every further
//! change, and the note is indexed only once the timer expires.
//! [`NoteDebouncer::flush_pending`] short-circuits the timers when
//! fresh results are needed immediately, e.g. right before a query.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::indexer::NoteIndexer;

/// Cooldown between the last observed change to a note and its
/// re-index.
pub const DEBOUNCE_DELAY: Duration = Duration::from_secs(5);

/// Per-path debounce front end over a shared [`NoteIndexer`].
pub struct NoteDebouncer {
    indexer: Arc<RwLock<NoteIndexer>>,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    delay: Duration,
}

impl NoteDebouncer {
    pub fn new(indexer: Arc<RwLock<NoteIndexer>>) -> Self {
        Self::with_delay(indexer, DEBOUNCE_DELAY)
    }

    pub fn with_delay(
        indexer: Arc<RwLock<NoteIndexer>>,
        delay: Duration,
    ) -> Self {
        Self {
            indexer,
            pending: Arc::new(Mutex::new(HashMap::new())),
            delay,
        }
    }

    /// Record a change to a note. Resets the note's cooldown timer;
    /// the note is indexed `delay` after its last reported change.
    pub async fn note_changed(&self, path: &str) {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.remove(path) {
            previous.abort();
        }

        let indexer = self.indexer.clone();
        let map = self.pending.clone();
        let delay = self.delay;
        let task_path = path.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            map.lock().await.remove(&task_path);
            index_path(&indexer, &task_path).await;
        });
        pending.insert(path.to_string(), handle);
    }

    /// Record a note deletion. Removal is cheap, so it happens
    /// immediately; any pending re-index for the path is cancelled.
    pub async fn note_removed(&self, path: &str) {
        if let Some(previous) = self.pending.lock().await.remove(path) {
            previous.abort();
        }
        let mut indexer = self.indexer.write().await;
        if let Err(e) = indexer.remove_file(path) {
            warn!(path, error = %e, "failed to remove note from index");
        }
    }

    /// Cancel every outstanding timer and index the affected notes
    /// now. Called before a query so results reflect recent edits.
    pub async fn flush_pending(&self) {
        let drained: Vec<(String, JoinHandle<()>)> = {
            let mut pending = self.pending.lock().await;
            pending.drain().collect()
        };
        if drained.is_empty() {
            return;
        }

        debug!(notes = drained.len(), "flushing pending note changes");
        let mut paths = Vec::with_capacity(drained.len());
        for (path, handle) in drained {
            handle.abort();
            paths.push(path);
        }
        paths.sort();
        for path in paths {
            index_path(&self.indexer, &path).await;
        }
    }

    /// Number of notes currently waiting out their cooldown.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

async fn index_path(indexer: &Arc<RwLock<NoteIndexer>>, path: &str) {
    let mut indexer = indexer.write().await;
    let meta = match indexer.vault.note_meta(path) {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            // Deleted between the change event and the timer firing.
            if let Err(e) = indexer.remove_file(path) {
                warn!(path, error = %e, "failed to remove vanished note");
            }
            return;
        }
        Err(e) => {
            warn!(path, error = %e, "failed to stat changed note");
            return;
        }
    };
    if let Err(e) = indexer.index_file(&meta).await {
        warn!(path, error = %e, "failed to index changed note");
    }
}

impl Drop for NoteDebouncer {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.try_lock() {
            for (_, handle) in pending.drain() {
                handle.abort();
            }
        }
    }
}
