//! In-memory chunk id -> embedding vector map.
//!
//! Mirrored to disk as the `documentEmbeddings` field of the index
//! sidecar; see [`crate::persistence`].

use std::collections::BTreeMap;

/// Embedding vectors keyed by chunk id.
///
/// A `BTreeMap` keeps the serialized sidecar stable across saves.
#[derive(Debug, Default, Clone)]
pub struct EmbeddingStore {
    vectors: BTreeMap<String, Vec<f32>>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk_id: String, vector: Vec<f32>) {
        self.vectors.insert(chunk_id, vector);
    }

    pub fn remove(&mut self, chunk_id: &str) -> bool {
        self.vectors.remove(chunk_id).is_some()
    }

    pub fn get(&self, chunk_id: &str) -> Option<&[f32]> {
        self.vectors.get(chunk_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, Vec<f32>> {
        self.vectors
    }

    pub(crate) fn from_inner(vectors: BTreeMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, Vec<f32>> {
        self.vectors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut store = EmbeddingStore::new();
        store.insert("a.md".into(), vec![1.0, 2.0]);

        assert_eq!(store.get("a.md"), Some([1.0, 2.0].as_slice()));
        assert_eq!(store.len(), 1);

        assert!(store.remove("a.md"));
        assert!(!store.remove("a.md"));
        assert!(store.get("a.md").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn insert_overwrites() {
        let mut store = EmbeddingStore::new();
        store.insert("a.md".into(), vec![1.0]);
        store.insert("a.md".into(), vec![2.0]);
        assert_eq!(store.get("a.md"), Some([2.0].as_slice()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_empties_store() {
        let mut store = EmbeddingStore::new();
        store.insert("a".into(), vec![1.0]);
        store.insert("b".into(), vec![2.0]);
        store.clear();
        assert!(store.is_empty());
    }
}
