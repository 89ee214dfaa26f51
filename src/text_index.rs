//! Full-text index over note chunks.
//!
//! Wraps an in-RAM Tantivy index behind the narrow contract the rest of
//! the crate relies on: bulk insert, delete by chunk id, ranked search,
//! and a transportable string form. A side map of chunk id -> chunk
//! carries the authoritative copy of every indexed chunk; it backs
//! exact path lookups, the vector-search candidate scan, and
//! serialization, while Tantivy owns tokenization and BM25 scoring.

use std::collections::HashMap;

use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    collector::TopDocs,
    doc,
    query::QueryParser,
    schema::{
        Field,
        IndexRecordOption,
        STORED,
        STRING,
        Schema,
        TextFieldIndexing,
        TextOptions,
        Value,
    },
    tokenizer::{
        LowerCaser,
        RemoveLongFilter,
        SimpleTokenizer,
        Stemmer,
        TextAnalyzer,
    },
};

use crate::{chunking::NoteChunk, error::Result};

const WRITER_MEMORY_BUDGET: usize = 15_000_000;

/// A keyword search hit.
#[derive(Debug, Clone)]
pub struct TextHit {
    pub chunk: NoteChunk,
    pub score: f32,
}

#[derive(Clone, Copy)]
struct Fields {
    id: Field,
    title: Field,
    content: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();

    let id = builder.add_text_field("id", STRING | STORED);

    let stemmed = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("en_stem")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    let title = builder.add_text_field("title", stemmed.clone());
    let content = builder.add_text_field("content", stemmed);

    let schema = builder.build();
    let fields = Fields { id, title, content };
    (schema, fields)
}

fn register_tokenizers(index: &Index) {
    let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(Stemmer::new(tantivy::tokenizer::Language::English))
        .build();
    index.tokenizers().register("en_stem", en_stem);
}

/// Full-text index plus the authoritative chunk map.
pub struct ChunkIndex {
    index: Index,
    writer: IndexWriter,
    reader: IndexReader,
    fields: Fields,
    docs: HashMap<String, NoteChunk>,
}

impl ChunkIndex {
    /// Create an empty index.
    pub fn new() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizers(&index);
        let writer = index.writer(WRITER_MEMORY_BUDGET)?;
        let reader = index.reader()?;

        Ok(Self {
            index,
            writer,
            reader,
            fields,
            docs: HashMap::new(),
        })
    }

    /// Insert chunks, replacing any existing chunks with the same ids.
    /// Commits once for the whole batch.
    pub fn insert_many(&mut self, chunks: Vec<NoteChunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            let term =
                tantivy::Term::from_field_text(self.fields.id, &chunk.id);
            self.writer.delete_term(term);
            self.writer.add_document(doc!(
                self.fields.id => chunk.id.as_str(),
                self.fields.title => chunk.title.as_str(),
                self.fields.content => chunk.content.as_str(),
            ))?;
            self.docs.insert(chunk.id.clone(), chunk);
        }
        self.writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Delete chunks by id. Commits once for the whole batch.
    pub fn delete_many(&mut self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        for id in ids {
            let term = tantivy::Term::from_field_text(self.fields.id, id);
            self.writer.delete_term(term);
            self.docs.remove(id);
        }
        self.writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Keyword search with BM25 scoring. The title field is boosted 2x.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<TextHit>> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let mut parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.content],
        );
        parser.set_field_boost(self.fields.title, 2.0);

        let (query, _errors) = parser.parse_query_lenient(query_str);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let id = doc
                .get_first(self.fields.id)
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if let Some(chunk) = self.docs.get(id) {
                results.push(TextHit {
                    chunk: chunk.clone(),
                    score,
                });
            }
        }
        Ok(results)
    }

    /// Ids of every chunk whose source path matches exactly.
    pub fn ids_for_path(&self, path: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .docs
            .values()
            .filter(|c| c.path == path)
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Iterate stored chunks, bounded by `cap`.
    pub fn all_chunks(&self, cap: usize) -> Vec<&NoteChunk> {
        self.docs.values().take(cap).collect()
    }

    pub fn get(&self, id: &str) -> Option<&NoteChunk> {
        self.docs.get(id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Serialize to the index's transportable string form: the chunk
    /// set as JSON, replayed through [`ChunkIndex::from_serialized`] on
    /// restore. Chunks are ordered by id so the output is stable.
    pub fn to_serialized(&self) -> Result<String> {
        let mut chunks: Vec<&NoteChunk> = self.docs.values().collect();
        chunks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(serde_json::to_string(&chunks)?)
    }

    /// Rebuild an index from its transportable string form.
    pub fn from_serialized(serialized: &str) -> Result<Self> {
        let chunks: Vec<NoteChunk> = serde_json::from_str(serialized)?;
        let mut index = Self::new()?;
        index.insert_many(chunks)?;
        Ok(index)
    }
}

impl std::fmt::Debug for ChunkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkIndex")
            .field("chunks", &self.docs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, path: &str, title: &str, content: &str) -> NoteChunk {
        NoteChunk {
            id: id.into(),
            path: path.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    fn sample_index() -> ChunkIndex {
        let mut index = ChunkIndex::new().unwrap();
        index
            .insert_many(vec![
                chunk(
                    "rust.md",
                    "rust.md",
                    "The Rust Language",
                    "Rust is a systems programming language focused on \
                     safety and performance.",
                ),
                chunk(
                    "pasta.md",
                    "pasta.md",
                    "How to Cook Pasta",
                    "Boil water, add salt, cook the pasta, drain and serve.",
                ),
                chunk(
                    "long.md-chunk-0",
                    "long.md",
                    "Long Note",
                    "First half about gardening and compost.",
                ),
                chunk(
                    "long.md-chunk-1",
                    "long.md",
                    "Long Note",
                    "Second half about watering and pruning.",
                ),
            ])
            .unwrap();
        index
    }

    #[test]
    fn insert_and_search() {
        let index = sample_index();
        let hits = index.search("rust programming", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].chunk.id, "rust.md");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn stemming_matches_inflections() {
        let index = sample_index();
        // "gardens" should stem to match "gardening"
        let hits = index.search("gardens", 10).unwrap();
        assert!(hits.iter().any(|h| h.chunk.id == "long.md-chunk-0"));
    }

    #[test]
    fn title_boost_ranks_title_match_first() {
        let mut index = ChunkIndex::new().unwrap();
        index
            .insert_many(vec![
                chunk("a.md", "a.md", "Tea Guide", "brewing instructions"),
                chunk("b.md", "b.md", "Brewing", "a guide about tea leaves"),
            ])
            .unwrap();
        let hits = index.search("tea", 10).unwrap();
        assert_eq!(hits[0].chunk.id, "a.md");
    }

    #[test]
    fn insert_same_id_replaces() {
        let mut index = sample_index();
        index
            .insert_many(vec![chunk(
                "rust.md",
                "rust.md",
                "Updated",
                "completely different text about zebras",
            )])
            .unwrap();

        assert_eq!(index.len(), 4);
        let hits = index.search("zebras", 10).unwrap();
        assert_eq!(hits.len(), 1);
        let stale = index.search("systems programming", 10).unwrap();
        assert!(stale.iter().all(|h| h.chunk.id != "rust.md"));
    }

    #[test]
    fn delete_removes_from_search_and_map() {
        let mut index = sample_index();
        index
            .delete_many(&["pasta.md".to_string()])
            .unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.get("pasta.md").is_none());
        assert!(index.search("pasta", 10).unwrap().is_empty());
    }

    #[test]
    fn ids_for_path_exact_match_only() {
        let index = sample_index();
        let ids = index.ids_for_path("long.md");
        assert_eq!(ids, vec!["long.md-chunk-0", "long.md-chunk-1"]);
        assert!(index.ids_for_path("long").is_empty());
    }

    #[test]
    fn all_chunks_respects_cap() {
        let index = sample_index();
        assert_eq!(index.all_chunks(2).len(), 2);
        assert_eq!(index.all_chunks(1000).len(), 4);
    }

    #[test]
    fn serialized_roundtrip_preserves_search() {
        let index = sample_index();
        let serialized = index.to_serialized().unwrap();

        let restored = ChunkIndex::from_serialized(&serialized).unwrap();
        assert_eq!(restored.len(), index.len());
        let hits = restored.search("pasta", 10).unwrap();
        assert_eq!(hits[0].chunk.id, "pasta.md");
    }

    #[test]
    fn serialized_form_is_stable() {
        let index = sample_index();
        assert_eq!(
            index.to_serialized().unwrap(),
            index.to_serialized().unwrap()
        );
    }

    #[test]
    fn search_empty_index() {
        let index = ChunkIndex::new().unwrap();
        assert!(index.search("anything", 10).unwrap().is_empty());
    }
}
