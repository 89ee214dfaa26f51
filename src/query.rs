//! Hybrid query execution and context formatting.
//!
//! Search is best-effort context enrichment for the chat flow: a
//! not-ready index or any mid-search failure degrades to a sentinel
//! string, never an error.

use std::{cmp::Ordering, collections::HashMap};

use tracing::warn;

use crate::{
    chunking::NoteChunk,
    embedding::{EmbedKind, cosine_similarity},
    error::Result,
    indexer::{IndexStatus, NoteIndexer},
    text_index::TextHit,
};

/// Returned when the index is unavailable or nothing matched.
pub const NO_RELEVANT_CONTENT: &str =
    "No relevant content found in the vault.";

/// Returned when the search itself failed.
pub const SEARCH_ERROR: &str = "Error searching vault.";

/// Upper bound on chunks scanned during vector search.
const VECTOR_CANDIDATE_CAP: usize = 1000;

/// Chunks at most this long are shown whole.
const SNIPPET_FULL_LIMIT: usize = 500;

/// Context window around the first query match, in characters.
const SNIPPET_BEFORE: usize = 200;
const SNIPPET_AFTER: usize = 300;

/// Which retrieval modes a query should use.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub use_vault_search: bool,
    pub use_vector_search: bool,
}

/// One fused search result.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: NoteChunk,
    pub score: f32,
}

impl NoteIndexer {
    /// Search the vault and render the results as a context block.
    ///
    /// Keyword-only unless vector search is enabled in both the
    /// options and the configuration and an embedding provider is
    /// configured, in which case keyword and vector results are fused.
    pub async fn search_vault(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> String {
        if !options.use_vault_search {
            return NO_RELEVANT_CONTENT.to_string();
        }
        if !matches!(self.status(), IndexStatus::Ready) {
            return NO_RELEVANT_CONTENT.to_string();
        }

        match self.search_chunks(query, options).await {
            Ok(results) if results.is_empty() => {
                NO_RELEVANT_CONTENT.to_string()
            }
            Ok(results) => format_context(query, &results),
            Err(e) => {
                warn!(error = %e, "vault search failed");
                SEARCH_ERROR.to_string()
            }
        }
    }

    /// Ranked, deduplicated results without formatting.
    pub async fn search_chunks(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<ScoredChunk>> {
        let max = self.config.max_search_results;
        let hybrid = options.use_vector_search
            && self.config.use_vector_search
            && self.embedder.is_some();

        if !hybrid {
            let hits = self.chunks.search(query, max)?;
            return Ok(hits.into_iter().map(scored).collect());
        }

        let vector_hits = self.vector_search(query, 2 * max).await?;
        let keyword_hits: Vec<ScoredChunk> = self
            .chunks
            .search(query, 2 * max)?
            .into_iter()
            .map(scored)
            .collect();

        Ok(merge_results(vector_hits, keyword_hits, max))
    }

    /// Cosine-similarity ranking of every embedded chunk against the
    /// query. Chunks without a stored vector are skipped, so an empty
    /// embedding store yields an empty result list, not an error.
    async fn vector_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let Some(embedder) = self.embedder.as_ref() else {
            return Ok(Vec::new());
        };
        let query_vector = embedder.embed(query, EmbedKind::Query).await?;

        let mut results = Vec::new();
        for chunk in self.chunks.all_chunks(VECTOR_CANDIDATE_CAP) {
            let Some(vector) = self.embeddings.get(&chunk.id) else {
                continue;
            };
            let score = cosine_similarity(&query_vector, vector)?;
            results.push(ScoredChunk {
                chunk: chunk.clone(),
                score,
            });
        }

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }
}

fn scored(hit: TextHit) -> ScoredChunk {
    ScoredChunk {
        chunk: hit.chunk,
        score: hit.score,
    }
}

fn sort_by_score(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    });
}

/// Fuse vector and keyword results into one ranked list.
///
/// Vector results seed the map; a keyword hit replaces an entry only
/// when its score is strictly higher. Ties keep the vector entry.
pub(crate) fn merge_results(
    vector_hits: Vec<ScoredChunk>,
    keyword_hits: Vec<ScoredChunk>,
    max: usize,
) -> Vec<ScoredChunk> {
    let mut merged: HashMap<String, ScoredChunk> = vector_hits
        .into_iter()
        .map(|r| (r.chunk.id.clone(), r))
        .collect();

    for hit in keyword_hits {
        match merged.get_mut(&hit.chunk.id) {
            Some(existing) => {
                if hit.score > existing.score {
                    *existing = hit;
                }
            }
            None => {
                merged.insert(hit.chunk.id.clone(), hit);
            }
        }
    }

    let mut results: Vec<ScoredChunk> = merged.into_values().collect();
    sort_by_score(&mut results);
    results.truncate(max);
    results
}

/// Render results as a context block for prompt injection.
pub(crate) fn format_context(query: &str, results: &[ScoredChunk]) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&format!("## {}\n", result.chunk.title));
        out.push_str(&format!("Source: {}\n", result.chunk.path));
        out.push_str(&format!("Score: {:.4}\n\n", result.score));
        out.push_str(&snippet(&result.chunk.content, query));
        out.push_str("\n\n----------\n\n");
    }
    out
}

/// Pick the part of a chunk worth showing.
///
/// Short chunks are shown whole. Longer chunks get a window centered
/// on the first case-insensitive occurrence of the query, or the
/// opening of the chunk when the query does not occur literally.
fn snippet(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();

    let window: String = if chars.len() <= SNIPPET_FULL_LIMIT {
        content.to_string()
    } else {
        let lower_content = content.to_lowercase();
        let lower_query = query.to_lowercase();

        if !lower_query.is_empty()
            && let Some(byte_pos) = lower_content.find(&lower_query)
        {
            let match_char = lower_content[..byte_pos].chars().count();
            let start = match_char.saturating_sub(SNIPPET_BEFORE);
            let end = (match_char + SNIPPET_AFTER).min(chars.len());
            chars[start.min(chars.len())..end].iter().collect()
        } else {
            chars[..SNIPPET_FULL_LIMIT].iter().collect()
        }
    };

    format!("{window}...")
}
