//! Splitting notes into overlapping, exactly reconstructible chunks.
//!
//! Chunks are fixed-size character windows: every chunk except the last
//! is exactly `chunk_size` characters, and consecutive chunks share a
//! `chunk_overlap`-character suffix/prefix. Stripping the leading
//! `chunk_overlap` characters from every chunk after the first and
//! concatenating reproduces the original content byte for byte.

use serde::{Deserialize, Serialize};

/// One indexed fragment of a note.
///
/// A note that fits in a single chunk keeps the note's own id; longer
/// notes produce ids `"<path>-chunk-0"`, `"<path>-chunk-1"`, ... in
/// content order with no gaps. Callers rely on the single-chunk id
/// shortcut when deleting by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteChunk {
    pub id: String,
    pub path: String,
    pub title: String,
    pub content: String,
}

/// Split note content into chunks.
///
/// Pure function of its inputs: no I/O, deterministic, restartable.
/// Sizes are in characters, not bytes, so multi-byte UTF-8 content is
/// never split mid-character.
///
/// Degenerate configurations (overlap >= size - 1) would stall the
/// walk; the loop stops early once the next start position would not
/// advance past the current one or would land on the final character.
pub fn chunk_note(
    path: &str,
    title: &str,
    content: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<NoteChunk> {
    let char_count = content.chars().count();

    // Short notes are indexed whole, reusing the note id.
    if char_count <= chunk_size {
        return vec![NoteChunk {
            id: path.to_string(),
            path: path.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }];
    }

    // Char index -> byte index map for O(1) slicing.
    let char_to_byte: Vec<usize> = content
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(content.len()))
        .collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    loop {
        let end = (start + chunk_size).min(char_count);
        let slice = &content[char_to_byte[start]..char_to_byte[end]];
        chunks.push(NoteChunk {
            id: format!("{path}-chunk-{index}"),
            path: path.to_string(),
            title: title.to_string(),
            content: slice.to_string(),
        });
        index += 1;

        if end == char_count {
            break;
        }

        let next = (start + chunk_size).saturating_sub(chunk_overlap);
        if next <= start || next >= char_count - 1 {
            break;
        }
        start = next;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[NoteChunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.content);
            } else {
                out.extend(chunk.content.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn short_note_single_chunk_keeps_note_id() {
        let chunks = chunk_note("a.md", "A", "Hello, world!", 200, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "a.md");
        assert_eq!(chunks[0].content, "Hello, world!");
    }

    #[test]
    fn boundary_length_still_single_chunk() {
        let content = "x".repeat(200);
        let chunks = chunk_note("a.md", "A", &content, 200, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "a.md");
    }

    #[test]
    fn chunk_ids_are_contiguous() {
        let content = "y".repeat(1000);
        let chunks = chunk_note("note.md", "N", &content, 200, 50);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("note.md-chunk-{i}"));
        }
    }

    #[test]
    fn seven_seventy_chars_with_overlap_fifty() {
        let content: String = (0..770)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        let chunks = chunk_note("n.md", "N", &content, 200, 50);

        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.content.chars().count(), 200);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .content
                .chars()
                .skip(pair[0].content.chars().count() - 50)
                .collect();
            let head: String = pair[1].content.chars().take(50).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(reassemble(&chunks, 50), content);
    }

    #[test]
    fn reconstruction_across_configs() {
        let content: String = "the quick brown fox jumps over the lazy dog "
            .repeat(40);
        for (size, overlap) in [(100, 0), (128, 32), (333, 100), (50, 49)] {
            let chunks = chunk_note("n.md", "N", &content, size, overlap);
            let rebuilt = reassemble(&chunks, overlap);
            assert!(
                content.starts_with(&rebuilt),
                "size={size} overlap={overlap}"
            );
            // With overlap < size - 1 the tail is never dropped.
            if overlap + 1 < size {
                assert_eq!(rebuilt, content, "size={size} overlap={overlap}");
            }
        }
    }

    #[test]
    fn degenerate_overlap_terminates() {
        let content = "z".repeat(5000);
        // overlap == size would never advance without the guard
        let chunks = chunk_note("n.md", "N", &content, 100, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content.chars().count(), 100);
    }

    #[test]
    fn multibyte_content_splits_on_char_boundaries() {
        let content = "café ☕ naïve 日本語 🎉 ".repeat(60);
        let chunks = chunk_note("n.md", "N", &content, 100, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 100);
        }
        assert_eq!(reassemble(&chunks, 20), content);
    }

    #[test]
    fn last_chunk_may_be_short() {
        let content = "q".repeat(450);
        let chunks = chunk_note("n.md", "N", &content, 200, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].content.chars().count(), 50);
    }
}
