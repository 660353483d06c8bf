//! Text chunking with configurable size and overlap.
//!
//! Sizes and offsets are counted in characters, not bytes, so Hangul text is
//! split at the same points as Latin text of equal length.

/// A slice of a paragraph, with character offsets into the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub position: u32,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Chunk text into overlapping segments of at most `chunk_size` characters.
///
/// Text that fits in one chunk is returned whole. Chunking stops once a
/// chunk reaches the end of the text, and a trailing fragment shorter than
/// 10% of `chunk_size` is dropped when earlier chunks already cover it.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    if chars.iter().all(|c| c.is_whitespace()) || chunk_size == 0 {
        return vec![];
    }

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());

        if !chunks.is_empty() && end - start < chunk_size / 10 {
            break;
        }

        let slice: String = chars[start..end].iter().collect();
        let trimmed = slice.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                position,
                text: trimmed.to_string(),
                start,
                end,
            });
            position += 1;
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    tracing::trace!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
