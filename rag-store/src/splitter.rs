//! Sentence-aware text splitter.
//!
//! Text is cut into sentence/paragraph pieces which are then merged into
//! chunks of at most `chunk_size` characters. Trailing pieces of a chunk (up
//! to `chunk_overlap` characters) are repeated at the start of the next one
//! so answers spanning a boundary still retrieve together. A single piece
//! longer than `chunk_size` is cut by characters with the same overlap.
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is never
//! split inside a code point.

use tracing::debug;

use crate::config::RagConfig;
use crate::record::{Document, TextChunk};

#[derive(Clone, Debug)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(cfg: &RagConfig) -> Self {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    /// Splits every document, keeping document order and metadata.
    pub fn split_documents(&self, docs: &[Document]) -> Vec<TextChunk> {
        let mut out = Vec::new();
        for doc in docs {
            for (i, text) in self.split_text(&doc.text).into_iter().enumerate() {
                out.push(TextChunk {
                    document_id: doc.id.clone(),
                    chunk_index: i,
                    text,
                    metadata: doc.metadata.clone(),
                });
            }
        }
        debug!(
            documents = docs.len(),
            chunks = out.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "documents split"
        );
        out
    }

    /// Splits a single text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        for piece in split_sentences(text) {
            if char_len(&piece) > self.chunk_size {
                pieces.extend(split_chars(&piece, self.chunk_size, self.chunk_overlap));
            } else {
                pieces.push(piece);
            }
        }

        self.merge(&pieces)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Merge pieces (each at most `chunk_size` chars) into chunks.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let lens: Vec<usize> = pieces.iter().map(|p| char_len(p)).collect();
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        // index of the first piece contributing to `current`
        let mut window_start = 0usize;

        for (idx, piece) in pieces.iter().enumerate() {
            if current_len > 0 && current_len + lens[idx] > self.chunk_size {
                chunks.push(std::mem::take(&mut current));

                // Walk back from the end of the window while the overlap fits
                // both the overlap budget and the room left for this piece.
                let room = self.chunk_size - lens[idx];
                let budget = self.chunk_overlap.min(room);
                let mut overlap_len = 0usize;
                let mut overlap_start = idx;
                for i in (window_start..idx).rev() {
                    if overlap_len + lens[i] > budget {
                        break;
                    }
                    overlap_len += lens[i];
                    overlap_start = i;
                }

                for p in &pieces[overlap_start..idx] {
                    current.push_str(p);
                }
                current_len = overlap_len;
                window_start = overlap_start;
            }

            current.push_str(piece);
            current_len += lens[idx];
        }

        if current_len > 0 {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits on paragraph breaks and on `.`, `?`, `!` followed by whitespace.
/// Separators stay attached to the preceding piece.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let next = chars.peek().copied();

        let paragraph_break = c == '\n' && next == Some('\n');
        let sentence_end = matches!(c, '.' | '?' | '!') && next.is_some_and(char::is_whitespace);

        if paragraph_break || sentence_end {
            // swallow the whitespace run so the next piece starts on content
            while let Some(w) = chars.peek().copied() {
                if !w.is_whitespace() {
                    break;
                }
                current.push(w);
                chars.next();
            }
            out.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Fixed-size character windows with overlap.
fn split_chars(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}
