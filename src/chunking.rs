//! Document chunking.
//!
//! Provides the [`Chunker`] trait and [`SentenceChunker`], a sliding-window
//! splitter that packs sentence and paragraph units into passages of bounded
//! size with a configurable overlap, so that no semantic unit is fully lost
//! at a passage boundary.

/// A strategy for splitting document text into ordered passages.
///
/// Passage order is stable and matches document order. Chunk indices are
/// assigned by the ingestion pipeline, densely from 0.
pub trait Chunker: Send + Sync {
    /// Split document text into passages.
    ///
    /// Deterministic: the same input and configuration always yield the same
    /// passage sequence. Returns an empty `Vec` for empty text.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Boundaries a passage prefers to end on, tried in order at each position.
const UNIT_SEPARATORS: [&str; 4] = ["\n\n", ". ", "! ", "? "];

/// Splits text at sentence/paragraph boundaries and packs the units into
/// passages of at most `chunk_size` characters, with consecutive passages
/// overlapping by roughly `chunk_overlap` characters.
///
/// Units longer than `chunk_size` (no usable boundary) are hard-split by
/// character count.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum passage size in characters
    /// * `chunk_overlap` — overlap carried between consecutive passages
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for SentenceChunker {
    fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut passages = Vec::new();
        let mut current = String::new();

        for unit in split_units(text) {
            if unit.len() > self.chunk_size {
                // No boundary inside the window; flush and hard-split.
                if !current.trim().is_empty() {
                    passages.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                passages.extend(split_by_size(unit, self.chunk_size, self.chunk_overlap));
            } else if current.len() + unit.len() <= self.chunk_size {
                current.push_str(unit);
            } else {
                let tail = overlap_tail(&current, self.chunk_overlap).to_string();
                passages.push(std::mem::take(&mut current));
                if tail.len() + unit.len() <= self.chunk_size {
                    current = tail;
                }
                current.push_str(unit);
            }
        }

        if !current.trim().is_empty() {
            passages.push(current);
        }

        passages
    }
}

/// Split text into sentence/paragraph units, keeping each separator attached
/// to the unit it terminates.
fn split_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let matched = UNIT_SEPARATORS.iter().find(|sep| rest.starts_with(**sep));
        if let Some(sep) = matched {
            let end = i + sep.len();
            units.push(&text[start..end]);
            start = end;
            i = end;
        } else {
            i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }

    if start < text.len() {
        units.push(&text[start..]);
    }

    units
}

/// The trailing `overlap` characters of a passage, aligned to a char boundary.
fn overlap_tail(s: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    if s.len() <= overlap {
        return s;
    }
    let mut idx = s.len() - overlap;
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    &s[idx..]
}

/// Character-count splitting with overlap, for units without any usable
/// boundary. Split points are rounded up to char boundaries.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        let mut next = start + step;
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}
