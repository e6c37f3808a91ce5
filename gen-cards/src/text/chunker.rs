//! Splitting preprocessed documents into prompt-sized chunks.
//!
//! Natural boundaries win over raw length: chapter headings first, then
//! blank-line paragraphs, then a length cut that backs up to the nearest
//! newline or sentence end.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default chunk budget in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

/// Fraction of the window a boundary must fall past to be preferred
/// over an exact cut.
const BOUNDARY_WINDOW: f64 = 0.7;

static CHAPTER_HEADINGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"第[一二三四五六七八九十百千0-9]+章|Chapter\s+\d+|Section\s+\d+")
        .expect("chapter heading pattern should compile")
});

/// Split `content` into ordered chunks of at most `max_chunk_size`
/// characters, except that intact chapters and single oversized
/// paragraphs are never cut.
pub fn chunk_content(content: &str, max_chunk_size: usize) -> Vec<String> {
    if content.is_empty() || max_chunk_size == 0 {
        return Vec::new();
    }

    if has_clear_chapters(content) {
        let chunks = split_by_chapters(content);
        if chunks.len() > 1 {
            return chunks;
        }
        return split_by_length(content, max_chunk_size);
    }

    if has_paragraphs(content) {
        split_by_paragraphs(content, max_chunk_size)
    } else {
        split_by_length(content, max_chunk_size)
    }
}

fn has_clear_chapters(content: &str) -> bool {
    CHAPTER_HEADINGS.is_match(content)
}

fn has_paragraphs(content: &str) -> bool {
    content.split("\n\n").count() > 5
}

/// Cut at every chapter heading. Headings win over the size budget, so a
/// long chapter stays whole. Fewer than two pieces means the headings
/// gave us nothing to work with.
fn split_by_chapters(content: &str) -> Vec<String> {
    let mut starts: Vec<usize> = CHAPTER_HEADINGS
        .find_iter(content)
        .map(|m| m.start())
        .collect();
    starts.dedup();

    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    starts.push(content.len());

    let mut chunks = Vec::new();
    for pair in starts.windows(2) {
        let piece = &content[pair[0]..pair[1]];
        if !piece.trim().is_empty() {
            chunks.push(piece.to_string());
        }
    }
    chunks
}

/// Accumulate blank-line paragraphs until the next one would overflow
/// the budget. A single paragraph larger than the budget becomes its own
/// chunk.
fn split_by_paragraphs(content: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in content.split("\n\n") {
        let paragraph_len = paragraph.chars().count();
        if !current.is_empty() && current_len + paragraph_len > max_chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(paragraph);
        current.push_str("\n\n");
        current_len += paragraph_len + 2;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Cut every `max_chunk_size` characters, preferring a newline or a
/// sentence terminator inside the last 30% of the window over a cut
/// mid-sentence. No acceptable boundary means an exact cut.
fn split_by_length(content: &str, max_chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + max_chunk_size).min(chars.len());

        if end < chars.len() {
            let threshold = start + (max_chunk_size as f64 * BOUNDARY_WINDOW) as usize;
            let window = &chars[start..end];
            let last_newline = window.iter().rposition(|&c| c == '\n').map(|i| start + i);
            let last_period = window
                .iter()
                .rposition(|&c| c == '.' || c == '。')
                .map(|i| start + i);

            end = match (last_newline, last_period) {
                (Some(newline), _) if newline > threshold => newline,
                (_, Some(period)) if period > threshold => period + 1,
                _ => end,
            };
        }

        chunks.push(chars[start..end].iter().collect());
        start = end;
    }

    chunks
}
