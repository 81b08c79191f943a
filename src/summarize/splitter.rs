use std::collections::VecDeque;

/// Rough chars-per-token ratio for English prose on BPE tokenizers.
pub const CHARS_PER_TOKEN: usize = 4;

/// Chunk sizing, expressed in (approximate) tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 400,
        }
    }
}

/// Recursive separator splitter: tries paragraph breaks first, then lines,
/// then words, then single characters, and merges the pieces back into
/// chunks no longer than `chunk_size` that overlap by up to `chunk_overlap`.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    max_chars: usize,
    overlap_chars: usize,
    separators: Vec<&'static str>,
}

impl TextSplitter {
    pub fn new(config: ChunkConfig) -> Self {
        let max_chars = (config.chunk_size * CHARS_PER_TOKEN).max(1);
        let overlap_chars = (config.chunk_overlap * CHARS_PER_TOKEN).min(max_chars.saturating_sub(1));
        Self {
            max_chars,
            overlap_chars,
            separators: vec!["\n\n", "\n", " ", ""],
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        // First separator present in the text; "" always matches
        let (pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len(), ""));
        let remaining = separators.get(pos + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) <= self.max_chars {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.max_chars && !window.is_empty() {
                push_chunk(&mut chunks, &window, separator);
                // Drop from the front until we are inside the overlap budget
                // and the next piece fits.
                while total > self.overlap_chars
                    || (total > 0 && total + len + if window.is_empty() { 0 } else { sep_len } > self.max_chars)
                {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }
            let joiner = if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
            total += len + joiner;
        }
        push_chunk(&mut chunks, &window, separator);
        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
