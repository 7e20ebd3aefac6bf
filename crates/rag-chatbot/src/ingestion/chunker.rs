//! Fixed-size text chunking with overlap

/// Splits text into overlapping character windows
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared between consecutive chunks
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextChunker {
    /// Create a new chunker. Overlap is capped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks.
    ///
    /// A window that does not reach the end of the text is cut back to the last
    /// space inside it, so words are not split. A space at or before the previous
    /// cut is ignored and the window is cut hard instead. The next window starts
    /// `overlap` characters before the previous cut, or at the cut itself when that
    /// would not move forward. Chunks are trimmed and blank ones dropped.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut last_end = 0usize;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);
            if end < len {
                if let Some(space) = (start + 1..=end)
                    .rev()
                    .find(|&i| chars[i] == ' ')
                    .filter(|&space| space > last_end)
                {
                    end = space;
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end >= len {
                break;
            }
            last_end = end;
            let next = end.saturating_sub(self.overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::default();
        assert_eq!(chunker.chunk("  Humanoid robots walk.  "), vec!["Humanoid robots walk."]);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n ").is_empty());
    }

    #[test]
    fn test_breaks_on_last_space() {
        let chunker = TextChunker::new(12, 0);
        let chunks = chunker.chunk("alpha beta gamma delta");
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let chunker = TextChunker::new(10, 4);
        let chunks = chunker.chunk("aaaa bbbb cccc dddd");
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let tail = &pair[0][pair[0].len() - 2..];
            assert!(pair[1].contains(tail), "{:?} should overlap {:?}", pair[1], pair[0]);
        }
        assert!(chunks.last().unwrap().ends_with("dddd"));
    }

    #[test]
    fn test_text_without_spaces_still_progresses() {
        let chunker = TextChunker::new(5, 2);
        let text = "x".repeat(23);
        let chunks = chunker.chunk(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert_eq!(chunks.first().map(String::len), Some(5));
    }

    #[test]
    fn test_early_space_does_not_repeat_chunks() {
        let chunker = TextChunker::default();
        let text = format!("{} {}", "a".repeat(150), "b".repeat(1500));
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "a".repeat(150));
        assert!(chunks[1..].iter().all(|c| c.chars().all(|ch| ch == 'b')));
        assert_eq!(chunks[1].chars().count(), 1000);
        assert_eq!(chunks[2].chars().count(), 701);
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = TextChunker::new(4, 1);
        let chunks = chunker.chunk("ロボット と 人間");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_overlap_capped() {
        let chunker = TextChunker::new(3, 10);
        assert_eq!(chunker.overlap(), 2);
        assert!(!chunker.chunk("abcdefghij").is_empty());
    }
}
