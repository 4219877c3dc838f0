use crate::models::{Chunk, IngestionOptions};
use regex::Regex;
use std::sync::OnceLock;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Target words per chunk.
    pub chunk_size: usize,
    /// A trailing paragraph at most this many words long is repeated at the head of the next chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap: 50,
        }
    }
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            chunk_size: value.chunk_size,
            overlap: value.chunk_overlap,
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern is valid"))
}

/// Blank-line separated paragraphs, trimmed, with empty ones dropped.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Packs whole paragraphs into chunks of roughly `chunk_size` words.
///
/// A paragraph is never split, so one longer than `chunk_size` becomes an
/// oversized chunk of its own. When a chunk is closed and its last paragraph
/// has no more than `overlap` words, that paragraph also opens the next chunk.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0usize;

    for paragraph in split_paragraphs(text) {
        let paragraph_words = word_count(paragraph);

        if !current.is_empty() && current_words + paragraph_words > config.chunk_size {
            chunks.push(Chunk {
                content: current.join(PARAGRAPH_SEPARATOR),
                word_count: current_words,
            });

            let carried = current
                .last()
                .copied()
                .filter(|last| word_count(last) <= config.overlap);

            current.clear();
            current_words = 0;
            if let Some(last) = carried {
                current.push(last);
                current_words = word_count(last);
            }
        }

        current.push(paragraph);
        current_words += paragraph_words;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            content: current.join(PARAGRAPH_SEPARATOR),
            word_count: current_words,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", ChunkingConfig::default()).is_empty());
        assert!(chunk_text(" \n\n \t\n\n", ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn text_without_blank_lines_is_a_single_chunk() {
        let text = "one two three\nfour five six\nseven";
        for size in [1, 3, 400] {
            let chunks = chunk_text(text, config(size, 2));
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].content, text);
            assert_eq!(chunks[0].word_count, 7);
        }
    }

    #[test]
    fn paragraphs_split_on_whitespace_only_lines() {
        let paragraphs = split_paragraphs("first\n   \nsecond\n\n\n\nthird\n \t \nfourth");
        assert_eq!(paragraphs, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn long_last_paragraph_is_not_carried_forward() {
        let text = "Para one word word.\n\nPara two word word.\n\nPara three.";
        let chunks = chunk_text(text, config(6, 3));

        assert_eq!(
            chunks,
            vec![
                Chunk {
                    content: "Para one word word.".to_string(),
                    word_count: 4,
                },
                Chunk {
                    content: "Para two word word.\n\nPara three.".to_string(),
                    word_count: 6,
                },
            ]
        );
    }

    #[test]
    fn short_last_paragraph_opens_the_next_chunk() {
        let text = "a b c d\n\ne f\n\ng h i j";
        let chunks = chunk_text(text, config(6, 3));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a b c d\n\ne f");
        assert_eq!(chunks[0].word_count, 6);
        assert_eq!(chunks[1].content, "e f\n\ng h i j");
        assert_eq!(chunks[1].word_count, 6);
    }

    #[test]
    fn zero_overlap_never_carries() {
        let text = "a b c d\n\ne f\n\ng h i j";
        let chunks = chunk_text(text, config(6, 0));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, "g h i j");
    }

    #[test]
    fn oversized_paragraph_stays_whole() {
        let long = (0..25).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let text = format!("short intro\n\n{long}\n\ntail words here");
        let chunks = chunk_text(&text, config(10, 0));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "short intro");
        assert_eq!(chunks[1].content, long);
        assert_eq!(chunks[1].word_count, 25);
        assert_eq!(chunks[2].content, "tail words here");
    }

    #[test]
    fn chunks_preserve_paragraph_order() {
        let paragraphs: Vec<String> = (0..40)
            .map(|i| {
                let words = (i % 7) + 1;
                (0..words).map(|w| format!("p{i}w{w}")).collect::<Vec<_>>().join(" ")
            })
            .collect();
        let text = paragraphs.join("\n\n");

        for (size, overlap) in [(5, 0), (8, 3), (12, 7), (400, 50)] {
            let chunks = chunk_text(&text, config(size, overlap));
            let mut rebuilt: Vec<&str> = Vec::new();
            for chunk in &chunks {
                for paragraph in chunk.content.split(PARAGRAPH_SEPARATOR) {
                    if rebuilt.last() != Some(&paragraph) {
                        rebuilt.push(paragraph);
                    }
                }
                assert_eq!(chunk.word_count, word_count(&chunk.content));
            }
            let expected: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
            assert_eq!(rebuilt, expected, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn zero_chunk_size_closes_a_chunk_per_paragraph() {
        let chunks = chunk_text("a b\n\nc\n\nd e f", config(0, 2));
        let contents: Vec<&str> = chunks.iter().map(|chunk| chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["a b", "a b\n\nc", "c\n\nd e f"]);
    }
}
