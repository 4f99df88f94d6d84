use super::{Passage, TokenCounter};
use crate::core::config::SplitConfig;
use crate::news::NewsRecord;

/// Structural boundaries tried in priority order: paragraph, line, sentence,
/// word. Characters are the terminal fallback.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits source text into chunks whose measured token count never exceeds
/// the configured cap, with consecutive chunks from one source overlapping by
/// roughly `overlap_tokens` (rounded at fragment boundaries).
pub struct RecursiveTokenSplitter {
    max_tokens: usize,
    overlap_tokens: usize,
}

impl RecursiveTokenSplitter {
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            max_tokens: config.max_chunk_tokens.max(1),
            overlap_tokens: config.overlap_tokens.min(config.max_chunk_tokens),
        }
    }

    /// One record becomes one source text (`title\ncontent`) and one or more
    /// passages, each keeping the record's link for citation.
    pub fn split_records(
        &self,
        records: &[NewsRecord],
        counter: &dyn TokenCounter,
    ) -> Vec<Passage> {
        let mut passages = Vec::new();
        for record in records {
            let text = if record.content.is_empty() {
                record.title.clone()
            } else {
                format!("{}\n{}", record.title, record.content)
            };
            for chunk in self.split_text(&text, counter) {
                passages.push(Passage {
                    text: chunk,
                    source: record.link.clone(),
                });
            }
        }
        passages
    }

    /// A text already under the cap yields exactly one chunk, no overlap.
    pub fn split_text(&self, text: &str, counter: &dyn TokenCounter) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if counter.count(trimmed) <= self.max_tokens {
            return vec![trimmed.to_string()];
        }

        let fragments = self.fragment(trimmed, 0, counter);
        self.merge(fragments, counter)
    }

    /// Recursively divides at the largest boundary that produces fragments
    /// under the cap. Every returned fragment satisfies
    /// `count(fragment) <= max_tokens`.
    fn fragment(&self, text: &str, sep_idx: usize, counter: &dyn TokenCounter) -> Vec<String> {
        if counter.count(text) <= self.max_tokens {
            return vec![text.to_string()];
        }
        if sep_idx >= SEPARATORS.len() {
            return self.fragment_chars(text, counter);
        }

        let pieces = split_keep_separator(text, SEPARATORS[sep_idx]);
        if pieces.len() <= 1 {
            return self.fragment(text, sep_idx + 1, counter);
        }

        pieces
            .iter()
            .flat_map(|piece| self.fragment(piece, sep_idx + 1, counter))
            .collect()
    }

    /// Terminal fallback for a single run with no structural boundary.
    fn fragment_chars(&self, text: &str, counter: &dyn TokenCounter) -> Vec<String> {
        let mut fragments = Vec::new();
        let mut current = String::new();
        for ch in text.chars() {
            current.push(ch);
            if counter.count(&current) > self.max_tokens {
                current.pop();
                if !current.is_empty() {
                    fragments.push(current.clone());
                    current.clear();
                }
                current.push(ch);
            }
        }
        if !current.is_empty() {
            fragments.push(current);
        }
        fragments
    }

    /// Greedily packs fragments into chunks. The measured token count of the
    /// joined chunk is checked directly, so the cap holds even when subword
    /// merges cross fragment boundaries.
    fn merge(&self, fragments: Vec<String>, counter: &dyn TokenCounter) -> Vec<String> {
        let fragments: Vec<(String, usize)> = fragments
            .into_iter()
            .filter(|f| !f.is_empty())
            .map(|f| {
                let n = counter.count(&f);
                (f, n)
            })
            .collect();

        let mut chunks = Vec::new();
        let mut window: Vec<(String, usize)> = Vec::new();
        let mut fresh = false;

        for (frag, n) in fragments {
            if !window.is_empty() && self.window_count(&window, &frag, counter) > self.max_tokens {
                if fresh {
                    push_chunk(&mut chunks, &window);
                }
                window = self.overlap_tail(&window);
                while !window.is_empty()
                    && self.window_count(&window, &frag, counter) > self.max_tokens
                {
                    window.remove(0);
                }
                fresh = false;
            }
            window.push((frag, n));
            fresh = true;
        }

        if fresh && !window.is_empty() {
            push_chunk(&mut chunks, &window);
        }
        chunks
    }

    fn window_count(
        &self,
        window: &[(String, usize)],
        next: &str,
        counter: &dyn TokenCounter,
    ) -> usize {
        let mut joined = String::new();
        for (frag, _) in window {
            joined.push_str(frag);
        }
        joined.push_str(next);
        counter.count(&joined)
    }

    /// Trailing fragments of the previous chunk totaling at most
    /// `overlap_tokens`, seeding the next chunk.
    fn overlap_tail(&self, window: &[(String, usize)]) -> Vec<(String, usize)> {
        if self.overlap_tokens == 0 {
            return Vec::new();
        }
        let mut total = 0;
        let mut tail = Vec::new();
        for item in window.iter().rev() {
            if total + item.1 > self.overlap_tokens {
                break;
            }
            total += item.1;
            tail.push(item.clone());
        }
        tail.reverse();
        tail
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &[(String, usize)]) {
    let mut joined = String::new();
    for (frag, _) in window {
        joined.push_str(frag);
    }
    let joined = joined.trim().to_string();
    if !joined.is_empty() {
        chunks.push(joined);
    }
}

/// Splits on `sep`, keeping the separator attached to the preceding piece so
/// that concatenating pieces reproduces the input exactly.
fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(sep) {
        let end = idx + sep.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    /// Deterministic counter: one token per whitespace-separated word.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn splitter(max: usize, overlap: usize) -> RecursiveTokenSplitter {
        RecursiveTokenSplitter::new(&SplitConfig {
            max_chunk_tokens: max,
            overlap_tokens: overlap,
        })
    }

    fn record(title: &str, content: &str) -> NewsRecord {
        NewsRecord {
            title: title.to_string(),
            link: Url::parse("https://news.example.com/a").unwrap(),
            content: content.to_string(),
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn short_text_is_one_chunk_without_overlap() {
        let chunks = splitter(10, 3).split_text("just a few words here", &WordCounter);
        assert_eq!(chunks, vec!["just a few words here".to_string()]);
    }

    #[test]
    fn every_chunk_respects_the_token_cap() {
        let text = words(57);
        let chunks = splitter(10, 3).split_text(&text, &WordCounter);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(WordCounter.count(chunk) <= 10, "oversized chunk: {chunk}");
        }
    }

    #[test]
    fn consecutive_chunks_overlap_by_the_configured_tokens() {
        let text = words(30);
        let chunks = splitter(10, 3).split_text(&text, &WordCounter);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();
            // Word fragments count one token each, so the rounding leaves the
            // overlap exact here.
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
    }

    #[test]
    fn prefers_paragraph_boundaries_over_word_boundaries() {
        let text = format!("{}\n\n{}", words(6), words(6));
        let chunks = splitter(8, 0).split_text(&text, &WordCounter);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], words(6));
        assert_eq!(chunks[1], words(6));
    }

    #[test]
    fn falls_back_to_characters_for_unbroken_runs() {
        // One 12-char run with no separators under a counter that charges a
        // token per character.
        struct CharCounter;
        impl TokenCounter for CharCounter {
            fn count(&self, text: &str) -> usize {
                text.chars().count()
            }
        }

        let chunks = splitter(5, 0).split_text("abcdefghijkl", &CharCounter);
        assert_eq!(chunks, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn three_small_records_yield_three_passages() {
        let records = vec![
            record("Sample Corp rises", "short body one"),
            record("Sample Corp falls", "short body two"),
            record("Sample Corp steady", "short body three"),
        ];
        let passages = splitter(50, 5).split_records(&records, &WordCounter);
        assert_eq!(passages.len(), 3);
        assert!(passages[0].text.starts_with("Sample Corp rises"));
        assert!(passages.iter().all(|p| p.source.as_str().contains("news.example.com")));
    }

    #[test]
    fn every_passage_keeps_its_record_link() {
        let mut rec = record("Title", &words(40));
        rec.link = Url::parse("https://news.example.com/long").unwrap();
        let passages = splitter(10, 2).split_records(&[rec], &WordCounter);
        assert!(passages.len() > 1);
        for passage in &passages {
            assert_eq!(passage.source.as_str(), "https://news.example.com/long");
        }
    }

    #[test]
    fn exact_tokenizer_end_to_end() {
        let counter = crate::split::Cl100kCounter::new().unwrap();
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        let text = sentence.repeat(40);
        let splitter = splitter(50, 10);
        let chunks = splitter.split_text(&text, &counter);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(counter.count(chunk) <= 50);
        }
    }
}
