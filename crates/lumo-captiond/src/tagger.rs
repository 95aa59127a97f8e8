use lumo_core::TagExtractor;
use lumo_model::MAX_TAGS;

/// Words that carry no descriptive value on their own.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "their", "there", "these", "this", "to", "was",
    "were", "with",
];

/// Keyword-based tag extractor.
///
/// Tokenizes the caption into lowercase alphabetic words, drops
/// stopwords, and emits the surviving words as unigram tags plus a
/// bigram tag for each pair of words that were adjacent in the original
/// text. Tags keep first-occurrence order, are deduplicated and capped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTagger;

impl KeywordTagger {
    fn is_stopword(word: &str) -> bool {
        STOPWORDS.contains(&word)
    }
}

impl TagExtractor for KeywordTagger {
    fn tags(&self, text: &str) -> Vec<String> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut tags: Vec<String> = Vec::new();
        let mut push = |tag: String| {
            if tags.len() < MAX_TAGS && !tags.contains(&tag) {
                tags.push(tag);
            }
        };

        for word in words.iter().filter(|w| !Self::is_stopword(w)) {
            push(word.clone());
        }
        for pair in words.windows(2) {
            if !Self::is_stopword(&pair[0]) && !Self::is_stopword(&pair[1]) {
                push(format!("{}_{}", pair[0], pair[1]));
            }
        }
        tags
    }
}
