//! Keyword signal extraction: a small ranked word-frequency table.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Default minimum token length, in characters.
pub const DEFAULT_MIN_LEN: usize = 5;
/// Default number of keywords kept.
pub const DEFAULT_TOP_N: usize = 7;

/// Function words ignored when counting (Italian, English, French, Spanish, German).
pub const STOP_WORDS: &[&str] = &[
    // it
    "anche", "della", "delle", "nella", "hanno", "stato", "sono", "come", "questo", "questa",
    "degli", "parte", "prima", "dopo", "tutto", "tutti", "fatto", "essere", "avere",
    // en
    "which", "their", "about", "would", "these", "other", "not", "that", "with", "from", "this",
    "have", "there", "where", "while", "after", "before", "being",
    // fr
    "sur", "pour", "dans", "avec", "plus", "leurs", "selon", "cette", "entre",
    // es
    "sobre", "desde", "hasta", "donde", "tiene", "según",
    // de
    "nicht", "werden", "einer", "eines", "durch", "wurde", "wurden", "sowie",
];

/// One ranked entry of a [`KeywordSignal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Ranked keyword table, highest count first. Empty means "no keyword section".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSignal(Vec<KeywordCount>);

impl KeywordSignal {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[KeywordCount] {
        &self.0
    }

    pub fn max_count(&self) -> usize {
        self.0.iter().map(|k| k.count).max().unwrap_or(0)
    }

    /// `word (count)` pairs joined for a one-line caption.
    pub fn caption(&self) -> String {
        self.0
            .iter()
            .map(|k| format!("{} ({})", k.word, k.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b\w+\b").expect("static word pattern is valid"))
}

/// Configurable extractor; [`KeywordExtractor::default`] matches [`extract_keywords`].
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    min_len: usize,
    top_n: usize,
    stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            top_n: DEFAULT_TOP_N,
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    /// Count qualifying tokens and keep the `top_n` most frequent.
    ///
    /// Ties keep the order in which the words first appeared in `text`.
    pub fn extract(&self, text: &str) -> KeywordSignal {
        let lowered = text.to_lowercase();
        let mut order: Vec<KeywordCount> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for m in word_regex().find_iter(&lowered) {
            let word = m.as_str();
            if word.chars().count() < self.min_len || self.stop_words.contains(word) {
                continue;
            }
            match index.get(word) {
                Some(&i) => order[i].count += 1,
                None => {
                    index.insert(word, order.len());
                    order.push(KeywordCount {
                        word: word.to_string(),
                        count: 1,
                    });
                }
            }
        }

        // Stable sort: equal counts stay in first-occurrence order.
        order.sort_by(|a, b| b.count.cmp(&a.count));
        order.truncate(self.top_n);
        KeywordSignal(order)
    }
}

/// Extract the default keyword signal from `text`.
pub fn extract_keywords(text: &str) -> KeywordSignal {
    KeywordExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(signal: &KeywordSignal) -> Vec<(&str, usize)> {
        signal
            .entries()
            .iter()
            .map(|k| (k.word.as_str(), k.count))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \n\t").is_empty());
    }

    #[test]
    fn test_all_stopwords() {
        assert!(extract_keywords("which their about would these della delle nella").is_empty());
    }

    #[test]
    fn test_short_words_ignored() {
        assert!(extract_keywords("the cat sat on a mat").is_empty());
    }

    #[test]
    fn test_ranking_by_count() {
        let extractor = KeywordExtractor::new()
            .with_min_len(4)
            .with_stop_words(Vec::<String>::new());
        let signal = extractor.extract("alpha alpha beta beta beta gamma");
        assert_eq!(words(&signal), vec![("beta", 3), ("alpha", 2), ("gamma", 1)]);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let signal = extract_keywords("zebra apple mango apple zebra mango");
        assert_eq!(
            words(&signal),
            vec![("zebra", 2), ("apple", 2), ("mango", 2)]
        );
    }

    #[test]
    fn test_lowercases_tokens() {
        let signal = extract_keywords("Rome ROMAN roman Roman");
        assert_eq!(words(&signal), vec![("roman", 3)]);
    }

    #[test]
    fn test_caps_at_seven() {
        let text = "aaaaa bbbbb ccccc ddddd eeeee fffff ggggg hhhhh iiiii aaaaa";
        let signal = extract_keywords(text);
        assert_eq!(signal.len(), 7);
        assert_eq!(signal.entries()[0].word, "aaaaa");
        assert_eq!(signal.max_count(), 2);
    }

    #[test]
    fn test_unicode_word_length_counts_chars() {
        // "città" is five characters but six bytes.
        let signal = extract_keywords("città città");
        assert_eq!(words(&signal), vec![("città", 2)]);
    }

    #[test]
    fn test_caption() {
        let signal = extract_keywords("rivers rivers bridge");
        assert_eq!(signal.caption(), "rivers (2), bridge (1)");
    }
}
