use crate::document::Document;
use crate::stats::TermStats;
use crate::TermId;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "had",
            "has", "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its",
            "no", "not", "of", "on", "or", "she", "so", "such", "that", "the", "their",
            "them", "then", "there", "these", "they", "this", "to", "was", "we", "were",
            "what", "which", "will", "with", "would", "you", "your",
        ];
        words.iter().copied().collect()
    };
}

/// Maps term strings to dense ids in first-seen order. Persisted with the
/// index so queries resolve to the same ids the build assigned.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.terms.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.terms.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.terms.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Collaborator that turns raw text into term counts on a document while
/// recording each term's presence in the shared corpus statistics.
pub trait Tokenizer {
    fn tokenize(&mut self, text: &str, document: &mut Document, stats: &mut TermStats);
}

/// Word tokenizer: NFKC normalization, lowercasing, stopword removal, and
/// English stemming, with terms interned through a [`Vocabulary`].
#[derive(Debug, Default)]
pub struct WordTokenizer {
    vocabulary: Vocabulary,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vocabulary(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn into_vocabulary(self) -> Vocabulary {
        self.vocabulary
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&mut self, text: &str, document: &mut Document, stats: &mut TermStats) {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut seen: HashSet<TermId> = HashSet::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if STOPWORDS.contains(token) {
                continue;
            }
            let stem = STEMMER.stem(token);
            let term = self.vocabulary.get_or_insert(&stem);
            document.increment(term, 1);
            if seen.insert(term) {
                stats.record(term);
            }
        }
    }
}
