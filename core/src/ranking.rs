use crate::document::Document;
use crate::error::{IndexError, Result};
use crate::stats::TermStats;
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;
pub const BM25_K3: f64 = 500.0;

/// Category label returned when a query matches nothing.
pub const NO_RESULTS: &str = "[no results]";

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f64,
    pub name: String,
    pub category: String,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

/// In-memory index: all documents' term-frequency vectors plus corpus-wide
/// statistics, immutable once built. Scores with BM25 and classifies by
/// k-nearest-neighbor majority vote over ranked results.
#[derive(Debug)]
pub struct MemoryIndex {
    documents: Vec<Document>,
    stats: TermStats,
    avg_doc_length: f64,
}

impl MemoryIndex {
    /// Build from raw document sources. Each path is read, named and
    /// categorized from its `category/name` segments, and tokenized through
    /// the collaborator.
    pub fn from_sources<T: Tokenizer>(sources: &[PathBuf], tokenizer: &mut T) -> Result<Self> {
        let mut stats = TermStats::new();
        let mut documents = Vec::with_capacity(sources.len());
        for (processed, path) in sources.iter().enumerate() {
            let text = fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
            let mut document = Document::from_path(path);
            tokenizer.tokenize(&text, &mut document, &mut stats);
            documents.push(document);
            if processed % 64 == 0 {
                tracing::info!(
                    percent = processed * 100 / sources.len(),
                    "indexing corpus"
                );
            }
        }
        Self::from_parts(documents, stats)
    }

    /// Build from pre-built documents; each document's distinct terms are
    /// folded into the corpus statistics.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self> {
        let mut stats = TermStats::new();
        for document in &documents {
            for &term in document.frequencies().keys() {
                stats.record(term);
            }
        }
        Self::from_parts(documents, stats)
    }

    /// Build from pre-built documents plus precomputed frequency statistics,
    /// e.g. when reloading a persisted index.
    pub fn from_parts(documents: Vec<Document>, stats: TermStats) -> Result<Self> {
        if documents.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }
        let total: u64 = documents.iter().map(|d| d.length()).sum();
        let avg_doc_length = total as f64 / documents.len() as f64;
        Ok(Self { documents, stats, avg_doc_length })
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn stats(&self) -> &TermStats {
        &self.stats
    }

    /// BM25 similarity of one document against a query. Only query terms
    /// contribute; terms the corpus has never seen get document frequency 0,
    /// and a term in more than half the corpus yields a negative component
    /// that is allowed to pull the score down.
    pub fn score(&self, document: &Document, query: &Document) -> f64 {
        let num_docs = self.documents.len() as f64;
        let doc_length = document.length() as f64;
        let mut score = 0.0;
        for (&term, &query_freq) in query.frequencies() {
            let doc_freq = f64::from(self.stats.doc_freq(term));
            let term_freq = f64::from(document.frequency(term));
            let query_term_freq = f64::from(query_freq);

            let idf = ((num_docs - doc_freq + 0.5) / (doc_freq + 0.5)).ln();
            let tf = ((BM25_K1 + 1.0) * term_freq)
                / (BM25_K1 * ((1.0 - BM25_B) + BM25_B * doc_length / self.avg_doc_length)
                    + term_freq);
            let qtf = ((BM25_K3 + 1.0) * query_term_freq) / (BM25_K3 + query_term_freq);

            score += idf * tf * qtf;
        }
        score
    }

    /// Score every document against the query in parallel and return hits
    /// sorted by descending score. Zero-score documents are dropped; scoring
    /// is fork-join over the immutable corpus, with no shared mutable state,
    /// and the result order is fixed by the final sort alone.
    pub fn search(&self, query: &Document) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .documents
            .par_iter()
            .filter_map(|document| {
                let score = self.score(document, query);
                (score != 0.0).then(|| SearchHit {
                    score,
                    name: document.name().to_string(),
                    category: document.category().to_string(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Majority category among the k highest-scoring results. When two
    /// categories tie on count, whichever the tally iterates first wins;
    /// callers must not rely on which one that is. Returns [`NO_RESULTS`]
    /// when nothing matched.
    pub fn classify_knn(&self, query: &Document, k: usize) -> String {
        let hits = self.search(query);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for hit in hits.iter().take(k) {
            *counts.entry(hit.category.as_str()).or_insert(0) += 1;
        }

        let mut best = NO_RESULTS;
        let mut high = 0;
        for (category, count) in counts {
            if count > high {
                best = category;
                high = count;
            }
        }
        best.to_string()
    }
}
