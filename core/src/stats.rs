use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Corpus-wide document-frequency counts: how many documents contain each
/// term at least once, not total occurrences.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TermStats {
    doc_freqs: HashMap<TermId, u32>,
}

impl TermStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more document containing `term`.
    pub fn record(&mut self, term: TermId) {
        *self.doc_freqs.entry(term).or_insert(0) += 1;
    }

    /// Sum another frequency map key-wise, e.g. when combining already-built
    /// sub-indexes.
    pub fn combine(&mut self, other: &HashMap<TermId, u32>) {
        for (&term, &count) in other {
            *self.doc_freqs.entry(term).or_insert(0) += count;
        }
    }

    /// 0 for terms never seen in the corpus.
    pub fn doc_freq(&self, term: TermId) -> u32 {
        self.doc_freqs.get(&term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.doc_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_freqs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_presence() {
        let mut stats = TermStats::new();
        stats.record(3);
        stats.record(3);
        assert_eq!(stats.doc_freq(3), 2);
        assert_eq!(stats.doc_freq(9), 0);
    }

    #[test]
    fn combine_sums_key_wise() {
        let mut stats = TermStats::new();
        stats.record(1);
        let mut other = HashMap::new();
        other.insert(1, 2);
        other.insert(2, 5);
        stats.combine(&other);
        assert_eq!(stats.doc_freq(1), 3);
        assert_eq!(stats.doc_freq(2), 5);
    }
}
