use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// An indexed unit (or a query): a name, a category label, a total term
/// count, and per-term frequencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    name: String,
    category: String,
    length: u64,
    frequencies: HashMap<TermId, u32>,
}

impl Document {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            length: 0,
            frequencies: HashMap::new(),
        }
    }

    /// Derive name and category from a `category/name` path-style
    /// identifier: category is the parent segment, name the final segment.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, category)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Total term count.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn frequency(&self, term: TermId) -> u32 {
        self.frequencies.get(&term).copied().unwrap_or(0)
    }

    pub fn frequencies(&self) -> &HashMap<TermId, u32> {
        &self.frequencies
    }

    pub fn increment(&mut self, term: TermId, amount: u32) {
        *self.frequencies.entry(term).or_insert(0) += amount;
        self.length += u64::from(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_category_and_name_from_path() {
        let doc = Document::from_path("corpus/sports/match-report.txt");
        assert_eq!(doc.name(), "match-report.txt");
        assert_eq!(doc.category(), "sports");
    }

    #[test]
    fn increment_tracks_length() {
        let mut doc = Document::new("d", "c");
        doc.increment(1, 2);
        doc.increment(2, 1);
        doc.increment(1, 1);
        assert_eq!(doc.frequency(1), 3);
        assert_eq!(doc.length(), 4);
    }
}
