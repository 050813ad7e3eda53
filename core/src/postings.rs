use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One sorted-run entry: a primary key and its (secondary key, count) pairs,
/// kept sorted by secondary key. Instantiated per index variant, e.g.
/// `PostingsData<TermId, DocId>` for a term-document inverted structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingsData<P, S> {
    pub primary: P,
    pub counts: Vec<(S, u32)>,
}

impl<P, S> PostingsData<P, S>
where
    P: Ord,
    S: Ord,
{
    pub fn new(primary: P) -> Self {
        Self { primary, counts: Vec::new() }
    }

    /// Append a (secondary, count) pair. Pairs must arrive in ascending
    /// secondary-key order.
    pub fn push(&mut self, secondary: S, count: u32) {
        debug_assert!(self.counts.last().map_or(true, |(s, _)| *s < secondary));
        self.counts.push((secondary, count));
    }

    /// Fold another record with the same primary key into this one: counts
    /// for matching secondary keys are summed, the rest union-merged in
    /// sorted order.
    pub fn combine(&mut self, other: PostingsData<P, S>) {
        debug_assert!(self.primary == other.primary);
        let mut merged = Vec::with_capacity(self.counts.len() + other.counts.len());
        let mut left = std::mem::take(&mut self.counts).into_iter().peekable();
        let mut right = other.counts.into_iter().peekable();
        loop {
            match (left.peek(), right.peek()) {
                (Some((l, _)), Some((r, _))) => match l.cmp(r) {
                    Ordering::Less => merged.push(left.next().unwrap()),
                    Ordering::Greater => merged.push(right.next().unwrap()),
                    Ordering::Equal => {
                        let (key, a) = left.next().unwrap();
                        let (_, b) = right.next().unwrap();
                        merged.push((key, a + b));
                    }
                },
                (Some(_), None) => merged.push(left.next().unwrap()),
                (None, Some(_)) => merged.push(right.next().unwrap()),
                (None, None) => break,
            }
        }
        self.counts = merged;
    }
}

// Records order by primary key alone so sorted runs and merges only ever
// look at the key column.
impl<P: Ord, S> PartialEq for PostingsData<P, S> {
    fn eq(&self, other: &Self) -> bool {
        self.primary == other.primary
    }
}

impl<P: Ord, S> Eq for PostingsData<P, S> {}

impl<P: Ord, S> PartialOrd for PostingsData<P, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord, S> Ord for PostingsData<P, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary.cmp(&other.primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_sums_matching_and_unions_rest() {
        let mut a: PostingsData<u32, u32> = PostingsData { primary: 7, counts: vec![(1, 2), (3, 1)] };
        let b = PostingsData { primary: 7, counts: vec![(3, 4), (9, 1)] };
        a.combine(b);
        assert_eq!(a.counts, vec![(1, 2), (3, 5), (9, 1)]);
    }

    #[test]
    fn push_appends_in_secondary_order() {
        let mut record: PostingsData<u32, u32> = PostingsData::new(1);
        record.push(2, 1);
        record.push(5, 3);
        assert_eq!(record.counts, vec![(2, 1), (5, 3)]);
    }

    #[test]
    fn orders_by_primary_key_only() {
        let a: PostingsData<u32, u32> = PostingsData { primary: 1, counts: vec![(5, 5)] };
        let b = PostingsData { primary: 2, counts: vec![] };
        assert!(a < b);
    }
}
