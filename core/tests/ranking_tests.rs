use ferret_core::{Document, IndexError, MemoryIndex, NO_RESULTS};

fn doc(name: &str, category: &str, freqs: &[(u32, u32)]) -> Document {
    let mut d = Document::new(name, category);
    for &(term, count) in freqs {
        d.increment(term, count);
    }
    d
}

#[test]
fn bm25_matches_the_closed_form() {
    // Ten documents of identical length 5, exactly one containing term 0, so
    // docLen == avgDocLen and the length normalization collapses:
    //   IDF = ln((10 - 1 + 0.5) / (1 + 0.5)),  TF = 1,  QTF = 1.
    let mut docs = vec![doc("hit", "a", &[(0, 1), (1, 4)])];
    for i in 0..9 {
        docs.push(doc(&format!("other{i}"), "a", &[(1, 5)]));
    }
    let index = MemoryIndex::from_documents(docs).unwrap();
    assert_eq!(index.num_docs(), 10);

    let query = doc("q", "none", &[(0, 1)]);
    let score = index.score(&index.documents()[0], &query);
    let expected = (9.5f64 / 1.5).ln();
    assert!((score - expected).abs() < 1e-9, "score {score} vs expected {expected}");
}

#[test]
fn average_length_is_sum_over_count() {
    let docs = vec![
        doc("a", "x", &[(0, 3)]),
        doc("b", "x", &[(1, 4)]),
        doc("c", "x", &[(2, 6)]),
    ];
    let index = MemoryIndex::from_documents(docs).unwrap();
    assert!((index.avg_doc_length() - 13.0 / 3.0).abs() < 1e-12);
}

#[test]
fn unmatched_query_yields_no_results() {
    let docs = vec![doc("a", "x", &[(0, 2)]), doc("b", "y", &[(1, 1)])];
    let index = MemoryIndex::from_documents(docs).unwrap();
    let query = doc("q", "none", &[(99, 1)]);
    assert!(index.search(&query).is_empty());
}

#[test]
fn negative_idf_is_not_clamped() {
    // Term 0 appears in all three documents: docFreq > N/2, so IDF is
    // negative and the hits must still rank, below zero.
    let docs = vec![
        doc("a", "x", &[(0, 1)]),
        doc("b", "x", &[(0, 2)]),
        doc("c", "x", &[(0, 3)]),
    ];
    let index = MemoryIndex::from_documents(docs).unwrap();
    let query = doc("q", "none", &[(0, 1)]);
    let hits = index.search(&query);
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|hit| hit.score < 0.0));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn knn_majority_vote_wins() {
    let docs = vec![
        doc("game-recap", "sports", &[(0, 5)]),
        doc("season-preview", "sports", &[(0, 3)]),
        doc("gadget-review", "tech", &[(0, 4)]),
    ];
    let index = MemoryIndex::from_documents(docs).unwrap();
    let query = doc("q", "none", &[(0, 1)]);
    assert_eq!(index.classify_knn(&query, 3), "sports");
}

#[test]
fn knn_with_no_hits_returns_the_sentinel() {
    let docs = vec![doc("a", "x", &[(0, 1)])];
    let index = MemoryIndex::from_documents(docs).unwrap();
    let query = doc("q", "none", &[(42, 1)]);
    assert_eq!(index.classify_knn(&query, 3), NO_RESULTS);
}

#[test]
fn empty_corpus_is_rejected() {
    match MemoryIndex::from_documents(Vec::new()) {
        Err(IndexError::EmptyCorpus) => {}
        other => panic!("expected EmptyCorpus, got {other:?}"),
    }
}

#[test]
fn search_results_render_name_and_category() {
    let docs = vec![doc("report.txt", "sports", &[(0, 2)]), doc("b", "x", &[(1, 1)])];
    let index = MemoryIndex::from_documents(docs).unwrap();
    let query = doc("q", "none", &[(0, 1)]);
    let hits = index.search(&query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].to_string(), "report.txt (sports)");
}
