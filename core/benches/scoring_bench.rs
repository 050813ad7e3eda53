use criterion::{criterion_group, criterion_main, Criterion};
use ferret_core::{Document, MemoryIndex};

fn build_index() -> MemoryIndex {
    let docs = (0..200u32)
        .map(|i| {
            let mut doc = Document::new(format!("doc{i}"), format!("cat{}", i % 4));
            for t in 0..50u32 {
                doc.increment((i * 7 + t * 13) % 500, 1 + t % 3);
            }
            doc
        })
        .collect();
    MemoryIndex::from_documents(docs).unwrap()
}

fn bench_search(c: &mut Criterion) {
    let index = build_index();
    let mut query = Document::new("q", "none");
    for t in 0..8u32 {
        query.increment(t * 13 % 500, 1);
    }
    c.bench_function("search_200_docs", |b| b.iter(|| index.search(&query)));
    c.bench_function("classify_200_docs", |b| b.iter(|| index.classify_knn(&query, 5)));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
