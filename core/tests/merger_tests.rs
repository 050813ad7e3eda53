use ferret_core::{merge_all, write_chunk, Chunk, MergeEvent, PostingsData, PostingsReader};
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;

type TestChunk = Chunk<u32, u32>;

/// One record per primary key, each with a single count pair, so every chunk's
/// byte size is proportional to its record count.
fn chunk_of(dir: &Path, name: &str, primaries: &[u32]) -> TestChunk {
    let records: Vec<PostingsData<u32, u32>> = primaries
        .iter()
        .map(|&p| PostingsData { primary: p, counts: vec![(p, 1)] })
        .collect();
    write_chunk(&dir.join(name), &records).unwrap()
}

#[test]
fn always_selects_the_two_smallest_chunks() {
    let dir = tempdir().unwrap();
    let chunks = vec![
        chunk_of(dir.path(), "c4.bin", &[40, 41, 42, 43]),
        chunk_of(dir.path(), "c1.bin", &[10]),
        chunk_of(dir.path(), "c3.bin", &[30, 31, 32]),
        chunk_of(dir.path(), "c2.bin", &[20, 21]),
    ];
    let unit = chunks[1].size();
    assert_eq!(chunks[0].size(), 4 * unit);

    let events: Mutex<Vec<MergeEvent>> = Mutex::new(Vec::new());
    let merged = merge_all(chunks, 1, |event| events.lock().unwrap().push(event))
        .unwrap()
        .expect("one chunk survives");

    // Greedy two-smallest selection on sizes [1,2,3,4]:
    // (1,2) -> 3, then (3,3) -> 6, then (4,6) -> 10.
    let events = events.into_inner().unwrap();
    let pairs: Vec<(u64, u64)> = events.iter().map(|e| (e.left, e.right)).collect();
    assert_eq!(pairs, vec![(unit, 2 * unit), (3 * unit, 3 * unit), (4 * unit, 6 * unit)]);
    assert_eq!(events[2].merged, 10 * unit);
    assert_eq!(merged.size(), 10 * unit);

    // The survivor holds the sorted union of every input record.
    let records: Vec<PostingsData<u32, u32>> = PostingsReader::open(merged.path())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let primaries: Vec<u32> = records.iter().map(|r| r.primary).collect();
    assert_eq!(primaries, vec![10, 20, 21, 30, 31, 32, 40, 41, 42, 43]);
}

#[test]
fn parallel_merge_produces_the_same_content() {
    let dir = tempdir().unwrap();
    let chunks: Vec<TestChunk> = (0..8)
        .map(|i| {
            let base = i * 10;
            chunk_of(dir.path(), &format!("c{i}.bin"), &[base, base + 1, base + 2])
        })
        .collect();

    let merged = merge_all(chunks, 4, |_| {}).unwrap().expect("one chunk survives");
    let records: Vec<PostingsData<u32, u32>> = PostingsReader::open(merged.path())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(records.len(), 24);
    assert!(records.windows(2).all(|w| w[0].primary < w[1].primary));
}

#[test]
fn single_chunk_is_returned_untouched() {
    let dir = tempdir().unwrap();
    let chunk = chunk_of(dir.path(), "only.bin", &[1, 2]);
    let size = chunk.size();
    let merged = merge_all(vec![chunk], 2, |_| {}).unwrap().expect("survivor");
    assert_eq!(merged.size(), size);
}

#[test]
fn no_chunks_yields_none() {
    let merged: Option<TestChunk> = merge_all(Vec::new(), 2, |_| {}).unwrap();
    assert!(merged.is_none());
}
