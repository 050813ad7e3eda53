use crate::chunk::Chunk;
use crate::error::{IndexError, Result};
use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Sizes observed for one completed pairwise merge, in selection order.
#[derive(Debug, Clone, Copy)]
pub struct MergeEvent {
    pub left: u64,
    pub right: u64,
    pub merged: u64,
}

struct MergeState<P, S> {
    heap: BinaryHeap<Reverse<Chunk<P, S>>>,
    in_flight: usize,
    failed: Option<IndexError>,
}

/// Repeatedly merge the two smallest pending chunks until one remains.
///
/// Pair selection happens under a single lock, so the two-smallest rule holds
/// even when merges execute on several worker threads, and a chunk taken for
/// an in-flight merge cannot be selected again until it is reinserted. Each
/// merge is retried once on failure before the whole run is aborted with the
/// first error. `on_merge` is invoked per completed merge with the input and
/// output sizes.
pub fn merge_all<P, S, F>(chunks: Vec<Chunk<P, S>>, threads: usize, on_merge: F) -> Result<Option<Chunk<P, S>>>
where
    P: Serialize + DeserializeOwned + Ord + Send,
    S: Serialize + DeserializeOwned + Ord + Send,
    F: Fn(MergeEvent) + Sync,
{
    if chunks.len() <= 1 {
        return Ok(chunks.into_iter().next());
    }
    let workers = threads.max(1).min(chunks.len() / 2);
    tracing::info!(chunks = chunks.len(), workers, "merging chunks");

    let state = Mutex::new(MergeState {
        heap: chunks.into_iter().map(Reverse).collect(),
        in_flight: 0,
        failed: None,
    });
    let available = Condvar::new();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| merge_worker(&state, &available, &on_merge));
        }
    });

    let mut state = state.into_inner();
    if let Some(err) = state.failed.take() {
        return Err(err);
    }
    Ok(state.heap.pop().map(|Reverse(chunk)| chunk))
}

fn merge_worker<P, S, F>(state: &Mutex<MergeState<P, S>>, available: &Condvar, on_merge: &F)
where
    P: Serialize + DeserializeOwned + Ord + Send,
    S: Serialize + DeserializeOwned + Ord + Send,
    F: Fn(MergeEvent) + Sync,
{
    loop {
        let mut guard = state.lock();
        let (mut target, source) = loop {
            if guard.failed.is_some() {
                return;
            }
            if guard.heap.len() >= 2 {
                let Reverse(target) = guard.heap.pop().expect("heap has two chunks");
                let Reverse(source) = guard.heap.pop().expect("heap has two chunks");
                break (target, source);
            }
            if guard.in_flight == 0 {
                return;
            }
            available.wait(&mut guard);
        };
        guard.in_flight += 1;
        drop(guard);

        let (left, right) = (target.size(), source.size());
        let outcome = match target.merge_with(source) {
            Ok(()) => Ok(target),
            Err((err, source)) => {
                tracing::warn!(error = %err, "chunk merge failed, retrying once");
                match target.merge_with(source) {
                    Ok(()) => Ok(target),
                    Err((err, _source)) => Err(err),
                }
            }
        };

        let mut guard = state.lock();
        guard.in_flight -= 1;
        match outcome {
            Ok(chunk) => {
                on_merge(MergeEvent { left, right, merged: chunk.size() });
                guard.heap.push(Reverse(chunk));
            }
            Err(err) => {
                if guard.failed.is_none() {
                    guard.failed = Some(err);
                }
            }
        }
        available.notify_all();
    }
}
