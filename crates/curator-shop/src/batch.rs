//! # Bounded Parallel Batches
//!
//! Partition a work list into fixed-size chunks, run each chunk's items
//! concurrently, await the chunk, then move on. This bounds simultaneous
//! outbound connections without serializing the whole job.

use futures_util::future::join_all;
use std::future::Future;

/// Runs `op` over `items` in bounded parallel chunks.
///
/// Results come back in input order regardless of completion order
/// within a chunk. `chunk_size` of zero is treated as one.
pub async fn run_chunked<T, R, F, Fut>(items: Vec<T>, chunk_size: usize, mut op: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let chunk_size = chunk_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut items = items.into_iter();

    loop {
        let chunk: Vec<Fut> = items.by_ref().take(chunk_size).map(&mut op).collect();
        if chunk.is_empty() {
            break;
        }
        results.extend(join_all(chunk).await);
    }

    results
}

// =============================================================================
// Unit Tests
// =============================================================================
