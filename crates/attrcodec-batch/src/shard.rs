//! Static, index-based sharding of the flattened field list.

use std::ops::Range;

/// Split `len` items into `min(workers, len)` contiguous, disjoint ranges
/// whose union is `0..len`. Earlier shards take the remainder, so sizes
/// differ by at most one.
pub fn shard_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let shards = workers.max(1).min(len);
    if shards == 0 {
        return Vec::new();
    }

    let base = len / shards;
    let remainder = len % shards;
    let mut ranges = Vec::with_capacity(shards);
    let mut start = 0;
    for i in 0..shards {
        let size = base + usize::from(i < remainder);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}
