use super::bitset::{BitSet, words_for};
use crate::error::SolveError;

fn reserve(words: Option<usize>) -> Result<Vec<u64>, SolveError> {
    let words = words.ok_or(SolveError::OutOfMemory { words: usize::MAX })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(words)
        .map_err(|_| SolveError::OutOfMemory { words })?;
    Ok(buf)
}

/// Applies one pool element to the reachable sums.
///
/// Values wider than the set (including anything that doesn't fit a `usize`)
/// leave it untouched.
pub fn advance(dp: &mut BitSet, value: u64) {
    let shift = usize::try_from(value).unwrap_or(usize::MAX);
    dp.or_shifted(shift);
}

/// Arena of reachability layers, one per pool prefix.
///
/// Only every `interval`-th layer is kept. Layers in between are replayed
/// from the closest checkpoint below them, one block at a time, so a
/// descending walk over all prefixes replays the pool exactly once.
pub struct LayerStore {
    interval: usize,
    width: usize,
    stride: usize,
    checkpoints: Vec<u64>,
    block: Vec<u64>,
    block_start: Option<usize>,
    block_layers: usize,
}

impl LayerStore {
    /// Words the store will hold at most: every checkpoint plus one replay
    /// block. `None` when that doesn't fit a `usize`.
    pub fn words_needed(width: usize, interval: usize, elements: usize) -> Option<usize> {
        let interval = interval.max(1);
        let block = if interval > 1 { interval } else { 0 };
        (elements / interval + 1)
            .checked_add(block)?
            .checked_mul(words_for(width))
    }

    /// Reserves everything up front, so that neither the forward pass nor
    /// the replays grow a buffer.
    pub fn new(width: usize, interval: usize, elements: usize) -> Result<Self, SolveError> {
        let interval = interval.max(1);
        let stride = words_for(width);
        let checkpoints = (elements / interval + 1).checked_mul(stride);
        let block = if interval > 1 { interval.checked_mul(stride) } else { Some(0) };

        Ok(Self {
            interval,
            width,
            stride,
            checkpoints: reserve(checkpoints)?,
            block: reserve(block)?,
            block_start: None,
            block_layers: 0,
        })
    }

    /// Offers the layer for `prefix` to the store; kept only on checkpoints.
    ///
    /// Prefixes must be observed in increasing order starting from 0.
    pub fn observe(&mut self, prefix: usize, layer: &BitSet) {
        if prefix % self.interval == 0 {
            debug_assert_eq!(self.checkpoints.len(), (prefix / self.interval) * self.stride);
            self.checkpoints.extend_from_slice(layer.as_words());
        }
    }

    /// Words held right now, checkpoints plus the replay block
    pub fn resident_words(&self) -> usize {
        self.checkpoints.len() + self.block.len()
    }

    /// Reachability using the first `prefix` elements of `pool`
    pub fn layer(&mut self, pool: &[u64], prefix: usize) -> &[u64] {
        let start = prefix - prefix % self.interval;
        if start == prefix {
            return self.checkpoint(start / self.interval);
        }

        if self.block_start != Some(start) || self.block_layers <= prefix - start {
            self.replay(pool, start, prefix);
        }

        let offset = (prefix - start) * self.stride;
        &self.block[offset..offset + self.stride]
    }

    fn checkpoint(&self, index: usize) -> &[u64] {
        let offset = index * self.stride;
        &self.checkpoints[offset..offset + self.stride]
    }

    fn replay(&mut self, pool: &[u64], start: usize, end: usize) {
        let mut dp = BitSet::new(self.width);
        dp.copy_from(self.checkpoint(start / self.interval));

        self.block.clear();
        self.block.extend_from_slice(dp.as_words());
        for &value in &pool[start..end] {
            advance(&mut dp, value);
            self.block.extend_from_slice(dp.as_words());
        }

        self.block_start = Some(start);
        self.block_layers = end - start + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(pool: &[u64], width: usize, interval: usize) -> (LayerStore, Vec<Vec<u64>>) {
        let mut dp = BitSet::new(width);
        dp.set(0);
        let mut store = LayerStore::new(width, interval, pool.len()).unwrap();
        let mut all = vec![dp.as_words().to_vec()];
        store.observe(0, &dp);
        for (i, &v) in pool.iter().enumerate() {
            advance(&mut dp, v);
            store.observe(i + 1, &dp);
            all.push(dp.as_words().to_vec());
        }
        (store, all)
    }

    #[test]
    fn test_full_snapshots() {
        let pool = [3, 5, 7, 11];
        let (mut store, all) = forward(&pool, 30, 1);
        assert_eq!(store.resident_words(), 5);
        for prefix in (0..=pool.len()).rev() {
            assert_eq!(store.layer(&pool, prefix), all[prefix].as_slice());
        }
        assert_eq!(store.resident_words(), 5);
    }

    #[test]
    fn test_checkpoints_replay_to_same_layers() {
        let pool = [70, 3, 64, 9, 129, 1, 2, 200, 40, 5, 6];
        for interval in [2, 3, 4, 11, 50] {
            let (mut store, all) = forward(&pool, 260, interval);
            for prefix in (0..=pool.len()).rev() {
                assert_eq!(
                    store.layer(&pool, prefix),
                    all[prefix].as_slice(),
                    "interval {interval}, prefix {prefix}"
                );
            }
        }
    }

    #[test]
    fn test_checkpoints_hold_less() {
        let pool = vec![1; 100];
        let (store, _) = forward(&pool, 64, 10);
        assert_eq!(store.resident_words(), 11);
    }

    #[test]
    fn test_words_needed() {
        // 2 words per layer: 5 checkpoints, plus a 3 layer block
        assert_eq!(LayerStore::words_needed(100, 3, 12), Some(16));
        assert_eq!(LayerStore::words_needed(100, 1, 12), Some(26));
        assert_eq!(LayerStore::words_needed(100, 0, 12), Some(26));
        assert_eq!(LayerStore::words_needed(usize::MAX, 1, 1 << 10), None);
    }

    #[test]
    fn test_replays_stay_within_reservation() {
        let pool = [70, 3, 64, 9, 129, 1, 2, 200, 40, 5, 6];
        let (mut store, _) = forward(&pool, 260, 4);
        let capacity = store.checkpoints.capacity() + store.block.capacity();
        for prefix in (0..=pool.len()).rev() {
            store.layer(&pool, prefix);
        }
        assert_eq!(store.checkpoints.capacity() + store.block.capacity(), capacity);
        assert!(store.resident_words() <= LayerStore::words_needed(260, 4, pool.len()).unwrap());
    }

    #[test]
    fn test_unallocatable_store_is_an_error() {
        let err = LayerStore::new(usize::MAX, 1, 1 << 10).err();
        assert_eq!(err, Some(SolveError::OutOfMemory { words: usize::MAX }));

        // Fits a usize but not the address space
        let err = LayerStore::new(1 << 62, 1, 0).err();
        assert_eq!(err, Some(SolveError::OutOfMemory { words: 1 << 56 }));
    }

    #[test]
    fn test_advance_ignores_wide_values() {
        let mut dp = BitSet::new(8);
        dp.set(0);
        advance(&mut dp, 8);
        advance(&mut dp, u64::MAX);
        assert!(dp.test(0));
        assert_eq!(dp.as_words(), &[1]);
    }
}
