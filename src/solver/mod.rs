use std::{collections::BTreeMap, sync::mpsc, time::Instant};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::SolveError;

mod bitset;
mod layers;

use bitset::{BitSet, test_bit};
use layers::LayerStore;

/// Largest target accepted by default: one layer of 2^34 bits is 2 GiB
pub const DEFAULT_MAX_TARGET: u64 = 1 << 34;

/// Default cap on stored reachability layers: 2^30 words is 8 GiB
pub const DEFAULT_MAX_LAYER_WORDS: usize = 1 << 30;

pub type Outcome = Result<Option<Vec<u64>>, SolveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Keep every k-th reachability layer and replay the rest.
    /// 1 keeps all of them, 0 picks `ceil(sqrt(n))`.
    pub checkpoint_interval: usize,
    pub max_target: u64,
    /// Words the stored layers may take. Over it, the solver checkpoints
    /// every `ceil(sqrt(n))` layers instead, and gives up if that's still
    /// too much.
    pub max_layer_words: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 1,
            max_target: DEFAULT_MAX_TARGET,
            max_layer_words: DEFAULT_MAX_LAYER_WORDS,
        }
    }
}

/// Exact subset sum over non-negative integers using bit-parallel DP
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Finds a combination of values in `pool` that sums up to `target`.
    ///
    /// Returns `None` when no such combination exists. The witness lists
    /// values in pool order and is the same on every call: walking the pool
    /// backwards, an element is left out whenever the remaining sum is
    /// already reachable without it.
    pub fn solve(&self, pool: &[u64], target: u64) -> Result<Option<Vec<u64>>, SolveError> {
        let width = self.width_for(target)?;
        let interval = self.plan_layers(width, pool.len())?;
        let started = Instant::now();

        let mut layers = LayerStore::new(width, interval, pool.len())?;

        let mut dp = BitSet::new(width);
        dp.set(0);
        layers.observe(0, &dp);
        for (i, &value) in pool.iter().enumerate() {
            layers::advance(&mut dp, value);
            layers.observe(i + 1, &dp);
        }

        let target = width - 1;
        if !dp.test(target) {
            debug!(items = pool.len(), target, elapsed = ?started.elapsed(), "target unreachable");
            return Ok(None);
        }

        let mut subset = vec![];
        let mut remaining = target;
        for i in (1..=pool.len()).rev() {
            if remaining == 0 {
                break;
            }

            let prev = layers.layer(pool, i - 1);
            if test_bit(prev, remaining) {
                continue;
            }

            // Not reachable without this element, so it must be part of the sum
            let value = usize::try_from(pool[i - 1]).unwrap_or(usize::MAX);
            if remaining >= value && test_bit(prev, remaining - value) {
                subset.push(pool[i - 1]);
                remaining -= value;
            }
        }
        debug_assert_eq!(remaining, 0);
        subset.reverse();

        debug!(
            items = pool.len(),
            target,
            interval,
            resident_words = layers.resident_words(),
            picked = subset.len(),
            elapsed = ?started.elapsed(),
            "target reached"
        );

        Ok(Some(subset))
    }

    /// Solves independent instances on a pool of `jobs` threads and hands
    /// each outcome to `emit` as soon as all the ones before it are done.
    ///
    /// Outcomes arrive in input order whatever the thread count. An error
    /// from `emit` stops the reporting; instances already running finish.
    pub fn solve_each<F>(&self, instances: &[(&[u64], u64)], jobs: usize, mut emit: F) -> Result<()>
    where
        F: FnMut(usize, Outcome) -> Result<()>,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .context("build solver thread pool")?;

        let (tx, rx) = mpsc::channel();
        pool.in_place_scope(|scope| {
            scope.spawn(move |_| {
                instances
                    .par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (index, &(values, target))| {
                        // The receiver only hangs up after `emit` failed
                        let _ = tx.send((index, self.solve(values, target)));
                    });
            });

            let mut pending = BTreeMap::new();
            let mut next = 0;
            for (index, outcome) in rx {
                pending.insert(index, outcome);
                while let Some(outcome) = pending.remove(&next) {
                    emit(next, outcome)?;
                    next += 1;
                }
            }
            Ok(())
        })
    }

    fn width_for(&self, target: u64) -> Result<usize, SolveError> {
        let too_large = SolveError::TargetTooLarge {
            target,
            max: self.config.max_target,
        };
        if target > self.config.max_target {
            return Err(too_large);
        }
        usize::try_from(target)
            .ok()
            .and_then(|t| t.checked_add(1))
            .ok_or(too_large)
    }

    fn interval_for(&self, elements: usize) -> usize {
        match self.config.checkpoint_interval {
            0 => sqrt_interval(elements),
            k => k,
        }
    }

    /// Checkpoint interval that keeps the layers within `max_layer_words`
    fn plan_layers(&self, width: usize, elements: usize) -> Result<usize, SolveError> {
        let max = self.config.max_layer_words;
        let words = |interval| {
            LayerStore::words_needed(width, interval, elements).unwrap_or(usize::MAX)
        };

        let wanted = self.interval_for(elements);
        let needed = words(wanted);
        if needed <= max {
            return Ok(wanted);
        }

        let root = sqrt_interval(elements);
        if root != wanted && words(root) <= max {
            info!(wanted, interval = root, needed, max, "layers over budget, checkpointing");
            return Ok(root);
        }

        Err(SolveError::LayersTooLarge { words: needed, max })
    }
}

fn sqrt_interval(elements: usize) -> usize {
    let root = elements.isqrt();
    let root = if root * root < elements { root + 1 } else { root };
    root.max(1)
}
