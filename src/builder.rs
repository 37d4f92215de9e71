use indexmap::IndexSet;

use crate::error::InputError;

/// A pool of distinct positive values with a subset known to reach `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantedInstance {
    pub pool: Vec<u64>,
    pub subset: Vec<u64>,
    pub target: u64,
}

impl PlantedInstance {
    pub fn is_distinct(&self) -> bool {
        self.pool.iter().collect::<IndexSet<_>>().len() == self.pool.len()
    }

    pub fn closes_target(&self) -> bool {
        self.subset.iter().map(|&v| u128::from(v)).sum::<u128>() == u128::from(self.target)
    }
}

/// 1 + 2 + ... + k
fn triangular(k: u64) -> u128 {
    let k = u128::from(k);
    k * (k + 1) / 2
}

/// Builds `n` distinct positive values containing a subset that sums to `target`.
///
/// The planted subset is `1, 2, ..., k, last` with `last = target - Tri(k)`,
/// where `k` is chosen so that `last > k` and one pool slot stays free for
/// `last`. The rest of the pool is filled with the smallest unused values
/// above the subset. Deterministic: same inputs, same pool.
pub fn build(target: u64, n: usize) -> Result<PlantedInstance, InputError> {
    if target == 0 {
        return Err(InputError::NonPositiveTarget);
    }
    if n < 2 {
        return Err(InputError::CountTooSmall(n));
    }

    let subset = base_subset(target, n);

    let mut pool: IndexSet<u64> = subset.iter().copied().collect();
    let mut next = subset.iter().max().map_or(1, |max| max + 1);
    while pool.len() < n {
        pool.insert(next);
        next += 1;
    }

    Ok(PlantedInstance {
        pool: pool.into_iter().collect(),
        subset,
        target,
    })
}

fn base_subset(target: u64, n: usize) -> Vec<u64> {
    let budget = u64::try_from(n - 1).unwrap_or(u64::MAX);
    let wanted = u128::from(target);

    let mut k = 1;
    while k < budget && triangular(k + 1) < wanted {
        k += 1;
    }

    while k >= 1 {
        if let Some(last) = wanted.checked_sub(triangular(k)) {
            if last > u128::from(k) {
                // last <= target, so it fits
                let last = last as u64;
                return (1..=k).chain(std::iter::once(last)).collect();
            }
        }
        k -= 1;
    }

    // Only targets 1 and 2 get here; {1, target - 1} would repeat 1 for target 2
    match target {
        1 | 2 => vec![target],
        _ => vec![1, target - 1],
    }
}
