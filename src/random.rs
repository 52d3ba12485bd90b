//! Random source helpers
//!
//! Stateful generators are never shared: each island owns a [`rand::rngs::StdRng`]
//! derived deterministically from the master seed, so runs are reproducible
//! for a fixed configuration.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Derive a generator for a given stream (island) from the master seed
///
/// Stream 0 is reserved for the archipelago itself; islands use their index
/// plus one.
pub fn derive_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15)))
}

/// Uniform real in [a, b)
pub fn uniform<R: Rng>(rng: &mut R, a: f64, b: f64) -> f64 {
    if a >= b {
        return a;
    }
    rng.gen_range(a..b)
}

/// Uniform integer in [a, b] (inclusive)
pub fn uniform_int<R: Rng>(rng: &mut R, a: i64, b: i64) -> i64 {
    if a >= b {
        return a;
    }
    rng.gen_range(a..=b)
}

/// Biased coin: true with probability p
pub fn flip_coin<R: Rng>(rng: &mut R, p: f64) -> bool {
    if p >= 1.0 {
        return true;
    }
    if p <= 0.0 {
        return false;
    }
    rng.gen_bool(p)
}

/// Shuffle a slice in place
pub fn shuffle<R: Rng, T>(rng: &mut R, values: &mut [T]) {
    values.shuffle(rng);
}

/// k distinct integers drawn from [lo, hi)
///
/// Panics if the range holds fewer than k values; callers size their pools.
pub fn distinct_ints<R: Rng>(rng: &mut R, k: usize, lo: usize, hi: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (lo..hi).collect();
    assert!(k <= pool.len(), "cannot draw {} distinct values from [{}, {})", k, lo, hi);
    pool.shuffle(rng);
    pool.truncate(k);
    pool
}

/// Partition indices into disjoint random groups of equal size
///
/// The number of indices must be a multiple of the group size.
pub fn random_groups<R: Rng>(rng: &mut R, indices: &mut [usize], group_size: usize) -> Vec<Vec<usize>> {
    indices.shuffle(rng);
    indices.chunks(group_size).map(|c| c.to_vec()).collect()
}

/// Latin-Hypercube samples over float ranges
///
/// Each dimension's range is partitioned into `n * dup` equal cells; `n`
/// distinct cells are drawn without replacement and each sample takes its
/// cell midpoint. Returns `n` points of dimension `min.len()`.
pub fn latin_hypercube<R: Rng>(
    rng: &mut R,
    n: usize,
    dup: usize,
    min: &[f64],
    max: &[f64],
) -> Vec<Vec<f64>> {
    let ndim = min.len();
    let ncells = n * dup.max(1);
    let mut points = vec![vec![0.0; ndim]; n];
    for j in 0..ndim {
        let width = (max[j] - min[j]) / ncells as f64;
        let cells = distinct_ints(rng, n, 0, ncells);
        for (i, &cell) in cells.iter().enumerate() {
            points[i][j] = min[j] + (cell as f64 + 0.5) * width;
        }
    }
    points
}

/// Latin-Hypercube samples over inclusive integer ranges
pub fn latin_hypercube_int<R: Rng>(
    rng: &mut R,
    n: usize,
    dup: usize,
    min: &[i64],
    max: &[i64],
) -> Vec<Vec<i64>> {
    let ndim = min.len();
    let ncells = n * dup.max(1);
    let mut points = vec![vec![0i64; ndim]; n];
    for j in 0..ndim {
        let span = (max[j] - min[j] + 1) as f64;
        let cells = distinct_ints(rng, n, 0, ncells);
        for (i, &cell) in cells.iter().enumerate() {
            let x = min[j] + ((cell as f64 + 0.5) * span / ncells as f64).floor() as i64;
            points[i][j] = x.clamp(min[j], max[j]);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_rng_is_deterministic() {
        let mut a = derive_rng(1234, 1);
        let mut b = derive_rng(1234, 1);
        let xs: Vec<f64> = (0..8).map(|_| a.gen::<f64>()).collect();
        let ys: Vec<f64> = (0..8).map(|_| b.gen::<f64>()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_derive_rng_streams_differ() {
        let mut a = derive_rng(1234, 1);
        let mut b = derive_rng(1234, 2);
        let xs: Vec<u64> = (0..4).map(|_| a.gen::<u64>()).collect();
        let ys: Vec<u64> = (0..4).map(|_| b.gen::<u64>()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_uniform_within_range() {
        let mut rng = derive_rng(42, 0);
        for _ in 0..100 {
            let x = uniform(&mut rng, -3.0, 7.0);
            assert!((-3.0..7.0).contains(&x));
        }
    }

    #[test]
    fn test_uniform_int_inclusive() {
        let mut rng = derive_rng(42, 0);
        let mut seen_lo = false;
        let mut seen_hi = false;
        for _ in 0..500 {
            let x = uniform_int(&mut rng, 0, 3);
            assert!((0..=3).contains(&x));
            seen_lo |= x == 0;
            seen_hi |= x == 3;
        }
        assert!(seen_lo && seen_hi);
    }

    #[test]
    fn test_flip_coin_extremes() {
        let mut rng = derive_rng(42, 0);
        assert!(flip_coin(&mut rng, 1.0));
        assert!(!flip_coin(&mut rng, 0.0));
    }

    #[test]
    fn test_distinct_ints_are_distinct() {
        let mut rng = derive_rng(42, 0);
        let picked = distinct_ints(&mut rng, 10, 0, 50);
        assert_eq!(picked.len(), 10);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
        assert!(picked.iter().all(|&v| v < 50));
    }

    #[test]
    fn test_random_groups_cover_all_indices() {
        let mut rng = derive_rng(42, 0);
        let mut indices: Vec<usize> = (0..12).collect();
        let groups = random_groups(&mut rng, &mut indices, 3);
        assert_eq!(groups.len(), 4);
        let mut all: Vec<usize> = groups.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_latin_hypercube_stratification() {
        let mut rng = derive_rng(42, 0);
        let n = 10;
        let pts = latin_hypercube(&mut rng, n, 1, &[0.0, -5.0], &[1.0, 5.0]);
        assert_eq!(pts.len(), n);
        // with dup = 1 every cell is used exactly once per dimension
        for j in 0..2 {
            let (lo, hi) = if j == 0 { (0.0, 1.0) } else { (-5.0, 5.0) };
            let width = (hi - lo) / n as f64;
            let mut cells: Vec<usize> = pts
                .iter()
                .map(|p| ((p[j] - lo) / width).floor() as usize)
                .collect();
            cells.sort_unstable();
            assert_eq!(cells, (0..n).collect::<Vec<_>>());
            for p in &pts {
                assert!(p[j] >= lo && p[j] <= hi);
            }
        }
    }

    #[test]
    fn test_latin_hypercube_int_within_bounds() {
        let mut rng = derive_rng(42, 0);
        let pts = latin_hypercube_int(&mut rng, 8, 3, &[0, -2], &[5, 2]);
        assert_eq!(pts.len(), 8);
        for p in &pts {
            assert!((0..=5).contains(&p[0]));
            assert!((-2..=2).contains(&p[1]));
        }
    }
}
