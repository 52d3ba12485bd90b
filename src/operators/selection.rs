//! Selection disciplines
//!
//! Roulette and stochastic-universal sampling over demerit- or rank-derived
//! fitness, plus the pair filter that turns selected indices into disjoint
//! breeding pairs.

use rand::Rng;

use crate::random::{shuffle, uniform};
use crate::solution::EPS_DEN;

/// Linear-ranking fitness (Baker)
///
/// For a population sorted best-first, position i receives
/// `2 - sp + 2(sp - 1)(n - 1 - i)/(n - 1)` with selective pressure
/// `sp` in [1, 2].
pub fn ranking_fitness(n: usize, sp: f64) -> Vec<f64> {
    let sp = if (1.0..=2.0).contains(&sp) { sp } else { 1.2 };
    (0..n)
        .map(|i| 2.0 - sp + 2.0 * (sp - 1.0) * (n - 1 - i) as f64 / (n - 1) as f64)
        .collect()
}

/// Fitness from demerits: shifted and scaled so the best (lowest demerit)
/// gets 1 and the worst gets 0; a flat population gets uniform fitness
pub fn demerit_fitness(demerits: &[f64]) -> Vec<f64> {
    let min = demerits.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = demerits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < 1e-14 {
        return vec![1.0; demerits.len()];
    }
    demerits.iter().map(|d| (max - d) / (max - min)).collect()
}

/// Cumulative selection probabilities from non-negative fitness values
///
/// The last entry is forced to exactly 1 so lookups cannot run off the end.
pub fn cumulative_probs(fitness: &[f64]) -> Vec<f64> {
    let sum: f64 = fitness.iter().sum::<f64>() + EPS_DEN;
    let mut acc = 0.0;
    let mut cum: Vec<f64> = fitness
        .iter()
        .map(|f| {
            acc += f / sum;
            acc
        })
        .collect();
    if let Some(last) = cum.last_mut() {
        *last = 1.0;
    }
    cum
}

/// Roulette-wheel selection: n independent uniform draws over the CDF
pub fn roulette_select<R: Rng>(rng: &mut R, cumprob: &[f64], selected: &mut [usize]) {
    for slot in selected.iter_mut() {
        let s = rng.gen::<f64>();
        *slot = cumprob
            .iter()
            .position(|&m| m > s)
            .unwrap_or(cumprob.len() - 1);
    }
}

/// Stochastic-universal sampling: one draw in [0, 1/n), then equally spaced
/// pointers; lower variance than roulette
pub fn sus_select<R: Rng>(rng: &mut R, cumprob: &[f64], selected: &mut [usize]) {
    let n = selected.len();
    let dp = 1.0 / n as f64;
    let mut pb = uniform(rng, 0.0, dp);
    let mut j = 0;
    for slot in selected.iter_mut() {
        while j < cumprob.len() - 1 && pb > cumprob[j] {
            j += 1;
        }
        *slot = j;
        pb += dp;
    }
}

/// Split selected indices into disjoint breeding pairs
///
/// Colliding pairs (a parent drawn against itself) replace the second
/// member with the first non-equal index from a shuffled pool of the
/// selections.
pub fn filter_pairs<R: Rng>(rng: &mut R, selinds: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let half = selinds.len() / 2;
    let mut a_list = Vec::with_capacity(half);
    let mut b_list = Vec::with_capacity(half);
    let mut pool: Vec<usize> = Vec::new();
    for i in 0..half {
        let a = selinds[2 * i];
        let mut b = selinds[2 * i + 1];
        if a == b {
            if pool.is_empty() {
                pool = selinds.to_vec();
            }
            shuffle(rng, &mut pool);
            if let Some(&other) = pool.iter().find(|&&s| s != a) {
                b = other;
            }
        }
        a_list.push(a);
        b_list.push(b);
    }
    (a_list, b_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::derive_rng;
    use approx::assert_relative_eq;

    #[test]
    fn test_ranking_fitness_extremes() {
        let f = ranking_fitness(5, 2.0);
        assert_relative_eq!(f[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(f[4], 0.0, epsilon = 1e-12);
        // invalid pressure falls back to 1.2
        let g = ranking_fitness(5, 5.0);
        assert_relative_eq!(g[0], 2.0 - 1.2 + 2.0 * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_demerit_fitness_orientation() {
        let f = demerit_fitness(&[0.0, 1.0, 2.0]);
        assert_relative_eq!(f[0], 1.0);
        assert_relative_eq!(f[1], 0.5);
        assert_relative_eq!(f[2], 0.0);
    }

    #[test]
    fn test_demerit_fitness_flat_population() {
        let f = demerit_fitness(&[3.0, 3.0, 3.0]);
        assert_eq!(f, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_cumulative_probs_monotone_ending_at_one() {
        let cum = cumulative_probs(&[1.0, 2.0, 3.0, 4.0]);
        for w in cum.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert_eq!(*cum.last().unwrap(), 1.0);
    }

    #[test]
    fn test_roulette_prefers_fit_individuals() {
        let mut rng = derive_rng(1234, 0);
        let cum = cumulative_probs(&[9.0, 1.0, 0.0]);
        let mut sel = vec![0usize; 1000];
        roulette_select(&mut rng, &cum, &mut sel);
        let first = sel.iter().filter(|&&s| s == 0).count();
        let last = sel.iter().filter(|&&s| s == 2).count();
        assert!(first > 800);
        assert_eq!(last, 0);
    }

    #[test]
    fn test_sus_uniform_fitness_selects_everyone_once() {
        let mut rng = derive_rng(1234, 0);
        let n = 8;
        let cum = cumulative_probs(&vec![1.0; n]);
        let mut sel = vec![0usize; n];
        sus_select(&mut rng, &cum, &mut sel);
        let mut sorted = sel.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_pairs_avoids_self_pairing() {
        let mut rng = derive_rng(1234, 0);
        let selinds = vec![3, 3, 1, 2, 0, 0];
        let (a, b) = filter_pairs(&mut rng, &selinds);
        assert_eq!(a.len(), 3);
        for i in 0..3 {
            assert_ne!(a[i], b[i]);
        }
    }

    #[test]
    fn test_filter_pairs_keeps_clean_pairs() {
        let mut rng = derive_rng(1234, 0);
        let selinds = vec![0, 1, 2, 3];
        let (a, b) = filter_pairs(&mut rng, &selinds);
        assert_eq!(a, vec![0, 2]);
        assert_eq!(b, vec![1, 3]);
    }
}
