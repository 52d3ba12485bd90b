//! Population group
//!
//! A fixed-size container of solutions with best-first sorting, duplicate
//! marking, a homogeneity statistic, and the regeneration redraw used when
//! an island's floats collapse onto one point.

use rand::Rng;

use crate::params::Parameters;
use crate::random::uniform;
use crate::solution::{best_cmp, Solution};

/// Relative tolerance for duplicate decision vectors
const EPS_REPEATED: f64 = 1e-8;

/// A group of solutions owned by one island
#[derive(Clone, Debug, Default)]
pub struct Group {
    /// The solutions; order is whatever the last sort left
    pub sols: Vec<Solution>,
}

impl Group {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group of freshly allocated solutions
    pub fn allocate(n: usize, id_offset: usize, prm: &Parameters) -> Self {
        Self {
            sols: (0..n).map(|i| Solution::new(id_offset + i, prm)).collect(),
        }
    }

    /// Number of solutions
    pub fn len(&self) -> usize {
        self.sols.len()
    }

    /// True if the group holds no solutions
    pub fn is_empty(&self) -> bool {
        self.sols.is_empty()
    }

    /// Iterate over the solutions
    pub fn iter(&self) -> impl Iterator<Item = &Solution> {
        self.sols.iter()
    }

    /// The best solution under the total best-first order
    pub fn best(&self) -> Option<&Solution> {
        self.sols.iter().min_by(|a, b| best_cmp(a, b))
    }

    /// Sort best-first: front ascending, crowding descending, neighbour
    /// distance descending, id ascending
    pub fn sort_best_first(&mut self) {
        self.sols.sort_by(best_cmp);
    }

    /// Sort by the demerit values of the last appraisal, best (lowest) first
    pub fn sort_by_demerit(&mut self) {
        self.sols.sort_by(|a, b| {
            a.demerit
                .partial_cmp(&b.demerit)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Flag solutions whose decision vectors duplicate an earlier one
    ///
    /// Floats match up to a relative epsilon; integers match exactly. The
    /// first occurrence keeps `repeated = false`.
    pub fn mark_repeated(&mut self) {
        let n = self.sols.len();
        for s in self.sols.iter_mut() {
            s.repeated = false;
        }
        for i in 0..n {
            if self.sols[i].repeated {
                continue;
            }
            for j in (i + 1)..n {
                if !self.sols[j].repeated && same_decision(&self.sols[i], &self.sols[j]) {
                    self.sols[j].repeated = true;
                }
            }
        }
    }

    /// Number of non-duplicate solutions after [`Group::mark_repeated`]
    pub fn n_distinct(&self) -> usize {
        self.sols.iter().filter(|s| !s.repeated).count()
    }

    /// Normalised deviation of the float genes, averaged across genes
    ///
    /// A value below `reg_tol` means the population has gone homogeneous.
    /// Returns infinity when there are no float genes.
    pub fn homogeneity(&self) -> f64 {
        let nflt = self.sols.first().map_or(0, |s| s.flt.len());
        if nflt == 0 || self.sols.len() < 2 {
            return f64::INFINITY;
        }
        let n = self.sols.len() as f64;
        let mut total = 0.0;
        for j in 0..nflt {
            let mean = self.sols.iter().map(|s| s.flt[j]).sum::<f64>() / n;
            let var = self
                .sols
                .iter()
                .map(|s| (s.flt[j] - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            let largest = self
                .sols
                .iter()
                .map(|s| s.flt[j].abs())
                .fold(0.0_f64, f64::max);
            total += var.sqrt() / (1.0 + largest);
        }
        total / nflt as f64
    }

    /// Redraw the floats of the worst `reg_pct` fraction uniformly in bounds
    ///
    /// Assumes the group is sorted best-first; the caller re-evaluates the
    /// touched solutions. Returns the index of the first regenerated slot.
    pub fn regenerate_floats<R: Rng>(&mut self, prm: &Parameters, rng: &mut R) -> usize {
        let n = self.sols.len();
        let start = n - ((prm.reg_pct * n as f64) as usize).min(n);
        for sol in self.sols.iter_mut().skip(start) {
            for j in 0..prm.nflt {
                sol.flt[j] = uniform(rng, prm.flt_min[j], prm.flt_max[j]);
            }
        }
        start
    }
}

fn same_decision(a: &Solution, b: &Solution) -> bool {
    if a.int != b.int {
        return false;
    }
    a.flt.iter().zip(b.flt.iter()).all(|(x, y)| {
        (x - y).abs() <= EPS_REPEATED * x.abs().max(y.abs()).max(1.0)
    })
}
