//! Solution record
//!
//! Holds one individual's decision vectors, objective and penalty values,
//! and the dominance/crowding metadata recomputed by each ranking pass.
//! The `closest` back-reference is an index into the owning island's
//! solution vector, used for lookup only.

use std::cmp::Ordering;

use rand::Rng;

use crate::params::Parameters;
use crate::random::flip_coin;

/// Numeric guard added to every normalisation denominator
pub const EPS_DEN: f64 = 1e-15;

/// One individual: decision variables, evaluation results, and metadata
#[derive(Clone, Debug)]
pub struct Solution {
    /// Identifier (stable within one island generation)
    pub id: usize,
    /// Objective values (minimised)
    pub ova: Vec<f64>,
    /// Out-of-range values; each >= 0, zero meaning feasible on that constraint
    pub oor: Vec<f64>,
    /// Float decision variables
    pub flt: Vec<f64>,
    /// Integer decision variables
    pub int: Vec<i64>,

    /// Indices of solutions dominated by this one (within the ranked set)
    pub wins: Vec<usize>,
    /// Number of solutions this one dominates
    pub n_wins: usize,
    /// Number of solutions dominating this one
    pub n_losses: usize,
    /// Pareto front rank; 0 is best
    pub front_id: usize,
    /// Crowding distance within the front
    pub dist_crowd: f64,
    /// Minimum normalised objective-space distance to any other solution
    pub dist_neigh: f64,
    /// Index of the nearest solution, when one exists
    pub closest: Option<usize>,
    /// Marked by duplicate detection over decision vectors
    pub repeated: bool,
    /// Replacement score from the last appraisal; lower is better
    pub demerit: f64,
}

impl Solution {
    /// Allocate an empty solution shaped by the parameters
    pub fn new(id: usize, prm: &Parameters) -> Self {
        Self {
            id,
            ova: vec![0.0; prm.nova],
            oor: vec![0.0; prm.noor],
            flt: vec![0.0; prm.nflt],
            int: vec![0; prm.nint],
            wins: Vec::new(),
            n_wins: 0,
            n_losses: 0,
            front_id: 0,
            dist_crowd: 0.0,
            dist_neigh: f64::INFINITY,
            closest: None,
            repeated: false,
            demerit: 0.0,
        }
    }

    /// Copy the essential data (id, values, decision vectors) into another
    /// solution; metadata is left for the next ranking pass
    pub fn copy_into(&self, other: &mut Solution) {
        other.id = self.id;
        other.ova.copy_from_slice(&self.ova);
        other.oor.copy_from_slice(&self.oor);
        other.flt.copy_from_slice(&self.flt);
        other.int.copy_from_slice(&self.int);
    }

    /// True iff every penalty component is zero
    pub fn is_feasible(&self) -> bool {
        self.oor.iter().all(|&v| v <= 0.0)
    }

    /// Number of violated constraints
    pub fn n_violations(&self) -> usize {
        self.oor.iter().filter(|&&v| v > 0.0).count()
    }

    /// Normalised decision-space (genotype) distance to another solution
    pub fn distance(
        &self,
        other: &Solution,
        fmin: &[f64],
        fmax: &[f64],
        imin: &[i64],
        imax: &[i64],
        absolute: bool,
    ) -> f64 {
        if absolute {
            let mut dist = 0.0;
            for i in 0..self.flt.len() {
                dist += (self.flt[i] - other.flt[i]).abs() / (fmax[i] - fmin[i] + EPS_DEN);
            }
            for i in 0..self.int.len() {
                dist += ((self.int[i] - other.int[i]) as f64).abs()
                    / ((imax[i] - imin[i]) as f64 + EPS_DEN);
            }
            dist
        } else {
            let mut dflt = 0.0;
            for i in 0..self.flt.len() {
                let d = (self.flt[i] - other.flt[i]) / (fmax[i] - fmin[i] + EPS_DEN);
                dflt += d * d;
            }
            let mut dint = 0.0;
            for i in 0..self.int.len() {
                let d = (self.int[i] - other.int[i]) as f64 / ((imax[i] - imin[i]) as f64 + EPS_DEN);
                dint += d * d;
            }
            dflt.sqrt() + dint.sqrt()
        }
    }

    /// Normalised objective-space (phenotype) distance to another solution
    pub fn ova_distance(&self, other: &Solution, omin: &[f64], omax: &[f64], absolute: bool) -> f64 {
        if absolute {
            let mut dist = 0.0;
            for i in 0..self.ova.len() {
                dist += (self.ova[i] - other.ova[i]).abs() / (omax[i] - omin[i] + EPS_DEN);
            }
            dist
        } else {
            let mut dist = 0.0;
            for i in 0..self.ova.len() {
                let d = (self.ova[i] - other.ova[i]) / (omax[i] - omin[i] + EPS_DEN);
                dist += d * d;
            }
            dist.sqrt()
        }
    }
}

/// Pareto minimisation over two vectors
///
/// Returns (a_dominates, b_dominates); never both.
pub fn pareto_min(a: &[f64], b: &[f64]) -> (bool, bool) {
    let mut a_better = false;
    let mut b_better = false;
    for (x, y) in a.iter().zip(b.iter()) {
        if x < y {
            a_better = true;
        } else if y < x {
            b_better = true;
        }
    }
    (a_better && !b_better, b_better && !a_better)
}

/// Constraint-aware dominance
///
/// Feasible solutions compare on objectives; infeasible pairs compare on
/// violation count, then on the penalty vectors, then on objectives; a
/// feasible solution always dominates an infeasible one.
pub fn compare(a: &Solution, b: &Solution) -> (bool, bool) {
    let nva = a.n_violations();
    let nvb = b.n_violations();
    if nva > 0 {
        if nvb > 0 {
            if nva < nvb {
                return (true, false);
            }
            if nvb < nva {
                return (false, true);
            }
            let (a_dom, b_dom) = pareto_min(&a.oor, &b.oor);
            if !a_dom && !b_dom {
                return pareto_min(&a.ova, &b.ova);
            }
            return (a_dom, b_dom);
        }
        return (false, true);
    }
    if nvb > 0 {
        return (true, false);
    }
    pareto_min(&a.ova, &b.ova)
}

/// Probabilistic comparison: Pareto relation on phi-blended objective vectors
///
/// The feasibility ladder is unchanged; for a feasible pair the vectors
/// `phi*A + (1-phi)*B` and `phi*B + (1-phi)*A` are compared instead of the
/// raw objectives. phi = 1 degenerates to plain dominance.
pub fn compare_blend(a: &Solution, b: &Solution, phi: f64) -> (bool, bool) {
    let nva = a.n_violations();
    let nvb = b.n_violations();
    if nva > 0 || nvb > 0 {
        return compare(a, b);
    }
    let ma: Vec<f64> = a
        .ova
        .iter()
        .zip(b.ova.iter())
        .map(|(x, y)| phi * x + (1.0 - phi) * y)
        .collect();
    let mb: Vec<f64> = a
        .ova
        .iter()
        .zip(b.ova.iter())
        .map(|(x, y)| phi * y + (1.0 - phi) * x)
        .collect();
    pareto_min(&ma, &mb)
}

/// Tie-break configuration for tournaments
#[derive(Clone, Copy, Debug)]
pub struct FightCfg {
    /// Break same-front ties by crowding then neighbour distance
    pub use_dist: bool,
    /// Use the phi-blended comparison instead of strict dominance
    pub comp_prob: bool,
    /// Blend weight for the probabilistic comparison
    pub pareto_phi: f64,
}

impl FightCfg {
    /// Extract the tournament knobs from the parameters
    pub fn from_params(prm: &Parameters) -> Self {
        Self {
            use_dist: prm.use_dist_fight,
            comp_prob: prm.comp_prob,
            pareto_phi: prm.pareto_phi,
        }
    }
}

/// Crowded binary tournament; returns true if A wins
pub fn fight<R: Rng>(a: &Solution, b: &Solution, cfg: &FightCfg, rng: &mut R) -> bool {
    let (a_dom, b_dom) = if cfg.comp_prob {
        compare_blend(a, b, cfg.pareto_phi)
    } else {
        compare(a, b)
    };
    if a_dom {
        return true;
    }
    if b_dom {
        return false;
    }
    if cfg.use_dist && a.front_id == b.front_id {
        if a.dist_crowd > b.dist_crowd {
            return true;
        }
        if b.dist_crowd > a.dist_crowd {
            return false;
        }
        if a.dist_neigh > b.dist_neigh {
            return true;
        }
        if b.dist_neigh > a.dist_neigh {
            return false;
        }
    }
    flip_coin(rng, 0.5)
}

/// Total best-first ordering: front ascending, crowding descending,
/// neighbour distance descending, id ascending
pub fn best_cmp(a: &Solution, b: &Solution) -> Ordering {
    a.front_id
        .cmp(&b.front_id)
        .then_with(|| {
            b.dist_crowd
                .partial_cmp(&a.dist_crowd)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| {
            b.dist_neigh
                .partial_cmp(&a.dist_neigh)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.id.cmp(&b.id))
}
