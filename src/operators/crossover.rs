//! Crossover and recombination strategies
//!
//! Two full variation pathways over the mixed float/integer genome: Deb's
//! simulated binary crossover with polynomial mutation, and differential-
//! evolution recombination. Integer genes use uniform crossover plus
//! random-reset mutation in both pathways.

use rand::rngs::StdRng;
use rand::Rng;

use crate::operators::mutation;
use crate::operators::traits::Variation;
use crate::params::Parameters;
use crate::random::flip_coin;
use crate::solution::Solution;

/// Uniform per-locus crossover for integer genes
pub fn uniform_int_crossover<R: Rng>(
    pa: &[i64],
    pb: &[i64],
    ca: &mut [i64],
    cb: &mut [i64],
    rng: &mut R,
) {
    for i in 0..pa.len() {
        if flip_coin(rng, 0.5) {
            ca[i] = pa[i];
            cb[i] = pb[i];
        } else {
            ca[i] = pb[i];
            cb[i] = pa[i];
        }
    }
}

/// Simulated binary crossover with polynomial mutation
///
/// With probability `pc` per pair the SBX spread factor recombines each
/// float gene; otherwise the parents are copied. Children are then mutated.
///
/// Reference: Deb, K., & Agrawal, R. B. (1995). Simulated Binary Crossover
/// for Continuous Search Space.
#[derive(Clone, Debug)]
pub struct DebVariation {
    /// Per-pair crossover probability
    pub pc: f64,
    /// SBX distribution index; higher keeps offspring closer to parents
    pub eta_c: f64,
    /// Polynomial mutation distribution index
    pub eta_m: f64,
    /// Per-gene float mutation probability
    pub pm_flt: f64,
    /// Per-gene integer mutation probability
    pub pm_int: f64,
}

impl DebVariation {
    /// Build from the configured knobs
    pub fn from_params(prm: &Parameters) -> Self {
        Self {
            pc: prm.de_pc,
            eta_c: prm.deb_etac,
            eta_m: prm.deb_etam,
            pm_flt: prm.pm_flt,
            pm_int: prm.pm_int,
        }
    }

    fn spread_factor(&self, u: f64) -> f64 {
        if u <= 0.5 {
            (2.0 * u).powf(1.0 / (self.eta_c + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (self.eta_c + 1.0))
        }
    }
}

impl Variation for DebVariation {
    fn breed(
        &self,
        pop: &[Solution],
        a: usize,
        b: usize,
        child1: &mut Solution,
        child2: &mut Solution,
        prm: &Parameters,
        _time: usize,
        rng: &mut StdRng,
    ) {
        let p1 = &pop[a];
        let p2 = &pop[b];

        if prm.nflt > 0 {
            if flip_coin(rng, self.pc) {
                for i in 0..prm.nflt {
                    let (x1, x2) = (p1.flt[i], p2.flt[i]);
                    let u = rng.gen::<f64>();
                    let beta = self.spread_factor(u);
                    let sum = x1 + x2;
                    let diff = (x2 - x1).abs();
                    child1.flt[i] = prm.enforce_range(i, 0.5 * (sum - beta * diff));
                    child2.flt[i] = prm.enforce_range(i, 0.5 * (sum + beta * diff));
                }
            } else {
                child1.flt.copy_from_slice(&p1.flt);
                child2.flt.copy_from_slice(&p2.flt);
            }
            mutation::polynomial(
                &mut child1.flt,
                self.eta_m,
                self.pm_flt,
                &prm.flt_min,
                &prm.flt_max,
                rng,
            );
            mutation::polynomial(
                &mut child2.flt,
                self.eta_m,
                self.pm_flt,
                &prm.flt_min,
                &prm.flt_max,
                rng,
            );
        }

        if prm.nint > 0 {
            uniform_int_crossover(&p1.int, &p2.int, &mut child1.int, &mut child2.int, rng);
            mutation::random_reset(
                &mut child1.int,
                self.pm_int,
                &prm.int_min,
                &prm.int_max,
                rng,
            );
            mutation::random_reset(
                &mut child2.int,
                self.pm_int,
                &prm.int_min,
                &prm.int_max,
                rng,
            );
        }
    }
}

/// Differential-evolution recombination (rand/1/bin)
///
/// Each child is the binomial crossover of its target parent with the
/// mutant `x_r1 + F * (x_r2 - x_r3)`, where r1, r2, r3 are distinct random
/// donors different from the target. One gene always inherits from the
/// mutant so a child is never a plain copy.
#[derive(Clone, Debug)]
pub struct DeVariation {
    /// Binomial crossover rate
    pub pc: f64,
    /// Difference multiplier F
    pub f_mult: f64,
    /// Polynomial mutation distribution index
    pub eta_m: f64,
    /// Per-gene float mutation probability
    pub pm_flt: f64,
    /// Per-gene integer mutation probability
    pub pm_int: f64,
}

impl DeVariation {
    /// Build from the configured knobs
    pub fn from_params(prm: &Parameters) -> Self {
        Self {
            pc: prm.de_pc,
            f_mult: prm.de_mult,
            eta_m: prm.deb_etam,
            pm_flt: prm.pm_flt,
            pm_int: prm.pm_int,
        }
    }

    fn de_child(
        &self,
        pop: &[Solution],
        target: usize,
        child: &mut Solution,
        prm: &Parameters,
        rng: &mut StdRng,
    ) {
        let n = pop.len();
        let pick = |rng: &mut StdRng, taken: &[usize]| loop {
            let r = rng.gen_range(0..n);
            if r != target && !taken.contains(&r) {
                return r;
            }
        };
        let r1 = pick(rng, &[]);
        let r2 = pick(rng, &[r1]);
        let r3 = pick(rng, &[r1, r2]);
        let jrand = rng.gen_range(0..prm.nflt);
        for j in 0..prm.nflt {
            let x = if j == jrand || flip_coin(rng, self.pc) {
                pop[r1].flt[j] + self.f_mult * (pop[r2].flt[j] - pop[r3].flt[j])
            } else {
                pop[target].flt[j]
            };
            child.flt[j] = prm.enforce_range(j, x);
        }
    }
}

impl Variation for DeVariation {
    fn breed(
        &self,
        pop: &[Solution],
        a: usize,
        b: usize,
        child1: &mut Solution,
        child2: &mut Solution,
        prm: &Parameters,
        _time: usize,
        rng: &mut StdRng,
    ) {
        if prm.nflt > 0 {
            self.de_child(pop, a, child1, prm, rng);
            self.de_child(pop, b, child2, prm, rng);
            mutation::polynomial(
                &mut child1.flt,
                self.eta_m,
                self.pm_flt,
                &prm.flt_min,
                &prm.flt_max,
                rng,
            );
            mutation::polynomial(
                &mut child2.flt,
                self.eta_m,
                self.pm_flt,
                &prm.flt_min,
                &prm.flt_max,
                rng,
            );
        }
        if prm.nint > 0 {
            uniform_int_crossover(
                &pop[a].int,
                &pop[b].int,
                &mut child1.int,
                &mut child2.int,
                rng,
            );
            mutation::random_reset(
                &mut child1.int,
                self.pm_int,
                &prm.int_min,
                &prm.int_max,
                rng,
            );
            mutation::random_reset(
                &mut child2.int,
                self.pm_int,
                &prm.int_min,
                &prm.int_max,
                rng,
            );
        }
    }
}

/// Pick the variation pathway configured by the parameters
pub fn make_variation(prm: &Parameters) -> Box<dyn Variation> {
    if prm.use_de {
        Box::new(DeVariation::from_params(prm))
    } else {
        Box::new(DebVariation::from_params(prm))
    }
}
