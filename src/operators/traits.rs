//! Operator and evaluator traits
//!
//! The variation strategy is chosen once at island construction and
//! dispatched through this seam, keeping variant switches out of the hot
//! loop.

use rand::rngs::StdRng;

use crate::params::Parameters;
use crate::report::Report;
use crate::solution::Solution;

/// Variation operator: fills two children from a pair of parents
///
/// Implementations read parent genomes from `pop` (which also provides the
/// donor pool for population-based recombination) and overwrite the
/// children's decision vectors; objective values are recomputed by the
/// caller. Every written gene is clamped to the configured range.
pub trait Variation: Send + Sync {
    /// Breed children from parents `pop[a]` and `pop[b]`
    fn breed(
        &self,
        pop: &[Solution],
        a: usize,
        b: usize,
        child1: &mut Solution,
        child2: &mut Solution,
        prm: &Parameters,
        time: usize,
        rng: &mut StdRng,
    );
}

/// User-supplied objective function
///
/// Writes the solution's `ova` (length nova, minimised) and `oor` (length
/// noor, each >= 0, zero = feasible). Must be thread-safe across islands;
/// the report sink is per-island, so no shared mutable state is needed for
/// logging.
pub trait Objective: Send + Sync {
    /// Evaluate one solution in place
    fn eval(&self, sol: &mut Solution, island: usize, time: usize, report: &mut Report);
}

impl<F> Objective for F
where
    F: Fn(&mut Solution, usize, usize, &mut Report) + Send + Sync,
{
    fn eval(&self, sol: &mut Solution, island: usize, time: usize, report: &mut Report) {
        self(sol, island, time, report)
    }
}
