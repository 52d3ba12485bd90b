//! # archipelago
//!
//! A constrained, possibly multi-objective evolutionary optimizer over
//! mixed float/integer decision variables, with island-model parallelism.
//!
//! Users supply decision-variable ranges and an objective function that
//! writes one or more objective values (minimised) and one or more
//! non-negative out-of-range penalties; the optimizer returns a
//! Pareto-approximating population.
//!
//! ## Features
//!
//! - **Constraint-aware dominance**: feasible solutions always outrank
//!   infeasible ones; infeasible pairs compare on violation counts and
//!   penalty vectors before objectives
//! - **Fast non-dominated sorting** with crowding and nearest-neighbour
//!   distances
//! - **Variation operators**: Deb's SBX + polynomial mutation,
//!   differential-evolution recombination, integer uniform crossover and
//!   random-reset mutation
//! - **Selection disciplines**: crowded binary tournaments, roulette,
//!   stochastic-universal sampling, and deterministic crowding with
//!   Munkres-matched parent/offspring pairing
//! - **Island model**: parallel sub-populations with periodic migration,
//!   Latin-Hypercube initialisation, and deterministic runs per seed
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use archipelago::prelude::*;
//! use std::sync::Arc;
//!
//! let mut prm = Parameters::default();
//! prm.nsol = 40;
//! prm.ncpu = 4;
//! prm.flt_min = vec![-5.0, -5.0];
//! prm.flt_max = vec![5.0, 5.0];
//!
//! let mut opt = Optimizer::with_fn(prm, |sol, _island, _time, _report| {
//!     sol.ova[0] = sol.flt.iter().map(|x| x * x).sum();
//! })?;
//! let front = opt.solve()?;
//! println!("best = {:?}", front[0].ova);
//! # Ok::<(), archipelago::error::EvoError>(())
//! ```
//!
//! ## Module overview
//!
//! - [`params`]: configuration, JSON round-trip, derivation and validation
//! - [`solution`]: the per-individual record, dominance and tournaments
//! - [`ranking`]: non-dominated sorting and distance metrics
//! - [`operators`]: variation and selection operators
//! - [`population`]: the group container and regeneration
//! - [`island`]: one sub-population's generation step
//! - [`optimizer`]: the archipelago, migration, snapshots
//! - [`matching`]: Munkres assignment for deterministic crowding
//! - [`random`]: seedable helpers and Latin-Hypercube sampling

pub mod error;
pub mod island;
pub mod matching;
pub mod operators;
pub mod optimizer;
pub mod params;
pub mod population;
pub mod random;
pub mod ranking;
pub mod report;
pub mod solution;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{ConfigError, EvoError, EvoResult, InternalError, RuntimeError};
    pub use crate::island::Island;
    pub use crate::operators::crossover::{DebVariation, DeVariation};
    pub use crate::operators::traits::{Objective, Variation};
    pub use crate::optimizer::Optimizer;
    pub use crate::params::{GaType, MigrationKind, Parameters};
    pub use crate::population::Group;
    pub use crate::report::Report;
    pub use crate::solution::{compare, fight, FightCfg, Solution};
}
