//! Optimizer (archipelago)
//!
//! Orchestrates the islands: Latin-Hypercube initialisation, the
//! generation barrier, periodic migration, output snapshots, cancellation,
//! and the final union ranking. Between two barriers all cross-island
//! writes happen on this single thread, so runs are deterministic for a
//! fixed seed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::EvoResult;
use crate::island::Island;
use crate::operators::traits::Objective;
use crate::params::{MigrationKind, Parameters};
use crate::population::Group;
use crate::random::{derive_rng, latin_hypercube, latin_hypercube_int};
use crate::ranking;
use crate::report::Report;
use crate::solution::{fight, FightCfg, Solution};

/// The archipelago: islands plus the coordination state
pub struct Optimizer {
    prm: Arc<Parameters>,
    /// The islands; exclusively owned sub-populations
    pub islands: Vec<Island>,
    master: StdRng,
    fight_cfg: FightCfg,
    /// Global-best snapshots taken at `dt_out` intervals
    pub snapshots: Vec<Solution>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Optimizer {
    /// Build the archipelago: derive parameters, seed the islands with
    /// Latin-Hypercube designs, and evaluate every initial solution
    pub fn new(mut prm: Parameters, objective: Arc<dyn Objective>) -> EvoResult<Self> {
        prm.calc_derived()?;
        let prm = Arc::new(prm);
        let mut master = derive_rng(prm.seed, 0);
        let fight_cfg = FightCfg::from_params(&prm);

        let nsol = prm.nsol;
        let ncpu = prm.ncpu;

        // one shared design sliced across islands, or one design per island
        let shared = if prm.gen_all {
            let flt = latin_hypercube(
                &mut master,
                nsol * ncpu,
                prm.latin_dup,
                &prm.flt_min,
                &prm.flt_max,
            );
            let int = latin_hypercube_int(
                &mut master,
                nsol * ncpu,
                prm.latin_dup,
                &prm.int_min,
                &prm.int_max,
            );
            Some((flt, int))
        } else {
            None
        };

        let mut islands = Vec::with_capacity(ncpu);
        for id in 0..ncpu {
            let mut rng = derive_rng(prm.seed, id as u64 + 1);
            let (flt_init, int_init) = match &shared {
                Some((flt, int)) => (
                    flt[id * nsol..(id + 1) * nsol].to_vec(),
                    int[id * nsol..(id + 1) * nsol].to_vec(),
                ),
                None => (
                    latin_hypercube(&mut rng, nsol, prm.latin_dup, &prm.flt_min, &prm.flt_max),
                    latin_hypercube_int(&mut rng, nsol, prm.latin_dup, &prm.int_min, &prm.int_max),
                ),
            };
            islands.push(Island::new(
                id,
                Arc::clone(&prm),
                Arc::clone(&objective),
                rng,
                &flt_init,
                &int_init,
            )?);
        }

        Ok(Self {
            prm,
            islands,
            master,
            fight_cfg,
            snapshots: Vec::new(),
            cancel: None,
        })
    }

    /// Build with a plain closure as the objective function
    pub fn with_fn<F>(prm: Parameters, f: F) -> EvoResult<Self>
    where
        F: Fn(&mut Solution, usize, usize, &mut Report) + Send + Sync + 'static,
    {
        Self::new(prm, Arc::new(f))
    }

    /// Install an external cancellation flag, checked at every barrier
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the main loop and return the final population, ranked as one
    /// group and sorted best-first
    ///
    /// A cancelled run stops at the next barrier and returns the state
    /// reached so far; snapshots recorded before a runtime error remain
    /// readable on the optimizer.
    pub fn solve(&mut self) -> EvoResult<Vec<Solution>> {
        let tf = self.prm.tf;
        for t in 1..=tf {
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    info!(time = t, "cancelled, returning best snapshot so far");
                    break;
                }
            }

            let results: Vec<EvoResult<()>> = if self.prm.pll && self.islands.len() > 1 {
                self.islands.par_iter_mut().map(|isl| isl.step(t)).collect()
            } else {
                self.islands.iter_mut().map(|isl| isl.step(t)).collect()
            };
            for result in results {
                result?;
            }

            if t % self.prm.dt_mig == 0 && self.islands.len() > 1 {
                self.migrate(t)?;
            }
            if t % self.prm.dt_out == 0 {
                self.snapshot(t)?;
            }
        }
        self.finish()
    }

    /// Cross-island migration, serialised on the master generator
    fn migrate(&mut self, time: usize) -> EvoResult<()> {
        debug!(time, "migration");
        let n = self.islands.len();
        let nsol = self.prm.nsol;
        match self.prm.migration {
            MigrationKind::Tournament => {
                let bests: Vec<Solution> =
                    self.islands.iter().map(|isl| isl.best().clone()).collect();
                for i in 0..n {
                    for j in 0..n {
                        if i == j {
                            continue;
                        }
                        let (winner, loser) =
                            if fight(&bests[i], &bests[j], &self.fight_cfg, &mut self.master) {
                                (i, j)
                            } else {
                                (j, i)
                            };
                        let worst = nsol - 1;
                        bests[winner].copy_into(&mut self.islands[loser].pop.sols[worst]);
                    }
                }
            }
            MigrationKind::Ring => {
                let mut chosen = Vec::with_capacity(n);
                for isl in self.islands.iter() {
                    let pick = self.master.gen_range(0..nsol);
                    chosen.push(isl.pop.sols[pick].clone());
                }
                for (i, emigrant) in chosen.iter().enumerate() {
                    let target = (i + 1) % n;
                    let recipient = self.master.gen_range(0..nsol);
                    emigrant.copy_into(&mut self.islands[target].pop.sols[recipient]);
                }
            }
        }
        for isl in self.islands.iter_mut() {
            isl.appraise()?;
        }
        Ok(())
    }

    /// Clone the current global best (total best-first order over the
    /// island bests ranked together) into the snapshot series
    fn snapshot(&mut self, time: usize) -> EvoResult<()> {
        let mut bests: Vec<Solution> = self.islands.iter().map(|isl| isl.best().clone()).collect();
        ranking::rank(&mut bests, self.prm.use_abs_dist)?;
        let mut group = Group { sols: bests };
        group.sort_best_first();
        if let Some(best) = group.sols.into_iter().next() {
            if self.prm.verbose {
                info!(time, ova = ?best.ova, "snapshot");
            }
            self.snapshots.push(best);
        }
        Ok(())
    }

    /// Union of all islands, ranked once as a single population
    fn finish(&mut self) -> EvoResult<Vec<Solution>> {
        let mut union: Vec<Solution> = self
            .islands
            .iter()
            .flat_map(|isl| isl.pop.iter().cloned())
            .collect();
        ranking::rank(&mut union, self.prm.use_abs_dist)?;
        let mut group = Group { sols: union };
        group.mark_repeated();
        group.sort_best_first();
        Ok(group.sols)
    }

    /// The most recent global-best snapshot
    pub fn best_snapshot(&self) -> Option<&Solution> {
        self.snapshots.last()
    }

    /// Total objective-function evaluations across all islands
    pub fn total_evaluations(&self) -> usize {
        self.islands.iter().map(|isl| isl.n_fevals).sum()
    }

    /// All island reports, concatenated after the final barrier
    pub fn report(&self) -> String {
        let mut out = String::new();
        for isl in &self.islands {
            if !isl.report.is_empty() {
                out.push_str(&format!("# island {}\n", isl.id));
                out.push_str(isl.report.as_str());
            }
        }
        out
    }

    /// Multi-trial statistics: run `ntrials` full optimizations with
    /// consecutive seeds and return each trial's best solution
    pub fn run_trials(
        prm: &Parameters,
        objective: Arc<dyn Objective>,
        ntrials: usize,
    ) -> EvoResult<Vec<Solution>> {
        let mut bests = Vec::with_capacity(ntrials);
        for trial in 0..ntrials {
            let mut p = prm.clone();
            p.seed = prm.seed.wrapping_add(trial as u64);
            let mut opt = Optimizer::new(p, Arc::clone(&objective))?;
            let mut sols = opt.solve()?;
            if !sols.is_empty() {
                bests.push(sols.remove(0));
            }
        }
        Ok(bests)
    }
}
