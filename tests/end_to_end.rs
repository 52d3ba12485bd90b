//! End-to-end optimization scenarios

use std::sync::Arc;

use archipelago::island::Island;
use archipelago::optimizer::Optimizer;
use archipelago::params::{GaType, MigrationKind, Parameters};
use archipelago::random::derive_rng;
use archipelago::report::Report;
use archipelago::solution::Solution;

const SEED: u64 = 1234;

fn base_params() -> Parameters {
    Parameters {
        seed: SEED,
        ..Parameters::default()
    }
}

#[test]
fn sphere_converges_to_origin() {
    let prm = Parameters {
        nsol: 40,
        ncpu: 4,
        tf: 100,
        dt_mig: 10,
        dt_out: 20,
        use_de: true,
        de_pc: 0.1,
        de_mult: 0.5,
        pm_flt: 0.1,
        deb_etam: 40.0,
        flt_min: vec![-5.0, -5.0],
        flt_max: vec![5.0, 5.0],
        ..base_params()
    };
    let mut opt = Optimizer::with_fn(prm, |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
        sol.ova[0] = sol.flt.iter().map(|x| x * x).sum();
    })
    .unwrap();
    let sols = opt.solve().unwrap();
    let best = &sols[0];
    assert!(best.ova[0] <= 1e-3, "best objective = {}", best.ova[0]);
    for &x in &best.flt {
        assert!(x.abs() <= 0.05, "best decision vector = {:?}", best.flt);
    }
}

/// Reliability design-point search: minimise the squared distance to the
/// origin subject to the limit state g(x) <= 0
#[test]
fn constrained_parabola_reliability_index() {
    let prm = Parameters {
        noor: 1,
        nsol: 40,
        ncpu: 4,
        tf: 200,
        dt_mig: 20,
        dt_out: 50,
        use_de: true,
        de_pc: 0.1,
        de_mult: 0.5,
        pm_flt: 0.1,
        deb_etam: 40.0,
        flt_min: vec![-4.0, -4.0],
        flt_max: vec![4.0, 4.0],
        ..base_params()
    };
    let mut opt = Optimizer::with_fn(prm, |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
        let (x1, x2) = (sol.flt[0], sol.flt[1]);
        let g = 2.0 - x2 - 0.1 * x1 * x1 + 0.06 * x1 * x1 * x1;
        sol.ova[0] = x1 * x1 + x2 * x2;
        sol.oor[0] = g.max(0.0);
    })
    .unwrap();
    let sols = opt.solve().unwrap();
    let best = &sols[0];
    assert_eq!(best.oor[0], 0.0, "best must be feasible");
    let beta = best.ova[0].sqrt();
    assert!(
        (beta - 2.0).abs() <= 0.05,
        "reliability index = {} at {:?}",
        beta,
        best.flt
    );
    assert!(best.flt[0].abs() < 1.0);
    assert!((best.flt[1] - 2.0).abs() < 0.5);
}

#[test]
fn zdt1_front_spread_and_distance() {
    let n = 10;
    let prm = Parameters {
        nova: 2,
        nsol: 100,
        ncpu: 1,
        tf: 800,
        dt_mig: 1000,
        dt_out: 200,
        pll: false,
        ga_type: GaType::Crowd,
        npar_grp: 2,
        all_vs_all: false,
        use_dist_fight: true,
        de_pc: 0.9,
        deb_etac: 15.0,
        deb_etam: 20.0,
        pm_flt: 0.1,
        flt_min: vec![0.0; n],
        flt_max: vec![1.0; n],
        ..base_params()
    };
    let mut opt = Optimizer::with_fn(prm, |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
        let x = &sol.flt;
        let f1 = x[0];
        let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / (x.len() - 1) as f64;
        let f2 = g * (1.0 - (f1 / g).sqrt());
        sol.ova[0] = f1;
        sol.ova[1] = f2;
    })
    .unwrap();
    let sols = opt.solve().unwrap();

    let front: Vec<&Solution> = sols
        .iter()
        .filter(|s| s.front_id == 0 && !s.repeated)
        .collect();
    assert!(front.len() >= 30, "front 0 has only {} members", front.len());

    let f1_min = front.iter().map(|s| s.ova[0]).fold(f64::INFINITY, f64::min);
    let f1_max = front
        .iter()
        .map(|s| s.ova[0])
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(f1_min < 0.1, "front does not reach small f1: {}", f1_min);
    assert!(f1_max > 0.9, "front does not reach large f1: {}", f1_max);

    // generational distance against the analytic front f2 = 1 - sqrt(f1)
    let gd = front
        .iter()
        .map(|s| (s.ova[1] - (1.0 - s.ova[0].sqrt())).abs())
        .sum::<f64>()
        / front.len() as f64;
    assert!(gd <= 0.02, "generational distance = {}", gd);
}

#[test]
fn integer_knapsack_reaches_optimum_across_seeds() {
    let weights: [i64; 10] = [7, 12, 9, 15, 5, 20, 11, 8, 14, 6];
    let values: [i64; 10] = [9, 14, 10, 18, 6, 21, 13, 10, 15, 8];
    let capacity: i64 = 50;

    // brute-force reference optimum
    let mut optimum = 0i64;
    for mask in 0u32..(1 << 10) {
        let mut w = 0;
        let mut v = 0;
        for i in 0..10 {
            if mask & (1 << i) != 0 {
                w += weights[i];
                v += values[i];
            }
        }
        if w <= capacity {
            optimum = optimum.max(v);
        }
    }

    let prm = Parameters {
        noor: 1,
        nsol: 40,
        ncpu: 2,
        tf: 120,
        dt_mig: 20,
        dt_out: 40,
        pm_int: 0.1,
        int_min: vec![0; 10],
        int_max: vec![1; 10],
        ..base_params()
    };
    let objective = Arc::new(
        move |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
            let mut w = 0;
            let mut v = 0;
            for i in 0..10 {
                if sol.int[i] != 0 {
                    w += weights[i];
                    v += values[i];
                }
            }
            sol.ova[0] = -(v as f64);
            sol.oor[0] = ((w - capacity).max(0)) as f64;
        },
    );
    let bests = Optimizer::run_trials(&prm, objective, 20).unwrap();
    assert_eq!(bests.len(), 20);
    let hits = bests
        .iter()
        .filter(|b| b.oor[0] == 0.0 && (-b.ova[0]) as i64 == optimum)
        .count();
    assert!(hits >= 19, "optimum {} reached in only {}/20 trials", optimum, hits);
}

#[test]
fn identical_seed_runs_are_deterministic() {
    for ncpu in [1usize, 4] {
        let make = || {
            let tf = 40;
            let prm = Parameters {
                nsol: 12,
                ncpu,
                tf,
                dt_mig: tf + 1, // no migration
                dt_out: 10,
                de_pc: 0.8,
                pm_flt: 0.5,
                flt_min: vec![-5.0, -5.0],
                flt_max: vec![5.0, 5.0],
                ..base_params()
            };
            let mut opt = Optimizer::with_fn(prm, |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
                sol.ova[0] = sol.flt.iter().map(|x| x * x).sum();
            })
            .unwrap();
            opt.solve().unwrap()
        };
        let a = make();
        let b = make();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.flt, y.flt, "ncpu = {}", ncpu);
            assert_eq!(x.ova, y.ova, "ncpu = {}", ncpu);
            assert_eq!(x.id, y.id, "ncpu = {}", ncpu);
        }
    }
}

#[test]
fn homogeneous_population_regenerates_and_diversifies() {
    let mut prm = Parameters {
        nsol: 12,
        ncpu: 1,
        tf: 10,
        de_pc: 0.8,
        pm_flt: 0.5,
        reg_tol: 1e-2,
        reg_pct: 0.3,
        flt_min: vec![-5.0, -5.0],
        flt_max: vec![5.0, 5.0],
        ..base_params()
    };
    prm.calc_derived().unwrap();
    let prm = Arc::new(prm);
    let objective: Arc<dyn archipelago::operators::traits::Objective> = Arc::new(
        |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
            sol.ova[0] = sol.flt.iter().map(|x| x * x).sum();
        },
    );
    let init: Vec<Vec<f64>> = vec![vec![0.5, 0.5]; 12];
    let mut island = Island::new(
        0,
        Arc::clone(&prm),
        objective,
        derive_rng(SEED, 1),
        &init,
        &[],
    )
    .unwrap();

    island.step(1).unwrap();
    island.step(2).unwrap();
    assert!(
        island.n_regen >= 1,
        "no regeneration within 2 generations"
    );
    assert!(island.report.as_str().contains("regeneration"));

    let floor = (prm.reg_pct * prm.nsol as f64) as usize;
    for t in 3..=8 {
        island.step(t).unwrap();
        island.pop.mark_repeated();
        assert!(
            island.pop.n_distinct() >= floor,
            "only {} distinct solutions at t = {}",
            island.pop.n_distinct(),
            t
        );
    }
}

#[test]
fn all_infeasible_start_converges_to_feasibility() {
    let mut prm = Parameters {
        noor: 1,
        nsol: 20,
        ncpu: 1,
        tf: 60,
        de_pc: 0.8,
        pm_flt: 0.5,
        flt_min: vec![-5.0, -5.0],
        flt_max: vec![5.0, 5.0],
        ..base_params()
    };
    prm.calc_derived().unwrap();
    let prm = Arc::new(prm);
    // feasible only when x1 >= 4
    let objective: Arc<dyn archipelago::operators::traits::Objective> = Arc::new(
        |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
            sol.ova[0] = sol.flt[1].abs();
            sol.oor[0] = (4.0 - sol.flt[0]).max(0.0);
        },
    );
    // seed the whole island inside the infeasible region
    let init: Vec<Vec<f64>> = (0..20)
        .map(|i| vec![-4.0 + 0.2 * i as f64, -2.0 + 0.2 * i as f64])
        .collect();
    let mut island = Island::new(
        0,
        Arc::clone(&prm),
        objective,
        derive_rng(SEED, 1),
        &init,
        &[],
    )
    .unwrap();

    // front 0 of an all-infeasible population is the minimum-violation set
    let min_oor = island
        .pop
        .iter()
        .map(|s| s.oor[0])
        .fold(f64::INFINITY, f64::min);
    assert!(min_oor > 0.0);
    for s in island.pop.iter().filter(|s| s.front_id == 0) {
        assert!((s.oor[0] - min_oor).abs() < 1e-12);
    }

    for t in 1..=60 {
        island.step(t).unwrap();
    }
    assert_eq!(island.best().oor[0], 0.0, "no feasible solution found");
}

#[test]
fn minimal_configuration_runs_to_completion() {
    let prm = Parameters {
        nsol: 6,
        ncpu: 1,
        tf: 20,
        pll: false,
        de_pc: 0.8,
        pm_flt: 0.5,
        migration: MigrationKind::Ring,
        flt_min: vec![-1.0],
        flt_max: vec![1.0],
        ..base_params()
    };
    let mut opt = Optimizer::with_fn(prm, |sol: &mut Solution, _island: usize, _time: usize, _report: &mut Report| {
        sol.ova[0] = sol.flt[0].abs();
    })
    .unwrap();
    let sols = opt.solve().unwrap();
    assert_eq!(sols.len(), 6);
    assert!(sols[0].ova[0] <= sols[sols.len() - 1].ova[0] + 1e-12);
}
