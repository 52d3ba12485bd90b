//! Mutation kernels
//!
//! Shared by both variation strategies and by population regeneration.

use rand::Rng;

use crate::random::{flip_coin, uniform_int};

/// Polynomial mutation for float genes
///
/// Each gene mutates with probability `pm`: a perturbation delta drawn from
/// the polynomial distribution with index `eta_m` is scaled by the gene's
/// full range. Results are clamped.
///
/// Reference: Deb, K. (2001). Multi-Objective Optimization using
/// Evolutionary Algorithms.
pub fn polynomial<R: Rng>(
    flt: &mut [f64],
    eta_m: f64,
    pm: f64,
    flt_min: &[f64],
    flt_max: &[f64],
    rng: &mut R,
) {
    if pm <= 0.0 {
        return;
    }
    for (i, gene) in flt.iter_mut().enumerate() {
        if !flip_coin(rng, pm) {
            continue;
        }
        let u = rng.gen::<f64>();
        let delta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta_m + 1.0)) - 1.0
        } else {
            1.0 - (2.0 * (1.0 - u)).powf(1.0 / (eta_m + 1.0))
        };
        *gene = (*gene + delta * (flt_max[i] - flt_min[i])).clamp(flt_min[i], flt_max[i]);
    }
}

/// Random-reset mutation for integer genes
///
/// Each gene mutates with probability `pm` to a uniform draw from its
/// inclusive range.
pub fn random_reset<R: Rng>(
    int: &mut [i64],
    pm: f64,
    int_min: &[i64],
    int_max: &[i64],
    rng: &mut R,
) {
    if pm <= 0.0 {
        return;
    }
    for (i, gene) in int.iter_mut().enumerate() {
        if flip_coin(rng, pm) {
            *gene = uniform_int(rng, int_min[i], int_max[i]);
        }
    }
}
